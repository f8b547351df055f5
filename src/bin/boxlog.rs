//! boxlog CLI
//!
//! Commands:
//! - transform: derive per-subject metrics records from session logs
//! - bins: derive the one-minute press histogram view
//! - validate: parse logs and report declared vs decoded event counts

use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use boxlog::pipeline::{bin_log, decode_sessions, process_log};
use boxlog::report::Report;
use boxlog::types::SessionRecord;
use boxlog::{FormatError, BOXLOG_VERSION};

/// boxlog - Session log analysis engine for operant conditioning chambers
#[derive(Parser)]
#[command(name = "boxlog")]
#[command(version = BOXLOG_VERSION)]
#[command(about = "Derive behavioral metrics from chamber session logs", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Derive per-subject metrics records (batch mode)
    Transform {
        /// Log file, or a directory of extensionless log files (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// Output format
        #[arg(long, default_value = "ndjson")]
        output_format: OutputFormat,
    },

    /// Derive the one-minute press histogram view
    Bins {
        /// Log file, or a directory of extensionless log files (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// Output format
        #[arg(long, default_value = "ndjson")]
        output_format: OutputFormat,
    },

    /// Parse logs and report declared vs decoded event counts
    Validate {
        /// Log file, or a directory of extensionless log files (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output the report as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Newline-delimited JSON (one record per line)
    Ndjson,
    /// Producer-stamped JSON report
    Json,
    /// Pretty-printed producer-stamped JSON report
    JsonPretty,
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e))
                    .unwrap_or_else(|_| "unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), BoxlogCliError> {
    match cli.command {
        Commands::Transform {
            input,
            output,
            output_format,
        } => {
            let mut records = Vec::new();
            for (_, text) in read_inputs(&input)? {
                records.extend(process_log(&text)?);
            }
            let data = format_records(&records, &output_format)?;
            write_output(&output, &data)
        }

        Commands::Bins {
            input,
            output,
            output_format,
        } => {
            let mut records = Vec::new();
            for (_, text) in read_inputs(&input)? {
                records.extend(bin_log(&text)?);
            }
            let data = format_records(&records, &output_format)?;
            write_output(&output, &data)
        }

        Commands::Validate { input, json } => cmd_validate(&input, json),
    }
}

fn cmd_validate(input: &Path, json: bool) -> Result<(), BoxlogCliError> {
    let mut reports = Vec::new();
    for (name, text) in read_inputs(input)? {
        let sessions = decode_sessions(&text)?;
        reports.push(FileReport {
            sessions: sessions.iter().map(check_session).collect(),
            file: name,
        });
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
        return Ok(());
    }

    for report in &reports {
        println!("{} ({} sessions)", report.file, report.sessions.len());
        for session in &report.sessions {
            let counts: Vec<String> = session
                .series
                .iter()
                .map(|s| format!("{} {}/{}", s.name, s.decoded, s.declared))
                .collect();
            let status = if session.series.iter().all(SeriesCheck::matches) {
                "ok"
            } else {
                "MISMATCH"
            };
            println!(
                "  subject {} ({}): {} [{}]",
                session.subject_id,
                session.date,
                counts.join(", "),
                status
            );
        }
    }

    Ok(())
}

fn check_session(session: &SessionRecord) -> SessionCheck {
    let series = vec![
        SeriesCheck::of("active", &session.active_presses),
        SeriesCheck::of("inactive", &session.inactive_presses),
        SeriesCheck::of("rewards", &session.rewards),
        SeriesCheck::of("magazine", &session.magazine_entries),
    ];
    SessionCheck {
        subject_id: session.heading.subject_id,
        date: session.heading.date,
        series,
    }
}

// Helper functions

/// Gather `(name, contents)` pairs: stdin for `-`, every extensionless
/// file of a directory, or the single named file.
fn read_inputs(input: &Path) -> Result<Vec<(String, String)>, BoxlogCliError> {
    if input.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        return Ok(vec![("<stdin>".to_string(), buffer)]);
    }

    if input.is_dir() {
        let mut paths: Vec<PathBuf> = fs::read_dir(input)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_file())
            .filter(|path| {
                path.file_name()
                    .map(|name| !name.to_string_lossy().contains('.'))
                    .unwrap_or(false)
            })
            .collect();
        paths.sort();

        if paths.is_empty() {
            return Err(BoxlogCliError::NoInputs(input.display().to_string()));
        }

        let mut inputs = Vec::new();
        for path in paths {
            inputs.push((path.display().to_string(), fs::read_to_string(&path)?));
        }
        return Ok(inputs);
    }

    Ok(vec![(
        input.display().to_string(),
        fs::read_to_string(input)?,
    )])
}

fn format_records<T: Serialize + Clone>(
    records: &[T],
    format: &OutputFormat,
) -> Result<String, BoxlogCliError> {
    match format {
        OutputFormat::Ndjson => {
            let mut lines: Vec<String> = Vec::new();
            for record in records {
                lines.push(serde_json::to_string(record)?);
            }
            Ok(lines.join("\n") + "\n")
        }
        OutputFormat::Json => Ok(Report::new(records.to_vec()).to_json()?),
        OutputFormat::JsonPretty => Ok(Report::new(records.to_vec()).to_json_pretty()?),
    }
}

fn write_output(output: &Path, data: &str) -> Result<(), BoxlogCliError> {
    if output.to_string_lossy() == "-" {
        print!("{data}");
    } else {
        fs::write(output, data)?;
    }
    Ok(())
}

// Report types

#[derive(Serialize)]
struct FileReport {
    file: String,
    sessions: Vec<SessionCheck>,
}

#[derive(Serialize)]
struct SessionCheck {
    subject_id: u32,
    date: chrono::NaiveDate,
    series: Vec<SeriesCheck>,
}

#[derive(Serialize)]
struct SeriesCheck {
    name: &'static str,
    declared: u32,
    decoded: usize,
}

impl SeriesCheck {
    fn of(name: &'static str, series: &boxlog::TimestampSeries) -> Self {
        Self {
            name,
            declared: series.declared_count,
            decoded: series.len(),
        }
    }

    fn matches(&self) -> bool {
        self.declared as usize == self.decoded
    }
}

// Error types

#[derive(Debug)]
enum BoxlogCliError {
    Io(io::Error),
    Format(FormatError),
    Json(serde_json::Error),
    NoInputs(String),
}

impl From<io::Error> for BoxlogCliError {
    fn from(e: io::Error) -> Self {
        BoxlogCliError::Io(e)
    }
}

impl From<FormatError> for BoxlogCliError {
    fn from(e: FormatError) -> Self {
        BoxlogCliError::Format(e)
    }
}

impl From<serde_json::Error> for BoxlogCliError {
    fn from(e: serde_json::Error) -> Self {
        BoxlogCliError::Json(e)
    }
}

#[derive(Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<BoxlogCliError> for CliError {
    fn from(e: BoxlogCliError) -> Self {
        match e {
            BoxlogCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            BoxlogCliError::Format(e) => CliError {
                code: "FORMAT_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("The file does not match the chamber log layout".to_string()),
            },
            BoxlogCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: None,
            },
            BoxlogCliError::NoInputs(dir) => CliError {
                code: "NO_INPUTS".to_string(),
                message: format!("no extensionless log files in {dir}"),
                hint: Some("Chamber logs are written without a file extension".to_string()),
            },
        }
    }
}
