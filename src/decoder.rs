//! Session block decoding
//!
//! A log file carries one block per subject per session: a fixed sequence
//! of labeled heading lines followed by four numeric sub-blocks (active
//! presses, inactive presses, rewards, magazine entries). Values are
//! pulled out of each line by whitespace token position; any label or
//! position that does not match the expected layout is a [`FormatError`]
//! and aborts the file read.

use chrono::{NaiveDate, NaiveTime};
use log::debug;

use crate::cursor::LineCursor;
use crate::error::FormatError;
use crate::types::{SessionHeading, SessionRecord, TimestampSeries};

/// Lines between the end-time line and the variable-interval line of a
/// heading.
const HEADING_FILLER_LINES: usize = 20;

/// Lines closing a block after the last series' label row.
const BLOCK_TAIL_LINES: usize = 3;

/// Decode exactly one session block, leaving the cursor on the line after
/// its tail.
pub fn decode_session(cursor: &mut LineCursor) -> Result<SessionRecord, FormatError> {
    let heading = decode_heading(cursor)?;

    let active_presses = decode_series(cursor)?;
    skip_label_row(cursor)?;
    let inactive_presses = decode_series(cursor)?;
    skip_label_row(cursor)?;
    let rewards = decode_series(cursor)?;
    skip_label_row(cursor)?;
    let magazine_entries = decode_series(cursor)?;
    skip_label_row(cursor)?;

    discard_lines(cursor, BLOCK_TAIL_LINES, "block tail")?;

    debug!(
        "decoded session: subject {} ({} active, {} inactive, {} rewards, {} magazine)",
        heading.subject_id,
        active_presses.len(),
        inactive_presses.len(),
        rewards.len(),
        magazine_entries.len(),
    );

    Ok(SessionRecord {
        heading,
        active_presses,
        inactive_presses,
        rewards,
        magazine_entries,
    })
}

/// Decode the fixed heading layout: date, end date (discarded), subject,
/// experiment/group/box (discarded), start time, end time, 20 filler
/// lines, variable interval, and the label row that opens the first
/// series section.
fn decode_heading(cursor: &mut LineCursor) -> Result<SessionHeading, FormatError> {
    let (line_no, date_line) = expect_line(cursor, "date line")?;
    check_label(date_line, line_no, "Start Date:")?;
    let date = parse_date(token_at(date_line, 2, line_no, "date value")?, line_no)?;

    discard_lines(cursor, 1, "end-date line")?;

    let (line_no, subject_line) = expect_line(cursor, "subject line")?;
    check_label(subject_line, line_no, "Subject:")?;
    let subject_tok = token_at(subject_line, 1, line_no, "subject id")?;
    let subject_id = subject_tok
        .parse::<u32>()
        .map_err(|_| FormatError::InvalidNumber {
            line: line_no,
            token: subject_tok.to_string(),
        })?;

    discard_lines(cursor, 3, "experiment, group and box lines")?;

    let (line_no, start_line) = expect_line(cursor, "start-time line")?;
    check_label(start_line, line_no, "Start Time:")?;
    let start = parse_time(token_at(start_line, 2, line_no, "start time")?, line_no)?;

    let (line_no, end_line) = expect_line(cursor, "end-time line")?;
    check_label(end_line, line_no, "End Time:")?;
    let end = parse_time(token_at(end_line, 2, line_no, "end time")?, line_no)?;

    discard_lines(cursor, HEADING_FILLER_LINES, "heading filler")?;

    let (line_no, vi_line) = expect_line(cursor, "variable-interval line")?;
    let vi_tok = token_at(vi_line, 1, line_no, "variable-interval value")?;
    let variable_interval_raw = parse_f64(vi_tok, line_no)?;

    // opens the first series section
    skip_label_row(cursor)?;

    Ok(SessionHeading {
        date,
        subject_id,
        nominal_duration_secs: (end - start).num_seconds(),
        variable_interval_raw,
    })
}

/// Decode one numeric sub-block into a timestamp series.
///
/// The first row's second whitespace token, rounded to the nearest
/// integer, is the declared element count. Rows are consumed and their
/// tokens after the first parsed as timestamps until a section-label row
/// (second character `:`) is reached; that row is left unconsumed for the
/// caller. The first accumulated value repeats the declared count and is
/// dropped from the timestamp sequence. Order is row-major, ascending by
/// construction of the log format; it is not re-sorted here.
pub fn decode_series(cursor: &mut LineCursor) -> Result<TimestampSeries, FormatError> {
    let first = cursor
        .peek()
        .ok_or(FormatError::UnexpectedEof("timestamp series"))?;
    if is_label_row(first) {
        return Err(FormatError::MissingToken {
            line: cursor.line_number(),
            what: "series data row",
        });
    }
    let first_no = cursor.line_number();
    let count_tok = token_at(first, 1, first_no, "element count")?;
    let declared_count = parse_f64(count_tok, first_no)?.round().max(0.0) as u32;

    let mut values: Vec<f64> = Vec::new();
    loop {
        let line = cursor
            .peek()
            .ok_or(FormatError::UnexpectedEof("timestamp series"))?;
        if is_label_row(line) {
            break;
        }
        let line_no = cursor.line_number();
        cursor.next_line();
        for token in line.split_whitespace().skip(1) {
            values.push(parse_f64(token, line_no)?);
        }
    }

    // values[0] is the count marker, not a timestamp
    let times = values.split_off(1);

    Ok(TimestampSeries {
        declared_count,
        times,
    })
}

/// A row whose second character is `:` opens a labeled section; data rows
/// lead with a right-aligned row index instead.
fn is_label_row(line: &str) -> bool {
    let mut chars = line.chars();
    chars.next();
    chars.next() == Some(':')
}

/// Discard one section-label row.
fn skip_label_row(cursor: &mut LineCursor) -> Result<(), FormatError> {
    let (line_no, line) = expect_line(cursor, "section label")?;
    if !is_label_row(line) {
        return Err(FormatError::LabelMismatch {
            line: line_no,
            expected: "section label",
            found: line.trim().to_string(),
        });
    }
    Ok(())
}

fn discard_lines(
    cursor: &mut LineCursor,
    n: usize,
    what: &'static str,
) -> Result<(), FormatError> {
    for _ in 0..n {
        cursor
            .next_line()
            .ok_or(FormatError::UnexpectedEof(what))?;
    }
    Ok(())
}

fn expect_line<'a>(
    cursor: &mut LineCursor<'a>,
    what: &'static str,
) -> Result<(usize, &'a str), FormatError> {
    let line_no = cursor.line_number();
    cursor
        .next_line()
        .map(|line| (line_no, line))
        .ok_or(FormatError::UnexpectedEof(what))
}

fn token_at<'a>(
    line: &'a str,
    index: usize,
    line_no: usize,
    what: &'static str,
) -> Result<&'a str, FormatError> {
    line.split_whitespace()
        .nth(index)
        .ok_or(FormatError::MissingToken {
            line: line_no,
            what,
        })
}

fn check_label(line: &str, line_no: usize, expected: &'static str) -> Result<(), FormatError> {
    if line.trim_start().starts_with(expected) {
        Ok(())
    } else {
        Err(FormatError::LabelMismatch {
            line: line_no,
            expected,
            found: line.trim().to_string(),
        })
    }
}

fn parse_f64(token: &str, line_no: usize) -> Result<f64, FormatError> {
    token.parse().map_err(|_| FormatError::InvalidNumber {
        line: line_no,
        token: token.to_string(),
    })
}

fn parse_date(token: &str, line_no: usize) -> Result<NaiveDate, FormatError> {
    NaiveDate::parse_from_str(token, "%m/%d/%y")
        .or_else(|_| NaiveDate::parse_from_str(token, "%m/%d/%Y"))
        .map_err(|_| FormatError::InvalidDate {
            line: line_no,
            token: token.to_string(),
        })
}

fn parse_time(token: &str, line_no: usize) -> Result<NaiveTime, FormatError> {
    NaiveTime::parse_from_str(token, "%H:%M:%S").map_err(|_| FormatError::InvalidTime {
        line: line_no,
        token: token.to_string(),
    })
}
