//! File orchestration
//!
//! Decodes every session block in a log file and reduces each one to its
//! derived records. One file is processed at a time; nothing persists
//! between files, and a single malformed block aborts the whole file with
//! no partial result.

use log::debug;

use crate::bins::bin_session;
use crate::cursor::LineCursor;
use crate::decoder::decode_session;
use crate::error::FormatError;
use crate::metrics::MetricsEngine;
use crate::types::{MetricsRecord, MinuteBins, SessionRecord};

/// Lines of file-level header before the first session block.
pub const FILE_HEADER_LINES: usize = 4;

/// Whitespace lines separating consecutive session blocks.
pub const SESSION_SEPARATOR_LINES: usize = 3;

/// Decode every session block in `text`.
///
/// The file header is skipped, then blocks are decoded back to back, each
/// followed by the separator when more input remains.
pub fn decode_sessions(text: &str) -> Result<Vec<SessionRecord>, FormatError> {
    let lines: Vec<&str> = text.lines().collect();
    let mut cursor = LineCursor::new(&lines);
    cursor.skip(FILE_HEADER_LINES);

    let mut sessions = Vec::new();
    loop {
        sessions.push(decode_session(&mut cursor)?);
        if cursor.remaining() < SESSION_SEPARATOR_LINES {
            break;
        }
        cursor.skip(SESSION_SEPARATOR_LINES);
        if cursor.is_exhausted() {
            break;
        }
    }
    debug!("decoded {} sessions", sessions.len());
    Ok(sessions)
}

/// Derive metrics for every session in `text`, ordered by subject id.
pub fn process_log(text: &str) -> Result<Vec<MetricsRecord>, FormatError> {
    let sessions = decode_sessions(text)?;
    let mut records: Vec<MetricsRecord> = sessions.iter().map(MetricsEngine::derive).collect();
    records.sort_by_key(|r| r.subject_id);
    Ok(records)
}

/// Minute-bin view of every session in `text`, ordered by subject id.
pub fn bin_log(text: &str) -> Result<Vec<MinuteBins>, FormatError> {
    let sessions = decode_sessions(text)?;
    let mut records: Vec<MinuteBins> = sessions.iter().map(bin_session).collect();
    records.sort_by_key(|r| r.subject_id);
    Ok(records)
}
