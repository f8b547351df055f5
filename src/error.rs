//! Error types for boxlog

use thiserror::Error;

/// Errors raised while decoding a session log.
///
/// Any of these aborts the surrounding file read; there is no per-session
/// recovery and no partial result. Missing behavioral data (empty event
/// streams, zero rewards) is never an error: the metrics engine resolves
/// those through zero counts and the not-reached sentinel.
#[derive(Debug, Error)]
pub enum FormatError {
    #[error("unexpected end of input while reading {0}")]
    UnexpectedEof(&'static str),

    #[error("line {line}: expected `{expected}`, found `{found}`")]
    LabelMismatch {
        line: usize,
        expected: &'static str,
        found: String,
    },

    #[error("line {line}: missing {what}")]
    MissingToken { line: usize, what: &'static str },

    #[error("line {line}: invalid number `{token}`")]
    InvalidNumber { line: usize, token: String },

    #[error("line {line}: invalid date `{token}`")]
    InvalidDate { line: usize, token: String },

    #[error("line {line}: invalid time `{token}`")]
    InvalidTime { line: usize, token: String },
}
