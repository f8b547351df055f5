//! boxlog - Session log analysis engine for operant conditioning chambers
//!
//! boxlog turns fixed-format chamber session logs (one text block per
//! subject per session) into per-subject behavioral metrics through a
//! deterministic pipeline: line cursor → session decoding → derived
//! metrics / minute bins → ordered report.
//!
//! ## Modules
//!
//! - **cursor / decoder**: slice one session block off the line stream and
//!   parse its heading and four timestamp series
//! - **runs**: continuous-run detection behind the FR-10 latency metrics
//! - **metrics / bins**: derive the per-subject record and the one-minute
//!   histogram view
//! - **pipeline / report**: whole-file orchestration and producer-stamped
//!   output payloads

pub mod bins;
pub mod cursor;
pub mod decoder;
pub mod error;
pub mod metrics;
pub mod pipeline;
pub mod report;
pub mod runs;
pub mod types;

pub use error::FormatError;
pub use metrics::MetricsEngine;
pub use pipeline::{bin_log, decode_sessions, process_log};
pub use report::Report;
pub use runs::find_continuous_run;
pub use types::{
    MetricsRecord, MinuteBins, SessionHeading, SessionRecord, TimestampSeries, NOT_REACHED,
};

/// boxlog version embedded in report payloads
pub const BOXLOG_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for report payloads
pub const PRODUCER_NAME: &str = "boxlog";
