//! Core types for the boxlog pipeline
//!
//! This module defines the data structures that flow through each stage of
//! the pipeline: the parsed session record, the derived metrics record, and
//! the one-minute histogram view.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Sentinel latency (seconds) meaning "this event never occurred within
/// the session".
///
/// Larger than any attainable in-session timestamp (sessions cap at
/// [`SESSION_CAP_SECS`]). Internal code carries `Option<f64>` latencies;
/// the sentinel is applied only when a [`MetricsRecord`] is built, so a
/// missing latency can never leak into arithmetic by accident. Sinks must
/// check for it before treating a latency as real elapsed time.
pub const NOT_REACHED: f64 = 800.0;

/// Hard session cap in seconds (12 minutes).
pub const SESSION_CAP_SECS: f64 = 720.0;

/// Number of one-minute histogram bins covering `[0, SESSION_CAP_SECS)`.
pub const NUM_BINS: usize = 12;

/// Width of one histogram bin in seconds.
pub const BIN_WIDTH_SECS: f64 = 60.0;

/// Run length for the fixed-ratio latency metrics.
pub const FR_RUN_LENGTH: usize = 10;

/// Reward count of a session that ran to full trial completion.
pub const FULL_COMPLETION_REWARDS: usize = 30;

/// Heading fields of one session block.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionHeading {
    /// Session date from the heading's date line.
    pub date: NaiveDate,
    /// Subject identifier. Unique within a file by convention only.
    pub subject_id: u32,
    /// Seconds between the heading's start and end times. Informational;
    /// the metrics engine derives the reported duration from the reward
    /// series instead.
    pub nominal_duration_secs: i64,
    /// Variable-interval threshold exactly as written in the log. Divided
    /// by 100 before use as a time threshold in seconds.
    pub variable_interval_raw: f64,
}

/// One event stream of a session: ordered timestamps in seconds from
/// session start.
///
/// Immutable after decoding. The declared count comes from the first row
/// of the numeric sub-block and is informational only; `times.len()` is
/// authoritative everywhere a count is derived.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimestampSeries {
    /// Element count declared on the first row of the sub-block.
    pub declared_count: u32,
    /// Event timestamps, non-decreasing, non-negative.
    pub times: Vec<f64>,
}

impl TimestampSeries {
    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    pub fn first(&self) -> Option<f64> {
        self.times.first().copied()
    }

    pub fn last(&self) -> Option<f64> {
        self.times.last().copied()
    }

    /// Count of timestamps strictly below `bound`.
    pub fn count_before(&self, bound: f64) -> usize {
        self.times.iter().filter(|&&t| t < bound).count()
    }
}

/// One fully parsed session block.
///
/// Created once by the session decoder, consumed once by the metrics
/// engine or the minute binner, then discarded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    pub heading: SessionHeading,
    pub active_presses: TimestampSeries,
    pub inactive_presses: TimestampSeries,
    pub rewards: TimestampSeries,
    pub magazine_entries: TimestampSeries,
}

/// Derived per-subject metrics for one session.
///
/// Latency fields hold [`NOT_REACHED`] when the event never occurred.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsRecord {
    /// Session date.
    pub date: NaiveDate,
    /// Subject identifier.
    pub subject_id: u32,
    /// Session length in minutes. 12.0 unless the session ran to full
    /// trial completion, in which case it ends at the last reward.
    pub duration_minutes: f64,
    /// Presses on either lever before the variable interval elapsed.
    pub within_vi: u32,
    /// Total active-lever presses.
    pub total_active: u32,
    /// Total inactive-lever presses.
    pub total_inactive: u32,
    /// Latency to the first press on either lever (seconds).
    pub lat_r1: f64,
    /// Time at which the active lever accumulated 10 uninterrupted presses.
    pub lat_fr10_active: f64,
    /// Time at which the inactive lever accumulated 10 uninterrupted presses.
    pub lat_fr10_inactive: f64,
    /// Active FR-10 latency over presses after the variable interval.
    pub lat_fr10_active_post_vi: f64,
    /// Inactive FR-10 latency over presses after the variable interval.
    pub lat_fr10_inactive_post_vi: f64,
    /// Variable-interval threshold in seconds.
    pub vi: f64,
    /// Active-lever presses within the variable interval.
    pub count_active_in_vi: u32,
    /// Average active response rate over the variable interval.
    pub arr_active: f64,
    /// Inactive-lever presses within the variable interval.
    pub count_inactive_in_vi: u32,
    /// Average inactive response rate over the variable interval.
    pub arr_inactive: f64,
    /// Rewards delivered.
    pub reward_count: u32,
    /// Magazine entries.
    pub magazine_count: u32,
    /// Active presses between the variable interval and the first reward.
    pub pre_reward_active_count: u32,
    /// Inactive presses between the variable interval and the first reward.
    pub pre_reward_inactive_count: u32,
}

/// Per-subject one-minute press histogram over the 12-minute session cap.
///
/// Events at or past [`SESSION_CAP_SECS`] fall outside every bin.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MinuteBins {
    pub subject_id: u32,
    pub active: [u32; NUM_BINS],
    pub inactive: [u32; NUM_BINS],
}
