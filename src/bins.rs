//! One-minute press histograms
//!
//! Partitions each lever's press timestamps into twelve fixed 60-second
//! bins covering the 12-minute session cap. This is the companion summary
//! view to the per-subject metrics record.

use crate::types::{MinuteBins, SessionRecord, BIN_WIDTH_SECS, NUM_BINS};

/// Count timestamps per one-minute bin over `[0, 720)`.
///
/// Each timestamp lands in at most one bin; events at or past the
/// session cap are not counted at all.
pub fn minute_bins(times: &[f64]) -> [u32; NUM_BINS] {
    let mut bins = [0u32; NUM_BINS];
    for &t in times {
        let index = (t / BIN_WIDTH_SECS).floor();
        if (0.0..NUM_BINS as f64).contains(&index) {
            bins[index as usize] += 1;
        }
    }
    bins
}

/// Bin one session's active and inactive presses.
pub fn bin_session(record: &SessionRecord) -> MinuteBins {
    MinuteBins {
        subject_id: record.heading.subject_id,
        active: minute_bins(&record.active_presses.times),
        inactive: minute_bins(&record.inactive_presses.times),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SESSION_CAP_SECS;

    #[test]
    fn test_bin_boundaries() {
        let bins = minute_bins(&[0.0, 59.999, 60.0, 119.9, 719.999]);
        assert_eq!(bins[0], 2);
        assert_eq!(bins[1], 2);
        assert_eq!(bins[11], 1);
    }

    #[test]
    fn test_events_past_cap_are_uncounted() {
        let bins = minute_bins(&[719.9, 720.0, 800.0]);
        let total: u32 = bins.iter().sum();
        assert_eq!(total, 1);
    }

    #[test]
    fn test_bin_totals_match_in_cap_events() {
        let times = [5.0, 65.0, 125.0, 300.0, 640.0, 719.0, 720.0, 900.0];
        let bins = minute_bins(&times);
        let in_cap = times.iter().filter(|&&t| t < SESSION_CAP_SECS).count();
        assert_eq!(bins.iter().sum::<u32>() as usize, in_cap);
    }

    #[test]
    fn test_empty_stream() {
        assert_eq!(minute_bins(&[]), [0; NUM_BINS]);
    }
}
