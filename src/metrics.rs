//! Derived-metrics computation
//!
//! Reduces one parsed session to its per-subject metrics record: counts
//! and response rates within the variable interval, response latencies,
//! FR-10 run latencies before and after the variable interval, and the
//! pre-first-reward press counts.

use crate::runs::find_continuous_run;
use crate::types::{
    MetricsRecord, SessionRecord, TimestampSeries, FR_RUN_LENGTH, FULL_COMPLETION_REWARDS,
    NOT_REACHED, SESSION_CAP_SECS,
};

/// Metrics engine for deriving a [`MetricsRecord`] from a session.
pub struct MetricsEngine;

impl MetricsEngine {
    /// Derive all per-subject fields from one session record.
    pub fn derive(record: &SessionRecord) -> MetricsRecord {
        let heading = &record.heading;
        let active = &record.active_presses.times;
        let inactive = &record.inactive_presses.times;

        // raw threshold is in centiseconds
        let vi = heading.variable_interval_raw / 100.0;

        let count_active_in_vi = record.active_presses.count_before(vi);
        let count_inactive_in_vi = record.inactive_presses.count_before(vi);
        let within_vi = count_active_in_vi + count_inactive_in_vi;

        let arr_active = round2(count_active_in_vi as f64 / vi);
        let arr_inactive = round2(count_inactive_in_vi as f64 / vi);

        let lat_r1 = first_response_latency(active, inactive);

        let (pre_reward_active_count, pre_reward_inactive_count) =
            pre_first_reward_counts(active, inactive, &record.rewards, vi);

        let lat_fr10_active = find_continuous_run(active, inactive, FR_RUN_LENGTH);
        let lat_fr10_inactive = find_continuous_run(inactive, active, FR_RUN_LENGTH);

        let active_post_vi: Vec<f64> = active.iter().copied().filter(|&t| t > vi).collect();
        let inactive_post_vi: Vec<f64> = inactive.iter().copied().filter(|&t| t > vi).collect();
        let lat_fr10_active_post_vi =
            find_continuous_run(&active_post_vi, &inactive_post_vi, FR_RUN_LENGTH);
        let lat_fr10_inactive_post_vi =
            find_continuous_run(&inactive_post_vi, &active_post_vi, FR_RUN_LENGTH);

        MetricsRecord {
            date: heading.date,
            subject_id: heading.subject_id,
            duration_minutes: session_duration_minutes(&record.rewards),
            within_vi: within_vi as u32,
            total_active: active.len() as u32,
            total_inactive: inactive.len() as u32,
            lat_r1: to_sentinel(lat_r1),
            lat_fr10_active: to_sentinel(lat_fr10_active),
            lat_fr10_inactive: to_sentinel(lat_fr10_inactive),
            lat_fr10_active_post_vi: to_sentinel(lat_fr10_active_post_vi),
            lat_fr10_inactive_post_vi: to_sentinel(lat_fr10_inactive_post_vi),
            vi,
            count_active_in_vi: count_active_in_vi as u32,
            arr_active,
            count_inactive_in_vi: count_inactive_in_vi as u32,
            arr_inactive,
            reward_count: record.rewards.len() as u32,
            magazine_count: record.magazine_entries.len() as u32,
            pre_reward_active_count,
            pre_reward_inactive_count,
        }
    }
}

/// Session length in minutes. A session that reached full trial
/// completion ends at its last reward; anything else ran to the
/// 12-minute cap.
fn session_duration_minutes(rewards: &TimestampSeries) -> f64 {
    if rewards.len() == FULL_COMPLETION_REWARDS {
        // whole seconds only
        let secs = rewards.last().unwrap_or(0.0).floor();
        round2(secs / 60.0)
    } else {
        SESSION_CAP_SECS / 60.0
    }
}

/// Latency to the first press on either lever, if any press occurred.
fn first_response_latency(active: &[f64], inactive: &[f64]) -> Option<f64> {
    match (active.first(), inactive.first()) {
        (Some(&a), Some(&i)) => Some(a.min(i)),
        (Some(&a), None) => Some(a),
        (None, Some(&i)) => Some(i),
        (None, None) => None,
    }
}

/// Presses per lever between the variable interval and the first reward.
/// Without a reward the window never opens and both counts are zero.
fn pre_first_reward_counts(
    active: &[f64],
    inactive: &[f64],
    rewards: &TimestampSeries,
    vi: f64,
) -> (u32, u32) {
    let first_reward = match rewards.first() {
        Some(t) => t,
        None => return (0, 0),
    };
    // window opens at vi / 100, not vi
    let lower = vi / 100.0;
    let count = |times: &[f64]| {
        times
            .iter()
            .filter(|&&t| t > lower && t <= first_reward)
            .count() as u32
    };
    (count(active), count(inactive))
}

fn to_sentinel(latency: Option<f64>) -> f64 {
    latency.unwrap_or(NOT_REACHED)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn series(times: &[f64]) -> TimestampSeries {
        TimestampSeries {
            declared_count: times.len() as u32,
            times: times.to_vec(),
        }
    }

    fn make_session(
        vi_raw: f64,
        active: &[f64],
        inactive: &[f64],
        rewards: &[f64],
        magazine: &[f64],
    ) -> SessionRecord {
        SessionRecord {
            heading: crate::types::SessionHeading {
                date: NaiveDate::from_ymd_opt(2019, 4, 12).unwrap(),
                subject_id: 12,
                nominal_duration_secs: 720,
                variable_interval_raw: vi_raw,
            },
            active_presses: series(active),
            inactive_presses: series(inactive),
            rewards: series(rewards),
            magazine_entries: series(magazine),
        }
    }

    #[test]
    fn test_vi_counts_and_rates() {
        // vi = 3000 / 100 = 30 seconds
        let session = make_session(
            3000.0,
            &[5.0, 10.0, 29.9, 30.0, 45.0],
            &[15.0, 31.0],
            &[],
            &[],
        );
        let metrics = MetricsEngine::derive(&session);

        assert_eq!(metrics.vi, 30.0);
        assert_eq!(metrics.count_active_in_vi, 3);
        assert_eq!(metrics.count_inactive_in_vi, 1);
        assert_eq!(metrics.within_vi, 4);
        assert_eq!(metrics.arr_active, 0.1);
        assert_eq!(metrics.arr_inactive, 0.03);
        assert_eq!(metrics.total_active, 5);
        assert_eq!(metrics.total_inactive, 2);
    }

    #[test]
    fn test_within_vi_is_sum_of_lever_counts() {
        let session = make_session(1200.0, &[1.0, 5.0, 20.0], &[3.0, 11.0], &[8.0], &[]);
        let metrics = MetricsEngine::derive(&session);
        assert_eq!(
            metrics.within_vi,
            metrics.count_active_in_vi + metrics.count_inactive_in_vi
        );
    }

    #[test]
    fn test_first_response_latency_cases() {
        let both = make_session(1000.0, &[12.5, 20.0], &[8.0], &[], &[]);
        assert_eq!(MetricsEngine::derive(&both).lat_r1, 8.0);

        let active_only = make_session(1000.0, &[12.5], &[], &[], &[]);
        assert_eq!(MetricsEngine::derive(&active_only).lat_r1, 12.5);

        let inactive_only = make_session(1000.0, &[], &[7.25], &[], &[]);
        assert_eq!(MetricsEngine::derive(&inactive_only).lat_r1, 7.25);

        let neither = make_session(1000.0, &[], &[], &[], &[]);
        assert_eq!(MetricsEngine::derive(&neither).lat_r1, NOT_REACHED);
    }

    #[test]
    fn test_duration_defaults_to_cap() {
        let session = make_session(1000.0, &[1.0], &[], &[10.0, 600.0], &[]);
        assert_eq!(MetricsEngine::derive(&session).duration_minutes, 12.0);
    }

    #[test]
    fn test_duration_override_on_full_completion() {
        let rewards: Vec<f64> = (1..=30).map(|i| i as f64 * 20.0).collect();
        let session = make_session(1000.0, &[1.0], &[], &rewards, &[]);
        // last reward at 600 seconds
        assert_eq!(MetricsEngine::derive(&session).duration_minutes, 10.0);
    }

    #[test]
    fn test_duration_override_truncates_seconds() {
        let mut rewards: Vec<f64> = (1..=29).map(|i| i as f64 * 10.0).collect();
        rewards.push(610.8);
        let session = make_session(1000.0, &[1.0], &[], &rewards, &[]);
        // floor(610.8) / 60 = 10.1666..., rounded to 10.17
        assert_eq!(MetricsEngine::derive(&session).duration_minutes, 10.17);
    }

    #[test]
    fn test_pre_reward_counts_empty_rewards() {
        let session = make_session(3000.0, &[1.0, 2.0, 3.0], &[1.5], &[], &[]);
        let metrics = MetricsEngine::derive(&session);
        assert_eq!(metrics.pre_reward_active_count, 0);
        assert_eq!(metrics.pre_reward_inactive_count, 0);
    }

    #[test]
    fn test_pre_reward_window_bounds() {
        // vi = 30, so the window opens at 0.3 and closes at the first
        // reward (10.0), inclusive
        let session = make_session(
            3000.0,
            &[0.2, 0.5, 10.0, 31.0],
            &[0.3, 4.0],
            &[10.0, 40.0],
            &[],
        );
        let metrics = MetricsEngine::derive(&session);
        assert_eq!(metrics.pre_reward_active_count, 2);
        assert_eq!(metrics.pre_reward_inactive_count, 1);
    }

    #[test]
    fn test_fr10_latencies() {
        // ten active presses in a row starting after one inactive press
        let active: Vec<f64> = (1..=10).map(|i| 20.0 + i as f64).collect();
        let session = make_session(1000.0, &active, &[5.0], &[], &[]);
        let metrics = MetricsEngine::derive(&session);

        assert_eq!(metrics.lat_fr10_active, 30.0);
        assert_eq!(metrics.lat_fr10_inactive, NOT_REACHED);
    }

    #[test]
    fn test_fr10_post_vi_filters_both_streams() {
        // vi = 10; the inactive press at 4.0 exists only pre-VI, so the
        // post-VI run completes earlier than the full-session run
        let active = [
            5.0, 11.0, 12.0, 13.0, 14.0, 15.0, 16.0, 17.0, 18.0, 19.0, 20.0, 21.0,
        ];
        let session = make_session(1000.0, &active, &[12.5], &[], &[]);
        let metrics = MetricsEngine::derive(&session);

        // full sequence: the press at 12.5 resets the streak
        assert_eq!(metrics.lat_fr10_active, NOT_REACHED);
        // post-VI: both streams filtered to > 10, interrupter at 12.5 remains
        assert_eq!(metrics.lat_fr10_active_post_vi, NOT_REACHED);

        let session = make_session(1000.0, &active, &[4.0], &[], &[]);
        let metrics = MetricsEngine::derive(&session);
        assert_eq!(metrics.lat_fr10_active, 19.0);
        // post-VI drops the active press at 5.0, so the run completes at 20.0
        assert_eq!(metrics.lat_fr10_active_post_vi, 20.0);
    }

    #[test]
    fn test_counts_use_decoded_lengths() {
        let mut session = make_session(1000.0, &[1.0, 2.0], &[], &[5.0], &[6.0, 7.0]);
        session.active_presses.declared_count = 99;
        session.rewards.declared_count = 30;

        let metrics = MetricsEngine::derive(&session);
        assert_eq!(metrics.total_active, 2);
        assert_eq!(metrics.reward_count, 1);
        // a wrong declared count must not trigger the duration override
        assert_eq!(metrics.duration_minutes, 12.0);
    }
}
