// State-interval integration tests: ON-duration from discrete samples

use fuelmon::cumulative::metrics::{
    day_window_ms, power_runtimes, state_is_on, state_runtime_hours,
};
use fuelmon::models::StateSample;

const HOUR_MS: i64 = 3_600_000;

fn sample(value: &str, time_ms: i64) -> StateSample {
    StateSample {
        value: value.to_string(),
        time_ms,
    }
}

#[test]
fn on_off_on_with_trailing_on_extends_to_window_end() {
    // ON at 0h, OFF at 2h, ON at 3h, window end 5h => 2h + 2h
    let samples = vec![
        sample("1", 0),
        sample("0", 2 * HOUR_MS),
        sample("1", 3 * HOUR_MS),
    ];
    let hours = state_runtime_hours(&samples, 5 * HOUR_MS);
    assert_eq!(hours, 4.0);
}

#[test]
fn zero_samples_means_zero_hours() {
    assert_eq!(state_runtime_hours(&[], 24 * HOUR_MS), 0.0);
}

#[test]
fn single_on_sample_runs_until_window_end() {
    let samples = vec![sample("1", 10 * HOUR_MS)];
    assert_eq!(state_runtime_hours(&samples, 24 * HOUR_MS), 14.0);
}

#[test]
fn trailing_on_at_window_end_adds_nothing() {
    let samples = vec![sample("0", 0), sample("1", 24 * HOUR_MS)];
    assert_eq!(state_runtime_hours(&samples, 24 * HOUR_MS), 0.0);
}

#[test]
fn all_off_means_zero_hours() {
    let samples = vec![sample("0", 0), sample("0", 6 * HOUR_MS)];
    assert_eq!(state_runtime_hours(&samples, 24 * HOUR_MS), 0.0);
}

#[test]
fn malformed_values_count_as_off() {
    // ON at 0h, garbage at 4h ends the interval, window end 10h
    let samples = vec![sample("1", 0), sample("garbage", 4 * HOUR_MS)];
    assert_eq!(state_runtime_hours(&samples, 10 * HOUR_MS), 4.0);
}

#[test]
fn accepted_on_tokens() {
    for token in ["1", "1.0", "on", "ON", "true", " True "] {
        assert!(state_is_on(token), "{token:?} should be ON");
    }
    for token in ["0", "0.0", "off", "false", "yes", "2", ""] {
        assert!(!state_is_on(token), "{token:?} should be OFF");
    }
}

#[test]
fn offline_hours_clamped_at_zero_when_runtimes_overlap() {
    // Generator 14h and zesa 15h overlap; offline must clamp to 0, not go negative.
    let generator = vec![sample("1", 0), sample("0", 14 * HOUR_MS)];
    let zesa = vec![sample("1", 0), sample("0", 15 * HOUR_MS)];
    let power = power_runtimes(&generator, &zesa, 24 * HOUR_MS);
    assert_eq!(power.total_generator_runtime, 14.0);
    assert_eq!(power.total_zesa_runtime, 15.0);
    assert_eq!(power.total_offline_time, 0.0);
}

#[test]
fn offline_hours_complements_short_runtimes() {
    let generator = vec![sample("1", 0), sample("0", 6 * HOUR_MS)];
    let power = power_runtimes(&generator, &[], 24 * HOUR_MS);
    assert_eq!(power.total_generator_runtime, 6.0);
    assert_eq!(power.total_zesa_runtime, 0.0);
    assert_eq!(power.total_offline_time, 18.0);
}

#[test]
fn day_window_spans_one_utc_day() {
    let date = chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    let (start, end) = day_window_ms(date);
    assert_eq!(start, 1_704_067_200_000);
    assert_eq!(end - start, 24 * HOUR_MS - 1);
}
