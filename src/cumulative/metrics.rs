// Pure signal logic: state-interval integration and fuel-delta analysis.
// DB access (sample fetch, upsert) stays in readings_repo.

use chrono::{NaiveDate, NaiveTime};

use crate::models::{FuelMetrics, FuelSample, PowerMetrics, StateSample};

/// Sample-to-sample changes below this are discarded as sensor jitter when the
/// generator had no activity that day. Percentage points for the level
/// sequence; percent-of-previous-reading for the volume sequence.
pub const NOISE_GATE_PERCENT: f64 = 2.0;

const MS_PER_HOUR: f64 = 3_600_000.0;
const MS_PER_DAY: i64 = 86_400_000;

/// Normalizes a raw state value to a boolean at the read boundary.
/// Accepted ON tokens: "1", "1.0", "on", "true" (case-insensitive, trimmed).
/// Anything else, including malformed text, is OFF.
pub fn state_is_on(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "1" | "1.0" | "on" | "true"
    )
}

/// [start, end] window of one UTC calendar day in epoch millis.
/// The end bound is the last representable millisecond of the day.
pub fn day_window_ms(date: NaiveDate) -> (i64, i64) {
    let start = date.and_time(NaiveTime::MIN).and_utc().timestamp_millis();
    (start, start + MS_PER_DAY - 1)
}

/// Total hours a state signal was ON within a window, from ascending samples.
/// Each consecutive pair contributes its gap when the earlier sample was ON; a
/// trailing ON sample extends to the window end. Zero samples means zero hours
/// (no implicit state is assumed). Pulses that start and end between two
/// samples are not observable; sparse sampling under-counts them.
pub fn state_runtime_hours(samples: &[StateSample], window_end_ms: i64) -> f64 {
    let mut runtime_ms: i64 = 0;
    let mut last: Option<(i64, bool)> = None;

    for sample in samples {
        if let Some((last_ms, true)) = last {
            runtime_ms += sample.time_ms - last_ms;
        }
        last = Some((sample.time_ms, state_is_on(&sample.value)));
    }

    if let Some((last_ms, true)) = last
        && last_ms < window_end_ms
    {
        runtime_ms += window_end_ms - last_ms;
    }

    runtime_ms as f64 / MS_PER_HOUR
}

/// Generator and zesa runtimes plus derived offline hours for one day.
/// The two signals are integrated independently and can overlap, so offline
/// time is clamped at zero rather than treated as a partition of 24h.
pub fn power_runtimes(
    generator: &[StateSample],
    zesa: &[StateSample],
    window_end_ms: i64,
) -> PowerMetrics {
    let generator_hours = state_runtime_hours(generator, window_end_ms);
    let zesa_hours = state_runtime_hours(zesa, window_end_ms);
    let offline_hours = (24.0 - generator_hours - zesa_hours).max(0.0);

    PowerMetrics {
        total_generator_runtime: generator_hours,
        total_zesa_runtime: zesa_hours,
        total_offline_time: offline_hours,
    }
}

/// Walks the level (%) and volume (L) sequences independently, classifying
/// each consecutive delta: positive accumulates into topped, negative into
/// consumed (absolute value). With no generator activity, deltas under the
/// noise gate are discarded; for the volume sequence the gate compares the
/// delta as a percentage of the previous reading and is skipped entirely when
/// the previous reading is not positive. Fewer than two samples in a sequence
/// contributes nothing. The sequences are never cross-validated.
pub fn fuel_changes(
    levels: &[FuelSample],
    volumes: &[FuelSample],
    generator_active: bool,
) -> FuelMetrics {
    let mut metrics = FuelMetrics::default();

    for pair in levels.windows(2) {
        let change = pair[1].value - pair[0].value;
        if !generator_active && change.abs() < NOISE_GATE_PERCENT {
            continue;
        }
        if change > 0.0 {
            metrics.fuel_topped_percent += change;
        } else if change < 0.0 {
            metrics.fuel_consumed_percent += -change;
        }
    }

    for pair in volumes.windows(2) {
        let prev = pair[0].value;
        let change = pair[1].value - prev;
        if prev > 0.0 {
            let change_percent = change.abs() / prev * 100.0;
            if !generator_active && change_percent < NOISE_GATE_PERCENT {
                continue;
            }
        }
        if change > 0.0 {
            metrics.total_fuel_topped += change;
        } else if change < 0.0 {
            metrics.total_fuel_consumed += -change;
        }
    }

    metrics
}
