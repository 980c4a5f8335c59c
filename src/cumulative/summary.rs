// Reduces per-site results into response summaries. Errored sites are
// excluded from sums but counted separately.

use chrono::NaiveDate;

use crate::models::{
    DateRange, DaySummary, RangeSummary, SiteDayResult, SiteRangeResult, SiteStatus,
};

/// Round half-up to the given number of decimals. All persisted metrics are
/// non-negative, so truncation after the +0.5 shift matches half-up.
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let multiplier = 10f64.powi(decimals as i32);
    (value * multiplier + 0.5).floor() / multiplier
}

/// Inclusive day count of a window: same start and end is 1 day.
pub fn days_included(start: NaiveDate, end: NaiveDate) -> i64 {
    if start == end {
        return 1;
    }
    (end - start).num_days() + 1
}

/// Summary for the single-day report. Litre/percent sums are rounded to 1
/// decimal, hour sums to 2.
pub fn day_summary(results: &[SiteDayResult], total_sites: usize) -> DaySummary {
    let mut summary = DaySummary {
        total_sites,
        ..DaySummary::default()
    };
    let mut fuel_consumed = 0.0;
    let mut fuel_topped = 0.0;
    let mut generator_hours = 0.0;
    let mut zesa_hours = 0.0;
    let mut offline_hours = 0.0;

    for result in results {
        if result.status == SiteStatus::Error {
            summary.error_sites += 1;
            continue;
        }
        summary.processed_sites += 1;
        fuel_consumed += result.fuel_consumed;
        fuel_topped += result.fuel_topped;
        generator_hours += result.generator_hours;
        zesa_hours += result.zesa_hours;
        offline_hours += result.offline_hours;
    }

    summary.total_fuel_consumed = round_to(fuel_consumed, 1);
    summary.total_fuel_topped = round_to(fuel_topped, 1);
    summary.total_generator_hours = round_to(generator_hours, 2);
    summary.total_zesa_hours = round_to(zesa_hours, 2);
    summary.total_offline_hours = round_to(offline_hours, 2);
    summary
}

/// Summary for the range report: totals across qualifying sites, average fuel
/// per site (0 when none qualified), and the requested window with its
/// inclusive day count.
pub fn range_summary(
    results: &[SiteRangeResult],
    start: NaiveDate,
    end: NaiveDate,
) -> RangeSummary {
    let mut fuel_consumed = 0.0;
    let mut fuel_topped = 0.0;
    let mut generator_hours = 0.0;
    let mut zesa_hours = 0.0;
    let mut offline_hours = 0.0;

    for result in results {
        fuel_consumed += result.total_fuel_consumed;
        fuel_topped += result.total_fuel_topped;
        generator_hours += result.total_generator_hours;
        zesa_hours += result.total_zesa_hours;
        offline_hours += result.total_offline_hours;
    }

    let average_fuel_per_site = if results.is_empty() {
        0.0
    } else {
        fuel_consumed / results.len() as f64
    };

    let start_str = start.format(super::DATE_FORMAT).to_string();
    let end_str = end.format(super::DATE_FORMAT).to_string();

    RangeSummary {
        date_range: DateRange {
            is_range: Some(start_str != end_str),
            start: start_str,
            end: end_str,
        },
        total_sites: results.len(),
        total_fuel_consumed: round_to(fuel_consumed, 1),
        total_fuel_topped: round_to(fuel_topped, 1),
        total_generator_hours: round_to(generator_hours, 2),
        total_zesa_hours: round_to(zesa_hours, 2),
        total_offline_hours: round_to(offline_hours, 2),
        average_fuel_per_site: round_to(average_fuel_per_site, 1),
        days_included: days_included(start, end),
    }
}
