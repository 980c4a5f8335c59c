// Summary builder tests: partial-failure accounting, rounding, day counts

use chrono::NaiveDate;
use fuelmon::cumulative::summary::{day_summary, days_included, range_summary, round_to};
use fuelmon::models::{DateRange, SiteDayResult, SiteRangeResult, SiteStatus};

fn ok_result(fuel_consumed: f64) -> SiteDayResult {
    SiteDayResult {
        site_id: 1,
        site_name: "site".to_string(),
        device_id: "device-1".to_string(),
        fuel_consumed,
        fuel_topped: 0.0,
        fuel_consumed_percent: 0.0,
        fuel_topped_percent: 0.0,
        generator_hours: 0.0,
        zesa_hours: 0.0,
        offline_hours: 0.0,
        status: SiteStatus::Created,
        error: None,
        calculated_at: None,
    }
}

fn err_result() -> SiteDayResult {
    SiteDayResult {
        status: SiteStatus::Error,
        error: Some("boom".to_string()),
        ..ok_result(0.0)
    }
}

fn range_result(fuel_consumed: f64) -> SiteRangeResult {
    SiteRangeResult {
        site_id: 1,
        site_name: "site".to_string(),
        device_id: "device-1".to_string(),
        total_fuel_consumed: fuel_consumed,
        total_fuel_topped: 0.0,
        total_generator_hours: 0.0,
        total_zesa_hours: 0.0,
        total_offline_hours: 0.0,
        reading_days: 1,
        date_range: DateRange {
            start: "2024-01-01".to_string(),
            end: "2024-01-01".to_string(),
            is_range: None,
        },
    }
}

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

#[test]
fn errored_sites_excluded_from_sums_but_counted() {
    let results = vec![ok_result(10.0), err_result()];
    let summary = day_summary(&results, 2);
    assert_eq!(summary.total_sites, 2);
    assert_eq!(summary.processed_sites, 1);
    assert_eq!(summary.error_sites, 1);
    assert_eq!(summary.total_fuel_consumed, 10.0);
}

#[test]
fn day_summary_rounds_sums() {
    let mut a = ok_result(10.04);
    a.generator_hours = 1.004;
    let mut b = ok_result(10.04);
    b.generator_hours = 1.004;
    let summary = day_summary(&[a, b], 2);
    // Litres to 1 decimal, hours to 2.
    assert_eq!(summary.total_fuel_consumed, 20.1);
    assert_eq!(summary.total_generator_hours, 2.01);
}

#[test]
fn round_half_up_semantics() {
    assert_eq!(round_to(1.25, 1), 1.3);
    assert_eq!(round_to(1.24, 1), 1.2);
    assert_eq!(round_to(3.125, 2), 3.13);
    assert_eq!(round_to(0.0, 1), 0.0);
}

#[test]
fn days_included_is_inclusive() {
    assert_eq!(days_included(date("2024-01-01"), date("2024-01-01")), 1);
    assert_eq!(days_included(date("2024-01-01"), date("2024-01-03")), 3);
}

#[test]
fn range_summary_totals_and_average() {
    let results = vec![range_result(10.0), range_result(20.0)];
    let summary = range_summary(&results, date("2024-01-01"), date("2024-01-03"));
    assert_eq!(summary.total_sites, 2);
    assert_eq!(summary.total_fuel_consumed, 30.0);
    assert_eq!(summary.average_fuel_per_site, 15.0);
    assert_eq!(summary.days_included, 3);
    assert_eq!(summary.date_range.is_range, Some(true));
}

#[test]
fn range_summary_empty_has_zero_average() {
    let summary = range_summary(&[], date("2024-01-02"), date("2024-01-02"));
    assert_eq!(summary.total_sites, 0);
    assert_eq!(summary.total_fuel_consumed, 0.0);
    assert_eq!(summary.average_fuel_per_site, 0.0);
    assert_eq!(summary.days_included, 1);
    assert_eq!(summary.date_range.is_range, Some(false));
}
