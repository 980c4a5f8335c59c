// Engine tests: per-site calculator, batch orchestration, range reductions

mod common;

use std::time::Duration;

use chrono::NaiveDate;
use common::{make_site, open_store, ts};
use fuelmon::cumulative::{
    self, BatchOptions, parse_flexible_date, range, summary,
};
use fuelmon::models::{FuelMetrics, PowerMetrics, SiteStatus};
use fuelmon::readings_repo::{
    ReadingsRepo, SENSOR_FUEL_LEVEL, SENSOR_FUEL_VOLUME, SENSOR_GENERATOR_STATE,
};

const DAY: &str = "2024-03-01";

fn opts() -> BatchOptions {
    BatchOptions {
        concurrency: 10,
        site_timeout: Duration::from_secs(30),
    }
}

fn day() -> NaiveDate {
    NaiveDate::parse_from_str(DAY, "%Y-%m-%d").unwrap()
}

/// Seed a day of activity: generator running 06:00-12:00, fuel drawn down.
async fn seed_activity(readings: &ReadingsRepo, device_id: &str, consumed: f64) {
    readings
        .insert_sample(device_id, SENSOR_GENERATOR_STATE, "1", ts(DAY, 6, 0, 0))
        .await
        .unwrap();
    readings
        .insert_sample(device_id, SENSOR_GENERATOR_STATE, "0", ts(DAY, 12, 0, 0))
        .await
        .unwrap();
    readings
        .insert_sample(device_id, SENSOR_FUEL_VOLUME, "500.0", ts(DAY, 6, 0, 0))
        .await
        .unwrap();
    readings
        .insert_sample(
            device_id,
            SENSOR_FUEL_VOLUME,
            &format!("{}", 500.0 - consumed),
            ts(DAY, 12, 0, 0),
        )
        .await
        .unwrap();
    readings
        .insert_sample(device_id, SENSOR_FUEL_LEVEL, "80.0", ts(DAY, 6, 0, 0))
        .await
        .unwrap();
    readings
        .insert_sample(device_id, SENSOR_FUEL_LEVEL, "70.0", ts(DAY, 12, 0, 0))
        .await
        .unwrap();
}

#[tokio::test]
async fn parse_flexible_date_accepts_both_formats() {
    assert_eq!(
        parse_flexible_date("01/03/2024").unwrap(),
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
    );
    assert_eq!(
        parse_flexible_date("2024-03-01").unwrap(),
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
    );
    assert!(parse_flexible_date("03-01-2024").is_err());
    assert!(parse_flexible_date("31/02/2024").is_err());
}

#[tokio::test]
async fn fuel_and_power_drivers_compute_a_full_day() {
    let (_dir, readings, _sites) = open_store().await;
    seed_activity(&readings, "dev-1", 60.0).await;

    let fuel = cumulative::fuel_changes_for_day(&readings, "dev-1", day())
        .await
        .unwrap();
    assert_eq!(fuel.total_fuel_consumed, 60.0);
    assert_eq!(fuel.fuel_consumed_percent, 10.0);

    let power = cumulative::power_runtimes_for_day(&readings, "dev-1", day())
        .await
        .unwrap();
    assert_eq!(power.total_generator_runtime, 6.0);
    assert_eq!(power.total_zesa_runtime, 0.0);
    assert_eq!(power.total_offline_time, 18.0);
}

#[tokio::test]
async fn calculator_is_idempotent_created_then_updated() {
    let (_dir, readings, sites) = open_store().await;
    let site = make_site(&sites, "Avondale", "dev-1").await;
    seed_activity(&readings, "dev-1", 60.0).await;
    let all = vec![site];

    let first = cumulative::process_sites_for_date(&readings, &all, day(), &opts())
        .await
        .unwrap();
    let second = cumulative::process_sites_for_date(&readings, &all, day(), &opts())
        .await
        .unwrap();

    assert_eq!(first[0].status, SiteStatus::Created);
    assert_eq!(second[0].status, SiteStatus::Updated);
    // Unchanged samples => identical metrics both runs.
    assert_eq!(first[0].fuel_consumed, second[0].fuel_consumed);
    assert_eq!(first[0].generator_hours, second[0].generator_hours);
    assert_eq!(first[0].fuel_consumed, 60.0);
}

#[tokio::test]
async fn batch_sorted_descending_by_fuel_consumed() {
    let (_dir, readings, sites) = open_store().await;
    let a = make_site(&sites, "A", "dev-a").await;
    let b = make_site(&sites, "B", "dev-b").await;
    let c = make_site(&sites, "C", "dev-c").await;
    seed_activity(&readings, "dev-a", 30.0).await;
    seed_activity(&readings, "dev-b", 90.0).await;
    seed_activity(&readings, "dev-c", 60.0).await;

    let results =
        cumulative::process_sites_for_date(&readings, &[a, b, c], day(), &opts())
            .await
            .unwrap();
    let consumed: Vec<f64> = results.iter().map(|r| r.fuel_consumed).collect();
    assert_eq!(consumed, vec![90.0, 60.0, 30.0]);
}

#[tokio::test]
async fn site_without_samples_yields_zero_metrics() {
    let (_dir, readings, sites) = open_store().await;
    let site = make_site(&sites, "Quiet", "dev-quiet").await;

    let results = cumulative::process_sites_for_date(&readings, &[site], day(), &opts())
        .await
        .unwrap();
    assert_eq!(results[0].status, SiteStatus::Created);
    assert_eq!(results[0].fuel_consumed, 0.0);
    assert_eq!(results[0].generator_hours, 0.0);
    // No samples at all still derives a full offline day.
    assert_eq!(results[0].offline_hours, 24.0);
}

#[tokio::test]
async fn empty_site_list_yields_empty_results() {
    let (_dir, readings, _sites) = open_store().await;
    let results = cumulative::process_sites_for_date(&readings, &[], day(), &opts())
        .await
        .unwrap();
    assert!(results.is_empty());
    let summary = summary::day_summary(&results, 0);
    assert_eq!(summary.total_sites, 0);
    assert_eq!(summary.total_fuel_consumed, 0.0);
}

#[tokio::test]
async fn timed_out_site_becomes_error_without_aborting_siblings() {
    let (_dir, readings, sites) = open_store().await;
    let a = make_site(&sites, "A", "dev-a").await;
    let b = make_site(&sites, "B", "dev-b").await;
    seed_activity(&readings, "dev-a", 30.0).await;
    seed_activity(&readings, "dev-b", 90.0).await;

    let zero_timeout = BatchOptions {
        concurrency: 10,
        site_timeout: Duration::ZERO,
    };
    let results = cumulative::process_sites_for_date(&readings, &[a, b], day(), &zero_timeout)
        .await
        .unwrap();

    assert_eq!(results.len(), 2);
    for result in &results {
        assert_eq!(result.status, SiteStatus::Error);
        assert_eq!(result.error.as_deref(), Some("timeout"));
        assert!(result.calculated_at.is_none());
    }
    let summary = summary::day_summary(&results, 2);
    assert_eq!(summary.error_sites, 2);
    assert_eq!(summary.processed_sites, 0);
}

#[tokio::test]
async fn range_results_drop_sites_without_readings() {
    let (_dir, readings, sites) = open_store().await;
    let a = make_site(&sites, "A", "dev-a").await;
    let b = make_site(&sites, "B", "dev-b").await;

    let fuel = FuelMetrics {
        total_fuel_consumed: 10.0,
        total_fuel_topped: 0.0,
        fuel_consumed_percent: 2.0,
        fuel_topped_percent: 0.0,
    };
    let power = PowerMetrics {
        total_generator_runtime: 4.0,
        total_zesa_runtime: 12.0,
        total_offline_time: 8.0,
    };
    readings
        .upsert_cumulative_reading(a.id, "dev-a", "2024-03-01", &fuel, &power)
        .await
        .unwrap();
    readings
        .upsert_cumulative_reading(a.id, "dev-a", "2024-03-02", &fuel, &power)
        .await
        .unwrap();

    let results = range::range_results_for_sites(
        &readings,
        &[a.clone(), b],
        "2024-03-01",
        "2024-03-03",
        15,
    )
    .await;

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].site_id, a.id);
    assert_eq!(results[0].reading_days, 2);
    assert_eq!(results[0].total_fuel_consumed, 20.0);
    assert_eq!(results[0].total_generator_hours, 8.0);
    assert_eq!(results[0].date_range.start, "2024-03-01");
    assert_eq!(results[0].date_range.end, "2024-03-02");
}

#[tokio::test]
async fn range_results_sorted_descending() {
    let (_dir, readings, sites) = open_store().await;
    let a = make_site(&sites, "A", "dev-a").await;
    let b = make_site(&sites, "B", "dev-b").await;

    let power = PowerMetrics::default();
    for (site, consumed) in [(&a, 5.0), (&b, 50.0)] {
        let fuel = FuelMetrics {
            total_fuel_consumed: consumed,
            ..FuelMetrics::default()
        };
        readings
            .upsert_cumulative_reading(site.id, &site.device_id, "2024-03-01", &fuel, &power)
            .await
            .unwrap();
    }

    let results =
        range::range_results_for_sites(&readings, &[a, b], "2024-03-01", "2024-03-01", 15).await;
    assert_eq!(results[0].total_fuel_consumed, 50.0);
    assert_eq!(results[1].total_fuel_consumed, 5.0);
}
