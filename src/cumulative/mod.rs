// Cumulative metrics engine: per-site daily calculation plus concurrent
// batch orchestration. Pure signal logic lives in metrics; SQL reductions for
// date ranges in range; summary reduction in summary.

pub mod metrics;
pub mod range;
pub mod summary;

use std::cmp::Ordering;
use std::time::Duration;

use anyhow::anyhow;
use chrono::{NaiveDate, Utc};
use futures_util::{StreamExt, stream};
use tracing::{debug, warn};

use crate::models::{FuelMetrics, PowerMetrics, Site, SiteDayResult, SiteStatus};
use crate::readings_repo::{ReadingsRepo, SENSOR_GENERATOR_STATE, SENSOR_ZESA_STATE};

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Tuning for a batch run. Worker counts bound concurrent storage queries;
/// the per-site timeout turns a stuck site into an ERROR entry instead of
/// stalling the whole batch.
#[derive(Debug, Clone)]
pub struct BatchOptions {
    pub concurrency: usize,
    pub site_timeout: Duration,
}

/// Parses `DD/MM/YYYY` or `YYYY-MM-DD`.
pub fn parse_flexible_date(raw: &str) -> anyhow::Result<NaiveDate> {
    let raw = raw.trim();
    let parsed = if raw.contains('/') {
        NaiveDate::parse_from_str(raw, "%d/%m/%Y")
    } else {
        NaiveDate::parse_from_str(raw, DATE_FORMAT)
    };
    parsed.map_err(|_| anyhow!("invalid date '{}': use DD/MM/YYYY or YYYY-MM-DD", raw))
}

/// Fuel deltas for one device/day: generator-activity check gates the noise
/// suppression, then the day's level and volume sequences are walked.
pub async fn fuel_changes_for_day(
    repo: &ReadingsRepo,
    device_id: &str,
    date: NaiveDate,
) -> anyhow::Result<FuelMetrics> {
    let (start_ms, end_ms) = metrics::day_window_ms(date);
    let generator_active = repo.has_generator_activity(device_id, start_ms, end_ms).await?;
    let (levels, volumes) = repo.fuel_samples(device_id, start_ms, end_ms).await?;
    Ok(metrics::fuel_changes(&levels, &volumes, generator_active))
}

/// Generator/zesa runtimes for one device/day, integrated from state samples.
pub async fn power_runtimes_for_day(
    repo: &ReadingsRepo,
    device_id: &str,
    date: NaiveDate,
) -> anyhow::Result<PowerMetrics> {
    let (start_ms, end_ms) = metrics::day_window_ms(date);
    let generator = repo
        .state_samples(device_id, SENSOR_GENERATOR_STATE, start_ms, end_ms)
        .await?;
    let zesa = repo
        .state_samples(device_id, SENSOR_ZESA_STATE, start_ms, end_ms)
        .await?;
    Ok(metrics::power_runtimes(&generator, &zesa, end_ms))
}

/// Runs the per-site calculation for every site over a bounded worker pool and
/// returns all results sorted descending by fuel consumed. The existing-record
/// prefetch is shared by the whole batch: its failure aborts the request,
/// while any per-site failure only yields that site's ERROR entry.
pub async fn process_sites_for_date(
    repo: &ReadingsRepo,
    sites: &[Site],
    date: NaiveDate,
    opts: &BatchOptions,
) -> anyhow::Result<Vec<SiteDayResult>> {
    let date_str = date.format(DATE_FORMAT).to_string();
    let site_ids: Vec<i64> = sites.iter().map(|s| s.id).collect();
    let existing = repo.sites_with_reading_on(&date_str, &site_ids).await?;

    let mut futures = Vec::with_capacity(sites.len());
    for site in sites {
        futures.push(process_single_site(
            repo,
            site,
            date,
            &date_str,
            existing.contains(&site.id),
            opts.site_timeout,
        ));
    }
    let mut results: Vec<SiteDayResult> = stream::iter(futures)
        .buffer_unordered(opts.concurrency.max(1))
        .collect()
        .await;

    sort_by_fuel_consumed(&mut results);
    Ok(results)
}

/// Computes fuel and power metrics concurrently, upserts the (site, date)
/// record, and labels the result CREATED or UPDATED from the prefetched
/// existence set. Any failure, including timeout, becomes an ERROR entry.
async fn process_single_site(
    repo: &ReadingsRepo,
    site: &Site,
    date: NaiveDate,
    date_str: &str,
    existed: bool,
    site_timeout: Duration,
) -> SiteDayResult {
    debug!(site = %site.name, device = %site.device_id, "processing site");

    let computed = tokio::time::timeout(site_timeout, compute_and_store(repo, site, date, date_str)).await;
    match computed {
        Err(_) => {
            warn!(site = %site.name, timeout_secs = site_timeout.as_secs(), "site calculation timed out");
            error_result(site, "timeout".to_string())
        }
        Ok(Err(e)) => {
            warn!(site = %site.name, error = %e, "site calculation failed");
            error_result(site, e.to_string())
        }
        Ok(Ok((fuel, power))) => SiteDayResult {
            site_id: site.id,
            site_name: site.name.clone(),
            device_id: site.device_id.clone(),
            fuel_consumed: fuel.total_fuel_consumed,
            fuel_topped: fuel.total_fuel_topped,
            fuel_consumed_percent: fuel.fuel_consumed_percent,
            fuel_topped_percent: fuel.fuel_topped_percent,
            generator_hours: power.total_generator_runtime,
            zesa_hours: power.total_zesa_runtime,
            offline_hours: power.total_offline_time,
            status: if existed { SiteStatus::Updated } else { SiteStatus::Created },
            error: None,
            calculated_at: Some(Utc::now()),
        },
    }
}

async fn compute_and_store(
    repo: &ReadingsRepo,
    site: &Site,
    date: NaiveDate,
    date_str: &str,
) -> anyhow::Result<(FuelMetrics, PowerMetrics)> {
    let (fuel, power) = tokio::join!(
        fuel_changes_for_day(repo, &site.device_id, date),
        power_runtimes_for_day(repo, &site.device_id, date),
    );

    let (fuel, power) = match (fuel, power) {
        (Ok(fuel), Ok(power)) => (fuel, power),
        (fuel, power) => {
            return Err(anyhow!(
                "calculation error: fuel={}, power={}",
                outcome(&fuel),
                outcome(&power)
            ));
        }
    };

    repo.upsert_cumulative_reading(site.id, &site.device_id, date_str, &fuel, &power)
        .await?;
    Ok((fuel, power))
}

fn outcome<T>(result: &anyhow::Result<T>) -> String {
    match result {
        Ok(_) => "ok".to_string(),
        Err(e) => e.to_string(),
    }
}

fn error_result(site: &Site, message: String) -> SiteDayResult {
    SiteDayResult {
        site_id: site.id,
        site_name: site.name.clone(),
        device_id: site.device_id.clone(),
        fuel_consumed: 0.0,
        fuel_topped: 0.0,
        fuel_consumed_percent: 0.0,
        fuel_topped_percent: 0.0,
        generator_hours: 0.0,
        zesa_hours: 0.0,
        offline_hours: 0.0,
        status: SiteStatus::Error,
        error: Some(message),
        calculated_at: None,
    }
}

/// Descending by fuel consumed; stable, so equal values keep arrival order.
pub fn sort_by_fuel_consumed(results: &mut [SiteDayResult]) {
    results.sort_by(|a, b| {
        b.fuel_consumed
            .partial_cmp(&a.fuel_consumed)
            .unwrap_or(Ordering::Equal)
    });
}
