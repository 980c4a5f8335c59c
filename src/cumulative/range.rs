// Range variant: per-site SQL reductions over already-persisted daily
// aggregates, fanned out across a bounded worker pool.

use std::cmp::Ordering;

use futures_util::{StreamExt, stream};
use tracing::warn;

use crate::models::{DateRange, Site, SiteRangeResult};
use crate::readings_repo::ReadingsRepo;

use super::summary::round_to;

/// One aggregate query per site over [start_date, end_date], concurrently.
/// Sites with no reading days in the window are dropped from the result set;
/// a failed query drops that site too, after logging. Results are sorted
/// descending by total fuel consumed.
pub async fn range_results_for_sites(
    repo: &ReadingsRepo,
    sites: &[Site],
    start_date: &str,
    end_date: &str,
    concurrency: usize,
) -> Vec<SiteRangeResult> {
    let mut futures = Vec::with_capacity(sites.len());
    for site in sites {
        futures.push(site_range_result(repo, site, start_date, end_date));
    }
    let mut results: Vec<SiteRangeResult> = stream::iter(futures)
        .buffer_unordered(concurrency.max(1))
        .filter_map(|result| async move { result })
        .collect()
        .await;

    results.sort_by(|a, b| {
        b.total_fuel_consumed
            .partial_cmp(&a.total_fuel_consumed)
            .unwrap_or(Ordering::Equal)
    });
    results
}

async fn site_range_result(
    repo: &ReadingsRepo,
    site: &Site,
    start_date: &str,
    end_date: &str,
) -> Option<SiteRangeResult> {
    let totals = match repo.range_totals(site.id, start_date, end_date).await {
        Ok(totals) => totals?,
        Err(e) => {
            warn!(site = %site.name, error = %e, "range totals query failed");
            return None;
        }
    };

    Some(SiteRangeResult {
        site_id: site.id,
        site_name: site.name.clone(),
        device_id: site.device_id.clone(),
        total_fuel_consumed: round_to(totals.fuel_consumed, 1),
        total_fuel_topped: round_to(totals.fuel_topped, 1),
        total_generator_hours: round_to(totals.generator_hours, 2),
        total_zesa_hours: round_to(totals.zesa_hours, 2),
        total_offline_hours: round_to(totals.offline_hours, 2),
        reading_days: totals.reading_days,
        date_range: DateRange {
            start: totals.first_date,
            end: totals.last_date,
            is_range: None,
        },
    })
}
