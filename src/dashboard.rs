// Dashboard assembly: latest readings fanned out over a bounded worker pool,
// per-site alert classification, system-wide counts.

use std::cmp::Ordering;

use futures_util::{StreamExt, stream};
use tracing::warn;

use crate::cumulative::metrics::state_is_on;
use crate::models::{
    ActivityItem, AlertStatus, DashboardData, SensorReading, Site, SiteWithReadings, SystemStatus,
    ViewMode,
};
use crate::readings_repo::ReadingsRepo;

/// Fuel level at or below this percentage raises a low-fuel alert.
pub const LOW_FUEL_THRESHOLD_PERCENT: f64 = 25.0;

const MAX_RECENT_ACTIVITY: usize = 10;

#[derive(Debug, Clone)]
pub struct DashboardOptions {
    pub realtime_concurrency: usize,
    pub closing_concurrency: usize,
}

/// Fetches each site's latest reading (raw stream for realtime, daily-closing
/// table plus live states for closing), classifies it, and reduces the batch
/// to system status and recent activity. Sites without a fuel-level reading
/// are omitted; a failed per-site query only drops that site.
pub async fn build_dashboard(
    repo: &ReadingsRepo,
    sites: &[Site],
    mode: ViewMode,
    opts: &DashboardOptions,
) -> DashboardData {
    let concurrency = match mode {
        ViewMode::Realtime => opts.realtime_concurrency,
        ViewMode::Closing => opts.closing_concurrency,
    };

    let mut futures = Vec::with_capacity(sites.len());
    for site in sites {
        futures.push(async move {
            let fetched = match mode {
                ViewMode::Realtime => repo.latest_device_reading(site.id, &site.device_id).await,
                ViewMode::Closing => repo.daily_closing_reading(site.id, &site.device_id).await,
            };
            match fetched {
                Ok(Some(reading)) if !reading.fuel_level.is_empty() => {
                    Some(classify_site_reading(site, reading))
                }
                Ok(_) => None,
                Err(e) => {
                    warn!(site = %site.name, error = %e, "latest reading fetch failed");
                    None
                }
            }
        });
    }
    let mut with_readings: Vec<SiteWithReadings> = stream::iter(futures)
        .buffer_unordered(concurrency.max(1))
        .filter_map(|result| async move { result })
        .collect()
        .await;

    with_readings.sort_by(|a, b| {
        b.fuel_level_percentage
            .partial_cmp(&a.fuel_level_percentage)
            .unwrap_or(Ordering::Equal)
    });

    let system_status = system_status(&with_readings, sites.len());
    let recent_activity = recent_activity(&with_readings);

    DashboardData {
        sites: with_readings,
        system_status,
        recent_activity,
        view_mode: mode,
    }
}

/// Parses the fuel level (clamped to [0, 100]), normalizes power states, and
/// derives the alert status for one site.
pub fn classify_site_reading(site: &Site, reading: SensorReading) -> SiteWithReadings {
    let fuel_level_percentage = reading
        .fuel_level
        .trim()
        .parse::<f64>()
        .map(|level| level.clamp(0.0, 100.0))
        .unwrap_or(0.0);

    let generator_online = state_is_on(&reading.generator_state);
    let zesa_online = state_is_on(&reading.zesa_state);

    let alert_status = if fuel_level_percentage <= LOW_FUEL_THRESHOLD_PERCENT {
        AlertStatus::LowFuel
    } else if !generator_online && fuel_level_percentage > 0.0 {
        AlertStatus::GeneratorOff
    } else {
        AlertStatus::Normal
    };

    SiteWithReadings {
        site: site.clone(),
        latest_reading: reading,
        generator_online,
        zesa_online,
        fuel_level_percentage,
        alert_status,
    }
}

pub fn system_status(sites: &[SiteWithReadings], total_sites: usize) -> SystemStatus {
    let mut status = SystemStatus {
        sites_online: sites.len(),
        total_sites,
        offline_sites: total_sites - sites.len(),
        ..SystemStatus::default()
    };

    for site in sites {
        if site.alert_status == AlertStatus::LowFuel {
            status.low_fuel_alerts += 1;
        }
        if site.generator_online {
            status.generators_running += 1;
        }
        if site.zesa_online {
            status.zesa_running += 1;
        }
    }

    status
}

/// Up to 10 activity items derived from the freshest readings, newest first.
pub fn recent_activity(sites: &[SiteWithReadings]) -> Vec<ActivityItem> {
    let mut activities: Vec<ActivityItem> = sites
        .iter()
        .take(MAX_RECENT_ACTIVITY)
        .enumerate()
        .map(|(i, site)| {
            let (event, status) = match site.alert_status {
                AlertStatus::LowFuel => ("Low Fuel Alert", "Low Fuel"),
                AlertStatus::GeneratorOff => ("Generator Offline", "Offline"),
                AlertStatus::Normal => ("Normal Reading", "Normal"),
            };
            let fuel_volume = if site.latest_reading.fuel_volume.is_empty() {
                "0"
            } else {
                site.latest_reading.fuel_volume.as_str()
            };
            ActivityItem {
                id: i + 1,
                site_id: site.site.id,
                site_name: site.site.name.clone(),
                event: event.to_string(),
                value: format!("{:.1}% ({}L)", site.fuel_level_percentage, fuel_volume),
                timestamp: site.latest_reading.captured_at,
                status: status.to_string(),
            }
        })
        .collect();

    activities.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    activities
}
