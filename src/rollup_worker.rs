// Background worker: recompute yesterday's cumulative readings for all active
// sites on a schedule (cron expression or fixed interval).

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use chrono::{Days, Utc};
use tracing::{info, warn};

use crate::cumulative::{self, BatchOptions, summary};
use crate::models::DaySummary;
use crate::readings_repo::ReadingsRepo;
use crate::site_repo::SiteRepo;

#[derive(Debug, Clone)]
pub struct RollupWorkerConfig {
    /// Optional cron expression (with seconds field, e.g. "0 10 0 * * *" =
    /// 00:10 daily). Uses local time. Falls back to interval_secs when unset.
    pub schedule: Option<String>,
    pub interval_secs: u64,
    pub batch: BatchOptions,
}

/// Spawns the rollup worker. Returns a join handle; send on the shutdown
/// channel to stop it.
pub fn spawn(
    readings: Arc<ReadingsRepo>,
    sites: Arc<SiteRepo>,
    config: RollupWorkerConfig,
    shutdown_rx: tokio::sync::oneshot::Receiver<()>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        run(readings, sites, config, shutdown_rx).await;
    })
}

async fn run(
    readings: Arc<ReadingsRepo>,
    sites: Arc<SiteRepo>,
    config: RollupWorkerConfig,
    mut shutdown_rx: tokio::sync::oneshot::Receiver<()>,
) {
    let (tick_tx, mut tick_rx) = tokio::sync::mpsc::channel::<()>(1);
    tokio::spawn(rollup_scheduler(config.clone(), tick_tx));

    loop {
        tokio::select! {
            received = tick_rx.recv() => {
                if received.is_none() {
                    break;
                }
                match run_one_rollup(&readings, &sites, &config.batch).await {
                    Ok(summary) => info!(
                        processed = summary.processed_sites,
                        errors = summary.error_sites,
                        fuel_consumed = summary.total_fuel_consumed,
                        "nightly rollup complete"
                    ),
                    Err(e) => warn!(error = %e, "nightly rollup failed"),
                }
            }
            _ = &mut shutdown_rx => {
                tracing::debug!("rollup worker shutting down");
                break;
            }
        }
    }
}

/// Sends a message on `tx` at each rollup time (cron or fixed interval).
/// Uses local time for cron.
async fn rollup_scheduler(config: RollupWorkerConfig, tx: tokio::sync::mpsc::Sender<()>) {
    if let Some(ref cron_str) = config.schedule {
        let Ok(schedule) = cron::Schedule::from_str(cron_str) else {
            warn!(cron = %cron_str, "invalid rollup schedule; rollup will not run");
            return;
        };
        loop {
            let now = chrono::Local::now();
            let next = schedule.after(&now).next();
            if let Some(next) = next {
                let delay = (next - now).to_std().unwrap_or(Duration::from_secs(1));
                tokio::time::sleep(delay).await;
                if tx.send(()).await.is_err() {
                    break;
                }
            } else {
                tokio::time::sleep(Duration::from_secs(3600)).await;
            }
        }
    } else {
        let interval = Duration::from_secs(config.interval_secs);
        loop {
            tokio::time::sleep(interval).await;
            if tx.send(()).await.is_err() {
                break;
            }
        }
    }
}

/// Runs one rollup pass for the previous UTC day across all active sites.
/// Used by the worker loop and callable once at startup for backfill.
pub async fn run_one_rollup(
    readings: &ReadingsRepo,
    sites: &SiteRepo,
    batch: &BatchOptions,
) -> anyhow::Result<DaySummary> {
    let yesterday = Utc::now()
        .date_naive()
        .checked_sub_days(Days::new(1))
        .ok_or_else(|| anyhow::anyhow!("date underflow computing yesterday"))?;

    let all_sites = sites.all_active().await?;
    let results = cumulative::process_sites_for_date(readings, &all_sites, yesterday, batch).await?;
    Ok(summary::day_summary(&results, all_sites.len()))
}
