use anyhow::Result;
use fuelmon::*;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::FormatTime;

struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(
            w,
            "{}",
            chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z")
        )
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_timer(LocalTimer)
        .with_env_filter(filter)
        .init();

    let app_config = config::AppConfig::load()?;

    let readings_repo = Arc::new(
        readings_repo::ReadingsRepo::connect(
            &app_config.database.path,
            app_config.database.max_pool_size,
        )
        .await?,
    );
    readings_repo.init().await?;

    let site_repo = Arc::new(site_repo::SiteRepo::new(readings_repo.pool()));
    site_repo.init().await?;
    if let Err(e) = site_repo.auto_create_from_devices().await {
        tracing::warn!(error = %e, "site auto-create failed");
    }

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
    let rollup_handle = if app_config.rollup.enabled {
        Some(rollup_worker::spawn(
            readings_repo.clone(),
            site_repo.clone(),
            rollup_worker::RollupWorkerConfig {
                schedule: app_config.rollup.schedule.clone(),
                interval_secs: app_config.rollup.interval_secs,
                batch: cumulative::BatchOptions {
                    concurrency: app_config.aggregation.daily_concurrency,
                    site_timeout: std::time::Duration::from_secs(
                        app_config.aggregation.site_timeout_secs,
                    ),
                },
            },
            shutdown_rx,
        ))
    } else {
        None
    };

    let app = routes::app(readings_repo, site_repo, app_config.clone());
    let addr = format!("{}:{}", app_config.server.host, app_config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on http://{}", addr);

    let in_container = std::path::Path::new("/.dockerenv").exists()
        || std::env::var("CONTAINER").as_deref() == Ok("1");

    if in_container {
        // In Docker: run server until error or SIGTERM (no signal handler; avoids immediate exit)
        axum::serve(listener, app).await?;
    } else {
        tokio::select! {
            result = axum::serve(listener, app) => {
                result?;
            }
            _ = async {
                #[cfg(unix)]
                {
                    let mut sigterm = match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                        Ok(s) => s,
                        Err(_) => {
                            let _ = tokio::signal::ctrl_c().await;
                            return;
                        }
                    };
                    tokio::select! {
                        _ = tokio::signal::ctrl_c() => {}
                        _ = sigterm.recv() => {}
                    }
                }
                #[cfg(not(unix))]
                {
                    tokio::signal::ctrl_c().await
                }
            } => {
                tracing::info!("Received shutdown signal");
                let _ = shutdown_tx.send(());
                if let Some(handle) = rollup_handle {
                    let _ = handle.await;
                }
            }
        }
    }

    Ok(())
}
