// Handlers: cumulative aggregation (single-day + range), dashboard, health.

use axum::Json;
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use chrono::Utc;
use serde::Deserialize;
use std::time::Duration;
use tracing::info;

use super::{ApiError, AppState};
use crate::cumulative::{self, BatchOptions, DATE_FORMAT, range, summary};
use crate::dashboard::{self, DashboardOptions};
use crate::models::{
    AuthedUser, CumulativeRequest, DashboardData, DateRange, DayReport, DaySummary, HealthResponse,
    RangeReport, RangeSummary, Role, UserInfo, ViewMode,
};
use crate::version::{NAME, VERSION};

/// GET /version — returns service name and version (from Cargo.toml at build time).
pub(super) async fn version_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "name": NAME,
        "version": VERSION,
    }))
}

/// GET /health — liveness probe.
pub(super) async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        timestamp: Utc::now().to_rfc3339(),
    })
}

/// POST /api/readings/cumulative — computes and persists per-site daily
/// metrics for the requested day (default: today, UTC) across the caller's
/// visible sites. Always 200 once the site list and the existing-record
/// prefetch succeed, even if every site errored.
pub(super) async fn cumulative_day_handler(
    State(state): State<AppState>,
    user: AuthedUser,
    body: Option<Json<CumulativeRequest>>,
) -> Result<Json<DayReport>, ApiError> {
    let request = body.map(|Json(request)| request).unwrap_or_default();
    let date = match request.date.as_deref().map(str::trim).filter(|raw| !raw.is_empty()) {
        Some(raw) => cumulative::parse_flexible_date(raw)
            .map_err(|e| ApiError::BadRequest(e.to_string()))?,
        None => Utc::now().date_naive(),
    };
    let date_str = date.format(DATE_FORMAT).to_string();
    info!(date = %date_str, user = %user.username, "processing cumulative readings");

    let sites = state.sites.sites_for_user(user.user_id, user.role).await?;
    if sites.is_empty() {
        return Ok(Json(DayReport {
            date: date_str,
            processed_at: Utc::now(),
            user: user_info(&user),
            sites: vec![],
            summary: DaySummary::default(),
        }));
    }

    let aggregation = &state.config.aggregation;
    let opts = BatchOptions {
        concurrency: aggregation.daily_concurrency,
        site_timeout: Duration::from_secs(aggregation.site_timeout_secs),
    };
    let results = cumulative::process_sites_for_date(&state.readings, &sites, date, &opts).await?;
    let summary = summary::day_summary(&results, sites.len());
    info!(
        date = %date_str,
        processed = summary.processed_sites,
        errors = summary.error_sites,
        "cumulative readings completed"
    );

    Ok(Json(DayReport {
        date: date_str,
        processed_at: Utc::now(),
        user: user_info(&user),
        sites: results,
        summary,
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct RangeParams {
    start_date: Option<String>,
    end_date: Option<String>,
}

/// GET /api/readings/cumulative/range?startDate=..&endDate=.. — sums the
/// already-persisted daily aggregates per site over an inclusive window.
/// endDate defaults to startDate.
pub(super) async fn cumulative_range_handler(
    State(state): State<AppState>,
    user: AuthedUser,
    Query(params): Query<RangeParams>,
) -> Result<Json<RangeReport>, ApiError> {
    let start_raw = params
        .start_date
        .as_deref()
        .map(str::trim)
        .filter(|raw| !raw.is_empty())
        .ok_or_else(|| ApiError::BadRequest("startDate parameter is required".to_string()))?;
    let start = cumulative::parse_flexible_date(start_raw)
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let end = match params.end_date.as_deref().map(str::trim).filter(|raw| !raw.is_empty()) {
        Some(raw) => cumulative::parse_flexible_date(raw)
            .map_err(|e| ApiError::BadRequest(e.to_string()))?,
        None => start,
    };

    let start_str = start.format(DATE_FORMAT).to_string();
    let end_str = end.format(DATE_FORMAT).to_string();
    info!(start = %start_str, end = %end_str, user = %user.username, "range aggregation");

    let sites = state.sites.sites_for_user(user.user_id, user.role).await?;
    if sites.is_empty() {
        return Ok(Json(RangeReport {
            sites: vec![],
            summary: empty_range_summary(start, end),
        }));
    }

    let results = range::range_results_for_sites(
        &state.readings,
        &sites,
        &start_str,
        &end_str,
        state.config.aggregation.range_concurrency,
    )
    .await;
    let summary = summary::range_summary(&results, start, end);
    info!(
        start = %start_str,
        end = %end_str,
        sites = summary.total_sites,
        "range aggregation completed"
    );

    Ok(Json(RangeReport {
        sites: results,
        summary,
    }))
}

fn empty_range_summary(start: chrono::NaiveDate, end: chrono::NaiveDate) -> RangeSummary {
    let start_str = start.format(DATE_FORMAT).to_string();
    let end_str = end.format(DATE_FORMAT).to_string();
    RangeSummary {
        date_range: DateRange {
            is_range: Some(start_str != end_str),
            start: start_str,
            end: end_str,
        },
        total_sites: 0,
        total_fuel_consumed: 0.0,
        total_fuel_topped: 0.0,
        total_generator_hours: 0.0,
        total_zesa_hours: 0.0,
        total_offline_hours: 0.0,
        average_fuel_per_site: 0.0,
        days_included: summary::days_included(start, end),
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct DashboardParams {
    mode: Option<String>,
}

/// GET /api/dashboard?mode=realtime|closing — latest readings per visible
/// site. Realtime mode is admin-only; everyone else gets the closing view.
pub(super) async fn dashboard_handler(
    State(state): State<AppState>,
    user: AuthedUser,
    Query(params): Query<DashboardParams>,
) -> Result<Json<DashboardData>, ApiError> {
    let mode = match params.mode.as_deref() {
        Some("realtime") if user.role == Role::Admin => ViewMode::Realtime,
        _ => ViewMode::Closing,
    };

    let sites = state.sites.sites_for_user(user.user_id, user.role).await?;
    let aggregation = &state.config.aggregation;
    let opts = DashboardOptions {
        realtime_concurrency: aggregation.realtime_concurrency,
        closing_concurrency: aggregation.closing_concurrency,
    };
    let data = dashboard::build_dashboard(&state.readings, &sites, mode, &opts).await;
    info!(
        user = %user.username,
        mode = ?mode,
        sites_with_data = data.sites.len(),
        total_sites = sites.len(),
        "dashboard built"
    );
    Ok(Json(data))
}

fn user_info(user: &AuthedUser) -> UserInfo {
    UserInfo {
        username: user.username.clone(),
        role: user.role,
    }
}
