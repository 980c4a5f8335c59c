// Request and response shapes for the cumulative aggregation endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Role;

/// Body for the single-day aggregation request. Date accepts `DD/MM/YYYY` or
/// `YYYY-MM-DD`; absent means the current UTC day.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CumulativeRequest {
    pub date: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SiteStatus {
    Created,
    Updated,
    Error,
}

/// Outcome of one site's per-day calculation. Ephemeral, never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteDayResult {
    pub site_id: i64,
    pub site_name: String,
    pub device_id: String,
    pub fuel_consumed: f64,
    pub fuel_topped: f64,
    pub fuel_consumed_percent: f64,
    pub fuel_topped_percent: f64,
    pub generator_hours: f64,
    pub zesa_hours: f64,
    pub offline_hours: f64,
    pub status: SiteStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub calculated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DaySummary {
    pub total_sites: usize,
    pub processed_sites: usize,
    pub error_sites: usize,
    pub total_fuel_consumed: f64,
    pub total_fuel_topped: f64,
    pub total_generator_hours: f64,
    pub total_zesa_hours: f64,
    pub total_offline_hours: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserInfo {
    pub username: String,
    pub role: Role,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayReport {
    pub date: String,
    pub processed_at: DateTime<Utc>,
    pub user: UserInfo,
    pub sites: Vec<SiteDayResult>,
    pub summary: DaySummary,
}

/// Inclusive date window. `is_range` is only reported on range summaries.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    pub start: String,
    pub end: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_range: Option<bool>,
}

/// Pre-aggregated totals for one site over a date window. Sites with zero
/// reading days in the window are dropped, not reported as zero rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteRangeResult {
    pub site_id: i64,
    pub site_name: String,
    pub device_id: String,
    pub total_fuel_consumed: f64,
    pub total_fuel_topped: f64,
    pub total_generator_hours: f64,
    pub total_zesa_hours: f64,
    pub total_offline_hours: f64,
    pub reading_days: i64,
    pub date_range: DateRange,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RangeSummary {
    pub date_range: DateRange,
    pub total_sites: usize,
    pub total_fuel_consumed: f64,
    pub total_fuel_topped: f64,
    pub total_generator_hours: f64,
    pub total_zesa_hours: f64,
    pub total_offline_hours: f64,
    pub average_fuel_per_site: f64,
    pub days_included: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RangeReport {
    pub sites: Vec<SiteRangeResult>,
    pub summary: RangeSummary,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
}
