// Dashboard models: latest readings, per-site status, system-wide counts.

use serde::{Deserialize, Serialize};

use super::Site;

/// Which data source the dashboard reads from. Realtime hits the raw sample
/// stream; closing uses the daily closing table plus live power states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    Realtime,
    Closing,
}

/// Latest known sensor values for one device. Values stay as the raw device
/// text; `temperature` is absent on devices without that sensor.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SensorReading {
    pub site_id: i64,
    pub device_id: String,
    pub fuel_level: String,
    pub fuel_volume: String,
    pub temperature: Option<String>,
    pub generator_state: String,
    pub zesa_state: String,
    /// Unix epoch millis of the fuel-level sample.
    pub captured_at: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertStatus {
    Normal,
    LowFuel,
    GeneratorOff,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteWithReadings {
    #[serde(flatten)]
    pub site: Site,
    pub latest_reading: SensorReading,
    pub generator_online: bool,
    pub zesa_online: bool,
    pub fuel_level_percentage: f64,
    pub alert_status: AlertStatus,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemStatus {
    pub sites_online: usize,
    pub total_sites: usize,
    pub low_fuel_alerts: usize,
    pub generators_running: usize,
    pub zesa_running: usize,
    pub offline_sites: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityItem {
    pub id: usize,
    pub site_id: i64,
    pub site_name: String,
    pub event: String,
    pub value: String,
    /// Unix epoch millis.
    pub timestamp: i64,
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardData {
    pub sites: Vec<SiteWithReadings>,
    pub system_status: SystemStatus,
    pub recent_activity: Vec<ActivityItem>,
    pub view_mode: ViewMode,
}
