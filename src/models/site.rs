// Site: one monitored location with a fuel/power sensor device

use serde::{Deserialize, Serialize};

/// A monitored site. `device_id` keys all sensor readings for the site.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Site {
    pub id: i64,
    pub name: String,
    pub location: String,
    pub device_id: String,
    pub is_active: bool,
    /// Unix epoch millis.
    pub created_at: i64,
}
