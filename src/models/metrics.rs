// Raw sample and per-day metric types for the aggregation engine.

use serde::{Deserialize, Serialize};

/// One binary state sample (generator / zesa), value kept as the raw device text.
#[derive(Debug, Clone)]
pub struct StateSample {
    pub value: String,
    /// Unix epoch millis.
    pub time_ms: i64,
}

/// One numeric fuel sample (level % or volume L), already parsed.
#[derive(Debug, Clone, Copy)]
pub struct FuelSample {
    pub value: f64,
    /// Unix epoch millis.
    pub time_ms: i64,
}

/// Fuel deltas accumulated over one day. Consumed and topped are mutually
/// exclusive contributions from individual deltas, never netted against each other.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FuelMetrics {
    /// Litres consumed (volume sequence, negative deltas).
    pub total_fuel_consumed: f64,
    /// Litres topped up (volume sequence, positive deltas).
    pub total_fuel_topped: f64,
    /// Percentage points consumed (level sequence).
    pub fuel_consumed_percent: f64,
    /// Percentage points topped up (level sequence).
    pub fuel_topped_percent: f64,
}

/// Power-source runtimes over one day. Generator and zesa are integrated
/// independently and may overlap, so offline time is a clamped approximation,
/// not a complement of 24h.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PowerMetrics {
    pub total_generator_runtime: f64,
    pub total_zesa_runtime: f64,
    pub total_offline_time: f64,
}

/// Persisted daily aggregate, unique per (site_id, date).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CumulativeReading {
    pub id: i64,
    pub site_id: i64,
    pub device_id: String,
    /// Calendar day, `YYYY-MM-DD`.
    pub date: String,
    pub total_fuel_consumed: f64,
    pub total_fuel_topped: f64,
    pub fuel_consumed_percent: f64,
    pub fuel_topped_percent: f64,
    pub total_generator_runtime: f64,
    pub total_zesa_runtime: f64,
    pub total_offline_time: f64,
    /// Unix epoch millis; refreshed on every recalculation.
    pub calculated_at: i64,
    /// Unix epoch millis; set once when the row is first created.
    pub created_at: i64,
}
