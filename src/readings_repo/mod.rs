// SQLite store for raw sensor samples and persisted daily aggregates.
// Values are kept as the raw device text; parsing happens on read.

use chrono::Utc;
use sqlx::Row;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use std::collections::HashSet;
use std::path::Path;
use std::str::FromStr;
use tracing::instrument;

use crate::cumulative::metrics::state_is_on;
use crate::models::{CumulativeReading, FuelMetrics, FuelSample, PowerMetrics, SensorReading, StateSample};

pub const SENSOR_FUEL_LEVEL: &str = "fuel_sensor_level";
pub const SENSOR_FUEL_VOLUME: &str = "fuel_sensor_volume";
pub const SENSOR_TEMPERATURE: &str = "fuel_sensor_temp";
pub const SENSOR_TEMPERATURE_ALT: &str = "fuel_sensor_temperature";
pub const SENSOR_GENERATOR_STATE: &str = "generator_state";
pub const SENSOR_ZESA_STATE: &str = "zesa_state";

/// SUM/COUNT/MIN/MAX projection of cumulative_readings over a date window.
#[derive(Debug, Clone)]
pub struct RangeTotals {
    pub reading_days: i64,
    pub fuel_consumed: f64,
    pub fuel_topped: f64,
    pub generator_hours: f64,
    pub zesa_hours: f64,
    pub offline_hours: f64,
    pub first_date: String,
    pub last_date: String,
}

pub struct ReadingsRepo {
    pool: SqlitePool,
}

impl ReadingsRepo {
    pub async fn connect(path: &str, max_pool_size: u32) -> anyhow::Result<Self> {
        if let Some(parent) = Path::new(path).parent() {
            std::fs::create_dir_all(parent)?;
        }
        let opts = SqliteConnectOptions::from_str(&format!("sqlite:{}", path))?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .busy_timeout(std::time::Duration::from_secs(5))
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal);
        let pool = SqlitePoolOptions::new()
            .max_connections(max_pool_size)
            .connect_with(opts)
            .await?;
        Ok(Self { pool })
    }

    /// Shared handle for sibling repos on the same database.
    pub fn pool(&self) -> SqlitePool {
        self.pool.clone()
    }

    pub async fn init(&self) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS sensor_readings (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                device_id TEXT NOT NULL,
                sensor_name TEXT NOT NULL,
                value TEXT,
                time INTEGER NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_sensor_readings_device_time ON sensor_readings(device_id, sensor_name, time)",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS cumulative_readings (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                site_id INTEGER NOT NULL,
                device_id TEXT NOT NULL,
                date TEXT NOT NULL,
                total_fuel_consumed REAL NOT NULL,
                total_fuel_topped_up REAL NOT NULL,
                fuel_consumed_percent REAL NOT NULL,
                fuel_topped_up_percent REAL NOT NULL,
                total_generator_runtime REAL NOT NULL,
                total_zesa_runtime REAL NOT NULL,
                total_offline_time REAL NOT NULL,
                calculated_at INTEGER NOT NULL,
                created_at INTEGER NOT NULL,
                UNIQUE(site_id, date)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_cumulative_readings_date ON cumulative_readings(date)",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS daily_closing_readings (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                site_id INTEGER NOT NULL,
                fuel_level TEXT,
                fuel_volume TEXT,
                temperature TEXT,
                captured_at INTEGER NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_daily_closing_site_latest ON daily_closing_readings(site_id, captured_at)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Samples for one device+sensor in [from_ms, to_ms], ascending by time.
    #[instrument(skip(self), fields(repo = "readings", operation = "state_samples"))]
    pub async fn state_samples(
        &self,
        device_id: &str,
        sensor_name: &str,
        from_ms: i64,
        to_ms: i64,
    ) -> anyhow::Result<Vec<StateSample>> {
        let rows = sqlx::query(
            "SELECT value, time FROM sensor_readings
             WHERE device_id = $1 AND sensor_name = $2 AND time >= $3 AND time <= $4 AND value IS NOT NULL
             ORDER BY time ASC",
        )
        .bind(device_id)
        .bind(sensor_name)
        .bind(from_ms)
        .bind(to_ms)
        .fetch_all(&self.pool)
        .await?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(StateSample {
                value: row.try_get("value")?,
                time_ms: row.try_get("time")?,
            });
        }
        Ok(out)
    }

    /// Whether any ON-valued generator sample exists in the window. A cheap
    /// existence check, not a duration.
    #[instrument(skip(self), fields(repo = "readings", operation = "has_generator_activity"))]
    pub async fn has_generator_activity(
        &self,
        device_id: &str,
        from_ms: i64,
        to_ms: i64,
    ) -> anyhow::Result<bool> {
        let values = sqlx::query_scalar::<_, String>(
            "SELECT value FROM sensor_readings
             WHERE device_id = $1 AND sensor_name = $2 AND time >= $3 AND time <= $4 AND value IS NOT NULL",
        )
        .bind(device_id)
        .bind(SENSOR_GENERATOR_STATE)
        .bind(from_ms)
        .bind(to_ms)
        .fetch_all(&self.pool)
        .await?;

        Ok(values.iter().any(|v| state_is_on(v)))
    }

    /// Level (%) and volume (L) samples for the window, parsed and partitioned
    /// by sensor, each ascending by time. Malformed numeric text is skipped.
    #[instrument(skip(self), fields(repo = "readings", operation = "fuel_samples"))]
    pub async fn fuel_samples(
        &self,
        device_id: &str,
        from_ms: i64,
        to_ms: i64,
    ) -> anyhow::Result<(Vec<FuelSample>, Vec<FuelSample>)> {
        let rows = sqlx::query(
            "SELECT sensor_name, value, time FROM sensor_readings
             WHERE device_id = $1 AND sensor_name IN ($2, $3) AND time >= $4 AND time <= $5 AND value IS NOT NULL
             ORDER BY time ASC",
        )
        .bind(device_id)
        .bind(SENSOR_FUEL_LEVEL)
        .bind(SENSOR_FUEL_VOLUME)
        .bind(from_ms)
        .bind(to_ms)
        .fetch_all(&self.pool)
        .await?;

        let mut levels = Vec::new();
        let mut volumes = Vec::new();
        for row in rows {
            let sensor_name: String = row.try_get("sensor_name")?;
            let value_text: String = row.try_get("value")?;
            let time_ms: i64 = row.try_get("time")?;
            let Ok(value) = value_text.trim().parse::<f64>() else {
                continue;
            };
            let sample = FuelSample { value, time_ms };
            match sensor_name.as_str() {
                SENSOR_FUEL_LEVEL => levels.push(sample),
                SENSOR_FUEL_VOLUME => volumes.push(sample),
                _ => {}
            }
        }
        Ok((levels, volumes))
    }

    /// Insert-or-update keyed by (site_id, date): metric fields and
    /// calculated_at are refreshed, created_at is preserved.
    #[instrument(skip(self, fuel, power), fields(repo = "readings", operation = "upsert_cumulative_reading"))]
    pub async fn upsert_cumulative_reading(
        &self,
        site_id: i64,
        device_id: &str,
        date: &str,
        fuel: &FuelMetrics,
        power: &PowerMetrics,
    ) -> anyhow::Result<CumulativeReading> {
        let now_ms = Utc::now().timestamp_millis();
        let row = sqlx::query(
            r#"
            INSERT INTO cumulative_readings (
                site_id, device_id, date, total_fuel_consumed, total_fuel_topped_up,
                fuel_consumed_percent, fuel_topped_up_percent, total_generator_runtime,
                total_zesa_runtime, total_offline_time, calculated_at, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            ON CONFLICT (site_id, date)
            DO UPDATE SET
                total_fuel_consumed = excluded.total_fuel_consumed,
                total_fuel_topped_up = excluded.total_fuel_topped_up,
                fuel_consumed_percent = excluded.fuel_consumed_percent,
                fuel_topped_up_percent = excluded.fuel_topped_up_percent,
                total_generator_runtime = excluded.total_generator_runtime,
                total_zesa_runtime = excluded.total_zesa_runtime,
                total_offline_time = excluded.total_offline_time,
                calculated_at = excluded.calculated_at
            RETURNING id, site_id, device_id, date, total_fuel_consumed, total_fuel_topped_up,
                      fuel_consumed_percent, fuel_topped_up_percent, total_generator_runtime,
                      total_zesa_runtime, total_offline_time, calculated_at, created_at
            "#,
        )
        .bind(site_id)
        .bind(device_id)
        .bind(date)
        .bind(fuel.total_fuel_consumed)
        .bind(fuel.total_fuel_topped)
        .bind(fuel.fuel_consumed_percent)
        .bind(fuel.fuel_topped_percent)
        .bind(power.total_generator_runtime)
        .bind(power.total_zesa_runtime)
        .bind(power.total_offline_time)
        .bind(now_ms)
        .bind(now_ms)
        .fetch_one(&self.pool)
        .await?;

        Self::parse_cumulative_row(&row)
    }

    /// Site ids that already have a cumulative reading on the given date.
    /// Used for CREATED/UPDATED status labeling only.
    #[instrument(skip(self, site_ids), fields(repo = "readings", operation = "sites_with_reading_on", sites_count = site_ids.len()))]
    pub async fn sites_with_reading_on(
        &self,
        date: &str,
        site_ids: &[i64],
    ) -> anyhow::Result<HashSet<i64>> {
        if site_ids.is_empty() {
            return Ok(HashSet::new());
        }

        let placeholders: Vec<String> = (0..site_ids.len()).map(|i| format!("${}", i + 2)).collect();
        let sql = format!(
            "SELECT site_id FROM cumulative_readings WHERE date = $1 AND site_id IN ({})",
            placeholders.join(", ")
        );

        let mut query = sqlx::query_scalar::<_, i64>(&sql).bind(date);
        for id in site_ids {
            query = query.bind(id);
        }
        let ids = query.fetch_all(&self.pool).await?;
        Ok(ids.into_iter().collect())
    }

    /// One SQL-level reduction per site across an inclusive date window.
    /// Returns None when the site has no reading days in the window.
    #[instrument(skip(self), fields(repo = "readings", operation = "range_totals"))]
    pub async fn range_totals(
        &self,
        site_id: i64,
        start_date: &str,
        end_date: &str,
    ) -> anyhow::Result<Option<RangeTotals>> {
        let row = sqlx::query(
            r#"
            SELECT
                COUNT(*) AS reading_days,
                COALESCE(SUM(total_fuel_consumed), 0) AS total_fuel_consumed,
                COALESCE(SUM(total_fuel_topped_up), 0) AS total_fuel_topped,
                COALESCE(SUM(total_generator_runtime), 0) AS total_generator_hours,
                COALESCE(SUM(total_zesa_runtime), 0) AS total_zesa_hours,
                COALESCE(SUM(total_offline_time), 0) AS total_offline_hours,
                MIN(date) AS first_date,
                MAX(date) AS last_date
            FROM cumulative_readings
            WHERE site_id = $1 AND date >= $2 AND date <= $3
            "#,
        )
        .bind(site_id)
        .bind(start_date)
        .bind(end_date)
        .fetch_one(&self.pool)
        .await?;

        let reading_days: i64 = row.try_get("reading_days")?;
        if reading_days == 0 {
            return Ok(None);
        }

        let first_date: Option<String> = row.try_get("first_date")?;
        let last_date: Option<String> = row.try_get("last_date")?;
        Ok(Some(RangeTotals {
            reading_days,
            fuel_consumed: row.try_get("total_fuel_consumed")?,
            fuel_topped: row.try_get("total_fuel_topped")?,
            generator_hours: row.try_get("total_generator_hours")?,
            zesa_hours: row.try_get("total_zesa_hours")?,
            offline_hours: row.try_get("total_offline_hours")?,
            first_date: first_date.unwrap_or_default(),
            last_date: last_date.unwrap_or_default(),
        }))
    }

    /// Latest value per sensor for one device, folded into a single reading.
    /// Returns None when the device has never reported a fuel level.
    #[instrument(skip(self), fields(repo = "readings", operation = "latest_device_reading"))]
    pub async fn latest_device_reading(
        &self,
        site_id: i64,
        device_id: &str,
    ) -> anyhow::Result<Option<SensorReading>> {
        let rows = sqlx::query(
            "SELECT sensor_name, value, MAX(time) AS time FROM sensor_readings
             WHERE device_id = $1 AND sensor_name IN ($2, $3, $4, $5, $6, $7) AND value IS NOT NULL
             GROUP BY sensor_name",
        )
        .bind(device_id)
        .bind(SENSOR_FUEL_LEVEL)
        .bind(SENSOR_FUEL_VOLUME)
        .bind(SENSOR_TEMPERATURE)
        .bind(SENSOR_TEMPERATURE_ALT)
        .bind(SENSOR_GENERATOR_STATE)
        .bind(SENSOR_ZESA_STATE)
        .fetch_all(&self.pool)
        .await?;

        let mut reading = SensorReading {
            site_id,
            device_id: device_id.to_string(),
            fuel_level: String::new(),
            fuel_volume: "0.00".to_string(),
            temperature: None,
            generator_state: "unknown".to_string(),
            zesa_state: "unknown".to_string(),
            captured_at: 0,
        };
        let mut has_fuel_level = false;

        for row in rows {
            let sensor_name: String = row.try_get("sensor_name")?;
            let value: String = row.try_get("value")?;
            let time_ms: i64 = row.try_get("time")?;
            match sensor_name.as_str() {
                SENSOR_FUEL_LEVEL => {
                    reading.fuel_level = value;
                    reading.captured_at = time_ms;
                    has_fuel_level = true;
                }
                SENSOR_FUEL_VOLUME => reading.fuel_volume = value,
                SENSOR_TEMPERATURE | SENSOR_TEMPERATURE_ALT => reading.temperature = Some(value),
                SENSOR_GENERATOR_STATE => reading.generator_state = value,
                SENSOR_ZESA_STATE => reading.zesa_state = value,
                _ => {}
            }
        }

        if !has_fuel_level {
            return Ok(None);
        }
        Ok(Some(reading))
    }

    /// Latest daily-closing row for a site combined with live power states
    /// from the raw sample stream. None when no closing row exists.
    #[instrument(skip(self), fields(repo = "readings", operation = "daily_closing_reading"))]
    pub async fn daily_closing_reading(
        &self,
        site_id: i64,
        device_id: &str,
    ) -> anyhow::Result<Option<SensorReading>> {
        let row = sqlx::query(
            "SELECT fuel_level, fuel_volume, temperature, captured_at
             FROM daily_closing_readings
             WHERE site_id = $1 AND fuel_level IS NOT NULL
             ORDER BY captured_at DESC
             LIMIT 1",
        )
        .bind(site_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let fuel_level: Option<String> = row.try_get("fuel_level")?;
        let fuel_volume: Option<String> = row.try_get("fuel_volume")?;
        let temperature: Option<String> = row.try_get("temperature")?;
        let captured_at: i64 = row.try_get("captured_at")?;

        let mut reading = SensorReading {
            site_id,
            device_id: device_id.to_string(),
            fuel_level: fuel_level.unwrap_or_default(),
            fuel_volume: fuel_volume.unwrap_or_else(|| "0.00".to_string()),
            temperature,
            generator_state: "unknown".to_string(),
            zesa_state: "unknown".to_string(),
            captured_at,
        };

        if let Some(state) = self.latest_state(device_id, SENSOR_GENERATOR_STATE).await? {
            reading.generator_state = state;
        }
        if let Some(state) = self.latest_state(device_id, SENSOR_ZESA_STATE).await? {
            reading.zesa_state = state;
        }

        Ok(Some(reading))
    }

    async fn latest_state(
        &self,
        device_id: &str,
        sensor_name: &str,
    ) -> anyhow::Result<Option<String>> {
        let value = sqlx::query_scalar::<_, String>(
            "SELECT value FROM sensor_readings
             WHERE device_id = $1 AND sensor_name = $2 AND value IS NOT NULL
             ORDER BY time DESC LIMIT 1",
        )
        .bind(device_id)
        .bind(sensor_name)
        .fetch_optional(&self.pool)
        .await?;
        Ok(value)
    }

    /// Append one raw sample. The sample stream is externally produced; this
    /// exists for ingestion tooling and tests.
    pub async fn insert_sample(
        &self,
        device_id: &str,
        sensor_name: &str,
        value: &str,
        time_ms: i64,
    ) -> anyhow::Result<()> {
        sqlx::query(
            "INSERT INTO sensor_readings (device_id, sensor_name, value, time) VALUES ($1, $2, $3, $4)",
        )
        .bind(device_id)
        .bind(sensor_name)
        .bind(value)
        .bind(time_ms)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Append one daily-closing row for a site.
    pub async fn insert_daily_closing(
        &self,
        site_id: i64,
        fuel_level: &str,
        fuel_volume: &str,
        temperature: Option<&str>,
        captured_at_ms: i64,
    ) -> anyhow::Result<()> {
        sqlx::query(
            "INSERT INTO daily_closing_readings (site_id, fuel_level, fuel_volume, temperature, captured_at)
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(site_id)
        .bind(fuel_level)
        .bind(fuel_volume)
        .bind(temperature)
        .bind(captured_at_ms)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    fn parse_cumulative_row(row: &SqliteRow) -> anyhow::Result<CumulativeReading> {
        Ok(CumulativeReading {
            id: row.try_get("id")?,
            site_id: row.try_get("site_id")?,
            device_id: row.try_get("device_id")?,
            date: row.try_get("date")?,
            total_fuel_consumed: row.try_get("total_fuel_consumed")?,
            total_fuel_topped: row.try_get("total_fuel_topped_up")?,
            fuel_consumed_percent: row.try_get("fuel_consumed_percent")?,
            fuel_topped_percent: row.try_get("fuel_topped_up_percent")?,
            total_generator_runtime: row.try_get("total_generator_runtime")?,
            total_zesa_runtime: row.try_get("total_zesa_runtime")?,
            total_offline_time: row.try_get("total_offline_time")?,
            calculated_at: row.try_get("calculated_at")?,
            created_at: row.try_get("created_at")?,
        })
    }
}
