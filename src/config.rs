use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub aggregation: AggregationConfig,
    #[serde(default)]
    pub rollup: RollupConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub path: String,
    pub max_pool_size: u32,
}

/// Concurrency tuning for the aggregation engine. The worker counts bound
/// simultaneous storage queries per request; none are correctness-critical.
#[derive(Debug, Clone, Deserialize)]
pub struct AggregationConfig {
    #[serde(default = "default_daily_concurrency")]
    pub daily_concurrency: usize,
    #[serde(default = "default_range_concurrency")]
    pub range_concurrency: usize,
    #[serde(default = "default_realtime_concurrency")]
    pub realtime_concurrency: usize,
    #[serde(default = "default_closing_concurrency")]
    pub closing_concurrency: usize,
    /// A per-site calculation exceeding this is reported as an ERROR entry
    /// instead of stalling the batch.
    #[serde(default = "default_site_timeout_secs")]
    pub site_timeout_secs: u64,
}

fn default_daily_concurrency() -> usize {
    10
}

fn default_range_concurrency() -> usize {
    15
}

fn default_realtime_concurrency() -> usize {
    15
}

fn default_closing_concurrency() -> usize {
    12
}

fn default_site_timeout_secs() -> u64 {
    30
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            daily_concurrency: default_daily_concurrency(),
            range_concurrency: default_range_concurrency(),
            realtime_concurrency: default_realtime_concurrency(),
            closing_concurrency: default_closing_concurrency(),
            site_timeout_secs: default_site_timeout_secs(),
        }
    }
}

/// Nightly recomputation of yesterday's aggregates for all active sites.
#[derive(Debug, Clone, Deserialize)]
pub struct RollupConfig {
    #[serde(default)]
    pub enabled: bool,
    /// Optional cron expression (e.g. "0 10 0 * * *" = 00:10 daily). Uses local time.
    #[serde(default)]
    pub schedule: Option<String>,
    /// Run every N seconds when schedule is not set.
    #[serde(default = "default_rollup_interval_secs")]
    pub interval_secs: u64,
}

fn default_rollup_interval_secs() -> u64 {
    86_400
}

impl Default for RollupConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            schedule: None,
            interval_secs: default_rollup_interval_secs(),
        }
    }
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".into());
        let s = std::fs::read_to_string(&path)?;
        Self::load_from_str(&s)
    }

    /// Parse and validate config from a string (e.g. for tests).
    pub fn load_from_str(s: &str) -> anyhow::Result<Self> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.server.port > 0,
            "server.port must be between 1 and 65535, got {}",
            self.server.port
        );
        anyhow::ensure!(
            !self.database.path.is_empty(),
            "database.path must be non-empty"
        );
        anyhow::ensure!(
            self.database.max_pool_size > 0,
            "database.max_pool_size must be > 0, got {}",
            self.database.max_pool_size
        );
        anyhow::ensure!(
            self.aggregation.daily_concurrency > 0,
            "aggregation.daily_concurrency must be > 0, got {}",
            self.aggregation.daily_concurrency
        );
        anyhow::ensure!(
            self.aggregation.range_concurrency > 0,
            "aggregation.range_concurrency must be > 0, got {}",
            self.aggregation.range_concurrency
        );
        anyhow::ensure!(
            self.aggregation.realtime_concurrency > 0,
            "aggregation.realtime_concurrency must be > 0, got {}",
            self.aggregation.realtime_concurrency
        );
        anyhow::ensure!(
            self.aggregation.closing_concurrency > 0,
            "aggregation.closing_concurrency must be > 0, got {}",
            self.aggregation.closing_concurrency
        );
        anyhow::ensure!(
            self.aggregation.site_timeout_secs > 0,
            "aggregation.site_timeout_secs must be > 0, got {}",
            self.aggregation.site_timeout_secs
        );
        anyhow::ensure!(
            self.rollup.interval_secs > 0,
            "rollup.interval_secs must be > 0, got {}",
            self.rollup.interval_secs
        );
        Ok(())
    }
}
