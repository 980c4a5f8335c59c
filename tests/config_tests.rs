// Config tests: parsing, defaults, validation failures

use fuelmon::config::AppConfig;

const VALID_CONFIG: &str = r#"
[server]
port = 4174
host = "0.0.0.0"

[database]
path = "data/fuelmon.db"
max_pool_size = 25

[aggregation]
daily_concurrency = 10
range_concurrency = 15
realtime_concurrency = 15
closing_concurrency = 12
site_timeout_secs = 30

[rollup]
enabled = true
schedule = "0 10 0 * * *"
interval_secs = 86400
"#;

#[test]
fn valid_config_parses() {
    let config = AppConfig::load_from_str(VALID_CONFIG).unwrap();
    assert_eq!(config.server.port, 4174);
    assert_eq!(config.database.max_pool_size, 25);
    assert_eq!(config.aggregation.range_concurrency, 15);
    assert_eq!(config.rollup.schedule.as_deref(), Some("0 10 0 * * *"));
}

#[test]
fn aggregation_and_rollup_sections_are_optional() {
    let config = AppConfig::load_from_str(
        r#"
[server]
port = 4174
host = "127.0.0.1"

[database]
path = "data/fuelmon.db"
max_pool_size = 5
"#,
    )
    .unwrap();
    assert_eq!(config.aggregation.daily_concurrency, 10);
    assert_eq!(config.aggregation.range_concurrency, 15);
    assert_eq!(config.aggregation.realtime_concurrency, 15);
    assert_eq!(config.aggregation.closing_concurrency, 12);
    assert_eq!(config.aggregation.site_timeout_secs, 30);
    assert!(!config.rollup.enabled);
    assert_eq!(config.rollup.interval_secs, 86_400);
}

#[test]
fn empty_database_path_rejected() {
    let bad = VALID_CONFIG.replace("path = \"data/fuelmon.db\"", "path = \"\"");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("database.path"));
}

#[test]
fn zero_pool_size_rejected() {
    let bad = VALID_CONFIG.replace("max_pool_size = 25", "max_pool_size = 0");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("max_pool_size"));
}

#[test]
fn zero_concurrency_rejected() {
    let bad = VALID_CONFIG.replace("daily_concurrency = 10", "daily_concurrency = 0");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("daily_concurrency"));
}

#[test]
fn zero_site_timeout_rejected() {
    let bad = VALID_CONFIG.replace("site_timeout_secs = 30", "site_timeout_secs = 0");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("site_timeout_secs"));
}

#[test]
fn malformed_toml_rejected() {
    assert!(AppConfig::load_from_str("[server").is_err());
}
