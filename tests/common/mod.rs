// Shared test helpers

use chrono::NaiveDate;
use fuelmon::models::Site;
use fuelmon::readings_repo::ReadingsRepo;
use fuelmon::site_repo::SiteRepo;
use tempfile::TempDir;

/// Fresh SQLite store in a temp dir. Keep the TempDir alive for the test.
#[allow(dead_code)]
pub async fn open_store() -> (TempDir, ReadingsRepo, SiteRepo) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("fuelmon.db");
    let readings = ReadingsRepo::connect(path.to_str().unwrap(), 5)
        .await
        .unwrap();
    readings.init().await.unwrap();
    let sites = SiteRepo::new(readings.pool());
    sites.init().await.unwrap();
    (dir, readings, sites)
}

/// Epoch millis for a UTC date + time.
#[allow(dead_code)]
pub fn ts(date: &str, hour: u32, min: u32, sec: u32) -> i64 {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .unwrap()
        .and_hms_opt(hour, min, sec)
        .unwrap()
        .and_utc()
        .timestamp_millis()
}

/// Seed one active site.
#[allow(dead_code)]
pub async fn make_site(sites: &SiteRepo, name: &str, device_id: &str) -> Site {
    sites
        .insert_site(name, &format!("{} location", name), device_id)
        .await
        .unwrap()
}
