// Sites and per-user visibility. Admin sees all active sites; other roles
// only their assigned ones.

use sqlx::Row;
use sqlx::sqlite::{SqlitePool, SqliteRow};
use tracing::{info, instrument};

use crate::models::{Role, Site};

pub struct SiteRepo {
    pool: SqlitePool,
}

impl SiteRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn init(&self) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS sites (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                location TEXT NOT NULL,
                device_id TEXT NOT NULL UNIQUE,
                is_active INTEGER NOT NULL DEFAULT 1,
                created_at INTEGER NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS user_site_assignments (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                site_id INTEGER NOT NULL,
                created_at INTEGER NOT NULL,
                UNIQUE(user_id, site_id)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Active sites visible to a user, ordered by name. The core never applies
    /// role logic beyond this query; callers receive an already-scoped list.
    #[instrument(skip(self), fields(repo = "sites", operation = "sites_for_user"))]
    pub async fn sites_for_user(&self, user_id: i64, role: Role) -> anyhow::Result<Vec<Site>> {
        if role == Role::Admin {
            return self.all_active().await;
        }

        let rows = sqlx::query(
            "SELECT s.id, s.name, s.location, s.device_id, s.is_active, s.created_at
             FROM sites s
             INNER JOIN user_site_assignments usa ON usa.site_id = s.id
             WHERE usa.user_id = $1 AND s.is_active = 1
             ORDER BY s.name",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::parse_site_row).collect()
    }

    /// All active sites, ordered by name.
    #[instrument(skip(self), fields(repo = "sites", operation = "all_active"))]
    pub async fn all_active(&self) -> anyhow::Result<Vec<Site>> {
        let rows = sqlx::query(
            "SELECT id, name, location, device_id, is_active, created_at
             FROM sites
             WHERE is_active = 1
             ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::parse_site_row).collect()
    }

    /// Creates a site for every device id seen in sensor_readings that has no
    /// site yet. Returns the number of sites created.
    #[instrument(skip(self), fields(repo = "sites", operation = "auto_create_from_devices"))]
    pub async fn auto_create_from_devices(&self) -> anyhow::Result<u32> {
        let device_ids = sqlx::query_scalar::<_, String>(
            "SELECT DISTINCT device_id FROM sensor_readings WHERE value IS NOT NULL ORDER BY device_id",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut created = 0u32;
        for device_id in &device_ids {
            if self.site_by_device_id(device_id).await?.is_some() {
                continue;
            }
            self.insert_site(device_id, &format!("{} location", device_id), device_id)
                .await?;
            created += 1;
        }

        if created > 0 {
            info!(created, devices = device_ids.len(), "auto-created sites from sensor devices");
        }
        Ok(created)
    }

    pub async fn site_by_device_id(&self, device_id: &str) -> anyhow::Result<Option<Site>> {
        let row = sqlx::query(
            "SELECT id, name, location, device_id, is_active, created_at FROM sites WHERE device_id = $1",
        )
        .bind(device_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::parse_site_row).transpose()
    }

    pub async fn insert_site(
        &self,
        name: &str,
        location: &str,
        device_id: &str,
    ) -> anyhow::Result<Site> {
        let now_ms = chrono::Utc::now().timestamp_millis();
        let row = sqlx::query(
            "INSERT INTO sites (name, location, device_id, is_active, created_at)
             VALUES ($1, $2, $3, 1, $4)
             RETURNING id, name, location, device_id, is_active, created_at",
        )
        .bind(name)
        .bind(location)
        .bind(device_id)
        .bind(now_ms)
        .fetch_one(&self.pool)
        .await?;

        Self::parse_site_row(&row)
    }

    pub async fn assign_site(&self, user_id: i64, site_id: i64) -> anyhow::Result<()> {
        let now_ms = chrono::Utc::now().timestamp_millis();
        sqlx::query(
            "INSERT OR IGNORE INTO user_site_assignments (user_id, site_id, created_at) VALUES ($1, $2, $3)",
        )
        .bind(user_id)
        .bind(site_id)
        .bind(now_ms)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    fn parse_site_row(row: &SqliteRow) -> anyhow::Result<Site> {
        Ok(Site {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            location: row.try_get("location")?,
            device_id: row.try_get("device_id")?,
            is_active: row.try_get("is_active")?,
            created_at: row.try_get("created_at")?,
        })
    }
}
