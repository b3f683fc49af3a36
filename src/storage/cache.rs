use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};

use crate::domain::QueryKey;

use super::MIGRATION_001_INITIAL;

/// A stored response body and when it was fetched.
#[derive(Debug, Clone)]
pub struct CachedResponse {
    pub body: Vec<u8>,
    pub fetched_at: DateTime<Utc>,
}

/// Persists the last response body per [`QueryKey`].
///
/// Bodies are stored exactly as received so decoding stays in one place.
pub struct ResponseCache {
    pool: SqlitePool,
}

impl ResponseCache {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to a SQLite database at the given URL.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = SqlitePool::connect(database_url)
            .await
            .context("Failed to connect to cache database")?;
        Ok(Self::new(pool))
    }

    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(MIGRATION_001_INITIAL)
            .execute(&self.pool)
            .await
            .context("Failed to run migration 001")?;
        Ok(())
    }

    /// Open (creating if needed) the cache file at `path` and migrate it.
    pub async fn init(path: &str) -> Result<Self> {
        let cache = Self::connect(&format!("sqlite:{}?mode=rwc", path)).await?;
        cache.migrate().await?;
        Ok(cache)
    }

    pub async fn put(&self, key: &QueryKey, body: &[u8]) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO responses (key, kind, body, fetched_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET
                kind = excluded.kind,
                body = excluded.body,
                fetched_at = excluded.fetched_at
            "#,
        )
        .bind(key.as_str())
        .bind(key.kind())
        .bind(body)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .context("Failed to store cached response")?;
        Ok(())
    }

    pub async fn get(&self, key: &QueryKey) -> Result<Option<CachedResponse>> {
        let row = sqlx::query("SELECT body, fetched_at FROM responses WHERE key = ?")
            .bind(key.as_str())
            .fetch_optional(&self.pool)
            .await
            .context("Failed to read cached response")?;

        match row {
            Some(row) => {
                let fetched_at: String = row.get("fetched_at");
                Ok(Some(CachedResponse {
                    body: row.get("body"),
                    fetched_at: DateTime::parse_from_rfc3339(&fetched_at)
                        .context("Invalid fetched_at timestamp")?
                        .with_timezone(&Utc),
                }))
            }
            None => Ok(None),
        }
    }

    /// Drop every entry of one resource family, e.g. `categories`.
    pub async fn invalidate_kind(&self, kind: &str) -> Result<u64> {
        let result = sqlx::query("DELETE FROM responses WHERE kind = ?")
            .bind(kind)
            .execute(&self.pool)
            .await
            .context("Failed to invalidate cached responses")?;
        Ok(result.rows_affected())
    }

    pub async fn clear(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM responses")
            .execute(&self.pool)
            .await
            .context("Failed to clear cache")?;
        Ok(result.rows_affected())
    }

    pub async fn count(&self) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM responses")
            .fetch_one(&self.pool)
            .await
            .context("Failed to count cached responses")?;
        Ok(row.get("n"))
    }
}
