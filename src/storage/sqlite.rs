use anyhow::{Context, Result};
use chrono::Utc;
use sqlx::{Row, SqlitePool};

use super::{KeyValueStore, MIGRATION_001_KV_STORE};

const UPSERT_VALUE: &str = r#"
INSERT INTO kv_store (key, value, updated_at)
VALUES (?, ?, ?)
ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
"#;

/// Key-value store backed by a single SQLite table.
#[derive(Debug, Clone)]
pub struct SqliteKv {
    pool: SqlitePool,
}

impl SqliteKv {
    /// Create a new store with the given SQLite connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to an existing SQLite database.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = SqlitePool::connect(database_url)
            .await
            .context("Failed to connect to database")?;
        Ok(Self::new(pool))
    }

    /// Create the key-value table if it does not exist yet.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(MIGRATION_001_KV_STORE)
            .execute(&self.pool)
            .await
            .context("Failed to run migration 001")?;
        Ok(())
    }

    /// Initialize a database (connect + migrate).
    pub async fn init(database_url: &str) -> Result<Self> {
        let kv = Self::connect(database_url).await?;
        kv.migrate().await?;
        Ok(kv)
    }
}

impl KeyValueStore for SqliteKv {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let row = sqlx::query("SELECT value FROM kv_store WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .with_context(|| format!("Failed to read key '{}'", key))?;

        Ok(row.map(|row| row.get("value")))
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query(UPSERT_VALUE)
            .bind(key)
            .bind(value)
            .bind(Utc::now().to_rfc3339())
            .execute(&self.pool)
            .await
            .with_context(|| format!("Failed to write key '{}'", key))?;
        Ok(())
    }

    async fn set_many(&self, entries: &[(&str, &str)]) -> Result<()> {
        let mut db_tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin transaction")?;
        let updated_at = Utc::now().to_rfc3339();

        for (key, value) in entries {
            sqlx::query(UPSERT_VALUE)
                .bind(*key)
                .bind(*value)
                .bind(updated_at.as_str())
                .execute(&mut *db_tx)
                .await
                .with_context(|| format!("Failed to write key '{}'", key))?;
        }

        db_tx.commit().await.context("Failed to commit transaction")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    async fn temp_kv() -> Result<(SqliteKv, TempDir)> {
        let temp_dir = TempDir::new()?;
        let db_path = temp_dir.path().join("kv.db");
        let url = format!("sqlite:{}?mode=rwc", db_path.display());
        let kv = SqliteKv::init(&url).await?;
        Ok((kv, temp_dir))
    }

    #[tokio::test]
    async fn test_get_missing_key() -> Result<()> {
        let (kv, _temp) = temp_kv().await?;
        assert_eq!(kv.get("wallets").await?, None);
        Ok(())
    }

    #[tokio::test]
    async fn test_set_then_get_upserts() -> Result<()> {
        let (kv, _temp) = temp_kv().await?;

        kv.set("wallets", "[]").await?;
        kv.set("wallets", r#"[{"name":"Cash"}]"#).await?;
        kv.set("transactions", "[]").await?;

        assert_eq!(
            kv.get("wallets").await?.as_deref(),
            Some(r#"[{"name":"Cash"}]"#)
        );
        assert_eq!(kv.get("transactions").await?.as_deref(), Some("[]"));
        Ok(())
    }

    #[tokio::test]
    async fn test_set_many_commits_all_keys() -> Result<()> {
        let (kv, _temp) = temp_kv().await?;
        kv.set("wallets", "old").await?;

        kv.set_many(&[("wallets", "[]"), ("transactions", r#"[{"amount":1}]"#)])
            .await?;

        assert_eq!(kv.get("wallets").await?.as_deref(), Some("[]"));
        assert_eq!(
            kv.get("transactions").await?.as_deref(),
            Some(r#"[{"amount":1}]"#)
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_migrate_is_idempotent() -> Result<()> {
        let (kv, _temp) = temp_kv().await?;
        kv.set("wallets", "[]").await?;
        kv.migrate().await?;
        assert_eq!(kv.get("wallets").await?.as_deref(), Some("[]"));
        Ok(())
    }
}
