//! SQLite key-value store
//!
//! Stores entries in a single `kv_store` table. The table is created by an
//! embedded migration the first time the store connects.

use super::KeyValueStore;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use sqlx::Row;

/// Schema for the store, applied on connect
const MIGRATION: &str = r#"
CREATE TABLE IF NOT EXISTS kv_store (
    key TEXT PRIMARY KEY NOT NULL,
    value TEXT NOT NULL,
    updated_at TIMESTAMP NOT NULL
)
"#;

/// Store backed by a SQLite table
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Connect to (and create if missing) the database at `url`.
    ///
    /// Accepts a bare file path, a `sqlite:` URL or `:memory:`.
    pub async fn connect(url: &str) -> Result<Self> {
        if !url.starts_with(":memory:") && !url.starts_with("sqlite::memory:") {
            let path = url.trim_start_matches("sqlite:");
            if let Some(parent) = std::path::Path::new(path).parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)
                        .with_context(|| format!("Failed to create database directory: {:?}", parent))?;
                }
            }
        }

        let connection_url = if url.starts_with("sqlite:") {
            if url.contains('?') {
                url.to_string()
            } else {
                format!("{}?mode=rwc", url)
            }
        } else if url == ":memory:" {
            "sqlite::memory:".to_string()
        } else {
            format!("sqlite:{}?mode=rwc", url)
        };

        // One connection keeps an in-memory database alive and serializes writes.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect(&connection_url)
            .await
            .with_context(|| format!("Failed to connect to SQLite store: {}", url))?;

        sqlx::query(MIGRATION)
            .execute(&pool)
            .await
            .context("Failed to create kv_store table")?;

        Ok(Self { pool })
    }

    /// In-memory database, for tests
    pub async fn in_memory() -> Result<Self> {
        Self::connect(":memory:").await
    }

    /// Close the connection pool
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl KeyValueStore for SqliteStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let row = sqlx::query("SELECT value FROM kv_store WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to read storage entry")?;

        Ok(row.map(|row| row.get("value")))
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.set_many(&[(key, value)]).await
    }

    async fn remove(&self, key: &str) -> Result<()> {
        sqlx::query("DELETE FROM kv_store WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await
            .context("Failed to delete storage entry")?;
        Ok(())
    }

    async fn set_many(&self, entries: &[(&str, &str)]) -> Result<()> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await.context("Failed to begin transaction")?;
        for (key, value) in entries {
            sqlx::query(
                r#"
                INSERT INTO kv_store (key, value, updated_at)
                VALUES (?, ?, ?)
                ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
                "#,
            )
            .bind(*key)
            .bind(*value)
            .bind(now)
            .execute(&mut *tx)
            .await
            .context("Failed to write storage entry")?;
        }
        tx.commit().await.context("Failed to commit storage write")?;
        Ok(())
    }

    async fn remove_many(&self, keys: &[&str]) -> Result<()> {
        let mut tx = self.pool.begin().await.context("Failed to begin transaction")?;
        for key in keys {
            sqlx::query("DELETE FROM kv_store WHERE key = ?")
                .bind(*key)
                .execute(&mut *tx)
                .await
                .context("Failed to delete storage entry")?;
        }
        tx.commit().await.context("Failed to commit storage delete")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_and_get() {
        let store = SqliteStore::in_memory().await.expect("Failed to open store");
        store.set("token", "abc").await.unwrap();
        assert_eq!(store.get("token").await.unwrap(), Some("abc".to_string()));
    }

    #[tokio::test]
    async fn test_upsert_replaces_value() {
        let store = SqliteStore::in_memory().await.unwrap();
        store.set("token", "old").await.unwrap();
        store.set("token", "new").await.unwrap();
        assert_eq!(store.get("token").await.unwrap(), Some("new".to_string()));
    }

    #[tokio::test]
    async fn test_remove_many() {
        let store = SqliteStore::in_memory().await.unwrap();
        store.set_many(&[("token", "abc"), ("user", "{}")]).await.unwrap();
        store.remove_many(&["token", "user"]).await.unwrap();
        assert!(store.get("token").await.unwrap().is_none());
        assert!(store.get("user").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_file_database_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("session.db");
        let url = path.display().to_string();

        let store = SqliteStore::connect(&url).await.unwrap();
        store.set("token", "abc").await.unwrap();
        store.close().await;

        let reopened = SqliteStore::connect(&url).await.unwrap();
        assert_eq!(reopened.get("token").await.unwrap(), Some("abc".to_string()));
    }
}
