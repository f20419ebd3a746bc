//! Client-side persistent storage
//!
//! This module provides the key-value store that keeps the session alive
//! across restarts. It supports:
//! - In-memory store - ephemeral, for tests and one-shot runs
//! - JSON file store - default, one file per profile
//! - SQLite store - for clients that already keep local data in SQLite
//!
//! The backend is selected based on configuration. Only [`SessionStore`]
//! knows which keys hold the session; nothing else reads or writes them.
//!
//! # Usage
//!
//! ```rust,ignore
//! use share2go::config::StorageConfig;
//! use share2go::storage::{create_store, SessionStore};
//!
//! let store = create_store(&StorageConfig::default()).await?;
//! let sessions = SessionStore::new(store);
//! let persisted = sessions.load().await?;
//! ```

pub mod file;
pub mod memory;
pub mod session;
pub mod sqlite;

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

use crate::config::{StorageConfig, StorageDriver};

pub use file::FileStore;
pub use memory::MemoryStore;
pub use session::{CachedIdentity, PersistedSession, SessionStore};
pub use sqlite::SqliteStore;

/// Persistent string key-value store scoped to one client profile.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Get a value
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Set a value, replacing any previous one
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove a value; removing a missing key is not an error
    async fn remove(&self, key: &str) -> Result<()>;

    /// Set several values in one write
    async fn set_many(&self, entries: &[(&str, &str)]) -> Result<()> {
        for (key, value) in entries {
            self.set(key, value).await?;
        }
        Ok(())
    }

    /// Remove several values in one write
    async fn remove_many(&self, keys: &[&str]) -> Result<()> {
        for key in keys {
            self.remove(key).await?;
        }
        Ok(())
    }
}

/// Shared store handle
pub type DynStore = Arc<dyn KeyValueStore>;

/// Create a store from configuration
pub async fn create_store(config: &StorageConfig) -> Result<DynStore> {
    match config.driver {
        StorageDriver::Memory => Ok(Arc::new(MemoryStore::new())),
        StorageDriver::File => Ok(Arc::new(FileStore::open(&config.path)?)),
        StorageDriver::Sqlite => Ok(Arc::new(SqliteStore::connect(&config.sqlite_url).await?)),
    }
}
