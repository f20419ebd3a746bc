//! In-memory key-value store
//!
//! Keeps values in a process-local map. Nothing survives a restart, which is
//! what tests and single-shot command invocations want.

use super::KeyValueStore;
use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

/// Process-local store
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-filled with entries
    pub fn with_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let map = entries
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self {
            entries: RwLock::new(map),
        }
    }

    /// Number of stored keys
    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Check if nothing is stored
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        Ok(entries.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.remove(key);
        Ok(())
    }

    async fn set_many(&self, items: &[(&str, &str)]) -> Result<()> {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        for (key, value) in items {
            entries.insert(key.to_string(), value.to_string());
        }
        Ok(())
    }

    async fn remove_many(&self, keys: &[&str]) -> Result<()> {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        for key in keys {
            entries.remove(*key);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_and_get() {
        let store = MemoryStore::new();
        store.set("token", "abc").await.unwrap();
        assert_eq!(store.get("token").await.unwrap(), Some("abc".to_string()));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_get_missing() {
        let store = MemoryStore::new();
        assert!(store.get("missing").await.unwrap().is_none());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_overwrite() {
        let store = MemoryStore::new();
        store.set("token", "old").await.unwrap();
        store.set("token", "new").await.unwrap();
        assert_eq!(store.get("token").await.unwrap(), Some("new".to_string()));
    }

    #[tokio::test]
    async fn test_remove_is_idempotent() {
        let store = MemoryStore::with_entries([("token", "abc")]);
        store.remove("token").await.unwrap();
        store.remove("token").await.unwrap();
        assert!(store.get("token").await.unwrap().is_none());
    }
}
