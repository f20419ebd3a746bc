//! JSON file key-value store
//!
//! All keys live in one JSON object on disk. Every write replaces the file
//! through a temporary sibling and a rename, so readers see either the old
//! or the new content and never a partial write.

use super::KeyValueStore;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

type Entries = BTreeMap<String, String>;

/// Store backed by a single JSON file
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    // Serializes read-modify-write cycles within this process
    write_lock: Mutex<()>,
}

impl FileStore {
    /// Open a store at `path`, creating the parent directory if needed.
    ///
    /// The file itself is created lazily on first write.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create storage directory: {:?}", parent))?;
            }
        }
        Ok(Self {
            path,
            write_lock: Mutex::new(()),
        })
    }

    /// Location of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_all(&self) -> Result<Entries> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Entries::new()),
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read storage file {:?}", self.path))
            }
        };

        if content.trim().is_empty() {
            return Ok(Entries::new());
        }

        match serde_json::from_str(&content) {
            Ok(entries) => Ok(entries),
            Err(e) => {
                tracing::warn!("Storage file {:?} is corrupt, starting empty: {}", self.path, e);
                Ok(Entries::new())
            }
        }
    }

    async fn write_all(&self, entries: &Entries) -> Result<()> {
        let json = serde_json::to_string_pretty(entries).context("Failed to serialize storage")?;
        let tmp = self.path.with_extension("tmp");
        tokio::fs::write(&tmp, json)
            .await
            .with_context(|| format!("Failed to write storage file {:?}", tmp))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .with_context(|| format!("Failed to replace storage file {:?}", self.path))?;
        Ok(())
    }

    async fn update<F>(&self, apply: F) -> Result<()>
    where
        F: FnOnce(&mut Entries) -> bool + Send,
    {
        let _guard = self.write_lock.lock().await;
        let mut entries = self.read_all().await?;
        if apply(&mut entries) {
            self.write_all(&entries).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self.read_all().await?;
        Ok(entries.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.update(|entries| {
            entries.insert(key.to_string(), value.to_string());
            true
        })
        .await
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.update(|entries| entries.remove(key).is_some()).await
    }

    async fn set_many(&self, items: &[(&str, &str)]) -> Result<()> {
        self.update(|entries| {
            for (key, value) in items {
                entries.insert(key.to_string(), value.to_string());
            }
            true
        })
        .await
    }

    async fn remove_many(&self, keys: &[&str]) -> Result<()> {
        self.update(|entries| {
            let mut changed = false;
            for key in keys {
                changed |= entries.remove(*key).is_some();
            }
            changed
        })
        .await
    }
}
