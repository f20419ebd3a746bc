//! Persisted session pair
//!
//! The session lives under two independent keys: `token` holds the raw bearer
//! token and `user` holds the JSON-encoded identity. They are written and
//! cleared together.

use anyhow::{Context, Result};

use super::DynStore;
use crate::models::Identity;

/// Key holding the bearer token
pub const TOKEN_KEY: &str = "token";
/// Key holding the JSON identity
pub const USER_KEY: &str = "user";

/// State of the cached identity entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CachedIdentity {
    /// Nothing stored
    Missing,
    /// Something stored that does not parse as an identity
    Corrupt,
    /// A parsed identity
    Present(Identity),
}

impl CachedIdentity {
    /// The identity, if it parsed and carries a non-empty id
    pub fn usable(&self) -> Option<&Identity> {
        match self {
            CachedIdentity::Present(identity) if !identity.id.is_empty() => Some(identity),
            _ => None,
        }
    }
}

/// Whatever the store held at load time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedSession {
    /// Raw token, `None` when missing or blank
    pub token: Option<String>,
    /// Cached identity entry
    pub identity: CachedIdentity,
}

/// Sole reader and writer of the persisted session keys
#[derive(Clone)]
pub struct SessionStore {
    store: DynStore,
}

impl SessionStore {
    /// Wrap a key-value store
    pub fn new(store: DynStore) -> Self {
        Self { store }
    }

    /// Read both keys
    pub async fn load(&self) -> Result<PersistedSession> {
        let token = self
            .store
            .get(TOKEN_KEY)
            .await
            .context("Failed to read persisted token")?
            .filter(|t| !t.trim().is_empty());

        let identity = match self
            .store
            .get(USER_KEY)
            .await
            .context("Failed to read persisted identity")?
        {
            None => CachedIdentity::Missing,
            Some(raw) => match serde_json::from_str::<Identity>(&raw) {
                Ok(identity) => CachedIdentity::Present(identity),
                Err(e) => {
                    tracing::debug!("Persisted identity does not parse: {}", e);
                    CachedIdentity::Corrupt
                }
            },
        };

        Ok(PersistedSession { token, identity })
    }

    /// Persist token and identity in one write
    pub async fn save(&self, token: &str, identity: &Identity) -> Result<()> {
        let json = serde_json::to_string(identity).context("Failed to serialize identity")?;
        self.store
            .set_many(&[(TOKEN_KEY, token), (USER_KEY, json.as_str())])
            .await
            .context("Failed to persist session")
    }

    /// Persist only the identity, next to an already stored token
    pub async fn save_identity(&self, identity: &Identity) -> Result<()> {
        let json = serde_json::to_string(identity).context("Failed to serialize identity")?;
        self.store
            .set(USER_KEY, &json)
            .await
            .context("Failed to persist identity")
    }

    /// Remove both keys
    pub async fn clear(&self) -> Result<()> {
        self.store
            .remove_many(&[TOKEN_KEY, USER_KEY])
            .await
            .context("Failed to clear persisted session")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserRole;
    use crate::storage::{KeyValueStore, MemoryStore};
    use std::sync::Arc;

    fn setup() -> (Arc<MemoryStore>, SessionStore) {
        let memory = Arc::new(MemoryStore::new());
        let sessions = SessionStore::new(memory.clone());
        (memory, sessions)
    }

    #[tokio::test]
    async fn test_load_empty() {
        let (_memory, sessions) = setup();
        let persisted = sessions.load().await.unwrap();
        assert!(persisted.token.is_none());
        assert_eq!(persisted.identity, CachedIdentity::Missing);
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let (memory, sessions) = setup();
        let identity = Identity::new(7, "a@b.com", UserRole::Driver).with_name("Ada");
        sessions.save("tok", &identity).await.unwrap();

        let persisted = sessions.load().await.unwrap();
        assert_eq!(persisted.token.as_deref(), Some("tok"));
        assert_eq!(persisted.identity, CachedIdentity::Present(identity));
        assert_eq!(memory.len(), 2);
    }

    #[tokio::test]
    async fn test_blank_token_is_missing() {
        let memory = Arc::new(MemoryStore::with_entries([(TOKEN_KEY, "  ")]));
        let sessions = SessionStore::new(memory);
        assert!(sessions.load().await.unwrap().token.is_none());
    }

    #[tokio::test]
    async fn test_corrupt_identity() {
        let memory = Arc::new(MemoryStore::with_entries([
            (TOKEN_KEY, "tok"),
            (USER_KEY, "{\"id\": 7,"),
        ]));
        let sessions = SessionStore::new(memory);
        let persisted = sessions.load().await.unwrap();
        assert_eq!(persisted.identity, CachedIdentity::Corrupt);
        assert!(persisted.identity.usable().is_none());
    }

    #[tokio::test]
    async fn test_identity_with_empty_id_is_not_usable() {
        let memory = Arc::new(MemoryStore::with_entries([(
            USER_KEY,
            r#"{"id":"","email":"a@b.com","role":"Driver"}"#,
        )]));
        let sessions = SessionStore::new(memory);
        let persisted = sessions.load().await.unwrap();
        assert!(matches!(persisted.identity, CachedIdentity::Present(_)));
        assert!(persisted.identity.usable().is_none());
    }

    #[tokio::test]
    async fn test_clear_removes_both_keys() {
        let (memory, sessions) = setup();
        memory.set("unrelated", "keep").await.unwrap();
        sessions
            .save("tok", &Identity::new(1, "x@y.z", UserRole::Passenger))
            .await
            .unwrap();

        sessions.clear().await.unwrap();

        assert!(memory.get(TOKEN_KEY).await.unwrap().is_none());
        assert!(memory.get(USER_KEY).await.unwrap().is_none());
        assert_eq!(memory.get("unrelated").await.unwrap(), Some("keep".to_string()));
    }
}
