//! Session service
//!
//! Owns the bearer token and the identity derived from it. This is the only
//! place that decides who is calling:
//! - Login (server payload first, token claims as fallback)
//! - Startup reconciliation from the persisted store
//! - Logout and forced logout on authorization rejection
//!
//! Decode and reconciliation failures never escape `resolve_from_storage`;
//! they degrade the session to anonymous and are logged.

use std::sync::Arc;

use tokio::sync::{watch, RwLock};

use crate::config::SessionConfig;
use crate::models::{Identity, ServerIdentity, Session, SessionState, SessionStatus, UserRole};
use crate::services::token::{identity_from_claims, DecodeError, TokenDecoder};
use crate::storage::{CachedIdentity, DynStore, SessionStore};

/// Error types for session operations
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The token had to be decoded and could not be
    #[error("Token could not be decoded: {0}")]
    Decode(#[from] DecodeError),

    /// Neither the server payload nor the token supplied a required field
    #[error("Login did not provide a usable '{0}'")]
    IncompleteIdentity(&'static str),

    /// The persisted store could not be written
    #[error("Session storage error: {0}")]
    Storage(#[from] anyhow::Error),
}

/// Session manager: the single writer of session state
pub struct SessionManager {
    store: SessionStore,
    decoder: TokenDecoder,
    session: RwLock<Session>,
    changes: watch::Sender<SessionStatus>,
}

impl SessionManager {
    /// Create a new session manager over the given store
    pub fn new(store: SessionStore, decoder: TokenDecoder) -> Self {
        let (changes, _) = watch::channel(SessionStatus::default());
        Self {
            store,
            decoder,
            session: RwLock::new(Session::anonymous()),
            changes,
        }
    }

    /// Create a shared session manager from configuration
    pub fn from_config(store: DynStore, config: &SessionConfig) -> Arc<Self> {
        Arc::new(Self::new(SessionStore::new(store), TokenDecoder::from(config)))
    }

    /// Log in with a freshly issued token.
    ///
    /// Server-provided fields win; anything the server left out is taken from
    /// the token's claims. The token is only decoded when such a backfill is
    /// needed.
    ///
    /// # Errors
    ///
    /// - `Decode` if a backfill was needed and the token does not decode
    /// - `IncompleteIdentity` if `id`, `email` or `role` is still missing
    /// - `Storage` if the session could not be persisted
    ///
    /// On any error the session is torn down to anonymous.
    pub async fn login(
        &self,
        token: &str,
        server: ServerIdentity,
    ) -> Result<Identity, SessionError> {
        let mut session = self.session.write().await;
        self.replace(&mut session, Session::resolving());

        let identity = match self.build_identity(token, &server) {
            Ok(identity) => identity,
            Err(e) => {
                tracing::warn!("Login rejected: {}", e);
                self.teardown(&mut session).await;
                return Err(e);
            }
        };

        if let Err(e) = self.store.save(token, &identity).await {
            tracing::warn!("Failed to persist session: {:#}", e);
            self.teardown(&mut session).await;
            return Err(SessionError::Storage(e));
        }

        tracing::info!("Logged in as {} ({})", identity.email, identity.role);
        self.replace(&mut session, Session::authenticated(token, identity.clone()));
        Ok(identity)
    }

    /// Log out: clear token, identity and persisted copies.
    ///
    /// Calling this while already anonymous changes nothing.
    pub async fn logout(&self) {
        let mut session = self.session.write().await;
        let was_authenticated = session.is_authenticated();
        self.teardown(&mut session).await;
        if was_authenticated {
            tracing::info!("Logged out");
        }
    }

    /// Reconcile the persisted session at startup.
    ///
    /// 1. No persisted token: anonymous.
    /// 2. A cached identity with a non-empty id is trusted as-is.
    /// 3. Otherwise the token's claims are decoded into an identity, which is
    ///    then persisted so step 2 applies next time.
    ///
    /// Any failure ends in the anonymous state with both keys cleared.
    pub async fn resolve_from_storage(&self) -> SessionState {
        let mut session = self.session.write().await;

        let persisted = match self.store.load().await {
            Ok(persisted) => persisted,
            Err(e) => {
                tracing::warn!("Failed to read persisted session: {:#}", e);
                self.replace(&mut session, Session::anonymous());
                return SessionState::Anonymous;
            }
        };

        let Some(token) = persisted.token else {
            if persisted.identity != CachedIdentity::Missing {
                tracing::debug!("Discarding cached identity without a token");
                self.teardown(&mut session).await;
            } else {
                self.replace(&mut session, Session::anonymous());
            }
            return SessionState::Anonymous;
        };

        self.replace(&mut session, Session::resolving());

        if let Some(identity) = persisted.identity.usable() {
            tracing::debug!("Trusting cached identity for user {}", identity.id);
            self.replace(&mut session, Session::authenticated(token, identity.clone()));
            return SessionState::Authenticated;
        }

        let derived = self
            .decoder
            .decode(&token)
            .map_err(SessionError::from)
            .and_then(|claims| {
                identity_from_claims(&claims).map_err(|e| SessionError::IncompleteIdentity(e.0))
            });

        match derived {
            Ok(identity) => {
                if let Err(e) = self.store.save_identity(&identity).await {
                    tracing::warn!("Failed to cache decoded identity: {:#}", e);
                }
                tracing::debug!("Restored session for user {} from token claims", identity.id);
                self.replace(&mut session, Session::authenticated(token, identity));
                SessionState::Authenticated
            }
            Err(e) => {
                tracing::warn!("Persisted token is invalid, clearing session: {}", e);
                self.replace(&mut session, Session::invalid());
                self.teardown(&mut session).await;
                SessionState::Anonymous
            }
        }
    }

    /// Forced logout after the backend rejected `sent_token` with a 401.
    ///
    /// A rejection of a token that is no longer current (the user logged in
    /// again while the request was in flight) is ignored. Returns whether the
    /// session was torn down.
    pub async fn handle_authorization_rejected(&self, sent_token: &str) -> bool {
        let mut session = self.session.write().await;
        if session.token() != Some(sent_token) {
            tracing::debug!("Ignoring authorization rejection for a stale token");
            return false;
        }
        tracing::warn!("Backend rejected the session token, logging out");
        self.teardown(&mut session).await;
        true
    }

    /// Current identity, if authenticated
    pub async fn current_identity(&self) -> Option<Identity> {
        self.session.read().await.identity().cloned()
    }

    /// Current role, if authenticated
    pub async fn current_role(&self) -> Option<UserRole> {
        self.session.read().await.identity().map(|i| i.role)
    }

    /// Check if a token and its identity are both present and valid
    pub async fn is_authenticated(&self) -> bool {
        self.session.read().await.is_authenticated()
    }

    /// Current lifecycle state
    pub async fn state(&self) -> SessionState {
        self.session.read().await.state()
    }

    /// Token to send as `Authorization: Bearer`, if authenticated
    pub async fn bearer_token(&self) -> Option<String> {
        let session = self.session.read().await;
        if session.is_authenticated() {
            session.token().map(str::to_string)
        } else {
            None
        }
    }

    /// Watch session changes (login, logout, forced logout)
    pub fn subscribe(&self) -> watch::Receiver<SessionStatus> {
        self.changes.subscribe()
    }

    fn build_identity(
        &self,
        token: &str,
        server: &ServerIdentity,
    ) -> Result<Identity, SessionError> {
        let id = server.user_id.clone().filter(|id| !id.is_empty());
        let email = non_blank(server.email.as_deref());
        let name = non_blank(server.name.as_deref());
        let role = server.role.as_deref().and_then(|raw| match raw.parse::<UserRole>() {
            Ok(role) => Some(role),
            Err(e) => {
                tracing::warn!("Ignoring role from login response: {}", e);
                None
            }
        });

        if let (Some(id), Some(email), Some(role)) = (&id, &email, role) {
            return Ok(Identity {
                id: id.clone(),
                email: email.clone(),
                name,
                role,
            });
        }

        let claims = self.decoder.decode(token)?;

        let id = id
            .or_else(|| claims.uid.clone().filter(|id| !id.is_empty()))
            .ok_or(SessionError::IncompleteIdentity("id"))?;
        let email = email
            .or_else(|| non_blank(claims.sub.as_deref()))
            .ok_or(SessionError::IncompleteIdentity("email"))?;
        let role = role
            .or_else(|| claims.role.as_deref().and_then(|r| r.parse().ok()))
            .ok_or(SessionError::IncompleteIdentity("role"))?;
        let name = name.or_else(|| non_blank(claims.name.as_deref()));

        Ok(Identity {
            id,
            email,
            name,
            role,
        })
    }

    async fn teardown(&self, session: &mut Session) {
        if let Err(e) = self.store.clear().await {
            tracing::warn!("Failed to clear persisted session: {:#}", e);
        }
        self.replace(session, Session::anonymous());
    }

    fn replace(&self, session: &mut Session, next: Session) {
        let status = next.status();
        *session = next;
        self.changes.send_if_modified(|current| {
            if *current == status {
                false
            } else {
                *current = status;
                true
            }
        });
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserId;
    use crate::services::token::make_token;
    use crate::storage::{session::TOKEN_KEY, session::USER_KEY, KeyValueStore, MemoryStore};
    use chrono::{Duration, Utc};
    use serde_json::json;

    fn setup() -> (Arc<MemoryStore>, SessionManager) {
        let memory = Arc::new(MemoryStore::new());
        let manager = SessionManager::new(SessionStore::new(memory.clone()), TokenDecoder::default());
        (memory, manager)
    }

    fn setup_with(entries: &[(&str, &str)]) -> (Arc<MemoryStore>, SessionManager) {
        let memory = Arc::new(MemoryStore::with_entries(entries.iter().copied()));
        let manager = SessionManager::new(SessionStore::new(memory.clone()), TokenDecoder::default());
        (memory, manager)
    }

    fn driver_token() -> String {
        make_token(&json!({"sub": "a@b.com", "uid": 7, "role": "DRIVER"}))
    }

    #[tokio::test]
    async fn test_initial_state_is_anonymous() {
        let (_memory, manager) = setup();
        assert_eq!(manager.state().await, SessionState::Anonymous);
        assert!(!manager.is_authenticated().await);
        assert!(manager.current_identity().await.is_none());
        assert!(manager.bearer_token().await.is_none());
    }

    #[tokio::test]
    async fn test_login_with_full_server_identity_skips_decode() {
        let (memory, manager) = setup();

        let identity = manager
            .login("validtoken", ServerIdentity::new(7, "a@b.com", "Driver"))
            .await
            .expect("Login failed");

        assert_eq!(identity, Identity::new(7, "a@b.com", UserRole::Driver));
        assert_eq!(manager.current_identity().await, Some(identity));
        assert!(manager.is_authenticated().await);
        assert_eq!(manager.bearer_token().await.as_deref(), Some("validtoken"));
        assert_eq!(memory.get(TOKEN_KEY).await.unwrap().as_deref(), Some("validtoken"));
        assert!(memory.get(USER_KEY).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_login_backfills_email_from_token() {
        let (_memory, manager) = setup();
        let server = ServerIdentity {
            user_id: Some(UserId::Numeric(7)),
            email: None,
            name: Some("Ada".into()),
            role: Some("Driver".into()),
        };

        let identity = manager.login(&driver_token(), server).await.unwrap();

        assert_eq!(identity.email, "a@b.com");
        assert_eq!(identity.name.as_deref(), Some("Ada"));
        assert_eq!(identity.id, UserId::Numeric(7));
    }

    #[tokio::test]
    async fn test_login_server_fields_win_over_claims() {
        let (_memory, manager) = setup();
        let server = ServerIdentity {
            user_id: Some(UserId::Numeric(99)),
            email: None,
            name: None,
            role: Some("PASSENGER".into()),
        };

        let identity = manager.login(&driver_token(), server).await.unwrap();

        assert_eq!(identity.id, UserId::Numeric(99));
        assert_eq!(identity.role, UserRole::Passenger);
        assert_eq!(identity.email, "a@b.com");
    }

    #[tokio::test]
    async fn test_login_invalid_server_role_falls_back_to_claims() {
        let (_memory, manager) = setup();
        let server = ServerIdentity::new(7, "a@b.com", "ADMIN");

        let identity = manager.login(&driver_token(), server).await.unwrap();
        assert_eq!(identity.role, UserRole::Driver);
    }

    #[tokio::test]
    async fn test_login_fails_when_backfill_cannot_decode() {
        let (memory, manager) = setup();
        let server = ServerIdentity {
            email: None,
            ..ServerIdentity::new(7, "ignored", "Driver")
        };

        let result = manager.login("not-a-jwt", server).await;

        assert!(matches!(result, Err(SessionError::Decode(_))));
        assert_eq!(manager.state().await, SessionState::Anonymous);
        assert!(memory.is_empty());
    }

    #[tokio::test]
    async fn test_login_fails_when_field_missing_everywhere() {
        let (_memory, manager) = setup();
        let token = make_token(&json!({"sub": "a@b.com", "uid": 7}));

        let result = manager.login(&token, ServerIdentity::default()).await;

        assert!(matches!(result, Err(SessionError::IncompleteIdentity("role"))));
        assert!(!manager.is_authenticated().await);
    }

    #[tokio::test]
    async fn test_login_replaces_previous_session() {
        let (_memory, manager) = setup();
        manager
            .login("first", ServerIdentity::new(1, "one@x.com", "Passenger"))
            .await
            .unwrap();
        manager
            .login("second", ServerIdentity::new(2, "two@x.com", "Driver"))
            .await
            .unwrap();

        assert_eq!(manager.bearer_token().await.as_deref(), Some("second"));
        assert_eq!(manager.current_role().await, Some(UserRole::Driver));
    }

    #[tokio::test]
    async fn test_logout_clears_everything() {
        let (memory, manager) = setup();
        memory.set("theme", "dark").await.unwrap();
        manager
            .login("validtoken", ServerIdentity::new(7, "a@b.com", "Driver"))
            .await
            .unwrap();

        manager.logout().await;

        assert!(!manager.is_authenticated().await);
        assert!(manager.current_identity().await.is_none());
        assert!(manager.bearer_token().await.is_none());
        assert!(memory.get(TOKEN_KEY).await.unwrap().is_none());
        assert!(memory.get(USER_KEY).await.unwrap().is_none());
        assert_eq!(memory.get("theme").await.unwrap().as_deref(), Some("dark"));
    }

    #[tokio::test]
    async fn test_logout_twice_is_same_as_once() {
        let (memory, manager) = setup();
        manager
            .login("validtoken", ServerIdentity::new(7, "a@b.com", "Driver"))
            .await
            .unwrap();

        manager.logout().await;
        let state_once = manager.state().await;
        let len_once = memory.len();

        manager.logout().await;

        assert_eq!(manager.state().await, state_once);
        assert_eq!(memory.len(), len_once);
    }

    #[tokio::test]
    async fn test_resolve_without_token() {
        let (_memory, manager) = setup();
        assert_eq!(manager.resolve_from_storage().await, SessionState::Anonymous);
        assert!(!manager.is_authenticated().await);
    }

    #[tokio::test]
    async fn test_resolve_prefers_cached_identity() {
        let cached = r#"{"id":42,"email":"cached@x.com","name":"Cached","role":"Passenger"}"#;
        let token = driver_token();
        let (_memory, manager) = setup_with(&[(TOKEN_KEY, token.as_str()), (USER_KEY, cached)]);

        assert_eq!(manager.resolve_from_storage().await, SessionState::Authenticated);

        let identity = manager.current_identity().await.unwrap();
        assert_eq!(identity.id, UserId::Numeric(42));
        assert_eq!(identity.email, "cached@x.com");
        assert_eq!(identity.name.as_deref(), Some("Cached"));
        assert_eq!(identity.role, UserRole::Passenger);
    }

    #[tokio::test]
    async fn test_resolve_cached_identity_skips_decode_of_opaque_token() {
        let cached = r#"{"id":7,"email":"a@b.com","role":"Driver"}"#;
        let (_memory, manager) = setup_with(&[(TOKEN_KEY, "validtoken"), (USER_KEY, cached)]);

        assert_eq!(manager.resolve_from_storage().await, SessionState::Authenticated);
    }

    #[tokio::test]
    async fn test_resolve_decodes_when_cache_missing_and_persists() {
        let token = driver_token();
        let (memory, manager) = setup_with(&[(TOKEN_KEY, token.as_str())]);

        assert_eq!(manager.resolve_from_storage().await, SessionState::Authenticated);
        assert_eq!(
            manager.current_identity().await,
            Some(Identity::new(7, "a@b.com", UserRole::Driver))
        );

        let stored = memory.get(USER_KEY).await.unwrap().expect("identity not cached");
        let stored: Identity = serde_json::from_str(&stored).unwrap();
        assert_eq!(stored.id, UserId::Numeric(7));
    }

    #[tokio::test]
    async fn test_resolve_decodes_when_cache_corrupt() {
        let token = driver_token();
        let (_memory, manager) = setup_with(&[(TOKEN_KEY, token.as_str()), (USER_KEY, "{oops")]);

        assert_eq!(manager.resolve_from_storage().await, SessionState::Authenticated);
        assert_eq!(manager.current_role().await, Some(UserRole::Driver));
    }

    #[tokio::test]
    async fn test_resolve_decodes_when_cached_id_empty() {
        let token = driver_token();
        let cached = r#"{"id":"","email":"stale@x.com","role":"Passenger"}"#;
        let (_memory, manager) = setup_with(&[(TOKEN_KEY, token.as_str()), (USER_KEY, cached)]);

        manager.resolve_from_storage().await;

        assert_eq!(manager.current_identity().await.unwrap().email, "a@b.com");
    }

    #[tokio::test]
    async fn test_resolve_malformed_token_tears_down() {
        let (memory, manager) = setup_with(&[(TOKEN_KEY, "garbage"), (USER_KEY, "{oops")]);

        assert_eq!(manager.resolve_from_storage().await, SessionState::Anonymous);
        assert!(!manager.is_authenticated().await);
        assert!(memory.is_empty());
    }

    #[tokio::test]
    async fn test_resolve_expired_token_tears_down() {
        let token = make_token(&json!({
            "sub": "a@b.com",
            "uid": 7,
            "role": "Driver",
            "exp": (Utc::now() - Duration::hours(2)).timestamp()
        }));
        let (memory, manager) = setup_with(&[(TOKEN_KEY, token.as_str())]);

        assert_eq!(manager.resolve_from_storage().await, SessionState::Anonymous);
        assert!(memory.is_empty());
    }

    #[tokio::test]
    async fn test_resolve_discards_identity_without_token() {
        let cached = r#"{"id":7,"email":"a@b.com","role":"Driver"}"#;
        let (memory, manager) = setup_with(&[(USER_KEY, cached)]);

        assert_eq!(manager.resolve_from_storage().await, SessionState::Anonymous);
        assert!(memory.is_empty());
    }

    #[tokio::test]
    async fn test_authorization_rejection_logs_out() {
        let (memory, manager) = setup();
        manager
            .login("validtoken", ServerIdentity::new(7, "a@b.com", "Driver"))
            .await
            .unwrap();

        assert!(manager.handle_authorization_rejected("validtoken").await);

        assert!(!manager.is_authenticated().await);
        assert!(memory.is_empty());
    }

    #[tokio::test]
    async fn test_authorization_rejection_for_stale_token_is_ignored() {
        let (_memory, manager) = setup();
        manager
            .login("new-token", ServerIdentity::new(7, "a@b.com", "Driver"))
            .await
            .unwrap();

        assert!(!manager.handle_authorization_rejected("old-token").await);
        assert!(manager.is_authenticated().await);
    }

    #[tokio::test]
    async fn test_subscribers_see_login_and_logout() {
        let (_memory, manager) = setup();
        let mut rx = manager.subscribe();

        manager
            .login("validtoken", ServerIdentity::new(7, "a@b.com", "Driver"))
            .await
            .unwrap();
        assert!(rx.has_changed().unwrap());
        let status = rx.borrow_and_update().clone();
        assert_eq!(status.state, SessionState::Authenticated);
        assert_eq!(status.identity.unwrap().email, "a@b.com");

        manager.logout().await;
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().state, SessionState::Anonymous);

        manager.logout().await;
        assert!(!rx.has_changed().unwrap());
    }
}
