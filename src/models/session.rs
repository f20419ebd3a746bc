//! Session model

use serde::{Deserialize, Serialize};
use std::fmt;

use super::Identity;

/// Lifecycle state of the client session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    /// No token, no identity
    #[default]
    Anonymous,
    /// A token is known and its identity is being reconciled
    Resolving,
    /// Token and identity are both present and valid
    Authenticated,
    /// The token could not be decoded; teardown follows immediately
    Invalid,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Anonymous => write!(f, "anonymous"),
            SessionState::Resolving => write!(f, "resolving"),
            SessionState::Authenticated => write!(f, "authenticated"),
            SessionState::Invalid => write!(f, "invalid"),
        }
    }
}

/// Pairing of a bearer token with its identity.
///
/// Constructed only through [`Session::anonymous`] and
/// [`Session::authenticated`], so a token never exists without its identity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    token: Option<String>,
    identity: Option<Identity>,
    state: SessionState,
}

impl Session {
    /// Session with nothing in it
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Session for a reconciled token
    pub fn authenticated(token: impl Into<String>, identity: Identity) -> Self {
        Self {
            token: Some(token.into()),
            identity: Some(identity),
            state: SessionState::Authenticated,
        }
    }

    /// Transitional marker while a token is being reconciled
    pub(crate) fn resolving() -> Self {
        Self {
            token: None,
            identity: None,
            state: SessionState::Resolving,
        }
    }

    /// Marker for a token that failed reconciliation
    pub(crate) fn invalid() -> Self {
        Self {
            token: None,
            identity: None,
            state: SessionState::Invalid,
        }
    }

    /// Current state
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Bearer token, if authenticated
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Identity, if authenticated
    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    /// Check if the session is authenticated
    pub fn is_authenticated(&self) -> bool {
        self.state == SessionState::Authenticated && self.token.is_some() && self.identity.is_some()
    }

    /// Snapshot for subscribers
    pub fn status(&self) -> SessionStatus {
        SessionStatus {
            state: self.state,
            identity: self.identity.clone(),
        }
    }
}

/// What subscribers see when the session changes
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionStatus {
    /// Current state
    pub state: SessionState,
    /// Current identity, if authenticated
    pub identity: Option<Identity>,
}
