//! Bearer token claims
//!
//! The backend signs an HS256 JWT whose payload carries the user's email as
//! `sub`, the numeric id as `uid` and the role name as `role`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::UserId;

/// Claims carried in the payload segment of a bearer token.
///
/// Every claim is optional at decode time; callers decide which ones they
/// need.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject (the login email)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    /// User id
    #[serde(
        default,
        alias = "userId",
        alias = "user_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub uid: Option<UserId>,
    /// Role name, any casing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Issued-at (unix seconds)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
    /// Expiry (unix seconds)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
}

impl TokenClaims {
    /// Expiry as a timestamp, if the token carries one
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.exp.and_then(|exp| DateTime::from_timestamp(exp, 0))
    }

    /// Check whether the token has expired at `now`, allowing `leeway_seconds`
    /// of clock skew. Tokens without `exp` never expire here.
    pub fn is_expired_at(&self, now: DateTime<Utc>, leeway_seconds: i64) -> bool {
        match self.exp {
            Some(exp) => exp.saturating_add(leeway_seconds) < now.timestamp(),
            None => false,
        }
    }
}
