//! User identity model
//!
//! This module defines the reconciled identity of whoever is using the client,
//! together with the closed role set the backend knows about.
//!
//! Role strings arrive from the backend in inconsistent casing (`Driver`,
//! `DRIVER`, `ROLE_DRIVER`), so they are normalized into [`UserRole`] as soon
//! as an identity is built and never compared as raw strings afterwards.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Stable subject identifier used by the backend as the key for
/// role-scoped requests ("my bookings", "my rides").
///
/// The backend issues numeric ids, but some deployments hand out string
/// subjects, so both shapes are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UserId {
    /// Numeric database id
    Numeric(i64),
    /// Opaque string subject
    Text(String),
}

impl UserId {
    /// An empty string id carries no identity and must not be trusted.
    pub fn is_empty(&self) -> bool {
        match self {
            UserId::Numeric(_) => false,
            UserId::Text(s) => s.trim().is_empty(),
        }
    }

    /// Numeric view of the id, if it has one.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            UserId::Numeric(n) => Some(*n),
            UserId::Text(s) => s.trim().parse().ok(),
        }
    }
}

impl From<i64> for UserId {
    fn from(id: i64) -> Self {
        UserId::Numeric(id)
    }
}

impl From<&str> for UserId {
    fn from(id: &str) -> Self {
        UserId::Text(id.to_string())
    }
}

impl From<String> for UserId {
    fn from(id: String) -> Self {
        UserId::Text(id)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserId::Numeric(n) => write!(f, "{}", n),
            UserId::Text(s) => write!(f, "{}", s),
        }
    }
}

/// User role for page gating.
///
/// - Driver: publishes and manages rides
/// - Passenger: searches and books rides
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum UserRole {
    /// Publishes rides and handles booking requests
    Driver,
    /// Searches and books rides
    Passenger,
}

impl UserRole {
    /// Landing page for this role, used when a page refuses the role.
    pub fn home_path(&self) -> &'static str {
        match self {
            UserRole::Driver => "/driver-dashboard",
            UserRole::Passenger => "/passenger-dashboard",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserRole::Driver => write!(f, "Driver"),
            UserRole::Passenger => write!(f, "Passenger"),
        }
    }
}

/// Error returned when a role string is outside the closed set.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid user role: {0}")]
pub struct InvalidRole(pub String);

impl FromStr for UserRole {
    type Err = InvalidRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        let normalized = normalized.strip_prefix("role_").unwrap_or(&normalized);
        match normalized {
            "driver" => Ok(UserRole::Driver),
            "passenger" => Ok(UserRole::Passenger),
            _ => Err(InvalidRole(s.to_string())),
        }
    }
}

impl<'de> Deserialize<'de> for UserRole {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// The reconciled, authoritative record of who is using the client.
///
/// Pages read this through the session manager only; nothing else parses
/// the token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Subject identifier
    pub id: UserId,
    /// Contact / login identifier
    pub email: String,
    /// Display label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Normalized role
    pub role: UserRole,
}

impl Identity {
    /// Create an identity without a display name
    pub fn new(id: impl Into<UserId>, email: impl Into<String>, role: UserRole) -> Self {
        Self {
            id: id.into(),
            email: email.into(),
            name: None,
            role,
        }
    }

    /// Attach a display name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Check if the user is a driver
    pub fn is_driver(&self) -> bool {
        self.role == UserRole::Driver
    }

    /// Check if the user is a passenger
    pub fn is_passenger(&self) -> bool {
        self.role == UserRole::Passenger
    }

    /// Label to show in a navbar: the name if known, else the email.
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(&self.email)
    }
}

/// Identity fields the backend returned alongside a freshly issued token.
///
/// Every field is optional because the login payload varies between
/// deployments; missing fields are backfilled from the token claims.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "ServerIdentityFields")]
pub struct ServerIdentity {
    /// Backend user id (`userId`, falling back to `id`)
    pub user_id: Option<UserId>,
    /// Email address
    pub email: Option<String>,
    /// Display name
    pub name: Option<String>,
    /// Role string as sent by the backend, any casing
    pub role: Option<String>,
}

/// Login payload as received; some deployments send both `id` and `userId`.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ServerIdentityFields {
    #[serde(default, alias = "user_id")]
    user_id: Option<UserId>,
    #[serde(default)]
    id: Option<UserId>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    role: Option<String>,
}

impl From<ServerIdentityFields> for ServerIdentity {
    fn from(fields: ServerIdentityFields) -> Self {
        Self {
            user_id: fields.user_id.filter(|id| !id.is_empty()).or(fields.id),
            email: fields.email,
            name: fields.name,
            role: fields.role,
        }
    }
}

impl ServerIdentity {
    /// Create a server identity with id, email and role
    pub fn new(
        user_id: impl Into<UserId>,
        email: impl Into<String>,
        role: impl Into<String>,
    ) -> Self {
        Self {
            user_id: Some(user_id.into()),
            email: Some(email.into()),
            name: None,
            role: Some(role.into()),
        }
    }
}

/// Input for registering a new account
#[derive(Debug, Clone, Serialize)]
pub struct RegisterInput {
    /// Display name
    pub name: String,
    /// Email address
    pub email: String,
    /// Plaintext password (hashed by the backend)
    pub password: String,
    /// Phone number (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// Selected role
    pub role: UserRole,
}

impl RegisterInput {
    /// Create a new registration input
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
        role: UserRole,
    ) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            password: password.into(),
            phone: None,
            role,
        }
    }
}
