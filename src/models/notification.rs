//! Notification model

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A notification addressed to one user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    /// Unique identifier
    pub id: i64,
    /// Recipient user
    #[serde(default)]
    pub recipient_id: Option<i64>,
    /// Event kind, e.g. `BOOKING_REQUEST`, `BOOKING_ACCEPTED`
    #[serde(rename = "type")]
    pub kind: String,
    /// Human readable text
    pub message: String,
    /// Whether the user has seen it
    #[serde(default)]
    pub read_flag: bool,
    /// Creation timestamp
    #[serde(default)]
    pub created_at: Option<NaiveDateTime>,
    /// Related ride
    #[serde(default)]
    pub ride_id: Option<i64>,
    /// Related booking
    #[serde(default)]
    pub booking_id: Option<i64>,
}
