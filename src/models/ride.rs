//! Ride model

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A ride published by a driver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ride {
    /// Unique identifier
    pub id: i64,
    /// Departure place
    pub origin: String,
    /// Arrival place
    pub destination: String,
    /// Local departure time as sent by the backend
    pub departure_time: NaiveDateTime,
    /// Seats still bookable
    pub available_seats: u32,
    /// Price per booked seat
    pub price_per_seat: f64,
    /// Publishing driver
    #[serde(default)]
    pub driver_id: Option<i64>,
    /// Driver display name
    #[serde(default)]
    pub driver_name: Option<String>,
    /// Passengers with a booking on this ride
    #[serde(default)]
    pub passenger_ids: Vec<i64>,
}

impl Ride {
    /// A ride is active until it departs.
    pub fn is_upcoming(&self, now: NaiveDateTime) -> bool {
        self.departure_time > now
    }
}

/// Input for publishing or updating a ride
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RideInput {
    pub origin: String,
    pub destination: String,
    pub departure_time: NaiveDateTime,
    pub available_seats: u32,
    pub price_per_seat: f64,
}

impl RideInput {
    /// Check the fields a backend would reject anyway
    pub fn validate(&self) -> Result<(), String> {
        if self.origin.trim().is_empty() {
            return Err("Origin is required".to_string());
        }
        if self.destination.trim().is_empty() {
            return Err("Destination is required".to_string());
        }
        if self.available_seats == 0 {
            return Err("At least one seat must be offered".to_string());
        }
        if self.price_per_seat < 0.0 || !self.price_per_seat.is_finite() {
            return Err("Price per seat must be a non-negative amount".to_string());
        }
        Ok(())
    }
}

/// Query for `GET /api/rides/search`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RideSearch {
    pub origin: String,
    pub destination: String,
    pub departure_time: NaiveDateTime,
}
