//! Booking model

use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use super::Ride;

/// A passenger's booking on a ride
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    /// Unique identifier
    pub id: i64,
    /// Booked ride
    #[serde(default)]
    pub ride_id: Option<i64>,
    /// Booking passenger
    #[serde(default)]
    pub passenger_id: Option<i64>,
    /// Seats requested
    pub number_of_seats: u32,
    /// Lifecycle status
    #[serde(default)]
    pub status: BookingStatus,
    /// When the booking was made
    #[serde(default)]
    pub booking_time: Option<NaiveDateTime>,
    /// Embedded ride, present on passenger listings
    #[serde(default)]
    pub ride: Option<Ride>,
}

/// Booking lifecycle status.
///
/// The backend writes both `CONFIRMED` and `ACCEPTED` for an accepted
/// booking depending on the code path. It stores the status as a free
/// string, so anything else (or a missing value) lands in `Other` with the
/// raw text kept.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BookingStatus {
    /// Waiting for the driver
    Pending,
    /// Accepted by the driver
    Confirmed,
    /// Accepted by the driver (legacy spelling)
    Accepted,
    /// Refused by the driver
    Rejected,
    /// Withdrawn by the passenger
    Cancelled,
    /// Unrecognized status; empty when the backend sent none
    Other(String),
}

impl BookingStatus {
    /// Accepted under either spelling
    pub fn is_confirmed(&self) -> bool {
        matches!(self, BookingStatus::Confirmed | BookingStatus::Accepted)
    }

    /// Still occupies (or may occupy) seats
    pub fn is_live(&self) -> bool {
        !matches!(self, BookingStatus::Rejected | BookingStatus::Cancelled)
    }

    /// Read a backend status, keeping unknown values instead of failing
    pub fn from_backend(raw: Option<String>) -> Self {
        match raw {
            None => BookingStatus::Other(String::new()),
            Some(raw) => raw.parse().unwrap_or(BookingStatus::Other(raw)),
        }
    }
}

impl Default for BookingStatus {
    fn default() -> Self {
        BookingStatus::Other(String::new())
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BookingStatus::Pending => write!(f, "PENDING"),
            BookingStatus::Confirmed => write!(f, "CONFIRMED"),
            BookingStatus::Accepted => write!(f, "ACCEPTED"),
            BookingStatus::Rejected => write!(f, "REJECTED"),
            BookingStatus::Cancelled => write!(f, "CANCELLED"),
            BookingStatus::Other(raw) => write!(f, "{}", raw),
        }
    }
}

impl FromStr for BookingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "PENDING" => Ok(BookingStatus::Pending),
            "CONFIRMED" => Ok(BookingStatus::Confirmed),
            "ACCEPTED" => Ok(BookingStatus::Accepted),
            "REJECTED" => Ok(BookingStatus::Rejected),
            "CANCELLED" | "CANCELED" => Ok(BookingStatus::Cancelled),
            _ => Err(format!("Invalid booking status: {}", s)),
        }
    }
}

impl Serialize for BookingStatus {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            BookingStatus::Other(raw) if raw.is_empty() => serializer.serialize_none(),
            status => serializer.collect_str(status),
        }
    }
}

impl<'de> Deserialize<'de> for BookingStatus {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<String>::deserialize(deserializer).map(BookingStatus::from_backend)
    }
}

/// Input for `POST /api/bookings`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingInput {
    pub ride_id: i64,
    pub passenger_id: i64,
    pub number_of_seats: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_booking_status_parse() {
        assert_eq!("pending".parse::<BookingStatus>().unwrap(), BookingStatus::Pending);
        assert_eq!("CONFIRMED".parse::<BookingStatus>().unwrap(), BookingStatus::Confirmed);
        assert_eq!("Canceled".parse::<BookingStatus>().unwrap(), BookingStatus::Cancelled);
        assert!("LOST".parse::<BookingStatus>().is_err());
    }

    #[test]
    fn test_booking_status_predicates() {
        assert!(BookingStatus::Confirmed.is_confirmed());
        assert!(BookingStatus::Accepted.is_confirmed());
        assert!(!BookingStatus::Pending.is_confirmed());
        assert!(BookingStatus::Pending.is_live());
        assert!(!BookingStatus::Rejected.is_live());
        assert!(!BookingStatus::Cancelled.is_live());
        assert!(!BookingStatus::Other("COMPLETED".into()).is_confirmed());
        assert!(BookingStatus::Other("COMPLETED".into()).is_live());
    }

    #[test]
    fn test_unknown_or_missing_status_is_kept() {
        let bookings: Vec<Booking> = serde_json::from_str(
            r#"[
                {"id":1,"numberOfSeats":1,"status":"CONFIRMED"},
                {"id":2,"numberOfSeats":1,"status":"COMPLETED"},
                {"id":3,"numberOfSeats":1,"status":null},
                {"id":4,"numberOfSeats":1}
            ]"#,
        )
        .unwrap();

        assert_eq!(bookings[0].status, BookingStatus::Confirmed);
        assert_eq!(bookings[1].status, BookingStatus::Other("COMPLETED".into()));
        assert_eq!(bookings[1].status.to_string(), "COMPLETED");
        assert_eq!(bookings[2].status, BookingStatus::default());
        assert_eq!(bookings[3].status, BookingStatus::default());
    }

    #[test]
    fn test_booking_status_serialize() {
        assert_eq!(
            serde_json::to_value(BookingStatus::Cancelled).unwrap(),
            serde_json::json!("CANCELLED")
        );
        assert_eq!(
            serde_json::to_value(BookingStatus::Other("COMPLETED".into())).unwrap(),
            serde_json::json!("COMPLETED")
        );
        assert!(serde_json::to_value(BookingStatus::default()).unwrap().is_null());
    }

    #[test]
    fn test_booking_from_backend_json() {
        let booking: Booking = serde_json::from_str(
            r#"{"id":5,"rideId":3,"passengerId":11,"numberOfSeats":2,"status":"PENDING","bookingTime":"2025-02-01T10:00:00"}"#,
        )
        .unwrap();
        assert_eq!(booking.status, BookingStatus::Pending);
        assert_eq!(booking.ride_id, Some(3));
        assert!(booking.ride.is_none());
    }

    #[test]
    fn test_create_booking_input_json() {
        let input = CreateBookingInput {
            ride_id: 3,
            passenger_id: 11,
            number_of_seats: 1,
        };
        assert_eq!(
            serde_json::to_value(&input).unwrap(),
            serde_json::json!({"rideId": 3, "passengerId": 11, "numberOfSeats": 1})
        );
    }
}
