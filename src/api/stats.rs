//! Dashboard counters
//!
//! The backend has no stats endpoint, so both dashboards derive their
//! counters from the lists they already fetched.

use std::collections::HashMap;

use chrono::NaiveDateTime;
use serde::Serialize;

use super::rides::PageRequest;
use super::{ApiClient, ApiError};
use crate::models::{Booking, BookingStatus, Ride, UserId};

/// Counters on the driver dashboard
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DriverStats {
    pub total_rides: usize,
    /// Rides that have not departed yet
    pub active_rides: usize,
    /// Accepted bookings across all rides
    pub total_passengers: usize,
    /// Bookings waiting for a decision
    pub pending_requests: usize,
    pub total_earnings: f64,
}

/// Counters on the passenger dashboard
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PassengerStats {
    pub total_bookings: usize,
    pub upcoming_rides: usize,
    pub completed_rides: usize,
    pub total_spent: f64,
}

/// Compute driver counters from rides and the bookings on each ride
pub fn driver_stats(
    rides: &[Ride],
    bookings: &HashMap<i64, Vec<Booking>>,
    now: NaiveDateTime,
) -> DriverStats {
    let mut stats = DriverStats {
        total_rides: rides.len(),
        active_rides: rides.iter().filter(|r| r.is_upcoming(now)).count(),
        ..Default::default()
    };

    for ride in rides {
        let Some(on_ride) = bookings.get(&ride.id) else {
            continue;
        };
        let accepted: Vec<&Booking> = on_ride.iter().filter(|b| b.status.is_confirmed()).collect();
        let booked_seats: u32 = accepted.iter().map(|b| b.number_of_seats).sum();

        stats.total_passengers += accepted.len();
        stats.pending_requests += on_ride
            .iter()
            .filter(|b| b.status == BookingStatus::Pending)
            .count();
        stats.total_earnings += ride.price_per_seat * f64::from(booked_seats);
    }

    stats
}

/// Compute passenger counters from their bookings.
///
/// A booking whose ride details were not embedded counts toward the total
/// only.
pub fn passenger_stats(bookings: &[Booking], now: NaiveDateTime) -> PassengerStats {
    let mut stats = PassengerStats {
        total_bookings: bookings.len(),
        ..Default::default()
    };

    for booking in bookings {
        let Some(ride) = &booking.ride else {
            continue;
        };

        if booking.status.is_confirmed() {
            stats.total_spent += ride.price_per_seat * f64::from(booking.number_of_seats);
        }

        if ride.is_upcoming(now) {
            if booking.status.is_live() {
                stats.upcoming_rides += 1;
            }
        } else if booking.status.is_confirmed() {
            stats.completed_rides += 1;
        }
    }

    stats
}

impl ApiClient {
    /// Fetch everything the driver dashboard shows and compute its counters.
    ///
    /// A ride whose bookings cannot be fetched counts as having none.
    pub async fn driver_dashboard(
        &self,
        driver_id: &UserId,
        now: NaiveDateTime,
    ) -> Result<(Vec<Ride>, DriverStats), ApiError> {
        let rides = self
            .rides_by_driver(driver_id, PageRequest { page: 0, size: 100 })
            .await?;

        let mut bookings = HashMap::with_capacity(rides.len());
        for ride in &rides {
            match self.bookings_for_ride(ride.id).await {
                Ok(list) => {
                    bookings.insert(ride.id, list);
                }
                Err(e) if e.requires_login() => return Err(e),
                Err(e) => {
                    tracing::warn!("Failed to fetch bookings for ride {}: {}", ride.id, e);
                }
            }
        }

        let stats = driver_stats(&rides, &bookings, now);
        Ok((rides, stats))
    }

    /// Fetch a passenger's bookings and compute their counters
    pub async fn passenger_dashboard(
        &self,
        passenger_id: &UserId,
        now: NaiveDateTime,
    ) -> Result<(Vec<Booking>, PassengerStats), ApiError> {
        let bookings = self.bookings_for_passenger(passenger_id).await?;
        let stats = passenger_stats(&bookings, now);
        Ok((bookings, stats))
    }
}
