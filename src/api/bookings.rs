//! Booking endpoints

use reqwest::Method;

use super::client::Auth;
use super::responses::ListResponse;
use super::{ApiClient, ApiError};
use crate::models::{Booking, CreateBookingInput, UserId};

impl ApiClient {
    /// POST /api/bookings - Request seats on a ride
    pub async fn create_booking(&self, input: &CreateBookingInput) -> Result<Booking, ApiError> {
        if input.number_of_seats == 0 {
            return Err(ApiError::Validation("At least one seat must be booked".to_string()));
        }
        let request = self.request(Method::POST, "/api/bookings").json(input);
        let booking: Booking = self.send_json(request, Auth::Bearer).await?;
        tracing::info!(
            "Booked {} seat(s) on ride {:?} (booking {})",
            booking.number_of_seats,
            booking.ride_id,
            booking.id
        );
        Ok(booking)
    }

    /// GET /api/bookings/passenger/{passengerId} - A passenger's bookings
    pub async fn bookings_for_passenger(&self, passenger_id: &UserId) -> Result<Vec<Booking>, ApiError> {
        let bookings: ListResponse<Booking> = self
            .get_json(&format!("/api/bookings/passenger/{}", passenger_id))
            .await?;
        Ok(bookings.into_items())
    }

    /// GET /api/bookings/ride/{rideId} - Bookings on one ride
    pub async fn bookings_for_ride(&self, ride_id: i64) -> Result<Vec<Booking>, ApiError> {
        let bookings: ListResponse<Booking> =
            self.get_json(&format!("/api/bookings/ride/{}", ride_id)).await?;
        Ok(bookings.into_items())
    }

    /// DELETE /api/bookings/{id} - Cancel a booking
    pub async fn cancel_booking(&self, id: i64) -> Result<(), ApiError> {
        let request = self.request(Method::DELETE, &format!("/api/bookings/{}", id));
        self.send_text(request, Auth::Bearer).await?;
        tracing::info!("Cancelled booking {}", id);
        Ok(())
    }

    /// PUT /api/bookings/{id}/accept - Driver accepts a booking
    pub async fn accept_booking(&self, id: i64) -> Result<Booking, ApiError> {
        let request = self.request(Method::PUT, &format!("/api/bookings/{}/accept", id));
        self.send_json(request, Auth::Bearer).await
    }

    /// PUT /api/bookings/{id}/reject - Driver rejects a booking
    pub async fn reject_booking(&self, id: i64) -> Result<Booking, ApiError> {
        let request = self.request(Method::PUT, &format!("/api/bookings/{}/reject", id));
        self.send_json(request, Auth::Bearer).await
    }
}
