//! Ride endpoints

use reqwest::Method;

use super::client::Auth;
use super::responses::ListResponse;
use super::{ApiClient, ApiError};
use crate::models::{Ride, RideInput, RideSearch, UserId};

/// Page request for list endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub size: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self { page: 0, size: 20 }
    }
}

impl PageRequest {
    fn query(&self) -> [(&'static str, String); 2] {
        [("page", self.page.to_string()), ("size", self.size.to_string())]
    }
}

impl ApiClient {
    /// GET /api/rides - All rides
    pub async fn list_rides(&self, page: PageRequest) -> Result<Vec<Ride>, ApiError> {
        let request = self.request(Method::GET, "/api/rides").query(&page.query());
        let rides: ListResponse<Ride> = self.send_json(request, Auth::Bearer).await?;
        Ok(rides.into_items())
    }

    /// GET /api/rides/{id} - One ride
    pub async fn get_ride(&self, id: i64) -> Result<Ride, ApiError> {
        self.get_json(&format!("/api/rides/{}", id)).await
    }

    /// GET /api/rides/search - Rides matching origin, destination and departure
    pub async fn search_rides(&self, search: &RideSearch) -> Result<Vec<Ride>, ApiError> {
        let departure = search.departure_time.format("%Y-%m-%dT%H:%M:%S").to_string();
        let request = self.request(Method::GET, "/api/rides/search").query(&[
            ("origin", search.origin.as_str()),
            ("destination", search.destination.as_str()),
            ("departureTime", departure.as_str()),
        ]);
        let rides: ListResponse<Ride> = self.send_json(request, Auth::Bearer).await?;
        Ok(rides.into_items())
    }

    /// GET /api/rides/driver/{driverId} - Rides published by a driver
    pub async fn rides_by_driver(
        &self,
        driver_id: &UserId,
        page: PageRequest,
    ) -> Result<Vec<Ride>, ApiError> {
        let request = self
            .request(Method::GET, &format!("/api/rides/driver/{}", driver_id))
            .query(&page.query());
        let rides: ListResponse<Ride> = self.send_json(request, Auth::Bearer).await?;
        Ok(rides.into_items())
    }

    /// POST /api/rides/driver/{driverId} - Publish a ride
    pub async fn publish_ride(&self, driver_id: &UserId, input: &RideInput) -> Result<Ride, ApiError> {
        input.validate().map_err(ApiError::Validation)?;
        let request = self
            .request(Method::POST, &format!("/api/rides/driver/{}", driver_id))
            .json(input);
        let ride: Ride = self.send_json(request, Auth::Bearer).await?;
        tracing::info!("Published ride {} ({} -> {})", ride.id, ride.origin, ride.destination);
        Ok(ride)
    }

    /// PUT /api/rides/{id} - Update a ride
    pub async fn update_ride(&self, id: i64, input: &RideInput) -> Result<Ride, ApiError> {
        input.validate().map_err(ApiError::Validation)?;
        let request = self.request(Method::PUT, &format!("/api/rides/{}", id)).json(input);
        self.send_json(request, Auth::Bearer).await
    }

    /// DELETE /api/rides/{id} - Delete a ride
    pub async fn delete_ride(&self, id: i64) -> Result<(), ApiError> {
        let request = self.request(Method::DELETE, &format!("/api/rides/{}", id));
        self.send_text(request, Auth::Bearer).await?;
        tracing::info!("Deleted ride {}", id);
        Ok(())
    }
}
