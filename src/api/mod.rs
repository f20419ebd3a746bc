//! API layer - REST backend client
//!
//! This module contains the client for the Share2Go backend.
//! It includes:
//! - Auth endpoints (login, register, logout)
//! - Ride endpoints
//! - Booking endpoints
//! - Notification endpoints
//! - Dashboard counters computed from list responses
//!
//! All calls go through [`ApiClient`], which attaches the session's bearer
//! token and turns a 401 into a logout.

pub mod auth;
pub mod bookings;
pub mod client;
pub mod error;
pub mod notifications;
pub mod responses;
pub mod rides;
pub mod stats;

pub use auth::LoginResponse;
pub use client::ApiClient;
pub use error::ApiError;
pub use responses::{ListResponse, PagedEnvelope, UserProfile};
pub use rides::PageRequest;
pub use stats::{driver_stats, passenger_stats, DriverStats, PassengerStats};

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use axum::Router;

    use super::ApiClient;
    use crate::config::ApiConfig;
    use crate::services::{SessionManager, TokenDecoder};
    use crate::storage::{MemoryStore, SessionStore};

    /// Serve `router` on an ephemeral port and return its base URL
    pub async fn spawn_backend(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind mock backend");
        let addr = listener.local_addr().expect("No local address");
        tokio::spawn(async move {
            let _ = axum::serve(listener, router).await;
        });
        format!("http://{}", addr)
    }

    /// Fresh in-memory session
    pub fn session() -> Arc<SessionManager> {
        Arc::new(SessionManager::new(
            SessionStore::new(Arc::new(MemoryStore::new())),
            TokenDecoder::default(),
        ))
    }

    /// Client for `base` bound to `session`
    pub fn client_for(base: &str, session: Arc<SessionManager>) -> ApiClient {
        let config = ApiConfig {
            base_url: base.to_string(),
            timeout_seconds: 5,
        };
        ApiClient::new(&config, session).expect("Failed to build client")
    }
}
