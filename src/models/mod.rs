//! Data models
//!
//! This module contains all data structures used throughout the Share2Go client.
//! Models represent:
//! - Session state (Session, Identity, token claims)
//! - Backend resources (Ride, Booking, Notification)
//! - Request inputs sent to the backend

mod booking;
mod claims;
mod notification;
mod ride;
mod session;
mod user;

pub use booking::{Booking, BookingStatus, CreateBookingInput};
pub use claims::TokenClaims;
pub use notification::Notification;
pub use ride::{Ride, RideInput, RideSearch};
pub use session::{Session, SessionState, SessionStatus};
pub use user::{Identity, InvalidRole, RegisterInput, ServerIdentity, UserId, UserRole};
