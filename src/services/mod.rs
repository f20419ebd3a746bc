//! Services layer - Session logic
//!
//! This module contains the client-side session services. Services are
//! responsible for:
//! - Decoding bearer tokens into claims
//! - Owning the session and reconciling it with the persisted copy
//! - Gating page access by role

pub mod routing;
pub mod session;
pub mod token;

pub use routing::{gate, Access, GateDecision, Navigation, Navigator, Page, RouteTable};
pub use session::{SessionError, SessionManager};
pub use token::{decode_claims, identity_from_claims, DecodeError, IncompleteClaims, TokenDecoder};
