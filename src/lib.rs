//! Share2Go - Client core for the Share2Go ride-sharing service
//!
//! This library owns the authentication session (token and derived identity),
//! persists it across restarts, gates pages by role and talks to the REST
//! backend on the session's behalf.

pub mod api;
pub mod config;
pub mod models;
pub mod services;
pub mod storage;
