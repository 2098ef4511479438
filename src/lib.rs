//! studio-auth - JWT authentication gateway for the yoga studio API
//!
//! Issues bearer tokens on login, verifies them on every request through a
//! fail-open-to-anonymous filter, and guards self-service account operations.

pub mod auth;
pub mod config;
pub mod routes;
pub mod server;
pub mod store;
pub mod types;

pub use config::Args;
pub use server::{run, AppState};
pub use types::{Result, StudioError};
