//! Shared types for studio-auth

pub mod error;

pub use error::{Result, StudioError};
