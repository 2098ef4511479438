//! HTTP server for studio-auth

pub mod http;

pub use http::{bootstrap_admin, route, run, AppState};
