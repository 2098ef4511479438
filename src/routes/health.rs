//! Health check endpoint
//!
//! /health, /healthz - Liveness probe. Always 200 while the process serves
//! requests.

use hyper::{Response, StatusCode};
use serde::Serialize;

use crate::routes::response::{json_response, BoxBody};
use crate::server::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub healthy: bool,
    pub version: &'static str,
    /// "development" or "production"
    pub mode: &'static str,
    pub timestamp: String,
}

fn build_health_response(state: &AppState) -> HealthResponse {
    HealthResponse {
        healthy: true,
        version: env!("CARGO_PKG_VERSION"),
        mode: if state.args.dev_mode {
            "development"
        } else {
            "production"
        },
        timestamp: chrono::Utc::now().to_rfc3339(),
    }
}

/// Handle liveness probe (/health, /healthz)
pub fn health_check(state: &AppState) -> Response<BoxBody> {
    json_response(StatusCode::OK, &build_health_response(state))
}
