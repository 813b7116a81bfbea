//! Health check endpoints
//!
//! - / - Plain-text liveness line
//! - /health - JSON status for probes and dashboards

use hyper::{Response, StatusCode};
use serde::Serialize;

use super::response::{json_response, text_response, BoxBody};
use crate::server::AppState;

/// Health response for probes
#[derive(Serialize)]
pub struct HealthResponse {
    /// Overall health status (true if service is running)
    pub healthy: bool,
    pub status: &'static str,
    /// Service version
    pub version: &'static str,
    /// Uptime in seconds
    pub uptime: u64,
    /// Which store is serving requests ("mongodb" or "memory")
    pub storage: &'static str,
    #[serde(rename = "devMode")]
    pub dev_mode: bool,
    /// Current timestamp
    pub timestamp: String,
}

fn build_health_response(state: &AppState) -> HealthResponse {
    HealthResponse {
        healthy: true,
        status: "online",
        version: env!("CARGO_PKG_VERSION"),
        uptime: state.started_at.elapsed().as_secs(),
        storage: state.backend.as_str(),
        dev_mode: state.args.dev_mode,
        timestamp: chrono::Utc::now().to_rfc3339(),
    }
}

pub fn liveness() -> Response<BoxBody> {
    text_response(StatusCode::OK, "API is alive and running!")
}

/// Handle liveness probe (/health)
pub fn health_check(state: &AppState) -> Response<BoxBody> {
    json_response(StatusCode::OK, &build_health_response(state))
}
