//! Health check endpoints.
//!
//! - `GET /health` - Liveness probe (always 200 if the server is up)
//! - `GET /health/ready` - Readiness probe with engine reachability

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::state::ServerState;

/// Health check response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub uptime_secs: u64,
    pub auctions_created: u64,
    pub bids_placed: u64,
    pub bids_rejected: u64,
}

/// Readiness check response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadyResponse {
    pub ready: bool,
    pub reason: &'static str,
}

/// Liveness probe: `GET /health`
pub async fn health(State(state): State<ServerState>) -> Json<HealthResponse> {
    let metrics = &state.metrics;

    Json(HealthResponse {
        status: "healthy",
        uptime_secs: state.uptime_secs(),
        auctions_created: metrics.auctions(),
        bids_placed: metrics.bids(),
        bids_rejected: metrics.rejections(),
    })
}

/// Readiness probe: `GET /health/ready`
///
/// Ready once the engine answers a store query.
pub async fn ready(State(state): State<ServerState>) -> Json<ReadyResponse> {
    let (ready, reason) = match state.engine.active_auctions() {
        Ok(_) => (true, "store reachable"),
        Err(_) => (false, "store unavailable"),
    };

    Json(ReadyResponse { ready, reason })
}
