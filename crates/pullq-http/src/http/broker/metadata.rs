//! Metadata route handlers for the pullq HTTP API

use super::server::AppState;
use axum::{extract::State, response::Json};
use log::trace;
use pullq::BrokerMetrics;

pub const HEARTBEAT_BODY: &str = "heartbeat";

pub async fn heartbeat() -> &'static str {
    trace!("GET /heartbeat");
    HEARTBEAT_BODY
}

pub async fn metrics(State(app_state): State<AppState>) -> Json<BrokerMetrics> {
    trace!("GET /metrics");
    Json(app_state.broker.metrics())
}
