//! HTTP server (broker) implementation for pullq

use axum::{Json, http::StatusCode};
use log::{debug, info};
use pullq::{Broker, BrokerConfig, InMemoryBroker};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use super::routes::create_router;
use crate::http::ErrorResponse;

// =============================================================================
// APPLICATION STATE
// =============================================================================

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub broker: Arc<dyn Broker>,
}

pub type HandlerError = (StatusCode, Json<ErrorResponse>);

// =============================================================================
// UTILITY FUNCTIONS
// =============================================================================

/// Maps pullq error codes to HTTP status codes
pub fn error_to_status_code(error_code: &str) -> StatusCode {
    match error_code {
        "invalid_parameter" | "validation_error" | "invalid_config" => StatusCode::BAD_REQUEST,
        "topic_not_found" | "subscription_not_found" => StatusCode::NOT_FOUND,
        "conflict" => StatusCode::CONFLICT,
        "internal_error" => StatusCode::INTERNAL_SERVER_ERROR,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub fn error_response(error_response: ErrorResponse) -> HandlerError {
    (
        error_to_status_code(&error_response.error),
        Json(error_response),
    )
}

// =============================================================================
// APPLICATION FACTORY & BROKER UTILITIES
// =============================================================================

/// Creates application state around an in-memory broker
pub fn create_app_state(config: BrokerConfig) -> AppState {
    Arc::new(AppStateInner {
        broker: Arc::new(InMemoryBroker::with_config(config)),
    })
}

/// Runs [`Broker::sweep`] every `interval` until the task is aborted.
pub fn spawn_sweeper(broker: Arc<dyn Broker>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let report = broker.sweep();
            if !report.is_empty() {
                debug!(
                    "Sweep removed {} topics, {} subscriptions, {} expired messages",
                    report.topics_removed, report.subscriptions_removed, report.messages_expired
                );
            }
        }
    })
}

/// Serves the API on an already bound listener.
pub async fn serve(
    listener: TcpListener,
    app_state: AppState,
    sweep_interval: Duration,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let sweeper = spawn_sweeper(Arc::clone(&app_state.broker), sweep_interval);
    let app = create_router(app_state);

    let result: Result<(), Box<dyn std::error::Error + Send + Sync>> = axum::serve(listener, app)
        .await
        .map_err(|e| format!("Broker failed to start: {e}").into());
    sweeper.abort();
    result
}

/// Starts the HTTP broker on `addr` with the given broker defaults
pub async fn start_server(
    addr: SocketAddr,
    config: BrokerConfig,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let sweep_interval = config.sweep_interval;
    let app_state = create_app_state(config);

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| format!("Failed to bind to address {addr}: {e}"))?;

    info!("pullq broker starting on http://{addr}");

    serve(listener, app_state, sweep_interval).await
}

// =============================================================================
// UNIT TESTS
// =============================================================================
