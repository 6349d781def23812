//! Route configuration for the pullq HTTP API

use axum::{
    Router,
    routing::{get, post, put},
};
use tower_http::trace::TraceLayer;

use super::{metadata, server::AppState, subscriptions, topics};

/// Prefix every route is nested under.
pub const API_PREFIX: &str = "/api/v0";

/// Creates the Axum router with all routes configured
pub fn create_router(app_state: AppState) -> Router {
    let api = Router::new()
        // Topic routes
        .route(
            "/topics/",
            get(topics::list_topics).put(topics::create_topic_with_uuid),
        )
        .route(
            "/topics/{topic}",
            put(topics::create_topic)
                .patch(topics::update_topic)
                .delete(topics::delete_topic)
                .get(topics::get_topic),
        )
        .route(
            "/topics/{topic}/subscriptions",
            get(topics::topic_subscriptions),
        )
        .route("/topics/{topic}/publish", post(topics::publish))
        // Subscription routes
        .route(
            "/subscriptions/",
            get(subscriptions::list_subscriptions).put(subscriptions::create_subscription_with_uuid),
        )
        .route(
            "/subscriptions/{subscription}",
            put(subscriptions::create_subscription)
                .patch(subscriptions::update_subscription)
                .delete(subscriptions::delete_subscription)
                .get(subscriptions::get_subscription),
        )
        .route(
            "/subscriptions/{subscription}/pull",
            post(subscriptions::pull),
        )
        .route("/subscriptions/{subscription}/ack", post(subscriptions::ack))
        // Metadata routes
        .route("/heartbeat", get(metadata::heartbeat))
        .route("/metrics", get(metadata::metrics));

    Router::new()
        .nest(API_PREFIX, api)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
