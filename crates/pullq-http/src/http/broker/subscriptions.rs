//! Subscription route handlers for the pullq HTTP API

use super::server::{AppState, HandlerError, error_response};
use crate::http::{
    AckRequest, ErrorResponse, MessageIdsResponse, PullRequest, PullResponse,
    SubscriptionsResponse, validate_subscription_name,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use log::{error, trace};
use pullq::{Subscription, SubscriptionCreateConfig, SubscriptionUpdateConfig};

fn validated(method: &str, subscription: &str) -> Result<(), HandlerError> {
    validate_subscription_name(subscription).map_err(|error_response_body| {
        error!(
            "{} /subscriptions/{} validation failed: {}",
            method, subscription, error_response_body.message
        );
        error_response(error_response_body)
    })
}

fn create(
    app_state: &AppState,
    name: &str,
    config: &SubscriptionCreateConfig,
) -> Result<(StatusCode, Json<Subscription>), HandlerError> {
    match app_state.broker.create_subscription(name, config) {
        Ok(subscription) => {
            trace!(
                "PUT /subscriptions/{} - subscription created on topic '{}'",
                subscription.name, subscription.topic
            );
            Ok((StatusCode::CREATED, Json(subscription)))
        }
        Err(err) => {
            error!("PUT /subscriptions/{name} failed: {err}");
            Err(error_response(ErrorResponse::from(err)))
        }
    }
}

#[tracing::instrument(level = "debug", skip(app_state, config), fields(subscription = %subscription, topic = %config.topic))]
pub async fn create_subscription(
    State(app_state): State<AppState>,
    Path(subscription): Path<String>,
    Json(config): Json<SubscriptionCreateConfig>,
) -> Result<(StatusCode, Json<Subscription>), HandlerError> {
    validated("PUT", &subscription)?;
    create(&app_state, &subscription, &config)
}

#[tracing::instrument(level = "debug", skip(app_state, config), fields(topic = %config.topic))]
pub async fn create_subscription_with_uuid(
    State(app_state): State<AppState>,
    Json(config): Json<SubscriptionCreateConfig>,
) -> Result<(StatusCode, Json<Subscription>), HandlerError> {
    create(&app_state, "", &config)
}

#[tracing::instrument(level = "debug", skip(app_state, config), fields(subscription = %subscription))]
pub async fn update_subscription(
    State(app_state): State<AppState>,
    Path(subscription): Path<String>,
    Json(config): Json<SubscriptionUpdateConfig>,
) -> Result<Json<Subscription>, HandlerError> {
    validated("PATCH", &subscription)?;
    match app_state.broker.update_subscription(&subscription, &config) {
        Ok(updated) => {
            trace!("PATCH /subscriptions/{subscription} - subscription updated");
            Ok(Json(updated))
        }
        Err(err) => {
            error!("PATCH /subscriptions/{subscription} failed: {err}");
            Err(error_response(ErrorResponse::from(err)))
        }
    }
}

#[tracing::instrument(level = "debug", skip(app_state), fields(subscription = %subscription))]
pub async fn delete_subscription(
    State(app_state): State<AppState>,
    Path(subscription): Path<String>,
) -> Result<StatusCode, HandlerError> {
    validated("DELETE", &subscription)?;
    match app_state.broker.delete_subscription(&subscription) {
        Ok(()) => {
            trace!("DELETE /subscriptions/{subscription} - subscription deleted");
            Ok(StatusCode::NO_CONTENT)
        }
        Err(err) => {
            error!("DELETE /subscriptions/{subscription} failed: {err}");
            Err(error_response(ErrorResponse::from(err)))
        }
    }
}

pub async fn get_subscription(
    State(app_state): State<AppState>,
    Path(subscription): Path<String>,
) -> Result<Json<Subscription>, HandlerError> {
    validated("GET", &subscription)?;
    trace!("GET /subscriptions/{subscription}");
    app_state
        .broker
        .get_subscription(&subscription)
        .map(Json)
        .map_err(|err| error_response(ErrorResponse::from(err)))
}

pub async fn list_subscriptions(State(app_state): State<AppState>) -> Json<SubscriptionsResponse> {
    trace!("GET /subscriptions/");
    Json(SubscriptionsResponse {
        subscriptions: app_state.broker.list_subscriptions(),
    })
}

#[tracing::instrument(level = "debug", skip(app_state, request), fields(subscription = %subscription, max_messages = ?request.max_messages))]
pub async fn pull(
    State(app_state): State<AppState>,
    Path(subscription): Path<String>,
    Json(request): Json<PullRequest>,
) -> Result<Json<PullResponse>, HandlerError> {
    validated("POST", &subscription)?;

    match app_state
        .broker
        .pull(&subscription, request.capped_max_messages())
    {
        Ok(messages) => {
            trace!(
                "POST /subscriptions/{subscription}/pull - {} messages",
                messages.len()
            );
            Ok(Json(PullResponse { messages }))
        }
        Err(err) => {
            error!("POST /subscriptions/{subscription}/pull failed: {err}");
            Err(error_response(ErrorResponse::from(err)))
        }
    }
}

#[tracing::instrument(level = "debug", skip(app_state, request), fields(subscription = %subscription, count = request.message_ids.len()))]
pub async fn ack(
    State(app_state): State<AppState>,
    Path(subscription): Path<String>,
    Json(request): Json<AckRequest>,
) -> Result<Json<MessageIdsResponse>, HandlerError> {
    validated("POST", &subscription)?;
    match app_state.broker.ack(&subscription, &request.message_ids) {
        Ok(message_ids) => {
            trace!(
                "POST /subscriptions/{subscription}/ack - acked {} of {}",
                message_ids.len(),
                request.message_ids.len()
            );
            Ok(Json(MessageIdsResponse { message_ids }))
        }
        Err(err) => {
            error!("POST /subscriptions/{subscription}/ack failed: {err}");
            Err(error_response(ErrorResponse::from(err)))
        }
    }
}
