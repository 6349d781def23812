//! Topic route handlers for the pullq HTTP API

use super::server::{AppState, HandlerError, error_response};
use crate::http::{
    ErrorResponse, MessageIdsResponse, PublishRequest, SubscriptionNamesResponse, TopicsResponse,
    validate_publish_request, validate_topic_name,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use log::{error, trace};
use pullq::{Topic, TopicCreateConfig, TopicUpdateConfig};

fn validated(method: &str, topic: &str) -> Result<(), HandlerError> {
    validate_topic_name(topic).map_err(|error_response_body| {
        error!(
            "{} /topics/{} validation failed: {}",
            method, topic, error_response_body.message
        );
        error_response(error_response_body)
    })
}

fn create(
    app_state: &AppState,
    name: &str,
    config: &TopicCreateConfig,
) -> Result<(StatusCode, Json<Topic>), HandlerError> {
    match app_state.broker.create_topic(name, config) {
        Ok(topic) => {
            trace!("PUT /topics/{} - topic created", topic.name);
            Ok((StatusCode::CREATED, Json(topic)))
        }
        Err(err) => {
            error!("PUT /topics/{name} failed: {err}");
            Err(error_response(ErrorResponse::from(err)))
        }
    }
}

#[tracing::instrument(level = "debug", skip(app_state, config), fields(topic = %topic))]
pub async fn create_topic(
    State(app_state): State<AppState>,
    Path(topic): Path<String>,
    Json(config): Json<TopicCreateConfig>,
) -> Result<(StatusCode, Json<Topic>), HandlerError> {
    validated("PUT", &topic)?;
    create(&app_state, &topic, &config)
}

#[tracing::instrument(level = "debug", skip(app_state, config))]
pub async fn create_topic_with_uuid(
    State(app_state): State<AppState>,
    Json(config): Json<TopicCreateConfig>,
) -> Result<(StatusCode, Json<Topic>), HandlerError> {
    create(&app_state, "", &config)
}

#[tracing::instrument(level = "debug", skip(app_state, config), fields(topic = %topic))]
pub async fn update_topic(
    State(app_state): State<AppState>,
    Path(topic): Path<String>,
    Json(config): Json<TopicUpdateConfig>,
) -> Result<Json<Topic>, HandlerError> {
    validated("PATCH", &topic)?;
    match app_state.broker.update_topic(&topic, &config) {
        Ok(updated) => {
            trace!("PATCH /topics/{topic} - topic updated");
            Ok(Json(updated))
        }
        Err(err) => {
            error!("PATCH /topics/{topic} failed: {err}");
            Err(error_response(ErrorResponse::from(err)))
        }
    }
}

#[tracing::instrument(level = "debug", skip(app_state), fields(topic = %topic))]
pub async fn delete_topic(
    State(app_state): State<AppState>,
    Path(topic): Path<String>,
) -> Result<StatusCode, HandlerError> {
    validated("DELETE", &topic)?;
    match app_state.broker.delete_topic(&topic) {
        Ok(()) => {
            trace!("DELETE /topics/{topic} - topic deleted");
            Ok(StatusCode::NO_CONTENT)
        }
        Err(err) => {
            error!("DELETE /topics/{topic} failed: {err}");
            Err(error_response(ErrorResponse::from(err)))
        }
    }
}

pub async fn get_topic(
    State(app_state): State<AppState>,
    Path(topic): Path<String>,
) -> Result<Json<Topic>, HandlerError> {
    validated("GET", &topic)?;
    trace!("GET /topics/{topic}");
    app_state
        .broker
        .get_topic(&topic)
        .map(Json)
        .map_err(|err| error_response(ErrorResponse::from(err)))
}

pub async fn list_topics(State(app_state): State<AppState>) -> Json<TopicsResponse> {
    trace!("GET /topics/");
    Json(TopicsResponse {
        topics: app_state.broker.list_topics(),
    })
}

pub async fn topic_subscriptions(
    State(app_state): State<AppState>,
    Path(topic): Path<String>,
) -> Result<Json<SubscriptionNamesResponse>, HandlerError> {
    validated("GET", &topic)?;
    trace!("GET /topics/{topic}/subscriptions");
    app_state
        .broker
        .topic_subscriptions(&topic)
        .map(|subscription_names| Json(SubscriptionNamesResponse { subscription_names }))
        .map_err(|err| error_response(ErrorResponse::from(err)))
}

#[tracing::instrument(level = "debug", skip(app_state, request), fields(topic = %topic))]
pub async fn publish(
    State(app_state): State<AppState>,
    Path(topic): Path<String>,
    Json(request): Json<PublishRequest>,
) -> Result<Json<MessageIdsResponse>, HandlerError> {
    validated("POST", &topic)?;
    if let Err(error_response_body) = validate_publish_request(&request) {
        error!(
            "POST /topics/{}/publish validation failed: {}",
            topic, error_response_body.message
        );
        return Err(error_response(error_response_body));
    }

    let data: Vec<String> = request.raw_messages.into_iter().map(|m| m.data).collect();
    match app_state.broker.publish(&topic, data) {
        Ok(message_ids) => {
            trace!(
                "POST /topics/{topic}/publish - published {} messages",
                message_ids.len()
            );
            Ok(Json(MessageIdsResponse { message_ids }))
        }
        Err(err) => {
            error!("POST /topics/{topic}/publish failed: {err}");
            Err(error_response(ErrorResponse::from(err)))
        }
    }
}
