//! Mapping of broker error responses back into [`PullqError`]

use super::common::ErrorResponse;
use log::debug;
use pullq::PullqError;
use reqwest::StatusCode;

/// The resource a request was addressed to, used to attribute errors whose
/// body does not name it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource<'a> {
    Topic(&'a str),
    Subscription(&'a str),
    None,
}

fn detail<'a>(error_response: &'a ErrorResponse, key: &str) -> Option<&'a str> {
    error_response
        .details
        .as_ref()
        .and_then(|d| d.get(key))
        .and_then(|v| v.as_str())
}

fn not_found(resource: Resource<'_>) -> Option<PullqError> {
    match resource {
        Resource::Topic(name) => Some(PullqError::topic_not_found(name)),
        Resource::Subscription(name) => Some(PullqError::subscription_not_found(name)),
        Resource::None => None,
    }
}

fn conflict(resource: Resource<'_>) -> Option<PullqError> {
    match resource {
        Resource::Topic(name) => Some(PullqError::TopicAlreadyExists {
            topic: name.to_string(),
        }),
        Resource::Subscription(name) => Some(PullqError::SubscriptionAlreadyExists {
            subscription: name.to_string(),
        }),
        Resource::None => None,
    }
}

/// Translate a decoded error body into the error taxonomy.
pub fn from_error_response(
    status: StatusCode,
    error_response: &ErrorResponse,
    resource: Resource<'_>,
    context: &str,
) -> PullqError {
    let mapped = match error_response.error.as_str() {
        "topic_not_found" => Some(match detail(error_response, "topic") {
            Some(topic) => PullqError::topic_not_found(topic),
            None => PullqError::topic_not_found(match resource {
                Resource::Topic(name) => name,
                _ => "",
            }),
        }),
        "subscription_not_found" => Some(match detail(error_response, "subscription") {
            Some(subscription) => PullqError::subscription_not_found(subscription),
            None => PullqError::subscription_not_found(match resource {
                Resource::Subscription(name) => name,
                _ => "",
            }),
        }),
        "conflict" => {
            if let Some(topic) = detail(error_response, "topic") {
                Some(PullqError::TopicAlreadyExists {
                    topic: topic.to_string(),
                })
            } else if let Some(subscription) = detail(error_response, "subscription") {
                Some(PullqError::SubscriptionAlreadyExists {
                    subscription: subscription.to_string(),
                })
            } else {
                conflict(resource)
            }
        }
        "invalid_config" | "invalid_parameter" | "validation_error" => {
            let field = detail(error_response, "field")
                .or_else(|| detail(error_response, "parameter"))
                .unwrap_or("request");
            Some(PullqError::invalid_config(field, &error_response.message))
        }
        _ => None,
    };

    mapped.unwrap_or_else(|| from_status(status, &error_response.message, resource, context))
}

/// Classify a failure from its status alone.
pub fn from_status(
    status: StatusCode,
    reason: &str,
    resource: Resource<'_>,
    context: &str,
) -> PullqError {
    let mapped = match status {
        StatusCode::NOT_FOUND => not_found(resource),
        StatusCode::CONFLICT => conflict(resource),
        StatusCode::BAD_REQUEST
        | StatusCode::UNPROCESSABLE_ENTITY
        | StatusCode::UNSUPPORTED_MEDIA_TYPE => Some(PullqError::invalid_config("request", reason)),
        _ => None,
    };
    mapped.unwrap_or_else(|| {
        PullqError::from_transport_error(format!("broker returned {status}: {reason}"), context)
    })
}

/// Consume a non-success response and turn it into a [`PullqError`].
pub async fn error_from_response(
    response: reqwest::Response,
    resource: Resource<'_>,
    context: &str,
) -> PullqError {
    let status = response.status();
    match response.text().await {
        Ok(body) => match serde_json::from_str::<ErrorResponse>(&body) {
            Ok(error_response) => from_error_response(status, &error_response, resource, context),
            Err(parse_error) => {
                debug!("Failed to parse error response for {context} ({status}): {parse_error}");
                from_status(status, body.trim(), resource, context)
            }
        },
        Err(body_error) => from_status(
            status,
            &format!("failed to read response body: {body_error}"),
            resource,
            context,
        ),
    }
}
