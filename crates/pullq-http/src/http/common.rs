//! HTTP API request and response types

use pullq::{Message, PullqError, Subscription, Topic};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =============================================================================
// PUBLISH API TYPES
// =============================================================================

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct RawMessage {
    pub data: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct PublishRequest {
    pub raw_messages: Vec<RawMessage>,
}

impl PublishRequest {
    pub fn new<I, S>(payloads: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            raw_messages: payloads
                .into_iter()
                .map(|data| RawMessage { data: data.into() })
                .collect(),
        }
    }
}

/// Message ids, used both for publish results and for ack requests and results.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct MessageIdsResponse {
    pub message_ids: Vec<Uuid>,
}

pub type AckRequest = MessageIdsResponse;

// =============================================================================
// PULL API TYPES
// =============================================================================

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct PullRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_messages: Option<usize>,
}

impl PullRequest {
    /// Requested batch size, capped at [`limits::MAX_PULL_MESSAGES`].
    pub fn capped_max_messages(&self) -> Option<usize> {
        self.max_messages
            .map(|max_messages| max_messages.min(limits::MAX_PULL_MESSAGES))
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct PullResponse {
    pub messages: Vec<Message>,
}

// =============================================================================
// LISTING TYPES
// =============================================================================

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct TopicsResponse {
    pub topics: Vec<Topic>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SubscriptionsResponse {
    pub subscriptions: Vec<Subscription>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SubscriptionNamesResponse {
    pub subscription_names: Vec<String>,
}

// =============================================================================
// ERRORS
// =============================================================================

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorResponse {
    pub fn new(error: &str, message: &str) -> Self {
        Self {
            error: error.to_string(),
            message: message.to_string(),
            details: None,
        }
    }

    pub fn with_details(error: &str, message: &str, details: serde_json::Value) -> Self {
        Self {
            error: error.to_string(),
            message: message.to_string(),
            details: Some(details),
        }
    }

    pub fn invalid_parameter(param_name: &str, message: &str) -> Self {
        Self::with_details(
            "invalid_parameter",
            message,
            serde_json::json!({ "parameter": param_name }),
        )
    }

    pub fn topic_not_found(topic: &str) -> Self {
        Self::with_details(
            "topic_not_found",
            &format!("Topic '{topic}' not found"),
            serde_json::json!({ "topic": topic }),
        )
    }

    pub fn subscription_not_found(subscription: &str) -> Self {
        Self::with_details(
            "subscription_not_found",
            &format!("Subscription '{subscription}' not found"),
            serde_json::json!({ "subscription": subscription }),
        )
    }

    pub fn internal_error(message: &str) -> Self {
        Self::new("internal_error", message)
    }

    pub fn invalid_name(parameter: &str, value: &str) -> Self {
        Self::with_details(
            "invalid_parameter",
            "Name must contain only alphanumeric characters, dots, underscores, and hyphens",
            serde_json::json!({ "parameter": parameter, "value": value }),
        )
    }
}

impl From<PullqError> for ErrorResponse {
    fn from(err: PullqError) -> Self {
        match err {
            PullqError::TopicNotFound { topic } => Self::topic_not_found(&topic),
            PullqError::SubscriptionNotFound { subscription } => {
                Self::subscription_not_found(&subscription)
            }
            PullqError::TopicAlreadyExists { topic } => Self::with_details(
                "conflict",
                &format!("Topic '{topic}' already exists"),
                serde_json::json!({ "topic": topic }),
            ),
            PullqError::SubscriptionAlreadyExists { subscription } => Self::with_details(
                "conflict",
                &format!("Subscription '{subscription}' already exists"),
                serde_json::json!({ "subscription": subscription }),
            ),
            PullqError::InvalidConfig { field, reason } => Self::with_details(
                "invalid_config",
                &format!("Invalid config field '{field}': {reason}"),
                serde_json::json!({ "field": field, "reason": reason }),
            ),
            PullqError::Transport { context, reason } => {
                Self::internal_error(&format!("Transport error in {context}: {reason}"))
            }
        }
    }
}

// =============================================================================
// VALIDATION
// =============================================================================

pub mod limits {
    /// Maximum length of topic and subscription names.
    pub const MAX_NAME_LENGTH: usize = 255;
    /// Maximum number of messages in one publish request.
    pub const MAX_BATCH_SIZE: usize = 1000;
    /// Maximum payload size in bytes (1MB).
    pub const MAX_DATA_SIZE: usize = 1_048_576;
    pub const MAX_PULL_MESSAGES: usize = 1000;
}

fn validate_name(parameter: &str, name: &str) -> Result<(), ErrorResponse> {
    if name.is_empty() || name.len() > limits::MAX_NAME_LENGTH {
        return Err(ErrorResponse::invalid_parameter(
            parameter,
            &format!(
                "Name must be between 1 and {} characters",
                limits::MAX_NAME_LENGTH
            ),
        ));
    }
    if name
        .chars()
        .any(|ch| !ch.is_alphanumeric() && ch != '.' && ch != '_' && ch != '-')
    {
        return Err(ErrorResponse::invalid_name(parameter, name));
    }
    Ok(())
}

pub fn validate_topic_name(topic: &str) -> Result<(), ErrorResponse> {
    validate_name("topic", topic)
}

pub fn validate_subscription_name(subscription: &str) -> Result<(), ErrorResponse> {
    validate_name("subscription", subscription)
}

pub fn validate_publish_request(request: &PublishRequest) -> Result<(), ErrorResponse> {
    if request.raw_messages.len() > limits::MAX_BATCH_SIZE {
        return Err(ErrorResponse::with_details(
            "validation_error",
            &format!(
                "Batch size exceeds maximum of {} messages (got {})",
                limits::MAX_BATCH_SIZE,
                request.raw_messages.len()
            ),
            serde_json::json!({ "field": "raw_messages", "max_size": limits::MAX_BATCH_SIZE, "actual_size": request.raw_messages.len() }),
        ));
    }
    for (index, message) in request.raw_messages.iter().enumerate() {
        if message.data.len() > limits::MAX_DATA_SIZE {
            return Err(ErrorResponse::with_details(
                "validation_error",
                &format!(
                    "Message at index {} data exceeds maximum length of {} bytes (got {})",
                    index,
                    limits::MAX_DATA_SIZE,
                    message.data.len()
                ),
                serde_json::json!({
                    "field": format!("raw_messages[{}].data", index), "max_size": limits::MAX_DATA_SIZE, "actual_size": message.data.len()
                }),
            ));
        }
    }
    Ok(())
}
