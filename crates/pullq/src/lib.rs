use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod broker;
pub mod error;
pub mod telemetry;

pub use broker::{
    Broker, BrokerConfig, BrokerMetrics, InMemoryBroker, SubscriptionMetrics, SweepReport,
    TopicMetrics,
};
pub use error::{ErrorKind, PullqError};

// Re-export logging macros for consistent usage across the crate
pub use log::{debug, error, info, trace, warn};

// =============================================================================
// CORE DATA STRUCTURES
// =============================================================================

/// A named channel messages are published into.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topic {
    /// Unique name of the topic.
    pub name: String,
    /// Message time to live in seconds, 0 disables expiry.
    pub message_ttl: u32,
    /// Idle time to live of the topic in seconds, 0 disables reclamation.
    pub ttl: u32,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

/// A topic-bound channel from which messages are pulled and acknowledged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    /// Unique name of the subscription.
    pub name: String,
    /// Name of the topic this subscription is bound to. Never changes.
    pub topic: String,
    /// Seconds a pulled message stays reserved before it can be redelivered.
    pub ack_deadline: u32,
    /// Idle time to live of the subscription in seconds, 0 disables reclamation.
    pub ttl: u32,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

/// A message as delivered to a subscription.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    /// Time the message was published.
    pub time: DateTime<Utc>,
    /// Number of times this message has been delivered to the subscription.
    pub tries: u32,
    pub data: String,
}

// =============================================================================
// RESOURCE CONFIGS
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicCreateConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_ttl: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl: Option<u32>,
}

impl TopicCreateConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_message_ttl(mut self, message_ttl: u32) -> Self {
        self.message_ttl = Some(message_ttl);
        self
    }

    pub fn with_ttl(mut self, ttl: u32) -> Self {
        self.ttl = Some(ttl);
        self
    }
}

/// Partial topic update; only fields that are `Some` are applied.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicUpdateConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_ttl: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl: Option<u32>,
}

impl TopicUpdateConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_message_ttl(mut self, message_ttl: u32) -> Self {
        self.message_ttl = Some(message_ttl);
        self
    }

    pub fn with_ttl(mut self, ttl: u32) -> Self {
        self.ttl = Some(ttl);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionCreateConfig {
    #[serde(default)]
    pub topic: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ack_deadline: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl: Option<u32>,
    /// Start from the messages already on the topic instead of only new ones.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub historical: Option<bool>,
}

impl SubscriptionCreateConfig {
    pub fn new(topic: &str) -> Self {
        Self {
            topic: topic.to_string(),
            ..Self::default()
        }
    }

    pub fn with_ack_deadline(mut self, ack_deadline: u32) -> Self {
        self.ack_deadline = Some(ack_deadline);
        self
    }

    pub fn with_ttl(mut self, ttl: u32) -> Self {
        self.ttl = Some(ttl);
        self
    }

    pub fn with_historical(mut self, historical: bool) -> Self {
        self.historical = Some(historical);
        self
    }
}

/// Partial subscription update; the topic binding is not updatable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionUpdateConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ack_deadline: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl: Option<u32>,
}

impl SubscriptionUpdateConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ack_deadline(mut self, ack_deadline: u32) -> Self {
        self.ack_deadline = Some(ack_deadline);
        self
    }

    pub fn with_ttl(mut self, ttl: u32) -> Self {
        self.ttl = Some(ttl);
        self
    }
}
