//! Broker trait definitions.

use crate::{
    Message, PullqError, Subscription, SubscriptionCreateConfig, SubscriptionUpdateConfig, Topic,
    TopicCreateConfig, TopicUpdateConfig,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Activity of a single topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicMetrics {
    /// Unexpired messages currently retained by the topic.
    pub messages: usize,
    pub messages_all_time: u64,
    pub expired_all_time: u64,
    pub subscriptions: usize,
}

/// Activity of a single subscription.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionMetrics {
    pub topic: String,
    /// Messages not yet acknowledged, reserved or not.
    pub pending: usize,
    pub reserved: usize,
    pub pulled_all_time: u64,
    /// Pulls that redelivered a message whose deadline had passed.
    pub pulled_retries_all_time: u64,
    /// Ids submitted for acknowledgement.
    pub acks_all_time: u64,
    /// Ids actually acknowledged.
    pub acked_all_time: u64,
}

/// Counters describing broker activity since start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrokerMetrics {
    pub start_time: DateTime<Utc>,
    pub topics_all_time: u64,
    pub subscriptions_all_time: u64,
    pub messages_published: u64,
    pub messages_pulled: u64,
    pub messages_acked: u64,
    pub messages_expired: u64,
    pub topics: HashMap<String, TopicMetrics>,
    pub subscriptions: HashMap<String, SubscriptionMetrics>,
}

/// What a single [`Broker::sweep`] pass reclaimed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub topics_removed: usize,
    pub subscriptions_removed: usize,
    pub messages_expired: usize,
}

impl SweepReport {
    pub fn is_empty(&self) -> bool {
        self.topics_removed == 0 && self.subscriptions_removed == 0 && self.messages_expired == 0
    }
}

/// Server-side operations of a pull-based pub/sub broker.
///
/// All operations are atomic with respect to each other. A message reserved by
/// one `pull` is never returned by a concurrent `pull` on the same subscription
/// until its ack deadline passes.
pub trait Broker: Send + Sync {
    /// Create a topic. An empty `name` asks the broker to generate a UUID name.
    fn create_topic(&self, name: &str, config: &TopicCreateConfig) -> Result<Topic, PullqError>;

    /// Apply the fields present in `config` and return the updated topic.
    fn update_topic(&self, name: &str, config: &TopicUpdateConfig) -> Result<Topic, PullqError>;

    /// Delete a topic together with every subscription bound to it.
    fn delete_topic(&self, name: &str) -> Result<(), PullqError>;

    fn get_topic(&self, name: &str) -> Result<Topic, PullqError>;

    fn list_topics(&self) -> Vec<Topic>;

    /// Names of the subscriptions bound to `name`, sorted.
    fn topic_subscriptions(&self, name: &str) -> Result<Vec<String>, PullqError>;

    /// Publish a batch of payloads and return one id per payload, in input order.
    fn publish(&self, topic: &str, data: Vec<String>) -> Result<Vec<Uuid>, PullqError>;

    /// Create a subscription. An empty `name` asks the broker to generate a UUID name.
    fn create_subscription(
        &self,
        name: &str,
        config: &SubscriptionCreateConfig,
    ) -> Result<Subscription, PullqError>;

    fn update_subscription(
        &self,
        name: &str,
        config: &SubscriptionUpdateConfig,
    ) -> Result<Subscription, PullqError>;

    fn delete_subscription(&self, name: &str) -> Result<(), PullqError>;

    fn get_subscription(&self, name: &str) -> Result<Subscription, PullqError>;

    fn list_subscriptions(&self) -> Vec<Subscription>;

    /// Reserve up to `max_messages` messages, falling back to the broker default.
    fn pull(
        &self,
        subscription: &str,
        max_messages: Option<usize>,
    ) -> Result<Vec<Message>, PullqError>;

    /// Acknowledge reserved messages and return the ids that were accepted.
    fn ack(&self, subscription: &str, ids: &[Uuid]) -> Result<Vec<Uuid>, PullqError>;

    /// Reclaim idle topics and subscriptions and drop expired messages.
    fn sweep(&self) -> SweepReport;

    fn metrics(&self) -> BrokerMetrics;
}
