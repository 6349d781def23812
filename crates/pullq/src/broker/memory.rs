//! In-memory broker implementation.

use crate::{
    Message, PullqError, Subscription, SubscriptionCreateConfig, SubscriptionUpdateConfig, Topic,
    TopicCreateConfig, TopicUpdateConfig,
    broker::{
        config::BrokerConfig,
        delivery::{DeliveryQueue, StoredMessage},
        r#trait::{Broker, BrokerMetrics, SubscriptionMetrics, SweepReport, TopicMetrics},
    },
};
use chrono::{DateTime, Duration, Utc};
use log::{debug, info, trace};
use parking_lot::RwLock;
use std::collections::{BTreeSet, HashMap, VecDeque};
use std::sync::Arc;
use uuid::Uuid;

/// In-memory implementation of the [`Broker`] trait.
///
/// All state sits behind a single lock, so every operation observes and
/// produces a consistent view. Cloning yields another handle to the same
/// broker.
#[derive(Debug, Clone)]
pub struct InMemoryBroker {
    config: BrokerConfig,
    state: Arc<RwLock<BrokerState>>,
    start_time: DateTime<Utc>,
}

#[derive(Debug)]
struct TopicState {
    topic: Topic,
    /// Every unexpired message, kept for historical subscriptions.
    log: VecDeque<Arc<StoredMessage>>,
    subscriptions: BTreeSet<String>,
    messages_all_time: u64,
    expired_all_time: u64,
}

#[derive(Debug)]
struct SubscriptionState {
    subscription: Subscription,
    queue: DeliveryQueue,
    delivery: DeliveryCounters,
}

#[derive(Debug, Default)]
struct DeliveryCounters {
    pulled: u64,
    retries: u64,
    acks: u64,
    acked: u64,
}

#[derive(Debug, Default)]
struct Counters {
    topics_all_time: u64,
    subscriptions_all_time: u64,
    published: u64,
    pulled: u64,
    acked: u64,
    expired: u64,
}

#[derive(Debug, Default)]
struct BrokerState {
    topics: HashMap<String, TopicState>,
    subscriptions: HashMap<String, SubscriptionState>,
    next_sequence: u64,
    counters: Counters,
}

impl BrokerState {
    fn remove_subscription(&mut self, name: &str) -> Option<SubscriptionState> {
        let removed = self.subscriptions.remove(name)?;
        if let Some(topic) = self.topics.get_mut(&removed.subscription.topic) {
            topic.subscriptions.remove(name);
        }
        Some(removed)
    }

    /// Remove a topic and its subscriptions, returning how many subscriptions went with it.
    fn remove_topic(&mut self, name: &str) -> Option<usize> {
        let removed = self.topics.remove(name)?;
        let mut cascaded = 0;
        for subscription in &removed.subscriptions {
            if self.subscriptions.remove(subscription).is_some() {
                cascaded += 1;
            }
        }
        Some(cascaded)
    }
}

fn idle_expired(updated: DateTime<Utc>, ttl: u32, now: DateTime<Utc>) -> bool {
    ttl != 0 && now.signed_duration_since(updated) >= Duration::seconds(i64::from(ttl))
}

fn resolve_name(name: &str) -> String {
    if name.is_empty() {
        Uuid::new_v4().to_string()
    } else {
        name.to_string()
    }
}

impl InMemoryBroker {
    pub fn new() -> Self {
        Self::with_config(BrokerConfig::default())
    }

    pub fn with_config(config: BrokerConfig) -> Self {
        Self {
            config,
            state: Arc::new(RwLock::new(BrokerState::default())),
            start_time: Utc::now(),
        }
    }

    pub fn config(&self) -> &BrokerConfig {
        &self.config
    }
}

impl Default for InMemoryBroker {
    fn default() -> Self {
        Self::new()
    }
}

impl Broker for InMemoryBroker {
    // ===== TOPICS =====

    fn create_topic(&self, name: &str, config: &TopicCreateConfig) -> Result<Topic, PullqError> {
        let name = resolve_name(name);
        let now = Utc::now();
        let mut state = self.state.write();

        if state.topics.contains_key(&name) {
            return Err(PullqError::TopicAlreadyExists { topic: name });
        }

        let topic = Topic {
            name: name.clone(),
            message_ttl: config
                .message_ttl
                .unwrap_or(self.config.default_message_ttl),
            ttl: config.ttl.unwrap_or(self.config.default_topic_ttl),
            created: now,
            updated: now,
        };
        state.topics.insert(
            name,
            TopicState {
                topic: topic.clone(),
                log: VecDeque::new(),
                subscriptions: BTreeSet::new(),
                messages_all_time: 0,
                expired_all_time: 0,
            },
        );
        state.counters.topics_all_time += 1;

        info!("Created topic '{}'", topic.name);
        Ok(topic)
    }

    fn update_topic(&self, name: &str, config: &TopicUpdateConfig) -> Result<Topic, PullqError> {
        let mut state = self.state.write();
        let entry = state
            .topics
            .get_mut(name)
            .ok_or_else(|| PullqError::topic_not_found(name))?;

        if let Some(message_ttl) = config.message_ttl {
            entry.topic.message_ttl = message_ttl;
        }
        if let Some(ttl) = config.ttl {
            entry.topic.ttl = ttl;
        }
        entry.topic.updated = Utc::now();

        debug!("Updated topic '{name}'");
        Ok(entry.topic.clone())
    }

    fn delete_topic(&self, name: &str) -> Result<(), PullqError> {
        let cascaded = self
            .state
            .write()
            .remove_topic(name)
            .ok_or_else(|| PullqError::topic_not_found(name))?;

        info!("Deleted topic '{name}' and {cascaded} subscriptions");
        Ok(())
    }

    fn get_topic(&self, name: &str) -> Result<Topic, PullqError> {
        self.state
            .read()
            .topics
            .get(name)
            .map(|entry| entry.topic.clone())
            .ok_or_else(|| PullqError::topic_not_found(name))
    }

    fn list_topics(&self) -> Vec<Topic> {
        let mut topics: Vec<Topic> = self
            .state
            .read()
            .topics
            .values()
            .map(|entry| entry.topic.clone())
            .collect();
        topics.sort_by(|a, b| a.name.cmp(&b.name));
        topics
    }

    fn topic_subscriptions(&self, name: &str) -> Result<Vec<String>, PullqError> {
        self.state
            .read()
            .topics
            .get(name)
            .map(|entry| entry.subscriptions.iter().cloned().collect())
            .ok_or_else(|| PullqError::topic_not_found(name))
    }

    #[tracing::instrument(level = "debug", skip(self, data), fields(topic = %topic, count = data.len()))]
    fn publish(&self, topic: &str, data: Vec<String>) -> Result<Vec<Uuid>, PullqError> {
        let now = Utc::now();
        let mut guard = self.state.write();
        let state = &mut *guard;

        let entry = state
            .topics
            .get_mut(topic)
            .ok_or_else(|| PullqError::topic_not_found(topic))?;

        let mut ids = Vec::with_capacity(data.len());
        for payload in data {
            state.next_sequence += 1;
            let message = Arc::new(StoredMessage::new(state.next_sequence, payload, now));
            for name in &entry.subscriptions {
                if let Some(subscription) = state.subscriptions.get_mut(name) {
                    subscription.queue.enqueue(Arc::clone(&message));
                }
            }
            ids.push(message.id);
            entry.log.push_back(message);
        }
        entry.topic.updated = now;
        entry.messages_all_time += ids.len() as u64;
        state.counters.published += ids.len() as u64;

        trace!(
            "Published {} messages to '{}' fanned out to {} subscriptions",
            ids.len(),
            topic,
            entry.subscriptions.len()
        );
        Ok(ids)
    }

    // ===== SUBSCRIPTIONS =====

    fn create_subscription(
        &self,
        name: &str,
        config: &SubscriptionCreateConfig,
    ) -> Result<Subscription, PullqError> {
        if config.topic.is_empty() {
            return Err(PullqError::invalid_config("topic", "must not be empty"));
        }

        let name = resolve_name(name);
        let now = Utc::now();
        let mut guard = self.state.write();
        let state = &mut *guard;

        let topic = state
            .topics
            .get_mut(&config.topic)
            .ok_or_else(|| PullqError::topic_not_found(&config.topic))?;

        if state.subscriptions.contains_key(&name) {
            return Err(PullqError::SubscriptionAlreadyExists { subscription: name });
        }

        let mut queue = DeliveryQueue::new();
        if config.historical.unwrap_or(false) {
            let message_ttl = topic.topic.message_ttl;
            topic
                .log
                .iter()
                .filter(|message| !message.is_expired(message_ttl, now))
                .for_each(|message| queue.enqueue(Arc::clone(message)));
        }

        let subscription = Subscription {
            name: name.clone(),
            topic: config.topic.clone(),
            ack_deadline: config
                .ack_deadline
                .unwrap_or(self.config.default_ack_deadline),
            ttl: config.ttl.unwrap_or(self.config.default_subscription_ttl),
            created: now,
            updated: now,
        };
        topic.subscriptions.insert(name.clone());
        info!(
            "Created subscription '{}' on topic '{}' with {} backlog messages",
            name,
            config.topic,
            queue.len()
        );
        state.subscriptions.insert(
            name,
            SubscriptionState {
                subscription: subscription.clone(),
                queue,
                delivery: DeliveryCounters::default(),
            },
        );
        state.counters.subscriptions_all_time += 1;

        Ok(subscription)
    }

    fn update_subscription(
        &self,
        name: &str,
        config: &SubscriptionUpdateConfig,
    ) -> Result<Subscription, PullqError> {
        let mut state = self.state.write();
        let entry = state
            .subscriptions
            .get_mut(name)
            .ok_or_else(|| PullqError::subscription_not_found(name))?;

        if let Some(ack_deadline) = config.ack_deadline {
            entry.subscription.ack_deadline = ack_deadline;
        }
        if let Some(ttl) = config.ttl {
            entry.subscription.ttl = ttl;
        }
        entry.subscription.updated = Utc::now();

        debug!("Updated subscription '{name}'");
        Ok(entry.subscription.clone())
    }

    fn delete_subscription(&self, name: &str) -> Result<(), PullqError> {
        self.state
            .write()
            .remove_subscription(name)
            .ok_or_else(|| PullqError::subscription_not_found(name))?;

        info!("Deleted subscription '{name}'");
        Ok(())
    }

    fn get_subscription(&self, name: &str) -> Result<Subscription, PullqError> {
        self.state
            .read()
            .subscriptions
            .get(name)
            .map(|entry| entry.subscription.clone())
            .ok_or_else(|| PullqError::subscription_not_found(name))
    }

    fn list_subscriptions(&self) -> Vec<Subscription> {
        let mut subscriptions: Vec<Subscription> = self
            .state
            .read()
            .subscriptions
            .values()
            .map(|entry| entry.subscription.clone())
            .collect();
        subscriptions.sort_by(|a, b| a.name.cmp(&b.name));
        subscriptions
    }

    // ===== DELIVERY =====

    #[tracing::instrument(level = "debug", skip(self), fields(subscription = %subscription))]
    fn pull(
        &self,
        subscription: &str,
        max_messages: Option<usize>,
    ) -> Result<Vec<Message>, PullqError> {
        let max_messages = max_messages.unwrap_or(self.config.default_max_messages);
        let now = Utc::now();
        let mut guard = self.state.write();
        let state = &mut *guard;

        let entry = state
            .subscriptions
            .get_mut(subscription)
            .ok_or_else(|| PullqError::subscription_not_found(subscription))?;

        let message_ttl = state
            .topics
            .get(&entry.subscription.topic)
            .map_or(0, |topic| topic.topic.message_ttl);
        entry.queue.purge_expired(message_ttl, now);

        let messages = entry
            .queue
            .reserve(max_messages, entry.subscription.ack_deadline, now);
        entry.subscription.updated = now;
        entry.delivery.pulled += messages.len() as u64;
        entry.delivery.retries += messages.iter().filter(|m| m.tries > 1).count() as u64;
        state.counters.pulled += messages.len() as u64;

        trace!(
            "Pulled {} of {} requested from '{}', {} pending, {} reserved",
            messages.len(),
            max_messages,
            subscription,
            entry.queue.pending_len(),
            entry.queue.reserved_len()
        );
        Ok(messages)
    }

    #[tracing::instrument(level = "debug", skip(self, ids), fields(subscription = %subscription, count = ids.len()))]
    fn ack(&self, subscription: &str, ids: &[Uuid]) -> Result<Vec<Uuid>, PullqError> {
        let now = Utc::now();
        let mut guard = self.state.write();
        let state = &mut *guard;

        let entry = state
            .subscriptions
            .get_mut(subscription)
            .ok_or_else(|| PullqError::subscription_not_found(subscription))?;

        let ack_deadline = entry.subscription.ack_deadline;
        let acked: Vec<Uuid> = ids
            .iter()
            .copied()
            .filter(|id| entry.queue.ack(id, ack_deadline, now))
            .collect();
        entry.subscription.updated = now;
        entry.delivery.acks += ids.len() as u64;
        entry.delivery.acked += acked.len() as u64;
        state.counters.acked += acked.len() as u64;

        trace!(
            "Acked {} of {} ids on '{}'",
            acked.len(),
            ids.len(),
            subscription
        );
        Ok(acked)
    }

    // ===== MAINTENANCE =====

    fn sweep(&self) -> SweepReport {
        let now = Utc::now();
        let mut guard = self.state.write();
        let state = &mut *guard;
        let mut report = SweepReport::default();

        let idle_subscriptions: Vec<String> = state
            .subscriptions
            .values()
            .filter(|s| idle_expired(s.subscription.updated, s.subscription.ttl, now))
            .map(|s| s.subscription.name.clone())
            .collect();
        for name in idle_subscriptions {
            if state.remove_subscription(&name).is_some() {
                debug!("Reclaimed idle subscription '{name}'");
                report.subscriptions_removed += 1;
            }
        }

        let idle_topics: Vec<String> = state
            .topics
            .values()
            .filter(|t| idle_expired(t.topic.updated, t.topic.ttl, now))
            .map(|t| t.topic.name.clone())
            .collect();
        for name in idle_topics {
            if let Some(cascaded) = state.remove_topic(&name) {
                debug!("Reclaimed idle topic '{name}' and {cascaded} subscriptions");
                report.topics_removed += 1;
                report.subscriptions_removed += cascaded;
            }
        }

        for topic in state.topics.values_mut() {
            let message_ttl = topic.topic.message_ttl;
            if message_ttl == 0 {
                continue;
            }
            let before = topic.log.len();
            topic
                .log
                .retain(|message| !message.is_expired(message_ttl, now));
            let expired = before - topic.log.len();
            topic.expired_all_time += expired as u64;
            report.messages_expired += expired;

            for name in &topic.subscriptions {
                if let Some(subscription) = state.subscriptions.get_mut(name) {
                    subscription.queue.purge_expired(message_ttl, now);
                }
            }
        }
        state.counters.expired += report.messages_expired as u64;

        report
    }

    fn metrics(&self) -> BrokerMetrics {
        let state = self.state.read();
        BrokerMetrics {
            start_time: self.start_time,
            topics_all_time: state.counters.topics_all_time,
            subscriptions_all_time: state.counters.subscriptions_all_time,
            messages_published: state.counters.published,
            messages_pulled: state.counters.pulled,
            messages_acked: state.counters.acked,
            messages_expired: state.counters.expired,
            topics: state
                .topics
                .iter()
                .map(|(name, entry)| {
                    let metrics = TopicMetrics {
                        messages: entry.log.len(),
                        messages_all_time: entry.messages_all_time,
                        expired_all_time: entry.expired_all_time,
                        subscriptions: entry.subscriptions.len(),
                    };
                    (name.clone(), metrics)
                })
                .collect(),
            subscriptions: state
                .subscriptions
                .iter()
                .map(|(name, entry)| {
                    let metrics = SubscriptionMetrics {
                        topic: entry.subscription.topic.clone(),
                        pending: entry.queue.len(),
                        reserved: entry.queue.reserved_len(),
                        pulled_all_time: entry.delivery.pulled,
                        pulled_retries_all_time: entry.delivery.retries,
                        acks_all_time: entry.delivery.acks,
                        acked_all_time: entry.delivery.acked,
                    };
                    (name.clone(), metrics)
                })
                .collect(),
        }
    }
}
