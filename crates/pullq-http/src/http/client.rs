//! Typed HTTP client for a pullq broker

use super::common::{
    MessageIdsResponse, PublishRequest, PullRequest, PullResponse, SubscriptionNamesResponse,
    SubscriptionsResponse, TopicsResponse,
};
use super::error::{Resource, error_from_response};
use log::{debug, trace};
use pullq::{
    BrokerMetrics, Message, PullqError, Subscription, SubscriptionCreateConfig,
    SubscriptionUpdateConfig, Topic, TopicCreateConfig, TopicUpdateConfig,
};
use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::collections::HashSet;
use std::time::Duration;
use uuid::Uuid;

pub mod defaults {
    pub const API_PREFIX: &str = "/api/v0";
    pub const TOPICS_PATH: &str = "/topics/";
    pub const SUBSCRIPTIONS_PATH: &str = "/subscriptions/";
    pub const HEARTBEAT_PATH: &str = "/heartbeat";
    pub const METRICS_PATH: &str = "/metrics";
}

/// Where and how the client reaches the broker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Scheme, host and port, e.g. `http://127.0.0.1:8080`.
    pub base_url: String,
    pub api_prefix: String,
    /// Collection path for topics, ending in `/`.
    pub topics_path: String,
    /// Collection path for subscriptions, ending in `/`.
    pub subscriptions_path: String,
    pub heartbeat_path: String,
    pub metrics_path: String,
    /// Per-request timeout; `None` waits indefinitely.
    pub timeout: Option<Duration>,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_prefix: defaults::API_PREFIX.to_string(),
            topics_path: defaults::TOPICS_PATH.to_string(),
            subscriptions_path: defaults::SUBSCRIPTIONS_PATH.to_string(),
            heartbeat_path: defaults::HEARTBEAT_PATH.to_string(),
            metrics_path: defaults::METRICS_PATH.to_string(),
            timeout: None,
        }
    }

    pub fn with_api_prefix(mut self, api_prefix: impl Into<String>) -> Self {
        self.api_prefix = api_prefix.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}{}", self.base_url, self.api_prefix, path)
    }
}

/// Client for a pullq broker's REST API.
///
/// Every call is a single request/response exchange. Failures are returned
/// immediately as [`PullqError`] values and never retried.
#[derive(Debug, Clone)]
pub struct PullqClient {
    config: ClientConfig,
    http: reqwest::Client,
}

impl PullqClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, PullqError> {
        Self::with_config(ClientConfig::new(base_url))
    }

    pub fn with_config(config: ClientConfig) -> Result<Self, PullqError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| PullqError::from_transport_error(e, "client construction"))?;
        Ok(Self { config, http })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    // ===== URLS =====

    fn topics_url(&self) -> String {
        self.config.endpoint(&self.config.topics_path)
    }

    fn topic_url(&self, topic: &str) -> String {
        format!("{}{}", self.topics_url(), urlencoding::encode(topic))
    }

    fn subscriptions_url(&self) -> String {
        self.config.endpoint(&self.config.subscriptions_path)
    }

    fn subscription_url(&self, subscription: &str) -> String {
        format!(
            "{}{}",
            self.subscriptions_url(),
            urlencoding::encode(subscription)
        )
    }

    // ===== TRANSPORT =====

    async fn execute(
        &self,
        request: RequestBuilder,
        resource: Resource<'_>,
        context: &str,
    ) -> Result<Response, PullqError> {
        let response = request
            .send()
            .await
            .map_err(|e| PullqError::from_transport_error(e, context))?;
        trace!("{context} -> {}", response.status());
        if response.status().is_success() {
            Ok(response)
        } else {
            Err(error_from_response(response, resource, context).await)
        }
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        resource: Resource<'_>,
        context: &str,
    ) -> Result<T, PullqError> {
        self.execute(request, resource, context)
            .await?
            .json::<T>()
            .await
            .map_err(|e| PullqError::from_transport_error(e, context))
    }

    // ===== TOPICS =====

    pub async fn create_topic(
        &self,
        name: &str,
        config: &TopicCreateConfig,
    ) -> Result<Topic, PullqError> {
        let request = self.http.put(self.topic_url(name)).json(config);
        self.send(request, Resource::Topic(name), "create_topic")
            .await
    }

    /// Create a topic named by the broker.
    pub async fn create_topic_with_uuid(
        &self,
        config: &TopicCreateConfig,
    ) -> Result<Topic, PullqError> {
        let request = self.http.put(self.topics_url()).json(config);
        self.send(request, Resource::None, "create_topic").await
    }

    pub async fn update_topic(
        &self,
        name: &str,
        config: &TopicUpdateConfig,
    ) -> Result<Topic, PullqError> {
        let request = self.http.patch(self.topic_url(name)).json(config);
        self.send(request, Resource::Topic(name), "update_topic")
            .await
    }

    pub async fn delete_topic(&self, name: &str) -> Result<(), PullqError> {
        let request = self.http.delete(self.topic_url(name));
        self.execute(request, Resource::Topic(name), "delete_topic")
            .await
            .map(|_| ())
    }

    pub async fn get_topic(&self, name: &str) -> Result<Topic, PullqError> {
        let request = self.http.get(self.topic_url(name));
        self.send(request, Resource::Topic(name), "get_topic").await
    }

    pub async fn list_topics(&self) -> Result<Vec<Topic>, PullqError> {
        let request = self.http.get(self.topics_url());
        self.send::<TopicsResponse>(request, Resource::None, "list_topics")
            .await
            .map(|response| response.topics)
    }

    /// Names of the subscriptions currently bound to `name`.
    pub async fn topic_subscriptions(&self, name: &str) -> Result<Vec<String>, PullqError> {
        let request = self
            .http
            .get(format!("{}/subscriptions", self.topic_url(name)));
        self.send::<SubscriptionNamesResponse>(request, Resource::Topic(name), "topic_subscriptions")
            .await
            .map(|response| response.subscription_names)
    }

    /// Publish one payload and return its message id.
    pub async fn publish(&self, topic: &str, data: impl Into<String>) -> Result<Uuid, PullqError> {
        let data: String = data.into();
        self.publish_batch(topic, [data])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| {
                PullqError::from_transport_error("broker returned no message id", "publish")
            })
    }

    /// Publish several payloads; ids come back in input order.
    pub async fn publish_batch<I, S>(&self, topic: &str, payloads: I) -> Result<Vec<Uuid>, PullqError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let body = PublishRequest::new(payloads);
        debug!(
            "Publishing {} messages to topic '{}'",
            body.raw_messages.len(),
            topic
        );
        let request = self
            .http
            .post(format!("{}/publish", self.topic_url(topic)))
            .json(&body);
        self.send::<MessageIdsResponse>(request, Resource::Topic(topic), "publish")
            .await
            .map(|response| response.message_ids)
    }

    // ===== SUBSCRIPTIONS =====

    pub async fn create_subscription(
        &self,
        name: &str,
        config: &SubscriptionCreateConfig,
    ) -> Result<Subscription, PullqError> {
        let request = self.http.put(self.subscription_url(name)).json(config);
        self.send(request, Resource::Subscription(name), "create_subscription")
            .await
    }

    /// Create a subscription named by the broker.
    pub async fn create_subscription_with_uuid(
        &self,
        config: &SubscriptionCreateConfig,
    ) -> Result<Subscription, PullqError> {
        let request = self.http.put(self.subscriptions_url()).json(config);
        self.send(request, Resource::None, "create_subscription")
            .await
    }

    pub async fn update_subscription(
        &self,
        name: &str,
        config: &SubscriptionUpdateConfig,
    ) -> Result<Subscription, PullqError> {
        let request = self.http.patch(self.subscription_url(name)).json(config);
        self.send(request, Resource::Subscription(name), "update_subscription")
            .await
    }

    pub async fn delete_subscription(&self, name: &str) -> Result<(), PullqError> {
        let request = self.http.delete(self.subscription_url(name));
        self.execute(request, Resource::Subscription(name), "delete_subscription")
            .await
            .map(|_| ())
    }

    pub async fn get_subscription(&self, name: &str) -> Result<Subscription, PullqError> {
        let request = self.http.get(self.subscription_url(name));
        self.send(request, Resource::Subscription(name), "get_subscription")
            .await
    }

    pub async fn list_subscriptions(&self) -> Result<Vec<Subscription>, PullqError> {
        let request = self.http.get(self.subscriptions_url());
        self.send::<SubscriptionsResponse>(request, Resource::None, "list_subscriptions")
            .await
            .map(|response| response.subscriptions)
    }

    // ===== DELIVERY =====

    /// Reserve up to `max_messages` messages from `subscription`.
    pub async fn pull(
        &self,
        subscription: &str,
        max_messages: usize,
    ) -> Result<Vec<Message>, PullqError> {
        let body = PullRequest {
            max_messages: Some(max_messages),
        };
        let request = self
            .http
            .post(format!("{}/pull", self.subscription_url(subscription)))
            .json(&body);
        self.send::<PullResponse>(request, Resource::Subscription(subscription), "pull")
            .await
            .map(|response| response.messages)
    }

    pub async fn pull_one(&self, subscription: &str) -> Result<Option<Message>, PullqError> {
        Ok(self.pull(subscription, 1).await?.into_iter().next())
    }

    /// Acknowledge one message; true when the broker accepted it.
    pub async fn ack(&self, subscription: &str, id: Uuid) -> Result<bool, PullqError> {
        Ok(self.ack_batch(subscription, &[id]).await?.contains(&id))
    }

    /// Acknowledge several messages and return the ids the broker accepted.
    pub async fn ack_batch(
        &self,
        subscription: &str,
        ids: &[Uuid],
    ) -> Result<HashSet<Uuid>, PullqError> {
        let body = MessageIdsResponse {
            message_ids: ids.to_vec(),
        };
        let request = self
            .http
            .post(format!("{}/ack", self.subscription_url(subscription)))
            .json(&body);
        self.send::<MessageIdsResponse>(request, Resource::Subscription(subscription), "ack")
            .await
            .map(|response| response.message_ids.into_iter().collect())
    }

    // ===== METADATA =====

    /// True when the broker answers its heartbeat endpoint.
    pub async fn heartbeat(&self) -> bool {
        let request = self
            .http
            .get(self.config.endpoint(&self.config.heartbeat_path));
        match self.execute(request, Resource::None, "heartbeat").await {
            Ok(_) => true,
            Err(err) => {
                debug!("Heartbeat failed: {err}");
                false
            }
        }
    }

    pub async fn metrics(&self) -> Result<BrokerMetrics, PullqError> {
        let request = self
            .http
            .get(self.config.endpoint(&self.config.metrics_path));
        self.send(request, Resource::None, "metrics").await
    }
}
