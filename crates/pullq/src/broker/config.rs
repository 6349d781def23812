use std::time::Duration;

pub mod defaults {
    /// Topics never idle out unless asked to.
    pub const TOPIC_TTL: u32 = 0;
    pub const SUBSCRIPTION_TTL: u32 = 0;
    /// One hour.
    pub const MESSAGE_TTL: u32 = 3600;
    pub const ACK_DEADLINE: u32 = 60;
    pub const MAX_MESSAGES: usize = 1;
    pub const SWEEP_INTERVAL_MS: u64 = 1000;
}

/// Defaults applied when a create or pull request leaves a field out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerConfig {
    pub default_topic_ttl: u32,
    pub default_subscription_ttl: u32,
    pub default_message_ttl: u32,
    pub default_ack_deadline: u32,
    pub default_max_messages: usize,
    /// How often the server runs [`crate::Broker::sweep`].
    pub sweep_interval: Duration,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            default_topic_ttl: defaults::TOPIC_TTL,
            default_subscription_ttl: defaults::SUBSCRIPTION_TTL,
            default_message_ttl: defaults::MESSAGE_TTL,
            default_ack_deadline: defaults::ACK_DEADLINE,
            default_max_messages: defaults::MAX_MESSAGES,
            sweep_interval: Duration::from_millis(defaults::SWEEP_INTERVAL_MS),
        }
    }
}
