//! Broker contract and the in-memory reference broker.

pub mod config;
pub(crate) mod delivery;
pub mod memory;
pub mod r#trait;

// Re-exports for ergonomics
pub use config::BrokerConfig;
pub use memory::InMemoryBroker;
pub use r#trait::{Broker, BrokerMetrics, SubscriptionMetrics, SweepReport, TopicMetrics};
