//! pullq HTTP broker binary

use clap::Parser;
use pullq::{BrokerConfig, broker::config::defaults, telemetry};
use pullq_http::broker::start_broker;
use std::net::SocketAddr;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "broker", version, about = "pullq HTTP broker")]
struct Args {
    /// Bind address (IP)
    #[arg(long, env = "PULLQ_ADDR", default_value = "127.0.0.1")]
    addr: String,

    /// Port to listen on
    #[arg(long, env = "PULLQ_PORT", default_value_t = 8080)]
    port: u16,

    /// Idle seconds before a topic is reclaimed, 0 disables
    #[arg(long, default_value_t = defaults::TOPIC_TTL)]
    default_topic_ttl: u32,

    /// Idle seconds before a subscription is reclaimed, 0 disables
    #[arg(long, default_value_t = defaults::SUBSCRIPTION_TTL)]
    default_subscription_ttl: u32,

    /// Seconds a message lives, 0 disables
    #[arg(long, default_value_t = defaults::MESSAGE_TTL)]
    default_message_ttl: u32,

    #[arg(long, default_value_t = defaults::ACK_DEADLINE)]
    default_ack_deadline: u32,

    /// Messages returned by a pull that does not ask for a count
    #[arg(long, default_value_t = defaults::MAX_MESSAGES)]
    default_max_messages: usize,

    /// Milliseconds between cleanup sweeps
    #[arg(long, default_value_t = defaults::SWEEP_INTERVAL_MS)]
    sweep_interval: u64,
}

impl Args {
    fn broker_config(&self) -> BrokerConfig {
        BrokerConfig {
            default_topic_ttl: self.default_topic_ttl,
            default_subscription_ttl: self.default_subscription_ttl,
            default_message_ttl: self.default_message_ttl,
            default_ack_deadline: self.default_ack_deadline,
            default_max_messages: self.default_max_messages,
            sweep_interval: Duration::from_millis(self.sweep_interval.max(1)),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    telemetry::init();

    let args = Args::parse();
    let addr: SocketAddr = format!("{}:{}", args.addr, args.port).parse()?;

    start_broker(addr, args.broker_config()).await
}
