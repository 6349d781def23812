//! CLI interface for the pullq HTTP client

use super::client::PullqClient;
use clap::{Args, Parser, Subcommand};
use pullq::{
    PullqError, SubscriptionCreateConfig, SubscriptionUpdateConfig, TopicCreateConfig,
    TopicUpdateConfig,
};
use serde_json::{Value, json};
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(name = "client")]
#[command(about = "pullq client")]
#[command(version)]
pub struct Cli {
    /// Broker base URL
    #[arg(short, long, env = "PULLQ_URL", default_value = "http://127.0.0.1:8080")]
    pub url: String,
    /// Request timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Heartbeat,
    Metrics,
    #[command(subcommand)]
    Topic(TopicCommands),
    #[command(subcommand)]
    Subscription(SubscriptionCommands),
}

#[derive(Args, Debug, Default)]
pub struct TopicSettings {
    #[arg(long)]
    pub message_ttl: Option<u32>,
    #[arg(long)]
    pub ttl: Option<u32>,
}

#[derive(Subcommand, Debug)]
pub enum TopicCommands {
    /// Create a topic; the broker picks a UUID name when none is given
    Create {
        name: Option<String>,
        #[command(flatten)]
        settings: TopicSettings,
    },
    Update {
        name: String,
        #[command(flatten)]
        settings: TopicSettings,
    },
    Delete {
        name: String,
    },
    Get {
        name: String,
    },
    List,
    /// List the subscriptions bound to a topic
    Subscriptions {
        name: String,
    },
    Publish {
        topic: String,
        #[arg(required = true)]
        data: Vec<String>,
    },
}

#[derive(Args, Debug, Default)]
pub struct SubscriptionSettings {
    #[arg(long)]
    pub ack_deadline: Option<u32>,
    #[arg(long)]
    pub ttl: Option<u32>,
}

#[derive(Subcommand, Debug)]
pub enum SubscriptionCommands {
    /// Create a subscription; the broker picks a UUID name when none is given
    Create {
        name: Option<String>,
        #[arg(long)]
        topic: String,
        #[arg(long)]
        historical: bool,
        #[command(flatten)]
        settings: SubscriptionSettings,
    },
    Update {
        name: String,
        #[command(flatten)]
        settings: SubscriptionSettings,
    },
    Delete {
        name: String,
    },
    Get {
        name: String,
    },
    List,
    Pull {
        name: String,
        #[arg(long, default_value_t = 1)]
        max_messages: usize,
    },
    Ack {
        name: String,
        #[arg(required = true)]
        ids: Vec<Uuid>,
    },
}

impl From<TopicSettings> for TopicCreateConfig {
    fn from(settings: TopicSettings) -> Self {
        Self {
            message_ttl: settings.message_ttl,
            ttl: settings.ttl,
        }
    }
}

impl From<TopicSettings> for TopicUpdateConfig {
    fn from(settings: TopicSettings) -> Self {
        Self {
            message_ttl: settings.message_ttl,
            ttl: settings.ttl,
        }
    }
}

impl From<SubscriptionSettings> for SubscriptionUpdateConfig {
    fn from(settings: SubscriptionSettings) -> Self {
        Self {
            ack_deadline: settings.ack_deadline,
            ttl: settings.ttl,
        }
    }
}

pub async fn handle_topic_command(
    client: &PullqClient,
    command: TopicCommands,
) -> Result<Value, PullqError> {
    match command {
        TopicCommands::Create { name, settings } => {
            let config = TopicCreateConfig::from(settings);
            let topic = match name {
                Some(name) => client.create_topic(&name, &config).await?,
                None => client.create_topic_with_uuid(&config).await?,
            };
            Ok(json!(topic))
        }
        TopicCommands::Update { name, settings } => {
            Ok(json!(client.update_topic(&name, &settings.into()).await?))
        }
        TopicCommands::Delete { name } => {
            client.delete_topic(&name).await?;
            Ok(json!({ "deleted": name }))
        }
        TopicCommands::Get { name } => Ok(json!(client.get_topic(&name).await?)),
        TopicCommands::List => Ok(json!({ "topics": client.list_topics().await? })),
        TopicCommands::Subscriptions { name } => Ok(json!({
            "subscription_names": client.topic_subscriptions(&name).await?
        })),
        TopicCommands::Publish { topic, data } => Ok(json!({
            "message_ids": client.publish_batch(&topic, data).await?
        })),
    }
}

pub async fn handle_subscription_command(
    client: &PullqClient,
    command: SubscriptionCommands,
) -> Result<Value, PullqError> {
    match command {
        SubscriptionCommands::Create {
            name,
            topic,
            historical,
            settings,
        } => {
            let mut config = SubscriptionCreateConfig::new(&topic).with_historical(historical);
            config.ack_deadline = settings.ack_deadline;
            config.ttl = settings.ttl;
            let subscription = match name {
                Some(name) => client.create_subscription(&name, &config).await?,
                None => client.create_subscription_with_uuid(&config).await?,
            };
            Ok(json!(subscription))
        }
        SubscriptionCommands::Update { name, settings } => {
            Ok(json!(client.update_subscription(&name, &settings.into()).await?))
        }
        SubscriptionCommands::Delete { name } => {
            client.delete_subscription(&name).await?;
            Ok(json!({ "deleted": name }))
        }
        SubscriptionCommands::Get { name } => {
            Ok(json!(client.get_subscription(&name).await?))
        }
        SubscriptionCommands::List => Ok(json!({
            "subscriptions": client.list_subscriptions().await?
        })),
        SubscriptionCommands::Pull { name, max_messages } => Ok(json!({
            "messages": client.pull(&name, max_messages).await?
        })),
        SubscriptionCommands::Ack { name, ids } => {
            let acked = client.ack_batch(&name, &ids).await?;
            // Keep the caller's order in the output
            let message_ids: Vec<Uuid> = ids.into_iter().filter(|id| acked.contains(id)).collect();
            Ok(json!({ "message_ids": message_ids }))
        }
    }
}

/// Run one CLI command and return its result as JSON.
pub async fn handle_cli_command(
    client: &PullqClient,
    command: Commands,
) -> Result<Value, PullqError> {
    match command {
        Commands::Heartbeat => Ok(json!({ "alive": client.heartbeat().await })),
        Commands::Metrics => Ok(json!(client.metrics().await?)),
        Commands::Topic(topic_cmd) => handle_topic_command(client, topic_cmd).await,
        Commands::Subscription(subscription_cmd) => {
            handle_subscription_command(client, subscription_cmd).await
        }
    }
}
