use std::fmt;

/// Coarse failure categories every operation reports through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    Conflict,
    InvalidConfig,
    TransportFailure,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PullqError {
    TopicNotFound {
        topic: String,
    },
    SubscriptionNotFound {
        subscription: String,
    },
    TopicAlreadyExists {
        topic: String,
    },
    SubscriptionAlreadyExists {
        subscription: String,
    },
    InvalidConfig {
        field: String,
        reason: String,
    },
    /// Connectivity, protocol or decoding failure between client and broker.
    Transport {
        context: String,
        reason: String,
    },
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::NotFound => write!(f, "not found"),
            ErrorKind::Conflict => write!(f, "conflict"),
            ErrorKind::InvalidConfig => write!(f, "invalid config"),
            ErrorKind::TransportFailure => write!(f, "transport failure"),
        }
    }
}

impl fmt::Display for PullqError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PullqError::TopicNotFound { topic } => write!(f, "Topic '{topic}' not found"),
            PullqError::SubscriptionNotFound { subscription } => {
                write!(f, "Subscription '{subscription}' not found")
            }
            PullqError::TopicAlreadyExists { topic } => {
                write!(f, "Topic '{topic}' already exists")
            }
            PullqError::SubscriptionAlreadyExists { subscription } => {
                write!(f, "Subscription '{subscription}' already exists")
            }
            PullqError::InvalidConfig { field, reason } => {
                write!(f, "Invalid config field '{field}': {reason}")
            }
            PullqError::Transport { context, reason } => {
                write!(f, "Transport error in {context}: {reason}")
            }
        }
    }
}

impl std::error::Error for PullqError {}

impl PullqError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PullqError::TopicNotFound { .. } | PullqError::SubscriptionNotFound { .. } => {
                ErrorKind::NotFound
            }
            PullqError::TopicAlreadyExists { .. } | PullqError::SubscriptionAlreadyExists { .. } => {
                ErrorKind::Conflict
            }
            PullqError::InvalidConfig { .. } => ErrorKind::InvalidConfig,
            PullqError::Transport { .. } => ErrorKind::TransportFailure,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }

    pub fn is_conflict(&self) -> bool {
        self.kind() == ErrorKind::Conflict
    }

    /// True for failures caused by the request rather than the broker or the network.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, PullqError::Transport { .. })
    }

    pub fn topic_not_found(topic: &str) -> Self {
        PullqError::TopicNotFound {
            topic: topic.to_string(),
        }
    }

    pub fn subscription_not_found(subscription: &str) -> Self {
        PullqError::SubscriptionNotFound {
            subscription: subscription.to_string(),
        }
    }

    pub fn invalid_config(field: &str, reason: impl fmt::Display) -> Self {
        PullqError::InvalidConfig {
            field: field.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn from_transport_error(e: impl fmt::Display, context: &str) -> Self {
        PullqError::Transport {
            context: context.to_string(),
            reason: e.to_string(),
        }
    }
}
