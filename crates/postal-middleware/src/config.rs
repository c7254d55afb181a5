//! Middleware configuration.

use serde::{Deserialize, Serialize};
use std::env;

/// Where the standing subscription listens.
///
/// Without a channel the middleware is a pure pass-through. With one, the
/// topic binding is required: building fails with
/// [`MiddlewareError::MissingTopic`](crate::MiddlewareError::MissingTopic)
/// when it is empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostalConfig {
    /// Bus channel for intents and the standing subscription.
    pub channel: Option<String>,
    /// Topic binding of the standing subscription.
    pub topic: String,
}

impl PostalConfig {
    /// Bridge `channel`, listening on the `topic` binding.
    ///
    /// A binding that covers the topics this store sends to makes the
    /// store its own subscriber for them.
    pub fn new(channel: impl Into<String>, topic: impl Into<String>) -> Self {
        Self {
            channel: Some(channel.into()),
            topic: topic.into(),
        }
    }

    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `POSTAL_CHANNEL`: bus channel (default: unset, pass-through)
    /// - `POSTAL_TOPIC`: subscription binding (required with a channel)
    pub fn from_env() -> Self {
        Self {
            channel: env::var("POSTAL_CHANNEL").ok().filter(|c| !c.is_empty()),
            topic: env::var("POSTAL_TOPIC").unwrap_or_default(),
        }
    }

    /// Whether intents are routed to the bus.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.channel.is_some()
    }
}
