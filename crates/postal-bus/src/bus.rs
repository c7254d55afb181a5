//! # Bus Contract
//!
//! The four operations consumers of the bus depend on. Implementations own
//! delivery, topic matching and request routing; consumers take an
//! `Arc<dyn MessageBus>` so a substitute can be passed in tests.

use crate::envelope::Envelope;
use crate::error::BusError;
use async_trait::async_trait;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// Callback invoked once per delivered envelope.
///
/// May be called from whatever context the bus delivers in, so it must not
/// block.
pub type EnvelopeHandler = Arc<dyn Fn(Envelope) + Send + Sync>;

/// Trait for a channel/topic addressed publish/subscribe bus.
#[async_trait]
pub trait MessageBus: Send + Sync {
    /// Register `handler` for every message on `channel` whose topic matches
    /// the `topic` binding.
    ///
    /// The returned handle unsubscribes when dropped.
    fn subscribe(
        &self,
        channel: &str,
        topic: &str,
        handler: EnvelopeHandler,
    ) -> Result<Subscription, BusError>;

    /// Broadcast `payload`. Delivery outcome is not reported.
    fn publish(&self, channel: &str, topic: &str, payload: Value);

    /// Number of subscriptions matching `channel`/`topic` right now.
    ///
    /// The count can change as soon as this returns.
    fn subscriber_count(&self, channel: &str, topic: &str) -> usize;

    /// Send `payload` to a responder and wait for its reply.
    async fn request(&self, channel: &str, topic: &str, payload: Value) -> Result<Value, BusError>;
}

/// A subscription handle.
///
/// When dropped, the subscription is released.
pub struct Subscription {
    id: Uuid,
    channel: String,
    topic: String,
    release: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    /// Create a handle that runs `release` when dropped.
    pub fn new(
        channel: impl Into<String>,
        topic: impl Into<String>,
        release: impl FnOnce() + Send + Sync + 'static,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            channel: channel.into(),
            topic: topic.into(),
            release: Some(Box::new(release)),
        }
    }

    /// Unique id of this handle.
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Channel the subscription listens on.
    #[must_use]
    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// Topic binding of the subscription.
    #[must_use]
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Release the subscription now.
    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("channel", &self.channel)
            .field("topic", &self.topic)
            .finish()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
        debug!(channel = %self.channel, topic = %self.topic, "Subscription dropped");
    }
}
