//! # In-Memory Bus
//!
//! Single-process implementation of [`MessageBus`].
//!
//! Delivery is synchronous: `publish` runs every matching handler before it
//! returns. The handler list is snapshotted first, so handlers may publish,
//! subscribe or drop their own subscription without deadlocking.

use crate::bus::{EnvelopeHandler, MessageBus, Subscription};
use crate::config::BusConfig;
use crate::envelope::Envelope;
use crate::error::{BusError, ConfigError};
use crate::pending::{sweep_loop, PendingRequestStore};
use crate::topic::TopicBinding;
use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use uuid::Uuid;

struct Registration {
    id: Uuid,
    channel: String,
    binding: TopicBinding,
    handler: EnvelopeHandler,
}

impl Registration {
    fn matches(&self, channel: &str, topic: &str) -> bool {
        self.channel == channel && self.binding.matches(topic)
    }
}

/// In-memory implementation of the message bus.
///
/// Suitable for single-process use and tests; a networked deployment would
/// put a broker behind the same trait.
pub struct InMemoryBus {
    registrations: Arc<RwLock<Vec<Registration>>>,

    /// Requests waiting for a reply.
    pending: Arc<PendingRequestStore>,

    /// Total messages published.
    messages_published: AtomicU64,

    config: BusConfig,
}

impl InMemoryBus {
    /// Create a bus with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(BusConfig::default())
    }

    /// Create a bus after checking `config`.
    pub fn try_with_config(config: BusConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::with_config(config))
    }

    /// Create a bus with the given configuration, unchecked.
    ///
    /// A zero cleanup interval is raised to
    /// [`MIN_SWEEP_INTERVAL`](crate::pending::MIN_SWEEP_INTERVAL) by the sweep.
    #[must_use]
    pub fn with_config(config: BusConfig) -> Self {
        Self {
            registrations: Arc::new(RwLock::new(Vec::new())),
            pending: Arc::new(PendingRequestStore::new(config.request_timeout())),
            messages_published: AtomicU64::new(0),
            config,
        }
    }

    /// Get the bus configuration.
    #[must_use]
    pub fn config(&self) -> &BusConfig {
        &self.config
    }

    /// Get the total number of messages published.
    #[must_use]
    pub fn messages_published(&self) -> u64 {
        self.messages_published.load(Ordering::Relaxed)
    }

    /// Get access to the pending request store.
    #[must_use]
    pub fn pending(&self) -> &Arc<PendingRequestStore> {
        &self.pending
    }

    /// Spawn the sweep that drops requests whose requester went away.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn_cleanup(&self) -> JoinHandle<()> {
        tokio::spawn(sweep_loop(
            Arc::clone(&self.pending),
            self.config.cleanup_interval(),
        ))
    }

    /// Answer a request envelope.
    ///
    /// Returns false if the envelope is not a request, or the request was
    /// already answered, timed out or abandoned.
    pub fn reply(&self, envelope: &Envelope, result: Result<Value, BusError>) -> bool {
        match envelope.correlation_id {
            Some(correlation_id) => self.pending.resolve(correlation_id, result),
            None => {
                warn!(
                    channel = %envelope.channel,
                    topic = %envelope.topic,
                    "Reply to an envelope that is not a request"
                );
                false
            }
        }
    }

    /// Subscribe a synchronous responder.
    ///
    /// `responder` runs for request envelopes only; plain publishes on the
    /// same binding are ignored.
    pub fn respond<F>(
        self: &Arc<Self>,
        channel: &str,
        topic: &str,
        responder: F,
    ) -> Result<Subscription, BusError>
    where
        F: Fn(&Envelope) -> Result<Value, BusError> + Send + Sync + 'static,
    {
        let bus: Weak<Self> = Arc::downgrade(self);
        self.subscribe(
            channel,
            topic,
            Arc::new(move |envelope: Envelope| {
                if !envelope.is_request() {
                    return;
                }
                let Some(bus) = bus.upgrade() else {
                    return;
                };
                let result = responder(&envelope);
                bus.reply(&envelope, result);
            }),
        )
    }

    /// Run every handler matching the envelope's address.
    fn deliver(&self, envelope: Envelope) -> usize {
        let handlers: Vec<EnvelopeHandler> = {
            let registrations = self.registrations.read();
            registrations
                .iter()
                .filter(|r| r.matches(&envelope.channel, &envelope.topic))
                .map(|r| Arc::clone(&r.handler))
                .collect()
        };

        for handler in &handlers {
            handler(envelope.clone());
        }

        handlers.len()
    }
}

impl Default for InMemoryBus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MessageBus for InMemoryBus {
    fn subscribe(
        &self,
        channel: &str,
        topic: &str,
        handler: EnvelopeHandler,
    ) -> Result<Subscription, BusError> {
        let binding = TopicBinding::parse(topic)?;
        let id = Uuid::new_v4();

        self.registrations.write().push(Registration {
            id,
            channel: channel.to_string(),
            binding,
            handler,
        });

        debug!(channel = channel, topic = topic, "New subscription created");

        let registrations = Arc::downgrade(&self.registrations);
        Ok(Subscription::new(channel, topic, move || {
            if let Some(registrations) = registrations.upgrade() {
                registrations.write().retain(|r| r.id != id);
            }
        }))
    }

    fn publish(&self, channel: &str, topic: &str, payload: Value) {
        self.messages_published.fetch_add(1, Ordering::Relaxed);

        let receivers = self.deliver(Envelope::new(channel, topic, payload));
        debug!(
            channel = channel,
            topic = topic,
            receivers = receivers,
            "Message published"
        );
    }

    fn subscriber_count(&self, channel: &str, topic: &str) -> usize {
        self.registrations
            .read()
            .iter()
            .filter(|r| r.matches(channel, topic))
            .count()
    }

    async fn request(&self, channel: &str, topic: &str, payload: Value) -> Result<Value, BusError> {
        let ticket = self.pending.open(topic, Some(self.config.request_timeout()));
        let correlation_id = ticket.correlation_id();

        let receivers = self.deliver(Envelope::request(channel, topic, payload, correlation_id));
        if receivers == 0 {
            self.pending.abandon(&correlation_id);
            return Err(BusError::NoResponder {
                channel: channel.to_string(),
                topic: topic.to_string(),
            });
        }

        debug!(
            correlation_id = %correlation_id,
            channel = channel,
            topic = topic,
            receivers = receivers,
            "Request delivered"
        );

        self.pending.await_reply(ticket).await
    }
}
