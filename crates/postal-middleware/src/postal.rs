//! # Postal Middleware
//!
//! Routes intent actions onto the bus and turns bus outcomes back into
//! dispatched actions.
//!
//! | Intent  | Bus call                                   | Follow-up                                  |
//! |---------|--------------------------------------------|--------------------------------------------|
//! | Send    | `subscriber_count`, then `publish` always  | `on_complete` if count > 0, else `on_no_subscribers` |
//! | Request | `request` in a spawned task                | `on_complete(Ok(v))` or `on_complete(Err(e))` |
//! | other   | none                                       | forwarded to `next`                        |
//!
//! At construction the middleware opens one standing subscription on the
//! configured channel/topic. Every inbound message is dispatched as a
//! received-message action. The subscription is released when the
//! middleware is dropped.
//!
//! A request is issued when its spawned task first runs, after `handle` has
//! returned. A send dispatched right behind a request can therefore reach
//! the bus before the request does.
//!
//! The subscriber count is read before publishing and can be stale by the
//! time the publish lands. Callers that need exact delivery confirmation
//! should use a request instead.

use crate::action::{BusAction, Classified};
use crate::config::PostalConfig;
use crate::error::MiddlewareError;
use crate::intent::{RequestMessage, SendMessage};
use crate::middleware::{Dispatcher, Middleware, Next};
use postal_bus::{Envelope, EnvelopeHandler, MessageBus, Subscription};
use postal_telemetry::{FOLLOW_UP_DISPATCHES, MESSAGES_PUBLISHED, MESSAGES_RECEIVED, REQUESTS};
use std::sync::Arc;
use tokio::runtime::Handle;
use tracing::{debug, info, warn};

/// Replacement for the default inbound-message handler.
pub type SubscriptionHandler<A> = Arc<dyn Fn(Envelope, &Dispatcher<A>) + Send + Sync>;

/// Middleware bridging the dispatch pipeline and a [`MessageBus`].
pub struct PostalMiddleware<A> {
    mode: Mode<A>,
}

enum Mode<A> {
    PassThrough,
    Active(Route<A>),
}

struct Route<A> {
    channel: String,
    bus: Arc<dyn MessageBus>,
    dispatcher: Dispatcher<A>,
    runtime: Handle,
    _subscription: Subscription,
}

impl<A: BusAction> PostalMiddleware<A> {
    /// Build with the default subscription handler.
    pub fn new(
        config: PostalConfig,
        bus: Arc<dyn MessageBus>,
        dispatcher: Dispatcher<A>,
    ) -> Result<Self, MiddlewareError> {
        Self::builder(config).build(bus, dispatcher)
    }

    pub fn builder(config: PostalConfig) -> PostalMiddlewareBuilder<A> {
        PostalMiddlewareBuilder {
            config,
            subscription_handler: None,
        }
    }

    /// Whether intents are routed to the bus.
    #[must_use]
    pub fn is_active(&self) -> bool {
        matches!(self.mode, Mode::Active(_))
    }
}

/// Builder for [`PostalMiddleware`].
pub struct PostalMiddlewareBuilder<A> {
    config: PostalConfig,
    subscription_handler: Option<SubscriptionHandler<A>>,
}

impl<A: BusAction> PostalMiddlewareBuilder<A> {
    /// Handle inbound messages with `handler` instead of dispatching a
    /// received-message action for each.
    #[must_use]
    pub fn subscription_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(Envelope, &Dispatcher<A>) + Send + Sync + 'static,
    {
        self.subscription_handler = Some(Arc::new(handler));
        self
    }

    /// Subscribe and return the middleware.
    ///
    /// Without a configured channel nothing is subscribed and the result
    /// forwards every action unchanged.
    pub fn build(
        self,
        bus: Arc<dyn MessageBus>,
        dispatcher: Dispatcher<A>,
    ) -> Result<PostalMiddleware<A>, MiddlewareError> {
        let Some(channel) = self.config.channel else {
            debug!("No channel configured, postal middleware forwards all actions");
            return Ok(PostalMiddleware {
                mode: Mode::PassThrough,
            });
        };

        if self.config.topic.is_empty() {
            return Err(MiddlewareError::MissingTopic { channel });
        }

        let runtime = Handle::try_current().map_err(|_| MiddlewareError::NoRuntime)?;

        let handler: EnvelopeHandler = {
            let dispatcher = dispatcher.clone();
            let label = channel.clone();
            match self.subscription_handler {
                Some(custom) => Arc::new(move |envelope: Envelope| {
                    MESSAGES_RECEIVED.with_label_values(&[label.as_str()]).inc();
                    custom(envelope, &dispatcher);
                }),
                None => Arc::new(move |envelope: Envelope| {
                    MESSAGES_RECEIVED.with_label_values(&[label.as_str()]).inc();
                    dispatcher.dispatch(A::message_received(envelope));
                }),
            }
        };

        let subscription = bus
            .subscribe(&channel, &self.config.topic, handler)
            .map_err(MiddlewareError::Subscribe)?;

        info!(
            channel = %channel,
            topic = %self.config.topic,
            "Postal middleware subscribed"
        );

        Ok(PostalMiddleware {
            mode: Mode::Active(Route {
                channel,
                bus,
                dispatcher,
                runtime,
                _subscription: subscription,
            }),
        })
    }
}

impl<A: BusAction> Route<A> {
    fn send(&self, intent: SendMessage<A>) {
        let SendMessage {
            topic,
            payload,
            on_complete,
            on_no_subscribers,
        } = intent;

        let subscribers = self.bus.subscriber_count(&self.channel, &topic);
        self.bus.publish(&self.channel, &topic, payload);
        MESSAGES_PUBLISHED.with_label_values(&[self.channel.as_str()]).inc();

        debug!(
            channel = %self.channel,
            topic = %topic,
            subscribers = subscribers,
            "Message sent"
        );

        let follow_up = if subscribers > 0 {
            on_complete.map(|f| ("complete", f()))
        } else {
            on_no_subscribers.map(|f| ("no_subscribers", f()))
        };

        if let Some((kind, action)) = follow_up {
            FOLLOW_UP_DISPATCHES.with_label_values(&[kind]).inc();
            self.dispatcher.dispatch(action);
        }
    }

    fn request(&self, intent: RequestMessage<A>) {
        let RequestMessage {
            topic,
            payload,
            on_complete,
            ..
        } = intent;

        let bus = Arc::clone(&self.bus);
        let channel = self.channel.clone();
        let dispatcher = self.dispatcher.clone();

        self.runtime.spawn(async move {
            let outcome = bus.request(&channel, &topic, payload).await;

            match &outcome {
                Ok(_) => {
                    REQUESTS.with_label_values(&["ok"]).inc();
                    debug!(channel = %channel, topic = %topic, "Request resolved");
                }
                Err(e) => {
                    REQUESTS.with_label_values(&["error"]).inc();
                    warn!(channel = %channel, topic = %topic, error = %e, "Request failed");
                }
            }

            if let Some(on_complete) = on_complete {
                FOLLOW_UP_DISPATCHES.with_label_values(&["complete"]).inc();
                dispatcher.dispatch(on_complete(outcome));
            }
        });
    }
}

impl<A: BusAction> Middleware<A> for PostalMiddleware<A> {
    fn handle(&self, action: A, next: Next<'_, A>) {
        let route = match &self.mode {
            Mode::PassThrough => {
                next.run(action);
                return;
            }
            Mode::Active(route) => route,
        };

        match action.classify() {
            Classified::Send(intent) => route.send(intent),
            Classified::Request(intent) => route.request(intent),
            Classified::PassThrough(action) => next.run(action),
        }
    }
}
