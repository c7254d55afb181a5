//! Intent actions and their creators.

use crate::action::BusAction;
use postal_bus::{BusError, Envelope};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Callback producing a follow-up action.
pub type FollowUp<A> = Arc<dyn Fn() -> A + Send + Sync>;

/// Callback turning a request outcome into a follow-up action.
pub type OutcomeFollowUp<A> = Arc<dyn Fn(Result<Value, BusError>) -> A + Send + Sync>;

/// Broadcast `payload` on `topic` and report whether anyone was listening.
pub struct SendMessage<A> {
    pub(crate) topic: String,
    pub(crate) payload: Value,
    pub(crate) on_complete: Option<FollowUp<A>>,
    pub(crate) on_no_subscribers: Option<FollowUp<A>>,
}

impl<A> SendMessage<A> {
    /// Dispatch `f()` after publishing, if at least one subscriber matched.
    #[must_use]
    pub fn on_complete<F>(mut self, f: F) -> Self
    where
        F: Fn() -> A + Send + Sync + 'static,
    {
        self.on_complete = Some(Arc::new(f));
        self
    }

    /// Dispatch `f()` after publishing, if no subscriber matched.
    #[must_use]
    pub fn on_no_subscribers<F>(mut self, f: F) -> Self
    where
        F: Fn() -> A + Send + Sync + 'static,
    {
        self.on_no_subscribers = Some(Arc::new(f));
        self
    }

    #[must_use]
    pub fn topic(&self) -> &str {
        &self.topic
    }

    #[must_use]
    pub fn payload(&self) -> &Value {
        &self.payload
    }
}

/// Send `payload` on `topic` and wait for a single reply.
pub struct RequestMessage<A> {
    pub(crate) topic: String,
    pub(crate) payload: Value,
    pub(crate) on_complete: Option<OutcomeFollowUp<A>>,
    pub(crate) on_no_subscribers: Option<FollowUp<A>>,
}

impl<A> RequestMessage<A> {
    /// Dispatch `f(outcome)` once the request resolves or fails.
    #[must_use]
    pub fn on_complete<F>(mut self, f: F) -> Self
    where
        F: Fn(Result<Value, BusError>) -> A + Send + Sync + 'static,
    {
        self.on_complete = Some(Arc::new(f));
        self
    }

    /// Accepted for parity with [`SendMessage`]. Requests never consult it:
    /// a missing responder arrives as an `Err` in `on_complete`.
    #[must_use]
    pub fn on_no_subscribers<F>(mut self, f: F) -> Self
    where
        F: Fn() -> A + Send + Sync + 'static,
    {
        self.on_no_subscribers = Some(Arc::new(f));
        self
    }

    #[must_use]
    pub fn topic(&self) -> &str {
        &self.topic
    }

    #[must_use]
    pub fn payload(&self) -> &Value {
        &self.payload
    }
}

// Manual impls: callbacks are shared, so `A` needs neither Clone nor Debug.

impl<A> Clone for SendMessage<A> {
    fn clone(&self) -> Self {
        Self {
            topic: self.topic.clone(),
            payload: self.payload.clone(),
            on_complete: self.on_complete.clone(),
            on_no_subscribers: self.on_no_subscribers.clone(),
        }
    }
}

impl<A> Clone for RequestMessage<A> {
    fn clone(&self) -> Self {
        Self {
            topic: self.topic.clone(),
            payload: self.payload.clone(),
            on_complete: self.on_complete.clone(),
            on_no_subscribers: self.on_no_subscribers.clone(),
        }
    }
}

fn placeholder<T>(callback: &Option<T>) -> &'static str {
    if callback.is_some() {
        "<callback>"
    } else {
        "None"
    }
}

impl<A> fmt::Debug for SendMessage<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SendMessage")
            .field("topic", &self.topic)
            .field("payload", &self.payload)
            .field("on_complete", &placeholder(&self.on_complete))
            .field("on_no_subscribers", &placeholder(&self.on_no_subscribers))
            .finish()
    }
}

impl<A> fmt::Debug for RequestMessage<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestMessage")
            .field("topic", &self.topic)
            .field("payload", &self.payload)
            .field("on_complete", &placeholder(&self.on_complete))
            .field("on_no_subscribers", &placeholder(&self.on_no_subscribers))
            .finish()
    }
}

/// Create a send intent with no callbacks.
pub fn send_message<A>(topic: impl Into<String>, payload: Value) -> SendMessage<A> {
    SendMessage {
        topic: topic.into(),
        payload,
        on_complete: None,
        on_no_subscribers: None,
    }
}

/// Create a request intent with no callbacks.
pub fn request_message<A>(topic: impl Into<String>, payload: Value) -> RequestMessage<A> {
    RequestMessage {
        topic: topic.into(),
        payload,
        on_complete: None,
        on_no_subscribers: None,
    }
}

/// Create the action the standing subscription dispatches for `envelope`.
pub fn receive_message<A: BusAction>(envelope: Envelope) -> A {
    A::message_received(envelope)
}
