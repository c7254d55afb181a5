//! Fakes shared by the unit tests.

use crate::middleware::Dispatcher;
use async_trait::async_trait;
use parking_lot::Mutex;
use postal_bus::{BusError, Envelope, EnvelopeHandler, MessageBus, Subscription};
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

/// One call made against the fake bus.
#[derive(Debug, Clone, PartialEq)]
pub enum BusCall {
    Subscribe { channel: String, topic: String },
    Publish { channel: String, topic: String, payload: Value },
    SubscriberCount { channel: String, topic: String },
    Request { channel: String, topic: String, payload: Value },
}

/// Bus that records every call and answers from scripted values.
pub struct RecordingBus {
    calls: Mutex<Vec<BusCall>>,
    subscribers: AtomicUsize,
    request_outcome: Mutex<Result<Value, BusError>>,
    subscribe_error: Option<BusError>,
    handlers: Mutex<Vec<EnvelopeHandler>>,
    released: Arc<AtomicUsize>,
}

impl RecordingBus {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            subscribers: AtomicUsize::new(0),
            request_outcome: Mutex::new(Ok(Value::Null)),
            subscribe_error: None,
            handlers: Mutex::new(Vec::new()),
            released: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with_subscribers(self, count: usize) -> Self {
        self.subscribers.store(count, Ordering::SeqCst);
        self
    }

    pub fn with_request_outcome(self, outcome: Result<Value, BusError>) -> Self {
        *self.request_outcome.lock() = outcome;
        self
    }

    pub fn failing_subscribe(mut self, error: BusError) -> Self {
        self.subscribe_error = Some(error);
        self
    }

    pub fn calls(&self) -> Vec<BusCall> {
        self.calls.lock().clone()
    }

    pub fn publishes(&self) -> Vec<BusCall> {
        self.calls()
            .into_iter()
            .filter(|c| matches!(c, BusCall::Publish { .. }))
            .collect()
    }

    pub fn requests(&self) -> Vec<BusCall> {
        self.calls()
            .into_iter()
            .filter(|c| matches!(c, BusCall::Request { .. }))
            .collect()
    }

    /// Number of subscription handles dropped so far.
    pub fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }

    /// Hand `envelope` to every registered handler, as an inbound message.
    pub fn deliver(&self, envelope: Envelope) {
        let handlers = self.handlers.lock().clone();
        for handler in handlers {
            handler(envelope.clone());
        }
    }

    fn record(&self, call: BusCall) {
        self.calls.lock().push(call);
    }
}

#[async_trait]
impl MessageBus for RecordingBus {
    fn subscribe(
        &self,
        channel: &str,
        topic: &str,
        handler: EnvelopeHandler,
    ) -> Result<Subscription, BusError> {
        self.record(BusCall::Subscribe {
            channel: channel.to_string(),
            topic: topic.to_string(),
        });
        if let Some(error) = &self.subscribe_error {
            return Err(error.clone());
        }
        self.handlers.lock().push(handler);
        let released = Arc::clone(&self.released);
        Ok(Subscription::new(channel, topic, move || {
            released.fetch_add(1, Ordering::SeqCst);
        }))
    }

    fn publish(&self, channel: &str, topic: &str, payload: Value) {
        self.record(BusCall::Publish {
            channel: channel.to_string(),
            topic: topic.to_string(),
            payload,
        });
    }

    fn subscriber_count(&self, channel: &str, topic: &str) -> usize {
        self.record(BusCall::SubscriberCount {
            channel: channel.to_string(),
            topic: topic.to_string(),
        });
        self.subscribers.load(Ordering::SeqCst)
    }

    async fn request(&self, channel: &str, topic: &str, payload: Value) -> Result<Value, BusError> {
        self.record(BusCall::Request {
            channel: channel.to_string(),
            topic: topic.to_string(),
            payload,
        });
        self.request_outcome.lock().clone()
    }
}

/// Dispatcher that forwards every action into a channel the test reads.
pub fn recording_dispatcher<A: Send + 'static>() -> (Dispatcher<A>, mpsc::UnboundedReceiver<A>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let dispatcher = Dispatcher::new(move |action| {
        let _ = tx.send(action);
    });
    (dispatcher, rx)
}
