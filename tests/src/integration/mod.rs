//! Integration flows against [`postal_bus::InMemoryBus`].

pub mod flows;
pub mod request_response;

use parking_lot::Mutex;
use postal_bus::{BusError, InMemoryBus, MessageBus};
use postal_middleware::{
    MiddlewareError, PostalAction, PostalConfig, PostalMiddleware, Store,
};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

/// Application events the fixtures' callbacks produce.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    Delivered(String),
    Unheard(String),
    Answered(Result<Value, BusError>),
}

pub type Action = PostalAction<AppEvent>;

/// State that records everything the reducer saw.
#[derive(Debug, Clone, Default)]
pub struct Recorded {
    /// Topics of received-message actions, in order.
    pub received: Vec<String>,
    pub events: Vec<AppEvent>,
}

pub fn record(state: &mut Recorded, action: &Action) {
    match action {
        PostalAction::ReceiveMessage(envelope) => state.received.push(envelope.topic.clone()),
        PostalAction::App(event) => state.events.push(event.clone()),
        _ => {}
    }
}

/// Store wired to `bus` through the postal middleware.
pub fn postal_store(
    bus: &Arc<InMemoryBus>,
    config: PostalConfig,
) -> Result<Store<Recorded, Action>, MiddlewareError> {
    let bus: Arc<dyn MessageBus> = Arc::clone(bus) as Arc<dyn MessageBus>;
    Store::builder(Recorded::default(), record)
        .middleware(move |dispatcher| PostalMiddleware::new(config, bus, dispatcher))
        .build()
}

/// Poll `store` until `done` holds or a second elapses.
pub async fn wait_until(
    store: &Store<Recorded, Action>,
    done: impl Fn(&Recorded) -> bool,
) -> Recorded {
    let _ = tokio::time::timeout(Duration::from_secs(1), async {
        while !store.with_state(&done) {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await;
    store.state()
}

/// Shared log a test subscriber appends to.
pub fn sink() -> Arc<Mutex<Vec<Value>>> {
    Arc::new(Mutex::new(Vec::new()))
}
