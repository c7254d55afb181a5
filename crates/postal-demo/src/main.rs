//! # Postal Demo
//!
//! Wires a store to the in-memory bus through the postal middleware.
//!
//! ## Startup Sequence
//!
//! 1. Initialize telemetry from the environment
//! 2. Build the bus from a validated configuration
//! 3. Register a responder for `<channel>.lookup`
//! 4. Build the store with the postal middleware
//! 5. Dispatch an unheard send, a self-addressed send and a request, then
//!    wait for the reply
//! 6. Log the final state and metrics

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use postal_bus::{BusConfig, BusError, InMemoryBus, MessageBus};
use postal_middleware::{
    request_message, send_message, PostalAction, PostalConfig, PostalMiddleware, Store,
};
use postal_telemetry::{encode_metrics, init_telemetry, TelemetryConfig};
use serde_json::{json, Value};
use tracing::info;

const DEFAULT_CHANNEL: &str = "orders";

#[derive(Debug, Clone)]
enum DemoEvent {
    Delivered,
    Unheard,
    Lookup(Result<Value, BusError>),
}

type Action = PostalAction<DemoEvent>;

#[derive(Debug, Clone, Default)]
struct DemoState {
    received: Vec<String>,
    delivered: u32,
    unheard: u32,
    lookups: Vec<Result<Value, BusError>>,
}

fn reduce(state: &mut DemoState, action: &Action) {
    match action {
        PostalAction::ReceiveMessage(envelope) => state.received.push(envelope.topic.clone()),
        PostalAction::App(DemoEvent::Delivered) => state.delivered += 1,
        PostalAction::App(DemoEvent::Unheard) => state.unheard += 1,
        PostalAction::App(DemoEvent::Lookup(outcome)) => state.lookups.push(outcome.clone()),
        _ => {}
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let _telemetry = init_telemetry(&TelemetryConfig::from_env())
        .context("failed to initialize telemetry")?;

    let bus = Arc::new(
        InMemoryBus::try_with_config(BusConfig::from_env())
            .context("invalid bus configuration")?,
    );
    let cleanup = bus.spawn_cleanup();

    let mut config = PostalConfig::from_env();
    let channel = config
        .channel
        .get_or_insert_with(|| DEFAULT_CHANNEL.to_string())
        .clone();
    if config.topic.is_empty() {
        config.topic = format!("{channel}.inbox.#");
    }
    let lookup_topic = format!("{channel}.lookup");

    let _responder = bus
        .respond(&channel, &lookup_topic, |envelope| {
            Ok(json!({ "id": envelope.data["id"], "status": "paid" }))
        })
        .context("failed to register responder")?;

    let shared: Arc<dyn MessageBus> = Arc::clone(&bus) as Arc<dyn MessageBus>;
    let store = Store::builder(DemoState::default(), reduce)
        .middleware(move |dispatcher| PostalMiddleware::new(config, shared, dispatcher))
        .build()
        .context("failed to build store")?;

    info!(channel = %channel, "Store ready");

    store.dispatch(PostalAction::Send(
        send_message(format!("{channel}.created"), json!({ "id": 42 }))
            .on_complete(|| PostalAction::App(DemoEvent::Delivered))
            .on_no_subscribers(|| PostalAction::App(DemoEvent::Unheard)),
    ));

    store.dispatch(PostalAction::Send(
        send_message(format!("{channel}.inbox.hello"), json!({ "from": "demo" }))
            .on_complete(|| PostalAction::App(DemoEvent::Delivered))
            .on_no_subscribers(|| PostalAction::App(DemoEvent::Unheard)),
    ));

    store.dispatch(PostalAction::Request(
        request_message(lookup_topic, json!({ "id": 42 }))
            .on_complete(|outcome| PostalAction::App(DemoEvent::Lookup(outcome))),
    ));

    tokio::time::timeout(Duration::from_secs(10), async {
        while store.with_state(|s| s.lookups.is_empty()) {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .context("request did not complete")?;

    let state = store.state();
    info!(
        received = state.received.len(),
        delivered = state.delivered,
        unheard = state.unheard,
        lookups = ?state.lookups,
        published = bus.messages_published(),
        "Demo finished"
    );
    info!(metrics = %encode_metrics()?, "Metrics snapshot");

    cleanup.abort();
    Ok(())
}
