//! # Request / Response Flows
//!
//! Request intents routed through the store to responders registered on the
//! in-memory bus. Every outcome, success or failure, comes back through the
//! intent's single completion callback.

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use postal_bus::{BusConfig, BusError, Envelope, EnvelopeHandler, InMemoryBus, MessageBus};
    use postal_middleware::{request_message, PostalAction, PostalConfig};
    use serde_json::json;

    use crate::integration::{postal_store, wait_until, Action, AppEvent};

    fn lookup(id: u64) -> Action {
        PostalAction::Request(
            request_message("orders.lookup", json!({ "id": id }))
                .on_complete(|outcome| PostalAction::App(AppEvent::Answered(outcome))),
        )
    }

    /// Subscription binding that never sees `orders.lookup`.
    fn quiet_config() -> PostalConfig {
        PostalConfig::new("orders", "orders.events.#")
    }

    #[tokio::test]
    async fn test_request_resolves_with_reply() {
        let bus = Arc::new(InMemoryBus::new());
        let _responder = bus
            .respond("orders", "orders.lookup", |envelope| {
                Ok(json!({ "id": envelope.data["id"], "status": "paid" }))
            })
            .unwrap();
        let store = postal_store(&bus, quiet_config()).unwrap();

        store.dispatch(lookup(42));

        let state = wait_until(&store, |s| !s.events.is_empty()).await;
        assert_eq!(
            state.events,
            vec![AppEvent::Answered(Ok(json!({ "id": 42, "status": "paid" })))]
        );
    }

    #[tokio::test]
    async fn test_responder_rejection_reaches_completion_callback() {
        let bus = Arc::new(InMemoryBus::new());
        let _responder = bus
            .respond("orders", "orders.lookup", |_| {
                Err(BusError::Rejected("unknown order".into()))
            })
            .unwrap();
        let store = postal_store(&bus, quiet_config()).unwrap();

        store.dispatch(lookup(7));

        let state = wait_until(&store, |s| !s.events.is_empty()).await;
        assert_eq!(
            state.events,
            vec![AppEvent::Answered(Err(BusError::Rejected(
                "unknown order".into()
            )))]
        );
    }

    #[tokio::test]
    async fn test_request_without_responder_fails() {
        let bus = Arc::new(InMemoryBus::new());
        let store = postal_store(&bus, quiet_config()).unwrap();

        store.dispatch(lookup(1));

        let state = wait_until(&store, |s| !s.events.is_empty()).await;
        assert_eq!(
            state.events,
            vec![AppEvent::Answered(Err(BusError::NoResponder {
                channel: "orders".into(),
                topic: "orders.lookup".into(),
            }))]
        );
    }

    #[tokio::test]
    async fn test_unanswered_request_times_out() {
        let bus = Arc::new(InMemoryBus::with_config(BusConfig {
            request_timeout_ms: 50,
            ..Default::default()
        }));
        let heard = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&heard);
        let silent: EnvelopeHandler = Arc::new(move |_: Envelope| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        let _listener = bus.subscribe("orders", "orders.lookup", silent).unwrap();
        let store = postal_store(&bus, quiet_config()).unwrap();

        store.dispatch(lookup(1));

        let state = wait_until(&store, |s| !s.events.is_empty()).await;
        assert_eq!(heard.load(Ordering::SeqCst), 1);
        assert_eq!(
            state.events,
            vec![AppEvent::Answered(Err(BusError::Timeout {
                topic: "orders.lookup".into(),
                timeout_ms: 50,
            }))]
        );
        assert_eq!(bus.pending().len(), 0);
    }

    #[tokio::test]
    async fn test_first_reply_wins() {
        let bus = Arc::new(InMemoryBus::new());
        let _first = bus
            .respond("orders", "orders.lookup", |_| Ok(json!("first")))
            .unwrap();
        let _second = bus
            .respond("orders", "orders.*", |_| Ok(json!("second")))
            .unwrap();
        let store = postal_store(&bus, quiet_config()).unwrap();

        store.dispatch(lookup(1));

        let state = wait_until(&store, |s| !s.events.is_empty()).await;
        assert_eq!(state.events, vec![AppEvent::Answered(Ok(json!("first")))]);
    }

    #[tokio::test]
    async fn test_concurrent_requests_resolve_independently() {
        let bus = Arc::new(InMemoryBus::new());
        let _responder = bus
            .respond("orders", "orders.lookup", |envelope| Ok(envelope.data["id"].clone()))
            .unwrap();
        let store = postal_store(&bus, quiet_config()).unwrap();

        for id in 0..10 {
            store.dispatch(lookup(id));
        }

        let state = wait_until(&store, |s| s.events.len() == 10).await;
        let mut ids: Vec<u64> = state
            .events
            .iter()
            .filter_map(|event| match event {
                AppEvent::Answered(Ok(value)) => value.as_u64(),
                _ => None,
            })
            .collect();
        ids.sort_unstable();
        assert_eq!(ids, (0..10).collect::<Vec<_>>());
    }
}
