//! # Send and Subscription Flows
//!
//! Store → PostalMiddleware → InMemoryBus, and back.
//!
//! ## Flows Tested:
//!
//! 1. **Send with listeners**: publish reaches subscribers, `on_complete` reduced
//! 2. **Send without listeners**: still published, `on_no_subscribers` reduced
//! 3. **Inbound messages**: anything matching the binding reaches the reducer
//! 4. **Lifecycle**: dropping the store releases the standing subscription

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use postal_bus::{BusError, Envelope, EnvelopeHandler, InMemoryBus, MessageBus};
    use postal_middleware::{send_message, MiddlewareError, PostalAction, PostalConfig};
    use postal_telemetry::MESSAGES_PUBLISHED;
    use serde_json::json;

    use crate::integration::{postal_store, sink, wait_until, Action, AppEvent};

    fn send(topic: &str) -> Action {
        let delivered = topic.to_string();
        let unheard = topic.to_string();
        PostalAction::Send(
            send_message(topic, json!({ "topic": topic }))
                .on_complete(move || PostalAction::App(AppEvent::Delivered(delivered.clone())))
                .on_no_subscribers(move || PostalAction::App(AppEvent::Unheard(unheard.clone()))),
        )
    }

    // =============================================================================
    // SEND INTENTS
    // =============================================================================

    #[tokio::test]
    async fn test_send_reaches_external_subscriber() {
        let bus = Arc::new(InMemoryBus::new());
        let seen = sink();
        let log = Arc::clone(&seen);
        let handler: EnvelopeHandler =
            Arc::new(move |envelope: Envelope| log.lock().push(envelope.data));
        let _listener = bus.subscribe("orders", "orders.#", handler).unwrap();

        let store = postal_store(&bus, PostalConfig::new("orders", "inbox")).unwrap();
        store.dispatch(send("orders.created"));

        assert_eq!(*seen.lock(), vec![json!({ "topic": "orders.created" })]);
        assert_eq!(
            store.state().events,
            vec![AppEvent::Delivered("orders.created".into())]
        );
    }

    #[tokio::test]
    async fn test_binding_covering_send_topic_counts_store_as_listener() {
        let bus = Arc::new(InMemoryBus::new());
        let store = postal_store(&bus, PostalConfig::new("orders", "orders.#")).unwrap();

        store.dispatch(send("orders.created"));

        let state = store.state();
        assert_eq!(state.received, vec!["orders.created".to_string()]);
        assert_eq!(state.events, vec![AppEvent::Delivered("orders.created".into())]);
    }

    #[tokio::test]
    async fn test_send_outside_own_binding_is_unheard() {
        let bus = Arc::new(InMemoryBus::new());
        let store = postal_store(&bus, PostalConfig::new("orders", "orders.inbox.#")).unwrap();

        store.dispatch(send("orders.nobody.listens"));

        let state = store.state();
        assert!(state.received.is_empty());
        assert_eq!(
            state.events,
            vec![AppEvent::Unheard("orders.nobody.listens".into())]
        );
    }

    #[tokio::test]
    async fn test_send_without_listeners_is_still_published() {
        let bus = Arc::new(InMemoryBus::new());
        let store = postal_store(&bus, PostalConfig::new("orders", "inbox.*")).unwrap();

        store.dispatch(send("orders.created"));

        assert_eq!(bus.messages_published(), 1);
        let state = store.state();
        assert!(state.received.is_empty());
        assert_eq!(state.events, vec![AppEvent::Unheard("orders.created".into())]);
    }

    #[tokio::test]
    async fn test_send_on_other_channel_is_not_heard() {
        let bus = Arc::new(InMemoryBus::new());
        let seen = sink();
        let log = Arc::clone(&seen);
        let handler: EnvelopeHandler =
            Arc::new(move |envelope: Envelope| log.lock().push(envelope.data));
        let _listener = bus.subscribe("invoices", "#", handler).unwrap();

        let store = postal_store(&bus, PostalConfig::new("orders", "inbox")).unwrap();
        store.dispatch(send("orders.created"));

        assert!(seen.lock().is_empty());
        assert_eq!(
            store.state().events,
            vec![AppEvent::Unheard("orders.created".into())]
        );
    }

    #[tokio::test]
    async fn test_repeated_send_routes_each_time() {
        let bus = Arc::new(InMemoryBus::new());
        let store = postal_store(&bus, PostalConfig::new("orders", "orders.#")).unwrap();

        let action = send("orders.created");
        store.dispatch(action.clone());
        store.dispatch(action);

        assert_eq!(bus.messages_published(), 2);
        assert_eq!(store.state().events.len(), 2);
    }

    // =============================================================================
    // INBOUND MESSAGES
    // =============================================================================

    #[tokio::test]
    async fn test_external_publish_reaches_reducer() {
        let bus = Arc::new(InMemoryBus::new());
        let store = postal_store(&bus, PostalConfig::new("orders", "orders.#")).unwrap();

        bus.publish("orders", "orders.cancelled", json!({ "id": 3 }));
        bus.publish("invoices", "invoices.paid", json!({ "id": 4 }));

        let state = wait_until(&store, |s| !s.received.is_empty()).await;
        assert_eq!(state.received, vec!["orders.cancelled".to_string()]);
        assert!(state.events.is_empty());
    }

    #[tokio::test]
    async fn test_wildcard_subscription_binding() {
        let bus = Arc::new(InMemoryBus::new());
        let store =
            postal_store(&bus, PostalConfig::new("orders", "orders.*.shipped")).unwrap();

        bus.publish("orders", "orders.eu.shipped", json!(1));
        bus.publish("orders", "orders.eu.fr.shipped", json!(2));
        bus.publish("orders", "orders.created", json!(3));

        assert_eq!(store.state().received, vec!["orders.eu.shipped".to_string()]);
    }

    // =============================================================================
    // CONFIGURATION AND LIFECYCLE
    // =============================================================================

    #[tokio::test]
    async fn test_no_channel_leaves_bus_untouched() {
        let bus = Arc::new(InMemoryBus::new());
        let store = postal_store(&bus, PostalConfig::default()).unwrap();

        store.dispatch(send("orders.created"));

        assert_eq!(bus.messages_published(), 0);
        assert_eq!(bus.subscriber_count("orders", "orders.created"), 0);
        assert!(store.state().events.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_binding_fails_store_build() {
        let bus = Arc::new(InMemoryBus::new());
        let result = postal_store(&bus, PostalConfig::new("orders", "orders..created"));

        assert!(matches!(
            result,
            Err(MiddlewareError::Subscribe(BusError::InvalidTopic(_)))
        ));
    }

    #[tokio::test]
    async fn test_channel_without_topic_fails_store_build() {
        let bus = Arc::new(InMemoryBus::new());
        let config = PostalConfig {
            channel: Some("orders".into()),
            ..Default::default()
        };

        let result = postal_store(&bus, config);

        assert!(matches!(result, Err(MiddlewareError::MissingTopic { .. })));
        assert_eq!(bus.subscriber_count("orders", "orders.created"), 0);
    }

    #[tokio::test]
    async fn test_dropping_store_releases_subscription() {
        let bus = Arc::new(InMemoryBus::new());
        let store = postal_store(&bus, PostalConfig::new("orders", "orders.#")).unwrap();
        assert_eq!(bus.subscriber_count("orders", "orders.created"), 1);

        drop(store);
        assert_eq!(bus.subscriber_count("orders", "orders.created"), 0);
    }

    #[tokio::test]
    async fn test_publish_metric_counts_per_channel() {
        let bus = Arc::new(InMemoryBus::new());
        let config = PostalConfig::new("metrics-flow", "metrics-flow.#");
        let store = postal_store(&bus, config).unwrap();
        let before = MESSAGES_PUBLISHED.with_label_values(&["metrics-flow"]).get();

        store.dispatch(send("metrics-flow.ping"));
        store.dispatch(send("metrics-flow.ping"));

        let after = MESSAGES_PUBLISHED.with_label_values(&["metrics-flow"]).get();
        assert_eq!(after - before, 2.0);
    }
}
