//! Prometheus metrics for the postal bridge.
//!
//! All metrics follow the naming convention: `postal_<metric>_<unit>`

use lazy_static::lazy_static;
use prometheus::{CounterVec, Encoder, Opts, Registry, TextEncoder};
use std::sync::Arc;

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    /// Send intents published to the bus
    pub static ref MESSAGES_PUBLISHED: CounterVec = CounterVec::new(
        Opts::new("postal_messages_published_total", "Send intents published to the bus"),
        &["channel"]
    ).expect("metric creation failed");

    /// Inbound bus messages turned into dispatched actions
    pub static ref MESSAGES_RECEIVED: CounterVec = CounterVec::new(
        Opts::new("postal_messages_received_total", "Inbound bus messages dispatched"),
        &["channel"]
    ).expect("metric creation failed");

    /// Request intents by outcome
    pub static ref REQUESTS: CounterVec = CounterVec::new(
        Opts::new("postal_requests_total", "Request intents by outcome"),
        &["outcome"]  // outcome: ok/error
    ).expect("metric creation failed");

    /// Follow-up actions dispatched by the middleware
    pub static ref FOLLOW_UP_DISPATCHES: CounterVec = CounterVec::new(
        Opts::new("postal_follow_up_dispatches_total", "Follow-up actions dispatched"),
        &["kind"]  // kind: complete/no_subscribers
    ).expect("metric creation failed");
}

/// Handle for the registered metrics
pub struct MetricsHandle {
    _registry: Arc<Registry>,
}

/// Register all metrics with the global registry.
///
/// Fails if called twice in the same process.
pub fn register_metrics() -> Result<MetricsHandle, TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(MESSAGES_PUBLISHED.clone()),
        Box::new(MESSAGES_RECEIVED.clone()),
        Box::new(REQUESTS.clone()),
        Box::new(FOLLOW_UP_DISPATCHES.clone()),
    ];

    for metric in metrics {
        REGISTRY
            .register(metric)
            .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    }

    Ok(MetricsHandle {
        _registry: Arc::new(REGISTRY.clone()),
    })
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}
