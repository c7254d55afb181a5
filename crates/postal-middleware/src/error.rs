//! Middleware error types.

use postal_bus::BusError;
use thiserror::Error;

/// Construction failures. Routing itself never fails: request errors are
/// delivered to the intent's completion callback.
#[derive(Debug, Error)]
pub enum MiddlewareError {
    /// The bus refused the standing subscription.
    #[error("failed to subscribe to the bus: {0}")]
    Subscribe(#[source] BusError),

    /// A channel was configured without a subscription topic.
    #[error("channel `{channel}` has no subscription topic")]
    MissingTopic { channel: String },

    /// Request routing needs a tokio runtime and none was running.
    #[error("postal middleware must be built inside a tokio runtime")]
    NoRuntime,
}
