//! Bus error types.

use thiserror::Error;

/// Errors surfaced by bus operations.
///
/// Request failures are values, not panics: the middleware hands them to the
/// caller's completion callback.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BusError {
    /// The underlying transport could not be reached.
    #[error("bus unreachable: {0}")]
    Unreachable(String),

    /// A subscription binding could not be parsed.
    #[error("invalid topic binding `{0}`")]
    InvalidTopic(String),

    /// Nobody was listening for a request.
    #[error("no responder for {channel}/{topic}")]
    NoResponder { channel: String, topic: String },

    /// No reply arrived in time.
    #[error("request to {topic} timed out after {timeout_ms}ms")]
    Timeout { topic: String, timeout_ms: u64 },

    /// The responder answered with an error.
    #[error("responder rejected request: {0}")]
    Rejected(String),

    /// The reply side was dropped before answering.
    #[error("reply channel closed")]
    ChannelClosed,
}

/// Configuration errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Requests would time out immediately.
    #[error("request timeout must be greater than zero")]
    ZeroRequestTimeout,

    /// The expiry sweep would spin.
    #[error("cleanup interval must be greater than zero")]
    ZeroCleanupInterval,
}
