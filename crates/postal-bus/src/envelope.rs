//! # Envelope
//!
//! The wrapper the bus delivers around every message. Consumers such as the
//! postal middleware treat it as opaque and pass it along untouched.

use crate::correlation::CorrelationId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A delivered message plus its addressing metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Channel the message was published on.
    pub channel: String,
    /// Concrete topic the message was published to.
    pub topic: String,
    /// Message payload.
    pub data: Value,
    /// When the bus accepted the message.
    pub timestamp: DateTime<Utc>,
    /// Set on request envelopes; responders reply against it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<CorrelationId>,
}

impl Envelope {
    /// Envelope for a fire-and-forget publish.
    pub fn new(channel: impl Into<String>, topic: impl Into<String>, data: Value) -> Self {
        Self {
            channel: channel.into(),
            topic: topic.into(),
            data,
            timestamp: Utc::now(),
            correlation_id: None,
        }
    }

    /// Envelope for a request awaiting a reply.
    pub fn request(
        channel: impl Into<String>,
        topic: impl Into<String>,
        data: Value,
        correlation_id: CorrelationId,
    ) -> Self {
        Self {
            correlation_id: Some(correlation_id),
            ..Self::new(channel, topic, data)
        }
    }

    /// Whether a reply is expected for this envelope.
    #[must_use]
    pub fn is_request(&self) -> bool {
        self.correlation_id.is_some()
    }
}
