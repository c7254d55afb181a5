//! # Postal Bus - Topic-Based Message Bus
//!
//! Defines the [`MessageBus`] capability the postal middleware depends on and
//! ships an in-memory implementation of it.
//!
//! ## Contract
//!
//! - `subscribe(channel, topic, handler)`: handler runs once per matching message
//! - `publish(channel, topic, payload)`: fire-and-forget broadcast
//! - `subscriber_count(channel, topic)`: listeners matching at the instant of the call
//! - `request(channel, topic, payload)`: resolves with the first reply, or fails
//!
//! ## Addressing
//!
//! ```text
//!   channel "orders"
//!   ├── orders.created        ◄── binding "orders.created"
//!   ├── orders.eu.shipped     ◄── binding "orders.*.shipped"
//!   └── orders.eu.fr.shipped  ◄── binding "orders.#"
//! ```
//!
//! Topics are dot-separated. In bindings `*` matches exactly one segment and
//! `#` matches zero or more.
//!
//! ## Request / Response
//!
//! Requests carry a correlation id (UUID v7). The bus parks a oneshot sender
//! in its [`PendingRequestStore`] and the first responder to call
//! [`InMemoryBus::reply`] completes it. Timeouts surface as
//! [`BusError::Timeout`].

// Nursery lints that are too strict
#![allow(clippy::missing_const_for_fn)]
// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod bus;
pub mod config;
pub mod correlation;
pub mod envelope;
pub mod error;
pub mod memory;
pub mod pending;
pub mod topic;

// Re-export main types
pub use bus::{EnvelopeHandler, MessageBus, Subscription};
pub use config::BusConfig;
pub use correlation::CorrelationId;
pub use envelope::Envelope;
pub use error::{BusError, ConfigError};
pub use memory::InMemoryBus;
pub use pending::{PendingRequestStore, PendingStats, Reply, Ticket};
pub use topic::TopicBinding;

/// Default time a request waits for its reply.
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 5_000;

/// Default interval between sweeps of expired pending requests.
pub const DEFAULT_CLEANUP_INTERVAL_MS: u64 = 1_000;
