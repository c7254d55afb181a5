//! # Pending Requests
//!
//! Requesters park here between delivering a request envelope and receiving
//! its reply.
//!
//! ```text
//!   open(topic) ──→ Ticket ──→ await_reply(ticket) ──→ Ok(value) / Err(..)
//!                     │                 ▲
//!                     │   resolve(id)   │
//!                     └── responder ────┘
//! ```
//!
//! Each ticket carries its own deadline and `await_reply` is the only place
//! that enforces it. `sweep` never touches an entry whose requester is still
//! waiting; it only drops entries whose ticket was dropped unawaited.

use crate::correlation::CorrelationId;
use crate::error::BusError;
use dashmap::DashMap;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::oneshot;
use tracing::{debug, warn};

/// A responder's answer plus how long it took.
#[derive(Debug)]
pub struct Reply {
    pub result: Result<Value, BusError>,
    pub latency: Duration,
}

/// Handle for one open request, consumed by [`PendingRequestStore::await_reply`].
#[derive(Debug)]
pub struct Ticket {
    correlation_id: CorrelationId,
    topic: String,
    timeout: Duration,
    receiver: oneshot::Receiver<Reply>,
}

impl Ticket {
    #[must_use]
    pub fn correlation_id(&self) -> CorrelationId {
        self.correlation_id
    }
}

struct Parked {
    sender: oneshot::Sender<Reply>,
    opened_at: Instant,
    topic: String,
}

#[derive(Default)]
struct Counters {
    opened: AtomicU64,
    resolved: AtomicU64,
    expired: AtomicU64,
    abandoned: AtomicU64,
}

/// Point-in-time request counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PendingStats {
    pub opened: u64,
    pub resolved: u64,
    /// Timed out while awaited.
    pub expired: u64,
    /// Dropped before a reply: no responder, or the requester went away.
    pub abandoned: u64,
}

/// Correlation id → parked requester.
pub struct PendingRequestStore {
    parked: DashMap<CorrelationId, Parked>,
    default_timeout: Duration,
    counters: Counters,
}

impl PendingRequestStore {
    pub fn new(default_timeout: Duration) -> Self {
        Self {
            parked: DashMap::new(),
            default_timeout,
            counters: Counters::default(),
        }
    }

    /// Park a new request. `timeout` overrides the store default.
    pub fn open(&self, topic: &str, timeout: Option<Duration>) -> Ticket {
        let correlation_id = CorrelationId::new();
        let timeout = timeout.unwrap_or(self.default_timeout);
        let (sender, receiver) = oneshot::channel();

        self.parked.insert(
            correlation_id,
            Parked {
                sender,
                opened_at: Instant::now(),
                topic: topic.to_string(),
            },
        );
        self.counters.opened.fetch_add(1, Ordering::Relaxed);
        debug!(correlation_id = %correlation_id, topic = topic, "Request parked");

        Ticket {
            correlation_id,
            topic: topic.to_string(),
            timeout,
            receiver,
        }
    }

    /// Wait for the ticket's reply until its deadline.
    pub async fn await_reply(&self, ticket: Ticket) -> Result<Value, BusError> {
        let Ticket {
            correlation_id,
            topic,
            timeout,
            mut receiver,
        } = ticket;

        // The receiver stays open until the entry is removed, so a concurrent
        // sweep cannot claim a timed-out request as orphaned.
        match tokio::time::timeout(timeout, &mut receiver).await {
            Ok(Ok(reply)) => reply.result,
            Ok(Err(_)) => Err(BusError::ChannelClosed),
            Err(_) => {
                if self.parked.remove(&correlation_id).is_some() {
                    self.counters.expired.fetch_add(1, Ordering::Relaxed);
                }
                Err(BusError::Timeout {
                    topic,
                    timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
                })
            }
        }
    }

    /// Hand `result` to the requester parked under `correlation_id`.
    ///
    /// Only the first call for an id succeeds.
    pub fn resolve(&self, correlation_id: CorrelationId, result: Result<Value, BusError>) -> bool {
        let Some((_, parked)) = self.parked.remove(&correlation_id) else {
            warn!(correlation_id = %correlation_id, "Late or unknown reply dropped");
            return false;
        };

        let latency = parked.opened_at.elapsed();
        if parked.sender.send(Reply { result, latency }).is_err() {
            self.counters.abandoned.fetch_add(1, Ordering::Relaxed);
            debug!(correlation_id = %correlation_id, topic = %parked.topic, "Requester gone");
            return false;
        }

        self.counters.resolved.fetch_add(1, Ordering::Relaxed);
        debug!(
            correlation_id = %correlation_id,
            topic = %parked.topic,
            latency_ms = latency.as_millis(),
            "Request resolved"
        );
        true
    }

    /// Drop a parked request without answering it.
    pub fn abandon(&self, correlation_id: &CorrelationId) -> bool {
        let removed = self.parked.remove(correlation_id).is_some();
        if removed {
            self.counters.abandoned.fetch_add(1, Ordering::Relaxed);
        }
        removed
    }

    /// Remove entries whose ticket was dropped without being awaited.
    /// Returns how many were removed.
    pub fn sweep(&self) -> usize {
        let mut removed = 0;
        self.parked.retain(|id, parked| {
            if !parked.sender.is_closed() {
                return true;
            }
            debug!(correlation_id = %id, topic = %parked.topic, "Orphaned request swept");
            removed += 1;
            false
        });
        self.counters
            .abandoned
            .fetch_add(removed as u64, Ordering::Relaxed);
        removed
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.parked.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.parked.is_empty()
    }

    #[must_use]
    pub fn contains(&self, correlation_id: &CorrelationId) -> bool {
        self.parked.contains_key(correlation_id)
    }

    #[must_use]
    pub fn stats(&self) -> PendingStats {
        PendingStats {
            opened: self.counters.opened.load(Ordering::Relaxed),
            resolved: self.counters.resolved.load(Ordering::Relaxed),
            expired: self.counters.expired.load(Ordering::Relaxed),
            abandoned: self.counters.abandoned.load(Ordering::Relaxed),
        }
    }
}

/// Shortest period [`sweep_loop`] will tick at.
pub const MIN_SWEEP_INTERVAL: Duration = Duration::from_millis(1);

/// Sweep `store` every `every` until the task is aborted.
///
/// Periods below [`MIN_SWEEP_INTERVAL`] are raised to it.
pub async fn sweep_loop(store: Arc<PendingRequestStore>, every: Duration) {
    let mut ticker = tokio::time::interval(every.max(MIN_SWEEP_INTERVAL));
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        let removed = store.sweep();
        if removed > 0 {
            debug!(removed = removed, "Swept orphaned requests");
        }
    }
}
