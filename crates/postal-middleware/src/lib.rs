//! # Postal Middleware - Dispatch Pipeline to Message Bus Bridge
//!
//! Application code expresses two intents as ordinary dispatched actions:
//!
//! - **Send**: broadcast and learn whether anyone was listening
//! - **Request**: ask and wait for one reply
//!
//! [`PostalMiddleware`] turns those into bus calls and turns bus outcomes
//! (and every inbound bus message) back into dispatched actions.
//!
//! ## Data Flow
//!
//! ```text
//! ┌──────────┐ dispatch ┌──────────────────┐ publish/request ┌────────────┐
//! │   App    │─────────→│ PostalMiddleware │────────────────→│ MessageBus │
//! └──────────┘          └──────────────────┘                 └────────────┘
//!      ▲                  │            ▲                           │
//!      │     follow-up    │            │   standing subscription   │
//!      └──────────────────┘            └───────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! let store = Store::builder(State::default(), reduce)
//!     .middleware(move |dispatcher| {
//!         PostalMiddleware::new(PostalConfig::new("orders", "orders.inbox.#"), bus, dispatcher)
//!     })
//!     .build()?;
//!
//! store.dispatch(PostalAction::Send(
//!     send_message("orders.created", json!({"id": 42}))
//!         .on_complete(|| PostalAction::App(Msg::Delivered))
//!         .on_no_subscribers(|| PostalAction::App(Msg::Unheard)),
//! ));
//! ```

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod action;
pub mod config;
pub mod error;
pub mod intent;
pub mod middleware;
pub mod postal;
pub mod store;

#[cfg(test)]
mod test_support;

// Re-export main types
pub use action::{
    ActionKind, BusAction, Classified, PostalAction, RECEIVE_MESSAGE, REQUEST_MESSAGE,
    SEND_MESSAGE,
};
pub use config::PostalConfig;
pub use error::MiddlewareError;
pub use intent::{
    receive_message, request_message, send_message, FollowUp, OutcomeFollowUp, RequestMessage,
    SendMessage,
};
pub use middleware::{Dispatcher, Middleware, Next};
pub use postal::{PostalMiddleware, PostalMiddlewareBuilder, SubscriptionHandler};
pub use store::{Store, StoreBuilder};
