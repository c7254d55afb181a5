//! # Postal Bridge Test Suite
//!
//! Cross-crate tests running the store, the postal middleware and the
//! in-memory bus together.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── flows.rs             # Send intents, inbound messages, lifecycle
//!     └── request_response.rs  # Request intents against live responders
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p postal-tests
//! cargo test -p postal-tests integration::request_response
//! ```

#![allow(dead_code)]

pub mod integration;
