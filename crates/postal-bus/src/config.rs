//! Bus configuration from environment variables.

use crate::error::ConfigError;
use crate::{DEFAULT_CLEANUP_INTERVAL_MS, DEFAULT_REQUEST_TIMEOUT_MS};
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

/// Tuning for [`crate::InMemoryBus`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BusConfig {
    /// How long a request waits for its reply.
    pub request_timeout_ms: u64,
    /// How often the expiry sweep runs.
    pub cleanup_interval_ms: u64,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            cleanup_interval_ms: DEFAULT_CLEANUP_INTERVAL_MS,
        }
    }
}

impl BusConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `POSTAL_REQUEST_TIMEOUT_MS`: reply timeout (default: 5000)
    /// - `POSTAL_CLEANUP_INTERVAL_MS`: expiry sweep interval (default: 1000)
    pub fn from_env() -> Self {
        Self {
            request_timeout_ms: env::var("POSTAL_REQUEST_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_MS),

            cleanup_interval_ms: env::var("POSTAL_CLEANUP_INTERVAL_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_CLEANUP_INTERVAL_MS),
        }
    }

    /// Reject values that would make the bus unusable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.request_timeout_ms == 0 {
            return Err(ConfigError::ZeroRequestTimeout);
        }
        if self.cleanup_interval_ms == 0 {
            return Err(ConfigError::ZeroCleanupInterval);
        }
        Ok(())
    }

    /// Request timeout as a `Duration`.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Sweep interval as a `Duration`.
    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_millis(self.cleanup_interval_ms)
    }
}
