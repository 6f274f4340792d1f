//! Bridge client configuration with validation.

use bridge_types::{normalize_origin, TrustedOrigin};
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

/// Smallest timeout a request may use, regardless of what the caller asks.
pub const MIN_TIMEOUT: Duration = Duration::from_millis(500);

/// Timeout used when neither the config nor the caller supplies one.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(10_000);

/// Client configuration.
///
/// The trusted parent target is not part of the config; it is a live
/// reference handed to [`crate::BridgeClient::new`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Trust anchor. Must normalize to an http/https origin.
    pub trusted_origin: String,
    /// Default per-request timeout in milliseconds (floored at 500).
    pub default_timeout_ms: u64,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            trusted_origin: String::new(),
            default_timeout_ms: DEFAULT_TIMEOUT.as_millis() as u64,
        }
    }
}

impl BridgeConfig {
    /// Config for the given trust anchor with the default timeout.
    pub fn new(trusted_origin: impl Into<String>) -> Self {
        Self {
            trusted_origin: trusted_origin.into(),
            ..Self::default()
        }
    }

    /// Override the default per-request timeout.
    #[must_use]
    pub fn with_default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Load from environment variables.
    ///
    /// - `BRIDGE_TRUSTED_ORIGIN`: trust anchor (default: empty, fails validation)
    /// - `BRIDGE_DEFAULT_TIMEOUT_MS`: default timeout (default: 10000)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            trusted_origin: env::var("BRIDGE_TRUSTED_ORIGIN").unwrap_or(defaults.trusted_origin),
            default_timeout_ms: env::var("BRIDGE_DEFAULT_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(defaults.default_timeout_ms),
        }
    }

    /// Validate configuration and return the normalized trust anchor.
    pub fn validate(&self) -> Result<TrustedOrigin, ConfigError> {
        if self.trusted_origin.trim().is_empty() {
            return Err(ConfigError::MissingOrigin);
        }

        normalize_origin(&self.trusted_origin)
            .ok_or_else(|| ConfigError::InvalidOrigin(self.trusted_origin.clone()))
    }

    /// Default timeout with the floor applied.
    pub fn default_timeout(&self) -> Duration {
        Duration::from_millis(self.default_timeout_ms).max(MIN_TIMEOUT)
    }

    /// Timeout for a single request.
    ///
    /// An override is honoured only if it reaches [`MIN_TIMEOUT`]; otherwise
    /// the instance default applies.
    pub fn effective_timeout(&self, requested: Option<Duration>) -> Duration {
        match requested {
            Some(timeout) if timeout >= MIN_TIMEOUT => timeout,
            _ => self.default_timeout(),
        }
    }
}

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// No trust anchor configured
    #[error("trusted origin is required")]
    MissingOrigin,
    /// Trust anchor is not an http/https URL
    #[error("invalid trusted origin: {0}")]
    InvalidOrigin(String),
}
