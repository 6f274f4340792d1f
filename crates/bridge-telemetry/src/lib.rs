//! # Bridge Telemetry
//!
//! Structured logging for the host bridge crates and their test suite.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use bridge_telemetry::{init_logging, TelemetryConfig};
//!
//! init_logging(&TelemetryConfig::from_env())?;
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `BRIDGE_SERVICE_NAME` | `frame-bridge` | Service name in log lines |
//! | `BRIDGE_LOG_LEVEL` / `RUST_LOG` | `info` | Filter directive |
//! | `BRIDGE_CONSOLE_OUTPUT` | `true` | Write logs to stdout |
//! | `BRIDGE_JSON_LOGS` | `false` | JSON formatted logs |

mod config;
mod logging;

pub use config::{TelemetryConfig, DEFAULT_SERVICE_NAME};
pub use logging::init_logging;

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TelemetryError {
    #[error("invalid log filter: {0}")]
    InvalidFilter(String),
}
