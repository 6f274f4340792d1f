//! Telemetry configuration from environment variables.

use std::env;

/// Service name used when none is configured.
pub const DEFAULT_SERVICE_NAME: &str = "frame-bridge";

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryConfig {
    /// Service name reported in the "Logging initialized" event
    pub service_name: String,

    /// Log level filter (trace, debug, info, warn, error) or full directive
    pub log_level: String,

    /// Whether to enable console output
    pub console_output: bool,

    /// Whether to enable JSON formatted logs
    pub json_logs: bool,

    /// Route output through the test harness capture
    pub test_writer: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: DEFAULT_SERVICE_NAME.to_string(),
            log_level: "info".to_string(),
            console_output: true,
            json_logs: false,
            test_writer: false,
        }
    }
}

impl TelemetryConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `BRIDGE_SERVICE_NAME`: Service name (default: frame-bridge)
    /// - `BRIDGE_LOG_LEVEL` or `RUST_LOG`: Log level (default: info)
    /// - `BRIDGE_CONSOLE_OUTPUT`: Enable console output (default: true)
    /// - `BRIDGE_JSON_LOGS`: Enable JSON logs (default: false)
    pub fn from_env() -> Self {
        Self {
            service_name: env::var("BRIDGE_SERVICE_NAME")
                .unwrap_or_else(|_| DEFAULT_SERVICE_NAME.to_string()),

            log_level: env::var("BRIDGE_LOG_LEVEL")
                .or_else(|_| env::var("RUST_LOG"))
                .unwrap_or_else(|_| "info".to_string()),

            console_output: env::var("BRIDGE_CONSOLE_OUTPUT")
                .map(|v| parse_flag(&v).unwrap_or(true))
                .unwrap_or(true),

            json_logs: env::var("BRIDGE_JSON_LOGS")
                .map(|v| parse_flag(&v).unwrap_or(false))
                .unwrap_or(false),

            test_writer: false,
        }
    }

    /// Configuration for test binaries: debug level, captured output.
    pub fn for_tests() -> Self {
        Self {
            log_level: env::var("RUST_LOG").unwrap_or_else(|_| "debug".to_string()),
            test_writer: true,
            ..Self::default()
        }
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
