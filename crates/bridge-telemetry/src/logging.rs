//! Subscriber installation.

use crate::{TelemetryConfig, TelemetryError};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Install the global subscriber described by `config`.
///
/// Returns `Ok(false)` when a global subscriber was already installed, so
/// test binaries and embedders can call this more than once.
///
/// # Errors
///
/// `TelemetryError::InvalidFilter` if the log level directive does not parse.
pub fn init_logging(config: &TelemetryConfig) -> Result<bool, TelemetryError> {
    let env_filter = EnvFilter::try_new(&config.log_level)
        .map_err(|e| TelemetryError::InvalidFilter(e.to_string()))?;

    let output = if !config.console_output {
        None
    } else if config.json_logs {
        // JSON output for log shipping
        let json_layer = tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_current_span(true)
            .with_file(true)
            .with_line_number(true);
        Some(if config.test_writer {
            json_layer.with_test_writer().boxed()
        } else {
            json_layer.boxed()
        })
    } else {
        // Pretty output for development
        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false);
        Some(if config.test_writer {
            fmt_layer.with_test_writer().with_ansi(false).boxed()
        } else {
            fmt_layer.with_ansi(true).boxed()
        })
    };

    let installed = tracing_subscriber::registry()
        .with(output)
        .with(env_filter)
        .try_init()
        .is_ok();

    if installed {
        tracing::info!(
            service = %config.service_name,
            log_level = %config.log_level,
            json_logs = config.json_logs,
            "Logging initialized"
        );
    }

    Ok(installed)
}
