//! Domain layer: correlation, pending-request bookkeeping, configuration.

pub mod config;
pub mod correlation;
pub mod error;
pub mod pending;
pub mod requests;

pub use config::{BridgeConfig, ConfigError, DEFAULT_TIMEOUT, MIN_TIMEOUT};
pub use correlation::CorrelationId;
pub use error::{BridgeError, BridgeResult};
pub use pending::{CorrelationTable, PendingSnapshot, PendingStats, Settlement};
pub use requests::RequestTag;
