//! Bridge client error types.
//!
//! Every failure that belongs to a caller's request surfaces as a
//! [`BridgeError`]. Discarded inbound messages never do.

use crate::domain::correlation::CorrelationId;
use bridge_channel::ChannelError;
use bridge_types::{HostError, HostErrorCode};
use std::time::Duration;

/// Errors surfaced by the bridge client.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BridgeError {
    /// The trust anchor is not a well-formed http/https URL.
    #[error("invalid trusted origin {0:?}: expected an http or https URL")]
    InvalidOrigin(String),

    /// No trusted parent was supplied and the window is not embedded.
    #[error("no trusted parent: window is not embedded and no parent was supplied")]
    NoParent,

    /// The client was created outside a Tokio runtime.
    #[error("bridge client requires a Tokio runtime")]
    NoRuntime,

    /// The client has been torn down.
    #[error("bridge client destroyed")]
    Destroyed,

    /// No response arrived within the effective timeout.
    #[error("request {tag} timed out after {}ms", .timeout.as_millis())]
    Timeout { tag: String, timeout: Duration },

    /// The host answered with an error.
    #[error("host error [{code}]: {message}")]
    Host {
        code: HostErrorCode,
        message: String,
    },

    /// An outbound envelope could not be serialized.
    #[error("failed to encode {tag} request: {reason}")]
    Encode { tag: String, reason: String },

    /// A pending entry already exists for this id.
    #[error("duplicate correlation id {0}")]
    DuplicateRequest(CorrelationId),

    /// The channel refused the outbound message.
    #[error("channel error: {0}")]
    Channel(#[from] ChannelError),

    /// The pending entry vanished without being settled.
    #[error("response channel closed")]
    ResponseDropped,

    /// A settled value did not have the expected shape.
    #[error("unexpected response shape: {0}")]
    UnexpectedResponse(String),
}

impl BridgeError {
    /// Host error code, if this failure was reported by the host.
    #[must_use]
    pub fn host_code(&self) -> Option<HostErrorCode> {
        match self {
            BridgeError::Host { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Whether the failure came from the request's deadline.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, BridgeError::Timeout { .. })
    }
}

impl From<HostError> for BridgeError {
    fn from(e: HostError) -> Self {
        BridgeError::Host {
            code: e.code,
            message: e.message,
        }
    }
}

/// Result type for bridge operations
pub type BridgeResult<T> = Result<T, BridgeError>;
