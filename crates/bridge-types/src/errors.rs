//! # Error Types
//!
//! Host-reported error codes. The set is closed: a code outside it makes the
//! carrying message invalid.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Error codes a host may report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HostErrorCode {
    /// The application lacks a permission required by the request.
    MissingPermission,
    /// The user is not signed in on the host.
    NotAuthed,
    /// Anything else.
    Unknown,
}

impl HostErrorCode {
    /// Wire representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            HostErrorCode::MissingPermission => "MISSING_PERMISSION",
            HostErrorCode::NotAuthed => "NOT_AUTHED",
            HostErrorCode::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for HostErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured error carried by an `ERROR` response.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("[{code}] {message}")]
pub struct HostError {
    pub code: HostErrorCode,
    pub message: String,
}

impl HostError {
    pub fn new(code: HostErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}
