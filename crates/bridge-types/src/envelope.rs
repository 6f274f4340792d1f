//! # Bridge Envelopes
//!
//! Wire shapes exchanged between the embedded application and its host.
//!
//! ## Outbound (client -> parent)
//!
//! - `{ type: <tag>, payload?: <opaque>, requestId: <string> }`
//! - `{ type: "APP_READY", requestId?: <string> }`
//!
//! ## Inbound (parent -> client)
//!
//! Exactly three variants, discriminated by `type`:
//!
//! | `type`         | Variant                          |
//! |----------------|----------------------------------|
//! | `HOST_CONTEXT` | [`InboundMessage::HostContext`]  |
//! | `RESULT`       | [`InboundMessage::Result`]       |
//! | `ERROR`        | [`InboundMessage::Error`]        |
//!
//! Decoding is strict: a wrong type, a missing field or a value outside a
//! closed set fails the whole message.

use crate::errors::HostError;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// Discriminator of the readiness announcement.
pub const APP_READY: &str = "APP_READY";

/// Discriminator of a host context push.
pub const HOST_CONTEXT: &str = "HOST_CONTEXT";

/// Discriminator of a successful response.
pub const RESULT: &str = "RESULT";

/// Discriminator of an error response.
pub const ERROR: &str = "ERROR";

// =============================================================================
// OUTBOUND
// =============================================================================

/// A correlated request sent to the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestEnvelope {
    /// Request tag, e.g. `LIST_CATEGORIES`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Opaque request payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
    /// Correlation identifier echoed back by the host.
    #[serde(rename = "requestId")]
    pub request_id: String,
}

/// Fire-and-forget readiness notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadyEnvelope {
    /// Always [`APP_READY`].
    #[serde(rename = "type")]
    pub kind: String,
    /// Optional identifier the host may key its context push on.
    #[serde(rename = "requestId", default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

impl ReadyEnvelope {
    /// Build a readiness announcement.
    #[must_use]
    pub fn new(request_id: Option<String>) -> Self {
        Self {
            kind: APP_READY.to_string(),
            request_id,
        }
    }
}

// =============================================================================
// HOST CONTEXT PAYLOAD
// =============================================================================

/// Context payload schema version. Anything else is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ContextVersion;

impl ContextVersion {
    /// The only accepted version tag.
    pub const CURRENT: u64 = 1;
}

impl Serialize for ContextVersion {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(Self::CURRENT)
    }
}

impl<'de> Deserialize<'de> for ContextVersion {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let v = u64::deserialize(deserializer)?;
        if v == Self::CURRENT {
            Ok(ContextVersion)
        } else {
            Err(de::Error::custom(format!(
                "unsupported context version {v}, expected {}",
                Self::CURRENT
            )))
        }
    }
}

/// How the application is being displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
    /// Rendered inside a host frame.
    Embedded,
    /// Opened on its own.
    Standalone,
}

/// Identity of the embedded application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppInfo {
    pub id: String,
    pub kind: String,
    pub mode: DisplayMode,
}

/// Host platform description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformInfo {
    pub mode: DisplayMode,
    pub host: String,
    pub is_dev_host: bool,
    pub is_mobile: bool,
}

/// Versioned context pushed by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostContext {
    pub v: ContextVersion,
    pub app: AppInfo,
    pub platform: PlatformInfo,
    /// Granted permission set.
    pub permissions: Vec<String>,
    pub is_authed: bool,
}

impl HostContext {
    /// Whether the host granted `permission`.
    #[must_use]
    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.iter().any(|p| p == permission)
    }
}

// =============================================================================
// INBOUND
// =============================================================================

/// A validated message from the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum InboundMessage {
    /// Context push, optionally correlated to a pending request.
    #[serde(rename = "HOST_CONTEXT")]
    HostContext {
        payload: HostContext,
        #[serde(rename = "requestId", default, skip_serializing_if = "Option::is_none")]
        request_id: Option<String>,
    },

    /// Successful response. The result is opaque.
    #[serde(rename = "RESULT")]
    Result {
        #[serde(rename = "requestId")]
        request_id: String,
        #[serde(default)]
        result: Value,
    },

    /// Host-reported failure.
    #[serde(rename = "ERROR")]
    Error {
        #[serde(rename = "requestId")]
        request_id: String,
        error: HostError,
    },
}

impl InboundMessage {
    /// Correlation identifier carried by the message, if any.
    #[must_use]
    pub fn request_id(&self) -> Option<&str> {
        match self {
            InboundMessage::HostContext { request_id, .. } => request_id.as_deref(),
            InboundMessage::Result { request_id, .. } | InboundMessage::Error { request_id, .. } => {
                Some(request_id)
            }
        }
    }

    /// The wire discriminator of this variant.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            InboundMessage::HostContext { .. } => HOST_CONTEXT,
            InboundMessage::Result { .. } => RESULT,
            InboundMessage::Error { .. } => ERROR,
        }
    }
}
