//! # Message Events
//!
//! What a listener observes for every delivered message.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use uuid::Uuid;

/// Identity of a browsing context.
///
/// Two handles refer to the same context iff their ids are equal. This is the
/// channel's equivalent of comparing `event.source` against a window
/// reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContextId(Uuid);

impl ContextId {
    /// Allocate a fresh context id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    #[must_use]
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ContextId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A delivered message.
///
/// `origin` and `source` are filled in by the channel from the posting
/// context, never by the sender's payload.
#[derive(Debug, Clone, PartialEq)]
pub struct MessageEvent {
    /// Structured-clone of the posted value.
    pub data: Value,
    /// Serialized origin of the posting document.
    pub origin: String,
    /// Posting context, if known.
    pub source: Option<ContextId>,
}

impl MessageEvent {
    pub fn new(data: Value, origin: impl Into<String>, source: Option<ContextId>) -> Self {
        Self {
            data,
            origin: origin.into(),
            source,
        }
    }
}
