//! # Frames
//!
//! In-process browsing contexts and `postMessage` delivery.
//!
//! A [`Frame`] owns a broadcast inbox. Posting to a frame stamps the event
//! with the *poster's* origin and context id, so a receiver can trust those
//! two fields the same way a browser page trusts `event.origin` and
//! `event.source`.

use crate::events::{ContextId, MessageEvent};
use crate::listener::Listener;
use crate::DEFAULT_INBOX_CAPACITY;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::{debug, trace};
use url::Url;

/// Target origin that disables the delivery restriction.
pub const WILDCARD_ORIGIN: &str = "*";

/// Errors from posting a message.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ChannelError {
    /// The target origin is neither `*` nor a parseable URL.
    #[error("invalid target origin: {0}")]
    InvalidTargetOrigin(String),

    /// The destination can no longer receive messages.
    #[error("channel closed")]
    Closed,
}

/// Outcome of a `post_message` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Delivered to this many listeners (possibly zero).
    Delivered(usize),
    /// The destination's origin did not match the target origin; the
    /// message was silently dropped.
    OriginMismatch,
}

impl Delivery {
    #[must_use]
    pub fn is_delivered(&self) -> bool {
        matches!(self, Delivery::Delivered(_))
    }
}

/// Something a message can be posted to.
pub trait MessageTarget: Send + Sync {
    /// Identity of the destination context.
    fn context_id(&self) -> ContextId;

    /// Serialized origin of the destination document.
    fn origin(&self) -> &str;

    /// Post `data` to this target on behalf of `source`.
    ///
    /// Delivery happens only when `target_origin` is `*` or names this
    /// target's origin.
    ///
    /// # Errors
    ///
    /// - `ChannelError::InvalidTargetOrigin` - `target_origin` is malformed
    /// - `ChannelError::Closed` - the target cannot receive
    fn post_message(
        &self,
        data: Value,
        target_origin: &str,
        source: &Frame,
    ) -> Result<Delivery, ChannelError>;
}

/// An in-process browsing context.
pub struct Frame {
    /// Context identity.
    id: ContextId,

    /// ASCII-serialized origin of the loaded document.
    origin: String,

    /// Embedding parent, if any.
    parent: Option<Arc<Frame>>,

    /// Broadcast sender backing the inbox.
    inbox: broadcast::Sender<MessageEvent>,

    /// Total messages delivered to this frame.
    messages_delivered: AtomicU64,
}

impl Frame {
    /// Create a top-level frame (no parent).
    #[must_use]
    pub fn top_level(origin: impl Into<String>) -> Arc<Self> {
        Arc::new(Self::build(origin.into(), None, DEFAULT_INBOX_CAPACITY))
    }

    /// Create a frame embedded in `parent`.
    #[must_use]
    pub fn embedded(origin: impl Into<String>, parent: &Arc<Frame>) -> Arc<Self> {
        Arc::new(Self::build(
            origin.into(),
            Some(Arc::clone(parent)),
            DEFAULT_INBOX_CAPACITY,
        ))
    }

    /// Create a frame with a custom inbox capacity.
    #[must_use]
    pub fn with_capacity(
        origin: impl Into<String>,
        parent: Option<&Arc<Frame>>,
        capacity: usize,
    ) -> Arc<Self> {
        Arc::new(Self::build(origin.into(), parent.cloned(), capacity))
    }

    fn build(origin: String, parent: Option<Arc<Frame>>, capacity: usize) -> Self {
        let (inbox, _) = broadcast::channel(capacity.max(1));
        Self {
            id: ContextId::new(),
            origin: canonical_origin(origin),
            parent,
            inbox,
            messages_delivered: AtomicU64::new(0),
        }
    }

    #[must_use]
    pub fn id(&self) -> ContextId {
        self.id
    }

    #[must_use]
    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// The embedding parent, if this frame is embedded.
    #[must_use]
    pub fn parent(&self) -> Option<Arc<Frame>> {
        self.parent.clone()
    }

    /// Register a message listener.
    #[must_use]
    pub fn add_listener(&self) -> Listener {
        debug!(frame = %self.id, "Listener added");
        Listener::new(self.inbox.subscribe(), self.id)
    }

    /// Number of live listeners.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.inbox.receiver_count()
    }

    /// Total messages delivered to this frame.
    #[must_use]
    pub fn messages_delivered(&self) -> u64 {
        self.messages_delivered.load(Ordering::Relaxed)
    }

    /// Deliver a fully-formed event, bypassing origin stamping.
    ///
    /// Models messages from contexts this crate does not track (other tabs,
    /// extensions, hostile iframes). Returns the number of listeners reached.
    pub fn dispatch(&self, event: MessageEvent) -> usize {
        self.messages_delivered.fetch_add(1, Ordering::Relaxed);
        match self.inbox.send(event) {
            Ok(receivers) => receivers,
            Err(_) => {
                trace!(frame = %self.id, "Message dropped (no listeners)");
                0
            }
        }
    }

    /// Whether `target_origin` permits delivery to this frame.
    fn accepts(&self, target_origin: &str) -> Result<bool, ChannelError> {
        if target_origin == WILDCARD_ORIGIN {
            return Ok(true);
        }

        let url = Url::parse(target_origin)
            .map_err(|_| ChannelError::InvalidTargetOrigin(target_origin.to_string()))?;

        Ok(url.origin().ascii_serialization() == self.origin)
    }
}

/// ASCII serialization of a tuple origin; anything else is kept verbatim.
fn canonical_origin(origin: String) -> String {
    match Url::parse(&origin) {
        Ok(url) if url.origin().is_tuple() => url.origin().ascii_serialization(),
        _ => origin,
    }
}

impl MessageTarget for Frame {
    fn context_id(&self) -> ContextId {
        self.id
    }

    fn origin(&self) -> &str {
        &self.origin
    }

    fn post_message(
        &self,
        data: Value,
        target_origin: &str,
        source: &Frame,
    ) -> Result<Delivery, ChannelError> {
        if !self.accepts(target_origin)? {
            debug!(
                frame = %self.id,
                frame_origin = %self.origin,
                target_origin = target_origin,
                "Message not delivered (target origin mismatch)"
            );
            return Ok(Delivery::OriginMismatch);
        }

        let event = MessageEvent::new(data, source.origin.clone(), Some(source.id));
        let receivers = self.dispatch(event);

        trace!(
            frame = %self.id,
            source = %source.id,
            receivers = receivers,
            "Message posted"
        );

        Ok(Delivery::Delivered(receivers))
    }
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("id", &self.id)
            .field("origin", &self.origin)
            .field("parent", &self.parent.as_ref().map(|p| p.id))
            .finish()
    }
}
