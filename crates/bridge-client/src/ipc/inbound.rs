//! Inbound message handling.
//!
//! Every event that reaches the embedded window passes through
//! [`InboundHandler::handle`]. The order of checks is fixed:
//!
//! 1. Sender authority: the event must come from the trusted origin *and*
//!    from the trusted parent context. Either alone is not enough.
//! 2. Shape: the payload must validate as an [`InboundMessage`].
//! 3. Routing: `RESULT` resolves, `ERROR` rejects, `HOST_CONTEXT` resolves a
//!    pending handshake or is broadcast to context subscribers.
//!
//! Discards are silent to the caller and counted.

use crate::domain::correlation::CorrelationId;
use crate::domain::error::BridgeError;
use crate::domain::pending::CorrelationTable;
use crate::ipc::validation::validate_inbound;
use bridge_channel::{ContextId, MessageEvent};
use bridge_types::{HostContext, InboundMessage, TrustedOrigin};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, trace};

/// Counters for discarded inbound messages.
#[derive(Debug, Default)]
pub struct InboundStats {
    /// Messages from an untrusted origin or context
    pub discarded_untrusted: AtomicU64,
    /// Messages from the trusted sender that failed validation
    pub discarded_malformed: AtomicU64,
    /// Context pushes broadcast to subscribers
    pub context_pushes: AtomicU64,
}

/// Applies the sender and shape checks and settles pending requests.
pub struct InboundHandler {
    /// Canonical trusted origin
    trusted_origin: TrustedOrigin,
    /// Context id of the trusted parent
    trusted_source: ContextId,
    /// Pending requests
    pending: Arc<CorrelationTable>,
    /// Unsolicited context pushes
    contexts: broadcast::Sender<HostContext>,
    /// Set once the owning client is torn down
    closed: AtomicBool,
    stats: InboundStats,
}

impl InboundHandler {
    pub fn new(
        trusted_origin: TrustedOrigin,
        trusted_source: ContextId,
        pending: Arc<CorrelationTable>,
        context_capacity: usize,
    ) -> Self {
        let (contexts, _) = broadcast::channel(context_capacity.max(1));
        Self {
            trusted_origin,
            trusted_source,
            pending,
            contexts,
            closed: AtomicBool::new(false),
            stats: InboundStats::default(),
        }
    }

    /// Process one inbound event. Never fails.
    pub fn handle(&self, event: &MessageEvent) {
        if self.closed.load(Ordering::Acquire) {
            return;
        }

        if !self.is_trusted_sender(event) {
            self.stats.discarded_untrusted.fetch_add(1, Ordering::Relaxed);
            trace!(
                origin = %event.origin,
                source = ?event.source,
                "Discarded message from untrusted sender"
            );
            return;
        }

        let Some(message) = validate_inbound(&event.data) else {
            self.stats.discarded_malformed.fetch_add(1, Ordering::Relaxed);
            debug!(origin = %event.origin, "Discarded malformed message");
            return;
        };

        self.route(message);
    }

    fn is_trusted_sender(&self, event: &MessageEvent) -> bool {
        self.trusted_origin.matches(&event.origin) && event.source == Some(self.trusted_source)
    }

    fn route(&self, message: InboundMessage) {
        match message {
            InboundMessage::Result { request_id, result } => {
                if let Some(id) = pending_id(&request_id) {
                    self.pending.resolve(&id, result);
                }
            }
            InboundMessage::Error { request_id, error } => {
                if let Some(id) = pending_id(&request_id) {
                    self.pending.reject(&id, error.into());
                }
            }
            InboundMessage::HostContext {
                payload,
                request_id,
            } => {
                let settled = match request_id.as_deref().and_then(pending_id) {
                    Some(id) => self.resolve_context(&id, &payload),
                    None => false,
                };
                if !settled {
                    self.broadcast_context(payload);
                }
            }
        }
    }

    /// Settle `id` with the context. Returns false if `id` was not pending.
    fn resolve_context(&self, id: &CorrelationId, context: &HostContext) -> bool {
        match serde_json::to_value(context) {
            Ok(value) => self.pending.resolve(id, value),
            Err(e) => self
                .pending
                .reject(id, BridgeError::UnexpectedResponse(e.to_string())),
        }
    }

    fn broadcast_context(&self, context: HostContext) {
        match self.contexts.send(context) {
            Ok(receivers) => {
                self.stats.context_pushes.fetch_add(1, Ordering::Relaxed);
                debug!(receivers = receivers, "Broadcast unsolicited host context");
            }
            Err(_) => trace!("Dropped host context (no subscribers)"),
        }
    }

    /// Subscribe to unsolicited context pushes.
    pub fn subscribe_context(&self) -> broadcast::Receiver<HostContext> {
        self.contexts.subscribe()
    }

    /// Stop processing events.
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    pub fn stats(&self) -> &InboundStats {
        &self.stats
    }
}

/// Parse a wire id. Ids this client did not mint cannot be pending.
fn pending_id(raw: &str) -> Option<CorrelationId> {
    match CorrelationId::parse(raw) {
        Ok(id) => Some(id),
        Err(_) => {
            trace!(request_id = raw, "Ignoring response for foreign request id");
            None
        }
    }
}
