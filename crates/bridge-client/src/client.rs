//! Bridge client: correlated requests from an embedded window to its host.

use crate::domain::config::BridgeConfig;
use crate::domain::correlation::CorrelationId;
use crate::domain::error::{BridgeError, BridgeResult};
use crate::domain::pending::{CorrelationTable, PendingSnapshot, Settlement};
use crate::domain::requests::RequestTag;
use crate::ipc::inbound::InboundHandler;
use crate::ipc::listener::ResponseListener;
use bridge_channel::{Delivery, Frame, MessageEvent, MessageTarget};
use bridge_types::{HostContext, ReadyEnvelope, RequestEnvelope, TrustedOrigin, APP_READY};
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::Value;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::{broadcast, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Buffered unsolicited context pushes per subscriber.
const CONTEXT_CHANNEL_CAPACITY: usize = 16;

/// Counters reported by [`BridgeClient::stats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BridgeStats {
    pub pending: PendingSnapshot,
    pub discarded_untrusted: u64,
    pub discarded_malformed: u64,
    pub context_pushes: u64,
}

/// Future returned by [`BridgeClient::request`].
///
/// Settles with the host's result, the host's error, a timeout, or
/// [`BridgeError::Destroyed`] on teardown.
#[must_use = "a request does nothing observable unless its response is awaited"]
pub struct PendingResponse {
    id: CorrelationId,
    receiver: oneshot::Receiver<Settlement>,
}

impl PendingResponse {
    /// The correlation id sent as `requestId`.
    pub fn correlation_id(&self) -> CorrelationId {
        self.id
    }
}

impl Future for PendingResponse {
    type Output = BridgeResult<Value>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.receiver)
            .poll(cx)
            .map(|settled| settled.unwrap_or(Err(BridgeError::ResponseDropped)))
    }
}

/// Client side of the host bridge.
///
/// Cheap to clone; clones share one correlation table and one listener.
/// Dropping the last clone tears the client down.
#[derive(Clone)]
pub struct BridgeClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    config: BridgeConfig,
    trusted_origin: TrustedOrigin,
    /// Window the client lives in; outbound messages are posted as it
    window: Arc<Frame>,
    /// Only target requests are ever posted to
    parent: Arc<dyn MessageTarget>,
    pending: Arc<CorrelationTable>,
    inbound: Arc<InboundHandler>,
    destroyed: AtomicBool,
    listener_task: Mutex<Option<JoinHandle<()>>>,
}

impl BridgeClient {
    /// Create a client for `window` and start listening.
    ///
    /// `parent` overrides the trusted target; by default it is the window's
    /// embedding parent.
    ///
    /// # Errors
    ///
    /// - `BridgeError::InvalidOrigin` - the trust anchor is not an http/https URL
    /// - `BridgeError::NoParent` - no parent supplied and the window is top-level
    /// - `BridgeError::NoRuntime` - called outside a Tokio runtime
    pub fn new(
        config: BridgeConfig,
        window: Arc<Frame>,
        parent: Option<Arc<dyn MessageTarget>>,
    ) -> BridgeResult<Self> {
        let trusted_origin = config
            .validate()
            .map_err(|_| BridgeError::InvalidOrigin(config.trusted_origin.clone()))?;

        let parent = parent
            .or_else(|| window.parent().map(|p| p as Arc<dyn MessageTarget>))
            .ok_or(BridgeError::NoParent)?;

        let runtime = Handle::try_current().map_err(|_| BridgeError::NoRuntime)?;

        let pending = Arc::new(CorrelationTable::new());
        let inbound = Arc::new(InboundHandler::new(
            trusted_origin.clone(),
            parent.context_id(),
            Arc::clone(&pending),
            CONTEXT_CHANNEL_CAPACITY,
        ));
        let listener = ResponseListener::new(Arc::clone(&inbound), window.add_listener());
        let task = runtime.spawn(listener.run());

        info!(
            trusted_origin = %trusted_origin,
            window = %window.id(),
            parent = %parent.context_id(),
            default_timeout_ms = config.default_timeout().as_millis(),
            "Bridge client started"
        );

        Ok(Self {
            inner: Arc::new(ClientInner {
                config,
                trusted_origin,
                window,
                parent,
                pending,
                inbound,
                destroyed: AtomicBool::new(false),
                listener_task: Mutex::new(Some(task)),
            }),
        })
    }

    /// Send a request and return a future for its response.
    ///
    /// The request is posted before this returns. `timeout` is honoured only
    /// if it is at least [`crate::MIN_TIMEOUT`]; otherwise the configured
    /// default applies.
    ///
    /// # Errors
    ///
    /// - `BridgeError::Destroyed` - the client was torn down; nothing is sent
    /// - `BridgeError::Channel` - the channel refused the message
    pub fn request(
        &self,
        tag: impl AsRef<str>,
        payload: Option<Value>,
        timeout: Option<Duration>,
    ) -> BridgeResult<PendingResponse> {
        self.ensure_active()?;

        let tag = tag.as_ref();
        let envelope = |id: CorrelationId| RequestEnvelope {
            kind: tag.to_string(),
            payload,
            request_id: id.to_string(),
        };

        self.dispatch_correlated(tag, timeout, envelope)
    }

    /// Send a request and wait for its response.
    pub async fn send_and_wait(
        &self,
        tag: impl AsRef<str>,
        payload: Option<Value>,
        timeout: Option<Duration>,
    ) -> BridgeResult<Value> {
        self.request(tag, payload, timeout)?.await
    }

    /// Call a recognized host operation with the default timeout.
    pub async fn call(&self, tag: RequestTag, payload: Option<Value>) -> BridgeResult<Value> {
        self.send_and_wait(tag, payload, None).await
    }

    /// Ask the host for its current context.
    pub async fn get_context(&self) -> BridgeResult<Value> {
        self.call(RequestTag::GetContext, None).await
    }

    /// Tell the host the application is ready. No response is awaited.
    ///
    /// # Errors
    ///
    /// - `BridgeError::Destroyed` - the client was torn down
    /// - `BridgeError::Channel` - the channel refused the message
    pub fn announce_ready(&self, request_id: Option<&str>) -> BridgeResult<()> {
        self.ensure_active()?;

        let envelope = ReadyEnvelope::new(request_id.map(str::to_string));
        let delivery = self.post(APP_READY, &envelope)?;
        debug!(request_id = ?request_id, delivered = delivery.is_delivered(), "Announced ready");
        Ok(())
    }

    /// Announce readiness and wait for the host's context push.
    ///
    /// The `APP_READY` message carries a fresh correlation id; the host
    /// answers with a `HOST_CONTEXT` keyed on it.
    pub async fn handshake(&self, timeout: Option<Duration>) -> BridgeResult<HostContext> {
        self.ensure_active()?;

        let response = self.dispatch_correlated(APP_READY, timeout, |id: CorrelationId| {
            ReadyEnvelope::new(Some(id.to_string()))
        })?;
        let value = response.await?;

        serde_json::from_value(value).map_err(|e| BridgeError::UnexpectedResponse(e.to_string()))
    }

    /// Process one inbound event. Untrusted or malformed events are dropped.
    ///
    /// The listener task calls this for every event the window receives;
    /// it is public so an embedder with its own event loop can drive it.
    pub fn handle_message(&self, event: &MessageEvent) {
        self.inner.inbound.handle(event);
    }

    /// Receive host context pushes that do not answer a pending request.
    pub fn subscribe_context(&self) -> broadcast::Receiver<HostContext> {
        self.inner.inbound.subscribe_context()
    }

    /// Tear the client down.
    ///
    /// Stops listening and fails every outstanding request with
    /// [`BridgeError::Destroyed`]. Later calls do nothing.
    pub fn destroy(&self) {
        self.inner.teardown();
    }

    pub fn is_destroyed(&self) -> bool {
        self.inner.destroyed.load(Ordering::Acquire)
    }

    /// Canonical trusted origin.
    pub fn trusted_origin(&self) -> &TrustedOrigin {
        &self.inner.trusted_origin
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.inner.config
    }

    pub fn pending_count(&self) -> usize {
        self.inner.pending.pending_count()
    }

    pub fn stats(&self) -> BridgeStats {
        let inbound = self.inner.inbound.stats();
        BridgeStats {
            pending: self.inner.pending.snapshot(),
            discarded_untrusted: inbound.discarded_untrusted.load(Ordering::Relaxed),
            discarded_malformed: inbound.discarded_malformed.load(Ordering::Relaxed),
            context_pushes: inbound.context_pushes.load(Ordering::Relaxed),
        }
    }

    fn ensure_active(&self) -> BridgeResult<()> {
        if self.is_destroyed() {
            return Err(BridgeError::Destroyed);
        }
        Ok(())
    }

    /// Register a fresh id, post the envelope built for it, and hand back
    /// the response future.
    fn dispatch_correlated<E: Serialize>(
        &self,
        tag: &str,
        timeout: Option<Duration>,
        envelope: impl FnOnce(CorrelationId) -> E,
    ) -> BridgeResult<PendingResponse> {
        let id = CorrelationId::new();
        let timeout = self.inner.config.effective_timeout(timeout);
        let receiver = self.inner.pending.register(id, tag, timeout)?;
        if self.inner.pending.is_closed() {
            // Drained by a concurrent teardown; the receiver already holds Destroyed.
            return Err(BridgeError::Destroyed);
        }

        match self.post(tag, &envelope(id)) {
            Ok(Delivery::Delivered(_)) => {
                debug!(correlation_id = %id, tag = tag, "Sent request");
            }
            Ok(Delivery::OriginMismatch) => {
                // Left pending; the deadline settles it.
                warn!(
                    correlation_id = %id,
                    tag = tag,
                    trusted_origin = %self.inner.trusted_origin,
                    parent_origin = self.inner.parent.origin(),
                    "Request not delivered (parent origin differs from trusted origin)"
                );
            }
            Err(e) => {
                self.inner.pending.cancel(&id);
                return Err(e);
            }
        }

        Ok(PendingResponse { id, receiver })
    }

    /// Serialize and post to the trusted parent, restricted to the trusted origin.
    fn post<E: Serialize>(&self, tag: &str, envelope: &E) -> BridgeResult<Delivery> {
        let data = serde_json::to_value(envelope).map_err(|e| BridgeError::Encode {
            tag: tag.to_string(),
            reason: e.to_string(),
        })?;

        let inner = &self.inner;
        Ok(inner
            .parent
            .post_message(data, inner.trusted_origin.as_str(), &inner.window)?)
    }
}

impl ClientInner {
    fn teardown(&self) {
        if self.destroyed.swap(true, Ordering::AcqRel) {
            return;
        }

        self.inbound.close();
        if let Some(task) = self.listener_task.lock().take() {
            task.abort();
        }
        let drained = self.pending.drain_all(|| BridgeError::Destroyed);

        info!(
            window = %self.window.id(),
            drained = drained,
            "Bridge client destroyed"
        );
    }
}

impl Drop for ClientInner {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl std::fmt::Debug for BridgeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BridgeClient")
            .field("trusted_origin", &self.inner.trusted_origin)
            .field("window", &self.inner.window.id())
            .field("parent", &self.inner.parent.context_id())
            .field("destroyed", &self.is_destroyed())
            .finish()
    }
}
