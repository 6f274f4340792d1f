//! Correlation Table - matches inbound responses to outstanding requests.
//!
//! Flow:
//! 1. Client generates a `CorrelationId`
//! 2. Client calls `register()` to get a oneshot receiver; a timer task starts
//! 3. Client posts the request carrying the id
//! 4. Listener calls `resolve()` / `reject()` when the host answers
//! 5. Whichever of the timer and the listener removes the entry first
//!    settles it; the other finds nothing and does nothing

use crate::domain::config::MIN_TIMEOUT;
use crate::domain::correlation::CorrelationId;
use crate::domain::error::{BridgeError, BridgeResult};
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};
use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tokio::task::AbortHandle;
use tracing::{debug, warn};

/// Outcome delivered to the waiting caller.
pub type Settlement = BridgeResult<Value>;

/// A request waiting for its response.
struct PendingRequest {
    /// Channel to settle the caller's future
    sender: oneshot::Sender<Settlement>,
    /// Deadline task for this entry
    timer: AbortHandle,
    /// Request tag (for logging and timeout errors)
    tag: String,
    /// When the request was registered
    created_at: Instant,
    /// Effective timeout
    timeout: Duration,
}

impl PendingRequest {
    /// Stop the timer and hand the outcome to the caller.
    ///
    /// Returns false if the caller stopped waiting.
    fn settle(self, outcome: Settlement) -> bool {
        self.timer.abort();
        self.sender.send(outcome).is_ok()
    }
}

/// Counters for the correlation table.
#[derive(Debug, Default)]
pub struct PendingStats {
    /// Total requests registered
    pub total_registered: AtomicU64,
    /// Total requests settled with a host result
    pub total_resolved: AtomicU64,
    /// Total requests settled with a host error
    pub total_rejected: AtomicU64,
    /// Total requests that hit their deadline
    pub total_timeouts: AtomicU64,
    /// Total requests removed without settlement
    pub total_cancelled: AtomicU64,
    /// Total requests failed by teardown
    pub total_drained: AtomicU64,
}

/// Point-in-time copy of [`PendingStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PendingSnapshot {
    pub registered: u64,
    pub resolved: u64,
    pub rejected: u64,
    pub timed_out: u64,
    pub cancelled: u64,
    pub drained: u64,
    pub pending: usize,
}

/// Table contents guarded by one lock.
#[derive(Default)]
struct Slots {
    requests: HashMap<CorrelationId, PendingRequest>,
    /// Set by `drain_all`; no registration succeeds afterwards
    closed: bool,
}

type Entries = Mutex<Slots>;

/// Table of outstanding requests keyed by correlation id.
///
/// Every settlement path removes the entry under the table lock before
/// completing it, so each id settles at most once.
pub struct CorrelationTable {
    entries: Arc<Entries>,
    stats: Arc<PendingStats>,
}

impl CorrelationTable {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(Mutex::new(Slots::default())),
            stats: Arc::new(PendingStats::default()),
        }
    }

    /// Register a pending request and start its deadline.
    ///
    /// The deadline is floored at [`MIN_TIMEOUT`].
    ///
    /// # Errors
    ///
    /// - `BridgeError::Destroyed` - the table was drained
    /// - `BridgeError::DuplicateRequest` - `id` is already pending
    /// - `BridgeError::NoRuntime` - called outside a Tokio runtime
    pub fn register(
        &self,
        id: CorrelationId,
        tag: &str,
        timeout: Duration,
    ) -> BridgeResult<oneshot::Receiver<Settlement>> {
        let handle = Handle::try_current().map_err(|_| BridgeError::NoRuntime)?;
        let timeout = timeout.max(MIN_TIMEOUT);
        let (tx, rx) = oneshot::channel();

        let mut entries = self.entries.lock();
        if entries.closed {
            return Err(BridgeError::Destroyed);
        }
        if entries.requests.contains_key(&id) {
            return Err(BridgeError::DuplicateRequest(id));
        }

        // The timer cannot observe the table before the insert below: it
        // needs the same lock to expire the entry.
        let timer = handle
            .spawn(expire_after(
                Arc::downgrade(&self.entries),
                Arc::clone(&self.stats),
                id,
                timeout,
            ))
            .abort_handle();

        entries.requests.insert(
            id,
            PendingRequest {
                sender: tx,
                timer,
                tag: tag.to_string(),
                created_at: Instant::now(),
                timeout,
            },
        );
        drop(entries);

        self.stats.total_registered.fetch_add(1, Ordering::Relaxed);
        debug!(
            correlation_id = %id,
            tag = tag,
            timeout_ms = timeout.as_millis(),
            "Registered pending request"
        );

        Ok(rx)
    }

    /// Settle a pending request with a success value.
    ///
    /// Returns true if the id was pending.
    pub fn resolve(&self, id: &CorrelationId, value: Value) -> bool {
        let Some(pending) = self.entries.lock().requests.remove(id) else {
            debug!(correlation_id = %id, "Result for unknown or settled request");
            return false;
        };

        self.stats.total_resolved.fetch_add(1, Ordering::Relaxed);
        debug!(
            correlation_id = %id,
            tag = pending.tag,
            response_time_ms = pending.created_at.elapsed().as_millis(),
            "Resolved pending request"
        );
        if !pending.settle(Ok(value)) {
            debug!(correlation_id = %id, "Caller stopped waiting before resolution");
        }
        true
    }

    /// Settle a pending request with a failure.
    ///
    /// Returns true if the id was pending.
    pub fn reject(&self, id: &CorrelationId, error: BridgeError) -> bool {
        let Some(pending) = self.entries.lock().requests.remove(id) else {
            debug!(correlation_id = %id, "Error for unknown or settled request");
            return false;
        };

        self.stats.total_rejected.fetch_add(1, Ordering::Relaxed);
        debug!(
            correlation_id = %id,
            tag = pending.tag,
            error = %error,
            "Rejected pending request"
        );
        pending.settle(Err(error));
        true
    }

    /// Remove a pending request without settling it.
    ///
    /// The caller's receiver observes a closed channel.
    pub fn cancel(&self, id: &CorrelationId) -> bool {
        match self.entries.lock().requests.remove(id) {
            Some(pending) => {
                pending.timer.abort();
                self.stats.total_cancelled.fetch_add(1, Ordering::Relaxed);
                true
            }
            None => false,
        }
    }

    /// Fail every pending request, empty the table and close it.
    ///
    /// Later registrations fail with `BridgeError::Destroyed`. Returns the
    /// number of requests drained.
    pub fn drain_all(&self, error: impl Fn() -> BridgeError) -> usize {
        let drained: Vec<_> = {
            let mut entries = self.entries.lock();
            entries.closed = true;
            entries.requests.drain().collect()
        };
        let count = drained.len();

        for (id, pending) in drained {
            debug!(correlation_id = %id, tag = pending.tag, "Draining pending request");
            pending.settle(Err(error()));
        }

        self.stats
            .total_drained
            .fetch_add(count as u64, Ordering::Relaxed);
        count
    }

    /// Get number of currently pending requests
    pub fn pending_count(&self) -> usize {
        self.entries.lock().requests.len()
    }

    /// Check if a correlation ID is pending
    pub fn is_pending(&self, id: &CorrelationId) -> bool {
        self.entries.lock().requests.contains_key(id)
    }

    /// Whether `drain_all` has run.
    pub fn is_closed(&self) -> bool {
        self.entries.lock().closed
    }

    /// Get statistics
    pub fn stats(&self) -> &PendingStats {
        &self.stats
    }

    /// Copy the counters.
    pub fn snapshot(&self) -> PendingSnapshot {
        PendingSnapshot {
            registered: self.stats.total_registered.load(Ordering::Relaxed),
            resolved: self.stats.total_resolved.load(Ordering::Relaxed),
            rejected: self.stats.total_rejected.load(Ordering::Relaxed),
            timed_out: self.stats.total_timeouts.load(Ordering::Relaxed),
            cancelled: self.stats.total_cancelled.load(Ordering::Relaxed),
            drained: self.stats.total_drained.load(Ordering::Relaxed),
            pending: self.pending_count(),
        }
    }
}

impl Default for CorrelationTable {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for CorrelationTable {
    fn drop(&mut self) {
        for (_, pending) in self.entries.lock().requests.drain() {
            pending.timer.abort();
        }
    }
}

/// Deadline task for a single entry.
async fn expire_after(
    entries: Weak<Entries>,
    stats: Arc<PendingStats>,
    id: CorrelationId,
    timeout: Duration,
) {
    tokio::time::sleep(timeout).await;

    let Some(entries) = entries.upgrade() else {
        return;
    };
    let Some(pending) = entries.lock().requests.remove(&id) else {
        return;
    };

    stats.total_timeouts.fetch_add(1, Ordering::Relaxed);
    warn!(
        correlation_id = %id,
        tag = pending.tag,
        timeout_ms = pending.timeout.as_millis(),
        "Request timed out"
    );

    let error = BridgeError::Timeout {
        tag: pending.tag.clone(),
        timeout: pending.timeout,
    };
    // This task is the timer; aborting itself is harmless.
    pending.settle(Err(error));
}
