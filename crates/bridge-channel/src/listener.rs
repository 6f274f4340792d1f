//! # Message Listener
//!
//! The receiving side of a frame's inbox.

use crate::events::{ContextId, MessageEvent};
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::debug;

/// Errors from listener operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ListenerError {
    /// Every handle to the frame was dropped.
    #[error("frame closed")]
    Closed,
}

/// A registered message listener.
///
/// Dropping it removes the listener from the frame.
pub struct Listener {
    /// Broadcast receiver for the frame's inbox.
    receiver: broadcast::Receiver<MessageEvent>,

    /// Frame this listener is attached to.
    frame_id: ContextId,
}

impl Listener {
    pub(crate) fn new(receiver: broadcast::Receiver<MessageEvent>, frame_id: ContextId) -> Self {
        Self { receiver, frame_id }
    }

    /// Receive the next message.
    ///
    /// # Returns
    ///
    /// - `Some(event)` - The next delivered message
    /// - `None` - The frame was dropped
    pub async fn recv(&mut self) -> Option<MessageEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Closed) => return None,
                Err(broadcast::error::RecvError::Lagged(count)) => {
                    debug!(
                        frame = %self.frame_id,
                        lagged = count,
                        "Listener lagged, some messages dropped"
                    );
                    continue;
                }
            }
        }
    }

    /// Receive the next message without waiting.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(event))` - A message was available
    /// - `Ok(None)` - Nothing queued
    /// - `Err(ListenerError::Closed)` - The frame was dropped
    pub fn try_recv(&mut self) -> Result<Option<MessageEvent>, ListenerError> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => return Ok(Some(event)),
                Err(broadcast::error::TryRecvError::Empty) => return Ok(None),
                Err(broadcast::error::TryRecvError::Closed) => return Err(ListenerError::Closed),
                Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
            }
        }
    }

    /// The frame this listener is attached to.
    #[must_use]
    pub fn frame_id(&self) -> ContextId {
        self.frame_id
    }
}

impl Drop for Listener {
    fn drop(&mut self) {
        debug!(frame = %self.frame_id, "Listener removed");
    }
}
