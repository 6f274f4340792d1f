//! Response listener task.

use crate::ipc::inbound::InboundHandler;
use bridge_channel::Listener;
use std::sync::Arc;
use tracing::debug;

/// Feeds events from the embedded window into the inbound handler.
pub struct ResponseListener {
    handler: Arc<InboundHandler>,
    listener: Listener,
}

impl ResponseListener {
    pub fn new(handler: Arc<InboundHandler>, listener: Listener) -> Self {
        Self { handler, listener }
    }

    /// Run the listener loop until the window goes away or the handler closes.
    pub async fn run(mut self) {
        while let Some(event) = self.listener.recv().await {
            if self.handler.is_closed() {
                break;
            }
            self.handler.handle(&event);
        }
        debug!(frame = %self.listener.frame_id(), "Response listener stopped");
    }
}
