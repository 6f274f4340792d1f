//! Inbound message validation.
//!
//! Structural checks only. The sender has already been authenticated by the
//! time a message gets here; this decides whether its shape is one of the
//! three the client understands.

use bridge_types::{InboundMessage, ERROR, HOST_CONTEXT};
use serde_json::Value;
use tracing::trace;

/// Decode an inbound message, or `None` if it is not a well-formed variant.
///
/// Never panics and never errors; anything unexpected is simply rejected.
pub fn validate_inbound(data: &Value) -> Option<InboundMessage> {
    let object = data.as_object()?;
    let kind = object.get("type")?.as_str()?;

    // Struct fields decode from JSON arrays too; nested records must be
    // objects before the typed decode runs.
    let shaped = match kind {
        HOST_CONTEXT => object.get("payload").is_some_and(|payload| {
            payload.is_object()
                && payload.get("app").is_some_and(Value::is_object)
                && payload.get("platform").is_some_and(Value::is_object)
        }),
        ERROR => object.get("error").is_some_and(Value::is_object),
        _ => true,
    };
    if !shaped {
        trace!(kind = kind, "Rejected inbound message (nested record is not an object)");
        return None;
    }

    match serde_json::from_value::<InboundMessage>(data.clone()) {
        Ok(message) => Some(message),
        Err(e) => {
            trace!(kind = kind, error = %e, "Rejected inbound message");
            None
        }
    }
}
