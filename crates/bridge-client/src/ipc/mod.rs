//! Channel-facing layer: inbound validation, sender checks and the listener task.

pub mod inbound;
pub mod listener;
pub mod validation;

pub use inbound::{InboundHandler, InboundStats};
pub use listener::ResponseListener;
pub use validation::validate_inbound;
