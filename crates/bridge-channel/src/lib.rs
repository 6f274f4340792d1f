//! # Bridge Channel - Cross-Context Messaging
//!
//! An in-process model of browsing contexts exchanging `postMessage` events.
//!
//! ```text
//! ┌──────────────────────────┐
//! │ Host frame               │
//! │  origin: https://host    │
//! │                          │
//! │  ┌────────────────────┐  │   post_message(data, "https://host", app)
//! │  │ Embedded frame     │ ─┼──────────────────────────────┐
//! │  │  origin: https://app│ │                              ▼
//! │  └────────────────────┘  │                      host inbox ──► listeners
//! └──────────────────────────┘
//! ```
//!
//! ## Security
//!
//! - **Channel-Stamped Identity:** `origin` and `source` on every event come
//!   from the posting frame, not from the payload
//! - **Target Origin Restriction:** a message is delivered only if the
//!   destination's origin matches the requested target origin (or `*`)

// Nursery lints that are too strict
#![allow(clippy::missing_const_for_fn)]
// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod events;
pub mod frame;
pub mod listener;

pub use events::{ContextId, MessageEvent};
pub use frame::{ChannelError, Delivery, Frame, MessageTarget, WILDCARD_ORIGIN};
pub use listener::{Listener, ListenerError};

/// Maximum messages buffered per listener before the oldest are dropped.
pub const DEFAULT_INBOX_CAPACITY: usize = 256;
