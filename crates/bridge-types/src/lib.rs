//! # Bridge Types Crate
//!
//! Wire envelopes, the trusted-origin type and host error codes shared by
//! every crate in the workspace.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: every shape that crosses the frame boundary
//!   is defined here.
//! - **Closed Variants**: inbound messages decode into exactly one of three
//!   variants or not at all.
//! - **Validated Origins**: a [`TrustedOrigin`] can only be obtained through
//!   [`normalize_origin`].

pub mod envelope;
pub mod errors;
pub mod origin;

pub use envelope::{
    AppInfo, ContextVersion, DisplayMode, HostContext, InboundMessage, PlatformInfo,
    ReadyEnvelope, RequestEnvelope, APP_READY, ERROR, HOST_CONTEXT, RESULT,
};
pub use errors::{HostError, HostErrorCode};
pub use origin::{normalize_origin, TrustedOrigin};
