// Allow missing docs for internal items in development
#![allow(missing_docs)]

//! # Bridge Client - Correlated Requests to a Trusted Host
//!
//! An embedded application talks to its embedding host over an untrusted
//! message channel. This crate turns that channel into typed
//! request/response calls.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                       BridgeClient                            │
//! │                                                              │
//! │  request(tag, payload) ──► CorrelationTable::register ──┐    │
//! │        │                     (timer task per entry)     │    │
//! │        ▼                                                │    │
//! │  parent.post_message(envelope, trusted_origin)          │    │
//! │                                                         │    │
//! │  ResponseListener ──► InboundHandler                    │    │
//! │                        1. sender origin + context       │    │
//! │                        2. validate_inbound              │    │
//! │                        3. resolve / reject / broadcast ─┘    │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use bridge_client::{BridgeClient, BridgeConfig, RequestTag};
//!
//! let client = BridgeClient::new(BridgeConfig::new("https://host.example"), window, None)?;
//! let context = client.handshake(None).await?;
//! let categories = client.call(RequestTag::ListCategories, None).await?;
//! ```
//!
//! # Security
//!
//! - Requests are posted only to the trusted parent, restricted to the
//!   canonical trusted origin (never `*`)
//! - Inbound events must match both the trusted origin and the trusted
//!   parent context; anything else is discarded before parsing
//! - Every request settles exactly once: result, host error, timeout, or
//!   teardown

#![warn(clippy::all)]
#![deny(unsafe_code)]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod client;
pub mod domain;
pub mod ipc;

pub use client::{BridgeClient, BridgeStats, PendingResponse};
pub use domain::{
    BridgeConfig, BridgeError, BridgeResult, ConfigError, CorrelationId, CorrelationTable,
    PendingSnapshot, RequestTag, DEFAULT_TIMEOUT, MIN_TIMEOUT,
};
pub use ipc::validate_inbound;
