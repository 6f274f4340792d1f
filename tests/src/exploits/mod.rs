//! Attack simulations against the inbound path.
//!
//! Every test here follows the same shape: an attacker message arrives
//! while a request is pending, the request must stay pending, and a
//! legitimate reply afterwards must still settle it.

pub mod spoofed_sender;
