//! # Trusted Origin
//!
//! Canonicalizes a user-supplied trust anchor into a comparable origin.
//!
//! ## Rules
//!
//! - Only `http` and `https` URLs are accepted
//! - The canonical form is the ASCII serialization of the URL origin:
//!   lower-cased scheme and host, default port elided, no path, query,
//!   fragment or trailing slash
//! - Two origins are equal iff their canonical strings are equal

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use url::Url;

/// Schemes a trust anchor may use.
pub const ALLOWED_SCHEMES: [&str; 2] = ["http", "https"];

/// A canonical `scheme://host[:port]` origin.
///
/// Only constructible through [`normalize_origin`], so holding one proves
/// the value was validated.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TrustedOrigin(String);

impl TrustedOrigin {
    /// The canonical origin string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Exact comparison against an origin reported by the channel.
    #[must_use]
    pub fn matches(&self, origin: &str) -> bool {
        self.0 == origin
    }
}

impl fmt::Display for TrustedOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for TrustedOrigin {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Serialize for TrustedOrigin {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for TrustedOrigin {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        normalize_origin(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid origin: {raw}")))
    }
}

/// Normalize a raw trust anchor.
///
/// Returns `None` when the input is not a well-formed `http`/`https` URL.
/// Callers decide how to surface the failure.
#[must_use]
pub fn normalize_origin(raw: &str) -> Option<TrustedOrigin> {
    let url = Url::parse(raw.trim()).ok()?;

    if !ALLOWED_SCHEMES.contains(&url.scheme()) {
        return None;
    }

    let origin = url.origin();
    if !origin.is_tuple() {
        return None;
    }

    Some(TrustedOrigin(origin.ascii_serialization()))
}
