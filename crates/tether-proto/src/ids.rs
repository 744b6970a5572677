//! Correlation and component identifiers.
//!
//! Both are opaque strings on the wire. Newtypes keep the two id spaces from
//! being mixed up in signatures and give the registry a proper map key.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Per-send-unique token pairing a reply to its originating send.
///
/// A correlation id is caller-generated and opaque: it is not a session or
/// sequence number and carries no ordering guarantee beyond pairing. Peers
/// echo the id of the frame they are replying to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CorrelationId(String);

impl CorrelationId {
    /// Wrap an existing id string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CorrelationId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl From<String> for CorrelationId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Identifier of one node in the synchronized component hierarchy.
///
/// Unique for the life of a session; once a component is destroyed its id is
/// retired and must not be reused.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComponentId(String);

impl ComponentId {
    /// Sentinel id anchoring the component hierarchy.
    pub const ROOT: &'static str = "root";

    /// Wrap an existing id string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The root sentinel: parent of all top-level components.
    pub fn root() -> Self {
        Self(Self::ROOT.to_owned())
    }

    /// Whether this is the root sentinel.
    pub fn is_root(&self) -> bool {
        self.0 == Self::ROOT
    }

    /// The id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Unwrap into the underlying string.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ComponentId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl From<String> for ComponentId {
    fn from(id: String) -> Self {
        Self(id)
    }
}
