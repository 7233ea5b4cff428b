//! Strongly-typed identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Per-call correlation identifier.
///
/// Minted fresh for every proxied tool call and sent downstream as the
/// JSON-RPC `id`. Only used for tracing; nothing routes on it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CorrelationId(String);

impl CorrelationId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for CorrelationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
