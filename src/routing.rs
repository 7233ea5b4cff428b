//! Tool name -> backend resolution.

use std::sync::Arc;

use crate::registry::{ServiceDescriptor, ServiceRegistry};
use crate::types::{Error, Result};

/// How a tool name was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteMatch<'a> {
    /// Listed in a service's declared tools.
    Exact,
    /// Fell through to the prefix rule with this prefix.
    Prefix(&'a str),
}

/// Resolves tool names against the registry.
///
/// Exact table first, then prefix rules front to back. Resolution reads only
/// immutable registry data, so a name always lands on the same service.
#[derive(Debug, Clone)]
pub struct ToolRouter {
    registry: Arc<ServiceRegistry>,
}

impl ToolRouter {
    pub fn new(registry: Arc<ServiceRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &ServiceRegistry {
        &self.registry
    }

    /// Resolve `tool_name` to its service, or `Error::UnknownTool`.
    pub fn route(&self, tool_name: &str) -> Result<&ServiceDescriptor> {
        self.resolve(tool_name).map(|(service, _)| service)
    }

    /// Like [`route`](Self::route), also reporting which table matched.
    pub fn resolve(&self, tool_name: &str) -> Result<(&ServiceDescriptor, RouteMatch<'_>)> {
        if let Some(service) = self.registry.find_by_exact_tool(tool_name) {
            return Ok((service, RouteMatch::Exact));
        }

        if let Some(rule) = self.registry.find_by_prefix(tool_name) {
            // Targets are checked when the registry is built.
            let service = self.registry.service(rule.service()).ok_or_else(|| {
                Error::internal(format!(
                    "prefix rule '{}' points at unregistered service {}",
                    rule.prefix(),
                    rule.service()
                ))
            })?;
            return Ok((service, RouteMatch::Prefix(rule.prefix())));
        }

        Err(Error::unknown_tool(tool_name))
    }
}

// =============================================================================
// Tests
// =============================================================================
