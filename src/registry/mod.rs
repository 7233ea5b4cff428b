//! Service registry - static catalog of backend services.
//!
//! Features:
//!   - Descriptor lookup by service name
//!   - Exact tool table (first registration of a tool wins)
//!   - Ordered prefix rules (first matching rule wins)
//!   - Per-service status slot, the only mutable state
//!
//! Membership is fixed once `from_config` returns.

mod descriptor;

pub use descriptor::{Endpoint, ServiceDescriptor, ServiceSnapshot, ServiceStatus};

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use crate::types::{Error, FleetConfig, Result};

// =============================================================================
// Prefix Rule
// =============================================================================

/// Fallback routing rule: tool names starting with `prefix` go to `service`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefixRule {
    prefix: String,
    service: String,
}

impl PrefixRule {
    pub fn new(prefix: impl Into<String>, service: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            service: service.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Name of the target service.
    pub fn service(&self) -> &str {
        &self.service
    }

    pub fn matches(&self, tool_name: &str) -> bool {
        tool_name.starts_with(&self.prefix)
    }
}

// =============================================================================
// Service Registry
// =============================================================================

/// Immutable backend catalog.
#[derive(Debug)]
pub struct ServiceRegistry {
    /// Descriptors in registration order.
    services: Vec<ServiceDescriptor>,
    by_name: HashMap<String, usize>,
    /// Tool name -> index into `services`.
    exact: HashMap<String, usize>,
    /// Evaluated front to back.
    prefix_rules: Vec<PrefixRule>,
}

impl ServiceRegistry {
    /// Build the registry from fleet configuration.
    ///
    /// Rejects empty or duplicate service names, port 0, empty prefixes, and
    /// prefix rules that target an unregistered service. A tool declared by
    /// more than one service stays with the first one; the duplicate and any
    /// prefix rule that can never fire are logged.
    pub fn from_config(fleet: &FleetConfig) -> Result<Self> {
        let mut services: Vec<ServiceDescriptor> = Vec::with_capacity(fleet.services.len());
        let mut by_name = HashMap::new();
        let mut exact: HashMap<String, usize> = HashMap::new();

        for (idx, svc) in fleet.services.iter().enumerate() {
            if svc.name.is_empty() {
                return Err(Error::config(format!("service #{idx} has an empty name")));
            }
            if svc.port == 0 {
                return Err(Error::config(format!("service {} has port 0", svc.name)));
            }
            if by_name.insert(svc.name.clone(), idx).is_some() {
                return Err(Error::config(format!("duplicate service name: {}", svc.name)));
            }

            for tool in &svc.tools {
                match exact.entry(tool.clone()) {
                    Entry::Occupied(entry) => {
                        let owner = &services[*entry.get()];
                        tracing::warn!(
                            tool = %tool,
                            kept = owner.name(),
                            ignored = %svc.name,
                            "tool declared by more than one service; first registration wins"
                        );
                    }
                    Entry::Vacant(entry) => {
                        entry.insert(idx);
                    }
                }
            }

            services.push(ServiceDescriptor::from_config(svc));
        }

        let mut prefix_rules = Vec::with_capacity(fleet.prefix_rules.len());
        for rule in &fleet.prefix_rules {
            if rule.prefix.is_empty() {
                return Err(Error::config(format!(
                    "prefix rule for {} has an empty prefix",
                    rule.service
                )));
            }
            if !by_name.contains_key(&rule.service) {
                return Err(Error::config(format!(
                    "prefix rule '{}' targets unknown service {}",
                    rule.prefix, rule.service
                )));
            }
            prefix_rules.push(PrefixRule::new(rule.prefix.clone(), rule.service.clone()));
        }

        let registry = Self {
            services,
            by_name,
            exact,
            prefix_rules,
        };

        for (shadowed, by) in registry.shadowed_prefix_rules() {
            tracing::warn!(
                prefix = shadowed.prefix(),
                service = shadowed.service(),
                shadowed_by = by.prefix(),
                winner = by.service(),
                "prefix rule is unreachable; an earlier rule always matches first"
            );
        }

        Ok(registry)
    }

    // =========================================================================
    // Lookup
    // =========================================================================

    /// All descriptors, in registration order.
    pub fn list_all(&self) -> Vec<ServiceSnapshot> {
        self.services.iter().map(ServiceDescriptor::snapshot).collect()
    }

    /// Borrow every descriptor, in registration order.
    pub fn services(&self) -> &[ServiceDescriptor] {
        &self.services
    }

    /// Get a service by name.
    pub fn service(&self, name: &str) -> Option<&ServiceDescriptor> {
        self.by_name.get(name).map(|&idx| &self.services[idx])
    }

    /// Service owning `tool_name` in the exact table.
    pub fn find_by_exact_tool(&self, tool_name: &str) -> Option<&ServiceDescriptor> {
        self.exact.get(tool_name).map(|&idx| &self.services[idx])
    }

    /// First prefix rule, in registration order, that matches `tool_name`.
    pub fn find_by_prefix(&self, tool_name: &str) -> Option<&PrefixRule> {
        self.prefix_rules.iter().find(|rule| rule.matches(tool_name))
    }

    pub fn prefix_rules(&self) -> &[PrefixRule] {
        &self.prefix_rules
    }

    /// Rules that never fire, each paired with the earlier rule that always
    /// wins over it.
    pub fn shadowed_prefix_rules(&self) -> Vec<(&PrefixRule, &PrefixRule)> {
        self.prefix_rules
            .iter()
            .enumerate()
            .filter_map(|(idx, rule)| {
                self.prefix_rules[..idx]
                    .iter()
                    .find(|earlier| rule.prefix.starts_with(&earlier.prefix))
                    .map(|earlier| (rule, earlier))
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PrefixRuleConfig, ServiceConfig};
    use tracing_test::traced_test;

    fn svc(name: &str, port: u16, tools: &[&str]) -> ServiceConfig {
        ServiceConfig {
            name: name.to_string(),
            description: format!("{name} service"),
            host: "127.0.0.1".to_string(),
            port,
            tools: tools.iter().map(|t| t.to_string()).collect(),
            container: format!("mcp-{name}"),
        }
    }

    fn rule(prefix: &str, service: &str) -> PrefixRuleConfig {
        PrefixRuleConfig {
            prefix: prefix.to_string(),
            service: service.to_string(),
        }
    }

    #[test]
    fn test_default_fleet_builds() {
        let registry = ServiceRegistry::from_config(&FleetConfig::default()).unwrap();
        assert_eq!(registry.len(), 9);
        let names: Vec<String> = registry.list_all().into_iter().map(|s| s.name).collect();
        assert_eq!(names[0], "filesystem");
        assert_eq!(names[8], "research");
    }

    #[test]
    fn test_exact_lookup() {
        let registry = ServiceRegistry::from_config(&FleetConfig::default()).unwrap();
        assert_eq!(registry.find_by_exact_tool("git_log").unwrap().name(), "git");
        assert!(registry.find_by_exact_tool("git_rebase").is_none());
    }

    #[test]
    fn test_duplicate_tool_first_registration_wins() {
        let registry = ServiceRegistry::from_config(&FleetConfig::default()).unwrap();
        // memory and cldmemory both declare store_memory
        assert_eq!(
            registry.find_by_exact_tool("store_memory").unwrap().name(),
            "memory"
        );
    }

    #[test]
    fn test_prefix_lookup_is_ordered() {
        let fleet = FleetConfig {
            services: vec![svc("a", 9001, &[]), svc("b", 9002, &[])],
            prefix_rules: vec![rule("search_", "a"), rule("search_web", "b")],
        };
        let registry = ServiceRegistry::from_config(&fleet).unwrap();
        let hit = registry.find_by_prefix("search_web_pages").unwrap();
        assert_eq!(hit.service(), "a");
        assert_eq!(hit.prefix(), "search_");
        assert!(registry.find_by_prefix("web").is_none());
    }

    #[test]
    fn test_shadowed_rules_reported() {
        let registry = ServiceRegistry::from_config(&FleetConfig::default()).unwrap();
        let shadowed: Vec<(&str, &str)> = registry
            .shadowed_prefix_rules()
            .into_iter()
            .map(|(rule, by)| (rule.service(), by.service()))
            .collect();
        assert_eq!(
            shadowed,
            vec![("cldmemory", "memory"), ("cldmemory", "memory")]
        );
    }

    #[test]
    #[traced_test]
    fn test_shadowed_rules_logged() {
        ServiceRegistry::from_config(&FleetConfig::default()).unwrap();
        assert!(logs_contain("prefix rule is unreachable"));
        assert!(logs_contain("first registration wins"));
    }

    #[test]
    fn test_rejects_bad_fleet() {
        let dup = FleetConfig {
            services: vec![svc("a", 9001, &[]), svc("a", 9002, &[])],
            prefix_rules: vec![],
        };
        assert!(ServiceRegistry::from_config(&dup).is_err());

        let zero_port = FleetConfig {
            services: vec![svc("a", 0, &[])],
            prefix_rules: vec![],
        };
        assert!(ServiceRegistry::from_config(&zero_port).is_err());

        let dangling = FleetConfig {
            services: vec![svc("a", 9001, &[])],
            prefix_rules: vec![rule("x_", "missing")],
        };
        let err = ServiceRegistry::from_config(&dangling).unwrap_err();
        assert!(err.to_string().contains("missing"));

        let empty_prefix = FleetConfig {
            services: vec![svc("a", 9001, &[])],
            prefix_rules: vec![rule("", "a")],
        };
        assert!(ServiceRegistry::from_config(&empty_prefix).is_err());
    }

}
