//! Backend service descriptors.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

use crate::types::ServiceConfig;

// =============================================================================
// Service Status
// =============================================================================

/// Liveness of a backend as seen by its most recent probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceStatus {
    /// Never probed since startup
    Unknown,
    /// Last probe connected
    Running,
    /// Last probe failed
    Offline,
}

impl ServiceStatus {
    pub fn from_reachable(reachable: bool) -> Self {
        if reachable {
            ServiceStatus::Running
        } else {
            ServiceStatus::Offline
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            ServiceStatus::Unknown => 0,
            ServiceStatus::Running => 1,
            ServiceStatus::Offline => 2,
        }
    }

    fn from_u8(raw: u8) -> Self {
        match raw {
            1 => ServiceStatus::Running,
            2 => ServiceStatus::Offline,
            _ => ServiceStatus::Unknown,
        }
    }
}

// =============================================================================
// Endpoint
// =============================================================================

/// Network location of a backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
}

impl Endpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

// =============================================================================
// Service Descriptor
// =============================================================================

/// A registered backend service.
///
/// Everything except `status` is fixed at construction. The status slot is an
/// atomic so concurrent probes can overwrite it without a lock; last write wins.
#[derive(Debug)]
pub struct ServiceDescriptor {
    name: String,
    description: String,
    tools: Vec<String>,
    endpoint: Endpoint,
    container: String,
    status: AtomicU8,
}

impl ServiceDescriptor {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        tools: Vec<String>,
        endpoint: Endpoint,
        container: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            tools,
            endpoint,
            container: container.into(),
            status: AtomicU8::new(ServiceStatus::Unknown.as_u8()),
        }
    }

    pub fn from_config(config: &ServiceConfig) -> Self {
        Self::new(
            config.name.clone(),
            config.description.clone(),
            config.tools.clone(),
            Endpoint::new(config.host.clone(), config.port),
            config.container.clone(),
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Declared tools, in configuration order.
    pub fn tools(&self) -> &[String] {
        &self.tools
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub fn port(&self) -> u16 {
        self.endpoint.port
    }

    pub fn container(&self) -> &str {
        &self.container
    }

    pub fn status(&self) -> ServiceStatus {
        ServiceStatus::from_u8(self.status.load(Ordering::Relaxed))
    }

    pub(crate) fn set_status(&self, status: ServiceStatus) {
        self.status.store(status.as_u8(), Ordering::Relaxed);
    }

    /// Serializable point-in-time copy.
    pub fn snapshot(&self) -> ServiceSnapshot {
        ServiceSnapshot {
            name: self.name.clone(),
            description: self.description.clone(),
            tools: self.tools.clone(),
            host: self.endpoint.host.clone(),
            port: self.endpoint.port,
            container: self.container.clone(),
            status: self.status(),
        }
    }
}

/// Read-only view of a descriptor, as rendered by `/services`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceSnapshot {
    pub name: String,
    pub description: String,
    pub tools: Vec<String>,
    pub host: String,
    pub port: u16,
    pub container: String,
    pub status: ServiceStatus,
}
