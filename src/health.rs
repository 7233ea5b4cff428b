//! Backend reachability probing.
//!
//! A probe is a bare TCP connect bounded by a timeout: no bytes are sent and
//! no handshake is expected. Results are never cached; every status inquiry
//! and every proxied call probes again.

use serde::Serialize;
use std::time::Duration;
use tokio::net::TcpStream;

use crate::registry::{Endpoint, ServiceDescriptor, ServiceRegistry, ServiceStatus};
use crate::types::ProbeConfig;

// =============================================================================
// Fleet health
// =============================================================================

/// Aggregate liveness of the fleet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FleetState {
    /// Every registered service answered its probe.
    Healthy,
    /// At least one service did not.
    Degraded,
}

/// Result of probing every registered service once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FleetHealth {
    pub services_running: usize,
    pub services_total: usize,
}

impl FleetHealth {
    pub fn state(&self) -> FleetState {
        if self.services_running == self.services_total {
            FleetState::Healthy
        } else {
            FleetState::Degraded
        }
    }
}

// =============================================================================
// Health checker
// =============================================================================

/// Bounded-time TCP reachability prober.
#[derive(Debug, Clone)]
pub struct HealthChecker {
    timeout: Duration,
}

impl HealthChecker {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn from_config(config: &ProbeConfig) -> Self {
        Self::new(config.timeout)
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// True if a TCP connection to `endpoint` opens within the timeout.
    ///
    /// Refusal, timeout, name resolution failure and any other I/O error all
    /// count as unreachable. The connection is dropped immediately.
    pub async fn probe(&self, endpoint: &Endpoint) -> bool {
        let connect = TcpStream::connect((endpoint.host.as_str(), endpoint.port));
        match tokio::time::timeout(self.timeout, connect).await {
            Ok(Ok(_stream)) => true,
            Ok(Err(e)) => {
                tracing::debug!(endpoint = %endpoint, error = %e, "probe failed");
                false
            }
            Err(_elapsed) => {
                tracing::debug!(
                    endpoint = %endpoint,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "probe timed out"
                );
                false
            }
        }
    }

    /// Probe one service and record the result in its status slot.
    pub async fn check(&self, service: &ServiceDescriptor) -> ServiceStatus {
        let status = ServiceStatus::from_reachable(self.probe(service.endpoint()).await);
        service.set_status(status);
        status
    }

    /// Probe every service in registration order, one at a time.
    ///
    /// With the whole fleet offline this takes up to
    /// `registry.len() * timeout`.
    pub async fn refresh_all(&self, registry: &ServiceRegistry) -> FleetHealth {
        let mut running = 0;
        for service in registry.services() {
            if self.check(service).await == ServiceStatus::Running {
                running += 1;
            }
        }
        FleetHealth {
            services_running: running,
            services_total: registry.len(),
        }
    }
}

impl Default for HealthChecker {
    fn default() -> Self {
        Self::from_config(&ProbeConfig::default())
    }
}

// =============================================================================
// Tests
// =============================================================================
