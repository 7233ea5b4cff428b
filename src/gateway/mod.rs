//! HTTP gateway: request pipeline, read-only fleet views, server.
//!
//! Per proxied request (no state carried between requests):
//! ```text
//!   Receive → Validate → Route → HealthCheck → Invoke → Respond
//!             request     ToolRouter  HealthChecker  BackendClient
//! ```
//! The health check and the call are not atomic. A backend that dies between
//! the two surfaces as an ordinary backend error.

pub mod handlers;
pub mod request;
pub mod server;

pub use handlers::router;
pub use server::GatewayServer;

use bytes::Bytes;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::Instrument;

use crate::backend::{BackendClient, ProxyOutcome, RequestEnvelope};
use crate::health::{FleetState, HealthChecker};
use crate::registry::{ServiceRegistry, ServiceSnapshot, ServiceStatus};
use crate::routing::ToolRouter;
use crate::types::{Config, Error, Result};

// =============================================================================
// Response bodies
// =============================================================================

/// `GET /services`.
#[derive(Debug, Clone, Serialize)]
pub struct Roster {
    pub gateway: RosterBody,
}

#[derive(Debug, Clone, Serialize)]
pub struct RosterBody {
    pub status: &'static str,
    pub name: String,
    pub port: u16,
    pub protocol: &'static str,
    pub services: Vec<ServiceSnapshot>,
    pub services_total: usize,
}

/// `GET /health`.
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub status: FleetState,
    pub service: String,
    pub port: u16,
    pub services_running: usize,
    pub services_total: usize,
}

/// `GET /tools/list`.
#[derive(Debug, Clone, Serialize)]
pub struct ToolCatalog {
    pub jsonrpc: &'static str,
    pub result: ToolCatalogResult,
}

#[derive(Debug, Clone, Serialize)]
pub struct ToolCatalogResult {
    pub tools: Vec<CatalogEntry>,
    pub total_tools: usize,
}

/// One tool of a reachable service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogEntry {
    pub name: String,
    pub service: String,
    pub description: String,
    pub container: String,
}

// =============================================================================
// Gateway
// =============================================================================

/// How the gateway identifies itself in responses.
#[derive(Debug, Clone)]
pub struct GatewayInfo {
    pub name: String,
    pub port: u16,
}

/// Request orchestrator shared by all connections.
#[derive(Debug)]
pub struct Gateway {
    router: ToolRouter,
    checker: HealthChecker,
    client: BackendClient,
    info: GatewayInfo,
}

impl Gateway {
    pub fn new(
        registry: Arc<ServiceRegistry>,
        checker: HealthChecker,
        client: BackendClient,
        info: GatewayInfo,
    ) -> Self {
        Self {
            router: ToolRouter::new(registry),
            checker,
            client,
            info,
        }
    }

    /// Build registry, checker and client from configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        let registry = Arc::new(ServiceRegistry::from_config(&config.fleet)?);
        let addr = config.server.socket_addr()?;
        Ok(Self::new(
            registry,
            HealthChecker::from_config(&config.probe),
            BackendClient::new(&config.backend)?,
            GatewayInfo {
                name: config.server.name.clone(),
                port: addr.port(),
            },
        ))
    }

    pub fn registry(&self) -> &ServiceRegistry {
        self.router.registry()
    }

    pub fn tool_router(&self) -> &ToolRouter {
        &self.router
    }

    pub fn checker(&self) -> &HealthChecker {
        &self.checker
    }

    /// Route, probe and forward one tool call; returns the backend's JSON body
    /// byte for byte.
    pub async fn call_tool(&self, envelope: RequestEnvelope) -> Result<Bytes> {
        let span = tracing::info_span!(
            "tool_call",
            tool = %envelope.tool_name,
            correlation_id = %envelope.correlation_id,
            service = tracing::field::Empty,
        );
        self.dispatch(envelope).instrument(span).await
    }

    async fn dispatch(&self, envelope: RequestEnvelope) -> Result<Bytes> {
        let (service, matched) = self.router.resolve(&envelope.tool_name)?;
        tracing::Span::current().record("service", service.name());
        tracing::debug!(?matched, endpoint = %service.endpoint(), "tool routed");

        if self.checker.check(service).await != ServiceStatus::Running {
            tracing::warn!(port = service.port(), "backend offline");
            return Err(Error::backend_unavailable(service.name(), service.port()));
        }

        let started = Instant::now();
        let outcome = self.client.call_tool(service, &envelope).await;
        let latency_ms = started.elapsed().as_millis() as u64;

        match &outcome {
            ProxyOutcome::Success { .. } => {
                tracing::info!(latency_ms, "tool call completed");
            }
            ProxyOutcome::Failure { kind, message } => {
                tracing::warn!(latency_ms, %kind, %message, "backend call failed");
            }
        }

        outcome.into_result(service)
    }

    /// Every registered service with a freshly probed status.
    pub async fn roster(&self) -> Roster {
        self.checker.refresh_all(self.registry()).await;
        let services = self.registry().list_all();
        Roster {
            gateway: RosterBody {
                status: "running",
                name: self.info.name.clone(),
                port: self.info.port,
                protocol: "MCP over HTTP",
                services_total: services.len(),
                services,
            },
        }
    }

    /// Aggregate liveness: healthy only when every service is reachable.
    pub async fn health(&self) -> HealthReport {
        let fleet = self.checker.refresh_all(self.registry()).await;
        HealthReport {
            status: fleet.state(),
            service: self.info.name.clone(),
            port: self.info.port,
            services_running: fleet.services_running,
            services_total: fleet.services_total,
        }
    }

    /// Declared tools of every service that answers its probe right now.
    pub async fn tool_catalog(&self) -> ToolCatalog {
        let mut tools = Vec::new();
        for service in self.registry().services() {
            if self.checker.check(service).await != ServiceStatus::Running {
                continue;
            }
            tools.extend(service.tools().iter().map(|tool| CatalogEntry {
                name: tool.clone(),
                service: service.name().to_string(),
                description: format!("{} via {}", tool, service.description()),
                container: service.container().to_string(),
            }));
        }
        ToolCatalog {
            jsonrpc: "2.0",
            result: ToolCatalogResult {
                total_tools: tools.len(),
                tools,
            },
        }
    }
}
