//! Core types for the gateway.
//!
//! This module provides foundational types used throughout the system:
//! - **IDs**: Correlation identifiers for proxied calls
//! - **Errors**: Application error types with thiserror derives
//! - **Config**: Server, probe, backend and fleet configuration

mod config;
mod errors;
mod ids;

pub use config::{
    BackendConfig, Config, FleetConfig, ObservabilityConfig, PrefixRuleConfig, ProbeConfig,
    ServerConfig, ServiceConfig, ENV_BACKEND_TIMEOUT, ENV_LISTEN_ADDR, ENV_PROBE_TIMEOUT,
};
pub use errors::{Error, Result};
pub use ids::CorrelationId;
