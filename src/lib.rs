//! # MCP Gateway - single entry point for a fleet of MCP tool services
//!
//! Clients reach one HTTP gateway; the gateway resolves each tool name to the
//! backend that implements it, checks the backend is reachable, forwards the
//! call as JSON-RPC 2.0 and relays the answer:
//! - Static service registry with an exact tool table and ordered prefix rules
//! - Bounded-time TCP reachability probes, never cached
//! - One synchronous backend hop per request, no retry
//! - Legacy `{tool, arguments}` and JSON-RPC `tools/call` request shapes
//!
//! ## Architecture
//!
//! ```text
//!                    ┌─────────────────────────────────────────┐
//!   HTTP requests →  │                 Gateway                 │
//!                    │  ┌────────────┐      ┌───────────────┐  │
//!                    │  │ ToolRouter │      │ HealthChecker │  │
//!                    │  └────────────┘      └───────────────┘  │
//!                    │  ┌────────────┐      ┌───────────────┐  │ → backends
//!                    │  │  Registry  │      │ BackendClient │  │
//!                    │  └────────────┘      └───────────────┘  │
//!                    └─────────────────────────────────────────┘
//! ```

// Enforce strict safety at compile time
#![deny(unsafe_code)]
#![warn(missing_debug_implementations)]
#![warn(rust_2018_idioms)]

pub mod backend;
pub mod gateway;
pub mod health;
pub mod registry;
pub mod routing;
pub mod types;

// Internal utilities
pub mod observability;

pub use gateway::{Gateway, GatewayServer};
pub use types::{Config, Error, Result};
