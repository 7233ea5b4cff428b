//! Backend call layer: JSON-RPC envelope, HTTP client, call outcome.

pub mod client;
pub mod jsonrpc;
pub mod outcome;

pub use client::BackendClient;
pub use jsonrpc::{JsonRpcRequest, RequestEnvelope, JSONRPC_VERSION, METHOD_TOOLS_CALL};
pub use outcome::{FailureKind, ProxyOutcome};
