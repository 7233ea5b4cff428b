//! JSON-RPC 2.0 request envelope sent to backends.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::types::CorrelationId;

pub const JSONRPC_VERSION: &str = "2.0";

/// The only method the gateway forwards.
pub const METHOD_TOOLS_CALL: &str = "tools/call";

/// Outbound JSON-RPC request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub id: String,
    pub method: String,
    pub params: Value,
}

impl JsonRpcRequest {
    pub fn new(id: impl Into<String>, method: impl Into<String>, params: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id: id.into(),
            method: method.into(),
            params,
        }
    }
}

/// A tool call normalised from either inbound request shape.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestEnvelope {
    pub tool_name: String,
    pub arguments: Map<String, Value>,
    pub correlation_id: CorrelationId,
}

impl RequestEnvelope {
    /// New envelope with a fresh correlation id.
    pub fn new(tool_name: impl Into<String>, arguments: Map<String, Value>) -> Self {
        Self {
            tool_name: tool_name.into(),
            arguments,
            correlation_id: CorrelationId::new(),
        }
    }

    /// `tools/call` params: `{"name": ..., "arguments": {...}}`.
    pub fn params(&self) -> Value {
        serde_json::json!({
            "name": self.tool_name,
            "arguments": self.arguments,
        })
    }

    /// The `tools/call` request for this envelope, id = correlation id.
    pub fn to_request(&self) -> JsonRpcRequest {
        JsonRpcRequest::new(
            self.correlation_id.as_str(),
            METHOD_TOOLS_CALL,
            self.params(),
        )
    }
}
