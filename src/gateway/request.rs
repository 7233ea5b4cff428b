//! Inbound request parsing.
//!
//! Two request shapes are accepted and normalised into one [`RequestEnvelope`]:
//!
//! ```text
//! POST /mcp         {"tool": "file_read", "arguments": {...}}
//! POST /tools/call  {"method": "tools/call", "params": {"name": "file_read", "arguments": {...}}}
//! ```
//!
//! Both produce the same envelope for the same tool and arguments, so the
//! backend sees the same call either way.

use serde_json::{Map, Value};

use crate::backend::{RequestEnvelope, METHOD_TOOLS_CALL};
use crate::types::{Error, Result};

/// Parse the legacy `{tool, arguments}` shape.
pub fn parse_legacy(body: &[u8]) -> Result<RequestEnvelope> {
    let mut request = json_object(body, "MCP")?;
    let tool = required_name(&request, "tool", "Missing 'tool' parameter in request")?;
    let arguments = arguments_field(&mut request)?;
    Ok(RequestEnvelope::new(tool, arguments))
}

/// Parse the JSON-RPC `{method: "tools/call", params: {name, arguments}}` shape.
///
/// `method` may be omitted; when present it must be `tools/call`.
pub fn parse_tools_call(body: &[u8]) -> Result<RequestEnvelope> {
    let mut request = json_object(body, "tools/call")?;

    if let Some(method) = request.get("method") {
        if method.as_str() != Some(METHOD_TOOLS_CALL) {
            return Err(Error::validation(format!(
                "Unsupported method {}, expected '{}'",
                method, METHOD_TOOLS_CALL
            )));
        }
    }

    let mut params = match request.remove("params") {
        Some(Value::Object(params)) => params,
        None | Some(Value::Null) => Map::new(),
        Some(_) => return Err(Error::validation("'params' must be a JSON object")),
    };
    let tool = required_name(&params, "name", "Missing tool name in tools/call request")?;
    let arguments = arguments_field(&mut params)?;
    Ok(RequestEnvelope::new(tool, arguments))
}

// =============================================================================
// Shared helpers
// =============================================================================

fn json_object(body: &[u8], kind: &str) -> Result<Map<String, Value>> {
    let value: Value = serde_json::from_slice(body)
        .map_err(|e| Error::validation(format!("Invalid JSON in {} request: {}", kind, e)))?;
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(Error::validation(format!(
            "{} request body must be a JSON object",
            kind
        ))),
    }
}

fn required_name(body: &Map<String, Value>, key: &str, missing: &str) -> Result<String> {
    body.get(key)
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .ok_or_else(|| Error::validation(missing))
}

fn arguments_field(body: &mut Map<String, Value>) -> Result<Map<String, Value>> {
    match body.remove("arguments") {
        None | Some(Value::Null) => Ok(Map::new()),
        Some(Value::Object(arguments)) => Ok(arguments),
        Some(_) => Err(Error::validation("'arguments' must be a JSON object")),
    }
}
