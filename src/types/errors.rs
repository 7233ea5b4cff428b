//! Application error types.
//!
//! All errors use `thiserror` for automatic Error trait derivation and provide
//! clear error messages with context. Every variant maps onto exactly one HTTP
//! status; the display string is the human-readable explanation sent to the
//! client.

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

/// Application result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error enum for the gateway.
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed request body or missing tool identifier (HTTP 400).
    #[error("{0}")]
    Validation(String),

    /// Tool name matched no exact entry and no prefix rule (HTTP 400).
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    /// Health probe against the resolved backend failed (HTTP 502).
    #[error("Service {service} (port {port}) is offline")]
    BackendUnavailable { service: String, port: u16 },

    /// Backend call failed after the probe passed (HTTP 502).
    #[error("Service {service} (port {port}) error: {cause}")]
    Backend {
        service: String,
        port: u16,
        cause: String,
    },

    /// Invalid static configuration (startup only).
    #[error("configuration error: {0}")]
    Config(String),

    /// Internal errors (HTTP 500).
    #[error("Gateway internal error: {0}")]
    Internal(String),

    /// Serialization/deserialization errors.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O errors.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Convert to the HTTP status code rendered to the client.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::Validation(_) | Error::UnknownTool(_) => StatusCode::BAD_REQUEST,
            Error::BackendUnavailable { .. } | Error::Backend { .. } => StatusCode::BAD_GATEWAY,
            Error::Config(_) | Error::Internal(_) | Error::Serialization(_) | Error::Io(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

// Convenience constructors
impl Error {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn unknown_tool(tool: impl Into<String>) -> Self {
        Self::UnknownTool(tool.into())
    }

    pub fn backend_unavailable(service: impl Into<String>, port: u16) -> Self {
        Self::BackendUnavailable {
            service: service.into(),
            port,
        }
    }

    pub fn backend(service: impl Into<String>, port: u16, cause: impl Into<String>) -> Self {
        Self::Backend {
            service: service.into(),
            port,
            cause: cause.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

// Lets handlers return `Result<_, Error>` and use `?` directly.
impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), "{}", self);
        } else {
            tracing::debug!(status = status.as_u16(), "{}", self);
        }
        let body = serde_json::json!({ "error": self.to_string() });
        (status, [(header::ACCESS_CONTROL_ALLOW_ORIGIN, "*")], Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            Error::validation("bad").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            Error::unknown_tool("x").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            Error::backend_unavailable("git", 8002).status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            Error::backend("git", 8002, "boom").status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            Error::internal("oops").status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_messages_name_service_and_port() {
        let err = Error::backend_unavailable("filesystem", 8001);
        assert_eq!(err.to_string(), "Service filesystem (port 8001) is offline");

        let err = Error::backend("git", 8002, "HTTP 500");
        assert_eq!(err.to_string(), "Service git (port 8002) error: HTTP 500");
    }

    #[test]
    fn test_io_and_serde_errors_convert() {
        fn bind_failure() -> Result<()> {
            Err(std::io::Error::new(std::io::ErrorKind::AddrInUse, "in use"))?;
            Ok(())
        }
        fn bad_json() -> Result<serde_json::Value> {
            Ok(serde_json::from_str("{")?)
        }

        let err = bind_failure().unwrap_err();
        assert!(matches!(err, Error::Io(_)));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);

        let err = bad_json().unwrap_err();
        assert!(matches!(err, Error::Serialization(_)));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_unknown_tool_references_name() {
        let err = Error::unknown_tool("unknown_tool_xyz");
        assert!(err.to_string().contains("unknown_tool_xyz"));
    }
}
