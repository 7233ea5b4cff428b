//! Result of one backend call.

use bytes::Bytes;
use std::fmt;

use crate::registry::ServiceDescriptor;
use crate::types::{Error, Result};

/// Why a backend call failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// No complete response within the call timeout.
    Timeout,
    /// TCP connection could not be opened.
    Connect,
    /// Backend answered with a non-2xx status.
    Status(u16),
    /// 2xx response whose body is not JSON.
    InvalidBody,
    /// Any other transport error.
    Transport,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::Connect => write!(f, "connect"),
            FailureKind::Status(code) => write!(f, "status {code}"),
            FailureKind::InvalidBody => write!(f, "invalid_body"),
            FailureKind::Transport => write!(f, "transport"),
        }
    }
}

/// Outcome of a proxied call. No retries: a failure is final.
///
/// A success carries the backend's body bytes exactly as received; they are
/// checked to be JSON but never re-encoded.
#[derive(Debug, Clone, PartialEq)]
pub enum ProxyOutcome {
    Success { payload: Bytes },
    Failure { kind: FailureKind, message: String },
}

impl ProxyOutcome {
    pub fn success(payload: impl Into<Bytes>) -> Self {
        ProxyOutcome::Success {
            payload: payload.into(),
        }
    }

    pub fn failure(kind: FailureKind, message: impl Into<String>) -> Self {
        ProxyOutcome::Failure {
            kind,
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ProxyOutcome::Success { .. })
    }

    /// Payload on success, `Error::Backend` naming `service` otherwise.
    pub fn into_result(self, service: &ServiceDescriptor) -> Result<Bytes> {
        match self {
            ProxyOutcome::Success { payload } => Ok(payload),
            ProxyOutcome::Failure { message, .. } => {
                Err(Error::backend(service.name(), service.port(), message))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Endpoint;

    #[test]
    fn test_failure_maps_to_backend_error() {
        let service = ServiceDescriptor::new(
            "database",
            "",
            vec![],
            Endpoint::new("localhost", 8004),
            "mcp-database",
        );
        let outcome = ProxyOutcome::failure(FailureKind::Status(500), "HTTP 500: boom");
        assert!(!outcome.is_success());

        let err = outcome.into_result(&service).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Service database (port 8004) error: HTTP 500: boom"
        );
    }

    #[test]
    fn test_success_passes_payload_through() {
        let service =
            ServiceDescriptor::new("git", "", vec![], Endpoint::new("localhost", 8002), "");
        let payload = Bytes::from_static(br#"{"result": {"ok": true}}"#);
        let value = ProxyOutcome::success(payload.clone())
            .into_result(&service)
            .unwrap();
        assert_eq!(value, payload);
    }
}
