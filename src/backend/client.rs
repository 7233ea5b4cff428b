//! Outbound JSON-RPC-over-HTTP client.
//!
//! One POST per call, bounded by the backend timeout (distinct from the probe
//! timeout). No automatic retry: a failed attempt is terminal for the request.

use bytes::Bytes;
use reqwest::Client;
use serde::de::IgnoredAny;
use serde_json::Value;
use std::time::Duration;

use super::jsonrpc::{JsonRpcRequest, RequestEnvelope};
use super::outcome::{FailureKind, ProxyOutcome};
use crate::registry::ServiceDescriptor;
use crate::types::{BackendConfig, CorrelationId, Error, Result};

/// Longest slice of an error body quoted back to the client.
const MAX_ERROR_BODY_CHARS: usize = 200;

/// HTTP client for backend services.
///
/// `Clone` is cheap; clones share reqwest's connection pool.
#[derive(Debug, Clone)]
pub struct BackendClient {
    client: Client,
    proxy_path: String,
    timeout: Duration,
}

impl BackendClient {
    pub fn new(config: &BackendConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::internal(format!("backend client build error: {}", e)))?;

        Ok(Self {
            client,
            proxy_path: config.proxy_path.clone(),
            timeout: config.timeout,
        })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// JSON-RPC URL of `service`.
    pub fn url_for(&self, service: &ServiceDescriptor) -> String {
        let endpoint = service.endpoint();
        format!("http://{}:{}{}", endpoint.host, endpoint.port, self.proxy_path)
    }

    /// Call `method` on `service` with a fresh request id.
    pub async fn invoke(
        &self,
        service: &ServiceDescriptor,
        method: &str,
        params: Value,
        timeout: Duration,
    ) -> ProxyOutcome {
        let request = JsonRpcRequest::new(CorrelationId::new().as_str(), method, params);
        self.send(service, &request, timeout).await
    }

    /// Forward a normalised tool call. The envelope's correlation id becomes
    /// the JSON-RPC id.
    pub async fn call_tool(
        &self,
        service: &ServiceDescriptor,
        envelope: &RequestEnvelope,
    ) -> ProxyOutcome {
        self.send(service, &envelope.to_request(), self.timeout).await
    }

    async fn send(
        &self,
        service: &ServiceDescriptor,
        request: &JsonRpcRequest,
        timeout: Duration,
    ) -> ProxyOutcome {
        let url = self.url_for(service);
        tracing::debug!(url = %url, method = %request.method, id = %request.id, "calling backend");

        let response = match self
            .client
            .post(&url)
            .timeout(timeout)
            .json(request)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => return transport_failure(&url, timeout, &e),
        };

        let status = response.status();
        let body = match response.bytes().await {
            Ok(body) => body,
            Err(e) => return transport_failure(&url, timeout, &e),
        };

        if !status.is_success() {
            return ProxyOutcome::failure(
                FailureKind::Status(status.as_u16()),
                format!("HTTP {}: {}", status, excerpt(&body)),
            );
        }

        // Validate only; the bytes are relayed untouched.
        match serde_json::from_slice::<IgnoredAny>(&body) {
            Ok(_) => ProxyOutcome::success(body),
            Err(e) => ProxyOutcome::failure(
                FailureKind::InvalidBody,
                format!("invalid JSON response from {}: {}", url, e),
            ),
        }
    }
}

fn transport_failure(url: &str, timeout: Duration, e: &reqwest::Error) -> ProxyOutcome {
    if e.is_timeout() {
        ProxyOutcome::failure(
            FailureKind::Timeout,
            format!("request to {} timed out after {:?}", url, timeout),
        )
    } else if e.is_connect() {
        ProxyOutcome::failure(
            FailureKind::Connect,
            format!("connection to {} failed: {}", url, e),
        )
    } else {
        ProxyOutcome::failure(
            FailureKind::Transport,
            format!("request to {} failed: {}", url, e),
        )
    }
}

fn excerpt(body: &Bytes) -> String {
    let text = String::from_utf8_lossy(body);
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return "<empty body>".to_string();
    }
    trimmed.chars().take(MAX_ERROR_BODY_CHARS).collect()
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Endpoint;
    use axum::http::StatusCode;
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::json;

    async fn spawn_backend(app: Router) -> u16 {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        port
    }

    fn service_on(port: u16) -> ServiceDescriptor {
        ServiceDescriptor::new("echo", "", vec![], Endpoint::new("127.0.0.1", port), "")
    }

    fn client(timeout: Duration) -> BackendClient {
        BackendClient::new(&BackendConfig {
            timeout,
            proxy_path: "/mcp".to_string(),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_success_returns_body() {
        let app = Router::new().route(
            "/mcp",
            post(|Json(req): Json<Value>| async move {
                Json(json!({"jsonrpc": "2.0", "id": req["id"], "result": {"echo": req["params"]}}))
            }),
        );
        let port = spawn_backend(app).await;

        let outcome = client(Duration::from_secs(5))
            .invoke(&service_on(port), "tools/call", json!({"name": "x"}), Duration::from_secs(5))
            .await;

        match outcome {
            ProxyOutcome::Success { payload } => {
                let payload: Value = serde_json::from_slice(&payload).unwrap();
                assert_eq!(payload["jsonrpc"], "2.0");
                assert_eq!(payload["result"]["echo"]["name"], "x");
                assert!(payload["id"].as_str().is_some_and(|id| !id.is_empty()));
            }
            other => panic!("expected success, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_success_body_is_untouched() {
        const BODY: &str = r#"{"zeta":1,"alpha":2,"big":123456789012345678901234567890,"f":1.10}"#;
        let app = Router::new().route(
            "/mcp",
            post(|| async { ([(axum::http::header::CONTENT_TYPE, "application/json")], BODY) }),
        );
        let port = spawn_backend(app).await;

        let outcome = client(Duration::from_secs(5))
            .invoke(&service_on(port), "tools/call", json!({}), Duration::from_secs(5))
            .await;

        assert_eq!(outcome, ProxyOutcome::success(BODY.as_bytes().to_vec()));
    }

    #[tokio::test]
    async fn test_non_2xx_is_status_failure() {
        let app = Router::new().route(
            "/mcp",
            post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
        );
        let port = spawn_backend(app).await;

        let outcome = client(Duration::from_secs(5))
            .invoke(&service_on(port), "tools/call", json!({}), Duration::from_secs(5))
            .await;

        match outcome {
            ProxyOutcome::Failure { kind, message } => {
                assert_eq!(kind, FailureKind::Status(500));
                assert!(message.contains("500"));
                assert!(message.contains("boom"));
            }
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unparseable_body_is_failure() {
        let app = Router::new().route("/mcp", post(|| async { "definitely not json" }));
        let port = spawn_backend(app).await;

        let outcome = client(Duration::from_secs(5))
            .invoke(&service_on(port), "tools/call", json!({}), Duration::from_secs(5))
            .await;

        assert!(matches!(
            outcome,
            ProxyOutcome::Failure { kind: FailureKind::InvalidBody, .. }
        ));
    }

    #[tokio::test]
    async fn test_slow_backend_times_out() {
        let app = Router::new().route(
            "/mcp",
            post(|| async {
                tokio::time::sleep(Duration::from_secs(3)).await;
                Json(json!({}))
            }),
        );
        let port = spawn_backend(app).await;

        let started = std::time::Instant::now();
        let outcome = client(Duration::from_secs(5))
            .invoke(&service_on(port), "tools/call", json!({}), Duration::from_millis(200))
            .await;

        assert!(started.elapsed() < Duration::from_secs(2));
        match outcome {
            ProxyOutcome::Failure { kind, message } => {
                assert_eq!(kind, FailureKind::Timeout);
                assert!(message.contains(&port.to_string()));
            }
            other => panic!("expected timeout, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_connection_refused() {
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };

        let outcome = client(Duration::from_secs(2))
            .invoke(&service_on(port), "tools/call", json!({}), Duration::from_secs(2))
            .await;

        match outcome {
            ProxyOutcome::Failure { kind, message } => {
                assert_eq!(kind, FailureKind::Connect);
                assert!(message.contains(&port.to_string()));
            }
            other => panic!("expected connect failure, got {:?}", other),
        }
    }

    #[test]
    fn test_url_uses_proxy_path() {
        let client = BackendClient::new(&BackendConfig {
            timeout: Duration::from_secs(1),
            proxy_path: "/rpc".to_string(),
        })
        .unwrap();
        let service =
            ServiceDescriptor::new("git", "", vec![], Endpoint::new("localhost", 8002), "");
        assert_eq!(client.url_for(&service), "http://localhost:8002/rpc");
    }

    #[test]
    fn test_excerpt_truncates() {
        let long = Bytes::from("x".repeat(1000));
        assert_eq!(excerpt(&long).len(), MAX_ERROR_BODY_CHARS);
        assert_eq!(excerpt(&Bytes::new()), "<empty body>");
    }
}
