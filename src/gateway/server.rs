//! HTTP server - bind, admission control, graceful shutdown.

use axum::extract::{Request, State};
use axum::http::{header, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

use super::handlers;
use super::Gateway;
use crate::types::Result;

/// In-flight request ceiling, applied in front of the gateway router.
#[derive(Debug, Clone)]
struct AdmissionLimit {
    permits: Arc<Semaphore>,
    max: usize,
}

/// HTTP server wrapping the gateway.
#[derive(Debug)]
pub struct GatewayServer {
    gateway: Arc<Gateway>,
    addr: SocketAddr,
    max_concurrent_requests: Option<usize>,
    cancel: CancellationToken,
}

impl GatewayServer {
    pub fn new(
        gateway: Arc<Gateway>,
        addr: SocketAddr,
        max_concurrent_requests: Option<usize>,
    ) -> Self {
        Self {
            gateway,
            addr,
            max_concurrent_requests,
            cancel: CancellationToken::new(),
        }
    }

    /// Router with the admission layer applied when a limit is configured.
    pub fn app(&self) -> Router {
        let app = handlers::router(self.gateway.clone());
        match self.max_concurrent_requests {
            Some(max) => {
                let limit = AdmissionLimit {
                    permits: Arc::new(Semaphore::new(max)),
                    max,
                };
                app.layer(middleware::from_fn_with_state(limit, admit))
            }
            None => app,
        }
    }

    /// Bind the configured address and serve until shutdown.
    pub async fn serve(&self) -> Result<()> {
        let listener = TcpListener::bind(self.addr).await?;
        self.serve_on(listener).await
    }

    /// Serve on an already bound listener until shutdown.
    pub async fn serve_on(&self, listener: TcpListener) -> Result<()> {
        let local = listener.local_addr()?;
        tracing::info!(
            "Gateway listening on http://{} (max_concurrent_requests={})",
            local,
            self.max_concurrent_requests
                .map_or_else(|| "unbounded".to_string(), |n| n.to_string()),
        );

        let cancel = self.cancel.clone();
        axum::serve(listener, self.app())
            .with_graceful_shutdown(async move { cancel.cancelled().await })
            .await?;

        tracing::info!("Gateway shut down");
        Ok(())
    }

    /// Request graceful shutdown.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    /// Token that triggers shutdown when cancelled.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }
}

/// Reject instead of queueing once every permit is taken.
async fn admit(State(limit): State<AdmissionLimit>, request: Request, next: Next) -> Response {
    match limit.permits.clone().try_acquire_owned() {
        // permit is held until the response is produced
        Ok(_permit) => next.run(request).await,
        Err(_) => {
            tracing::warn!(
                "Request to {} rejected: at max_concurrent_requests ({})",
                request.uri().path(),
                limit.max,
            );
            (
                StatusCode::SERVICE_UNAVAILABLE,
                [(header::ACCESS_CONTROL_ALLOW_ORIGIN, "*")],
                Json(serde_json::json!({
                    "error": format!("Gateway at capacity ({} in-flight requests)", limit.max),
                })),
            )
                .into_response()
        }
    }
}
