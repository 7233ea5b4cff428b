//! Axum route table and handlers.
//!
//! | Method | Path          | Handler         |
//! |--------|---------------|-----------------|
//! | GET    | /services     | `list_services` |
//! | GET    | /health       | `health`        |
//! | GET    | /tools/list   | `list_tools`    |
//! | POST   | /mcp          | `mcp_proxy`     |
//! | POST   | /tools/call   | `tools_call`    |
//!
//! Every path also answers OPTIONS preflight. Anything else is 404, including
//! a known path with the wrong method.

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use bytes::Bytes;
use serde::Serialize;
use std::sync::Arc;

use super::request;
use super::Gateway;
use crate::types::Result;

/// Build the gateway router.
pub fn router(gateway: Arc<Gateway>) -> Router {
    Router::new()
        .route(
            "/services",
            get(list_services).options(preflight).fallback(not_found),
        )
        .route("/health", get(health).options(preflight).fallback(not_found))
        .route(
            "/tools/list",
            get(list_tools).options(preflight).fallback(not_found),
        )
        .route("/mcp", post(mcp_proxy).options(preflight).fallback(not_found))
        .route(
            "/tools/call",
            post(tools_call).options(preflight).fallback(not_found),
        )
        .fallback(not_found)
        .with_state(gateway)
}

async fn list_services(State(gateway): State<Arc<Gateway>>) -> Response {
    ok_json(gateway.roster().await)
}

async fn health(State(gateway): State<Arc<Gateway>>) -> Response {
    ok_json(gateway.health().await)
}

async fn list_tools(State(gateway): State<Arc<Gateway>>) -> Response {
    ok_json(gateway.tool_catalog().await)
}

async fn mcp_proxy(State(gateway): State<Arc<Gateway>>, body: Bytes) -> Result<Response> {
    let envelope = request::parse_legacy(&body)?;
    let payload = gateway.call_tool(envelope).await?;
    Ok(relay(payload))
}

async fn tools_call(State(gateway): State<Arc<Gateway>>, body: Bytes) -> Result<Response> {
    let envelope = request::parse_tools_call(&body)?;
    let payload = gateway.call_tool(envelope).await?;
    Ok(relay(payload))
}

async fn preflight() -> Response {
    (
        StatusCode::OK,
        [
            (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
            (header::ACCESS_CONTROL_ALLOW_METHODS, "GET, POST, OPTIONS"),
            (header::ACCESS_CONTROL_ALLOW_HEADERS, "Content-Type"),
        ],
    )
        .into_response()
}

async fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        [(header::ACCESS_CONTROL_ALLOW_ORIGIN, "*")],
        Json(serde_json::json!({ "error": "Endpoint not found" })),
    )
        .into_response()
}

/// 200 carrying the backend's body as received.
fn relay(payload: Bytes) -> Response {
    (
        [
            (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
            (header::CONTENT_TYPE, "application/json"),
        ],
        payload,
    )
        .into_response()
}

/// 200 with a JSON body and allow-all CORS.
fn ok_json<T: Serialize>(body: T) -> Response {
    (
        [(header::ACCESS_CONTROL_ALLOW_ORIGIN, "*")],
        Json(body),
    )
        .into_response()
}
