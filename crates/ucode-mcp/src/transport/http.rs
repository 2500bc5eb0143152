//! HTTP server: mounts the streamable and legacy SSE bindings plus /health.

use std::future::Future;
use std::sync::Arc;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json as AxumJson, Response},
    routing::{any, get, post},
    Router,
};
use serde_json::json;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};

use crate::session::SessionManager;
use crate::types::{McpError, McpResult, SERVER_NAME};

use super::{shutdown_signal, sse, streamable};

/// Shared server state passed to all handlers via axum State.
#[derive(Clone)]
pub struct AppState {
    pub manager: Arc<SessionManager>,
}

/// HTTP transport serving both session-affine bindings.
pub struct HttpTransport {
    state: AppState,
}

impl HttpTransport {
    pub fn new(manager: Arc<SessionManager>) -> Self {
        Self {
            state: AppState { manager },
        }
    }

    pub fn router(&self) -> Router {
        router(self.state.manager.clone())
    }

    /// Run the HTTP server on the given address until Ctrl-C.
    pub async fn run(&self, addr: &str) -> McpResult<()> {
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(McpError::Io)?;

        tracing::info!("HTTP transport listening on {addr}");
        tracing::info!("  streamable HTTP: POST/DELETE /mcp");
        tracing::info!("  legacy SSE:      GET /sse, POST /messages?sessionId=<id>");

        self.serve(listener, shutdown_signal()).await
    }

    /// Serve on a bound listener until `shutdown` resolves.
    ///
    /// Every session is closed as soon as `shutdown` fires. Open event streams
    /// end with their session, so graceful shutdown does not wait on them.
    pub async fn serve<S>(&self, listener: TcpListener, shutdown: S) -> McpResult<()>
    where
        S: Future<Output = ()> + Send + 'static,
    {
        let manager = self.state.manager.clone();
        let close_sessions = async move {
            shutdown.await;
            let closed = manager.close_all();
            tracing::info!("HTTP shutdown: closed {closed} sessions");
        };

        axum::serve(listener, self.router())
            .with_graceful_shutdown(close_sessions)
            .await
            .map_err(|e| McpError::Transport(e.to_string()))?;

        Ok(())
    }
}

/// Build the router with every HTTP route.
pub fn router(manager: Arc<SessionManager>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .expose_headers(Any);

    Router::new()
        .route("/health", get(handle_health))
        .route("/mcp", any(streamable::handle_mcp))
        .route("/sse", get(sse::handle_stream))
        .route("/messages", post(sse::handle_message))
        .layer(cors)
        .with_state(AppState { manager })
}

/// Health check: independent of registry and session state.
async fn handle_health() -> AxumJson<serde_json::Value> {
    AxumJson(json!({
        "status": "ok",
        "server": SERVER_NAME,
    }))
}

/// JSON-RPC shaped error body with `id: null`.
pub(crate) fn json_rpc_error(status: StatusCode, code: i32, message: &str) -> Response {
    (
        status,
        AxumJson(json!({
            "jsonrpc": "2.0",
            "error": {
                "code": code,
                "message": message
            },
            "id": null
        })),
    )
        .into_response()
}
