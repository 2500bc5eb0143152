//! Streamable HTTP binding: one endpoint, session id in the `mcp-session-id` header.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Json as AxumJson, Response},
};

use crate::session::{Session, SessionBinding};
use crate::types::{error_codes, server_error_codes, JsonRpcMessage, McpError};

use super::http::{json_rpc_error, AppState};

pub const SESSION_HEADER: &str = "mcp-session-id";

pub async fn handle_mcp(
    State(state): State<AppState>,
    method: Method,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let session_id = headers
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    tracing::debug!(%method, session_id = ?session_id, "/mcp incoming");

    match method {
        Method::POST => handle_post(&state, session_id.as_deref(), &body).await,
        Method::DELETE => handle_delete(&state, session_id.as_deref()),
        _ => json_rpc_error(
            StatusCode::METHOD_NOT_ALLOWED,
            server_error_codes::NO_VALID_SESSION,
            "Method not allowed.",
        ),
    }
}

async fn handle_post(state: &AppState, session_id: Option<&str>, body: &[u8]) -> Response {
    let message: JsonRpcMessage = match serde_json::from_slice(body) {
        Ok(m) => m,
        Err(_) => {
            return json_rpc_error(StatusCode::BAD_REQUEST, error_codes::PARSE_ERROR, "Parse error")
        }
    };

    let session = match resolve_or_create(state, session_id, &message) {
        Ok(session) => session,
        Err(e) => return no_valid_session(&e),
    };

    let worker_session = session.clone();
    let outcome = tokio::spawn(async move { worker_session.exchange(message).await }).await;

    let response = match outcome {
        Ok(Some(value)) => AxumJson(value).into_response(),
        Ok(None) => StatusCode::ACCEPTED.into_response(),
        Err(e) => {
            tracing::error!(session_id = session.id(), "/mcp handler failed: {e}");
            return json_rpc_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                error_codes::INTERNAL_ERROR,
                "Internal server error",
            );
        }
    };
    with_session_header(response, session.id())
}

fn handle_delete(state: &AppState, session_id: Option<&str>) -> Response {
    match session_id {
        Some(id) if state.manager.destroy(id) => StatusCode::OK.into_response(),
        _ => no_valid_session(&McpError::NoValidSession),
    }
}

/// An existing session by header, or a new one for a header-less initialize.
fn resolve_or_create(
    state: &AppState,
    session_id: Option<&str>,
    message: &JsonRpcMessage,
) -> Result<Arc<Session>, McpError> {
    match session_id {
        Some(id) => state.manager.resolve(id).ok_or(McpError::NoValidSession),
        None => state
            .manager
            .create_for_initialize(None, message, SessionBinding::Streamable),
    }
}

fn no_valid_session(error: &McpError) -> Response {
    json_rpc_error(StatusCode::BAD_REQUEST, error.code(), &error.to_string())
}

fn with_session_header(mut response: Response, session_id: &str) -> Response {
    if let Ok(value) = HeaderValue::from_str(session_id) {
        response.headers_mut().insert(SESSION_HEADER, value);
    }
    response
}
