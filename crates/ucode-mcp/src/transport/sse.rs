//! Legacy SSE binding: `GET /sse` opens the event stream and `POST /messages` feeds it.

use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
};
use futures::Stream;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::mpsc;

use crate::session::{SessionBinding, SessionManager};
use crate::types::{JsonRpcMessage, MCP_VERSION};

use super::http::AppState;

pub const UNKNOWN_SESSION_MESSAGE: &str = "No transport/server found for sessionId";

/// Client info injected into handshakes from clients that omit it.
const LEGACY_CLIENT_NAME: &str = "legacy-sse-client";
const LEGACY_CLIENT_VERSION: &str = "0.0.0";

#[derive(Debug, Deserialize)]
pub struct MessageQuery {
    #[serde(rename = "sessionId")]
    pub session_id: Option<String>,
}

/// Destroys the session when the event stream is dropped (client disconnect).
struct StreamGuard {
    manager: Arc<SessionManager>,
    session_id: String,
}

impl Drop for StreamGuard {
    fn drop(&mut self) {
        tracing::debug!(session_id = %self.session_id, "SSE stream closed");
        self.manager.destroy(&self.session_id);
    }
}

/// Open the downstream channel. The first event tells the client where to post.
pub async fn handle_stream(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let (inbound_tx, mut inbound_rx) = mpsc::unbounded_channel::<JsonRpcMessage>();
    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<Value>();

    let session = state
        .manager
        .create(SessionBinding::EventStream { inbound: inbound_tx });
    let endpoint = format!("/messages?sessionId={}", session.id());

    // One worker per session keeps upstream posts in arrival order. It holds
    // only the engine so dropping the session ends it.
    let engine = session.engine();
    tokio::spawn(async move {
        while let Some(msg) = inbound_rx.recv().await {
            if let Some(response) = engine.handle_message(msg).await {
                if outbound_tx.send(response).is_err() {
                    break;
                }
            }
        }
    });

    let guard = StreamGuard {
        manager: state.manager.clone(),
        session_id: session.id().to_string(),
    };
    drop(session);

    let stream = async_stream::stream! {
        let _guard = guard;
        yield Ok(Event::default().event("endpoint").data(endpoint));

        while let Some(message) = outbound_rx.recv().await {
            match serde_json::to_string(&message) {
                Ok(data) => yield Ok(Event::default().event("message").data(data)),
                Err(e) => tracing::error!("Failed to encode SSE message: {e}"),
            }
        }
    };

    Sse::new(stream).keep_alive(KeepAlive::default())
}

/// Deliver an upstream message to the session named by `?sessionId=`.
pub async fn handle_message(
    State(state): State<AppState>,
    Query(query): Query<MessageQuery>,
    body: Bytes,
) -> Response {
    let Some(session) = query
        .session_id
        .as_deref()
        .and_then(|id| state.manager.resolve(id))
    else {
        return (StatusCode::BAD_REQUEST, UNKNOWN_SESSION_MESSAGE).into_response();
    };

    let mut value: Value = match serde_json::from_slice(&body) {
        Ok(v) => v,
        Err(e) => return (StatusCode::BAD_REQUEST, format!("Invalid message: {e}")).into_response(),
    };
    normalize_legacy_initialize(&mut value);

    let message: JsonRpcMessage = match serde_json::from_value(value) {
        Ok(m) => m,
        Err(e) => return (StatusCode::BAD_REQUEST, format!("Invalid message: {e}")).into_response(),
    };

    match session.enqueue(message) {
        Ok(()) => (StatusCode::ACCEPTED, "Accepted").into_response(),
        Err(e) => {
            tracing::error!(session_id = session.id(), "Failed to deliver message: {e}");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

/// Fill in `protocolVersion`, `capabilities`, and `clientInfo` on an
/// `initialize` request that omits them. Other messages are left untouched.
pub fn normalize_legacy_initialize(message: &mut Value) {
    if message.get("method").and_then(Value::as_str) != Some("initialize") {
        return;
    }

    let Some(object) = message.as_object_mut() else {
        return;
    };
    let params = object
        .entry("params")
        .or_insert_with(|| Value::Object(serde_json::Map::new()));
    if !params.is_object() {
        *params = Value::Object(serde_json::Map::new());
    }

    if let Some(params) = params.as_object_mut() {
        params
            .entry("protocolVersion")
            .or_insert_with(|| json!(MCP_VERSION));
        params.entry("capabilities").or_insert_with(|| json!({}));
        params.entry("clientInfo").or_insert_with(|| {
            json!({ "name": LEGACY_CLIENT_NAME, "version": LEGACY_CLIENT_VERSION })
        });
    }
}
