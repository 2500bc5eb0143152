//! Session table: creates, resolves, and destroys engine/transport pairs.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde_json::Value;
use tokio::sync::mpsc;

use crate::protocol::{Dispatcher, ProtocolEngine};
use crate::types::{JsonRpcMessage, McpError, McpResult};

/// Transport-specific half of a session.
#[derive(Debug)]
pub enum SessionBinding {
    /// The single implicit session of the stdio transport.
    Stdio,
    /// Addressable HTTP stream; requests carry the session id in a header.
    Streamable,
    /// Legacy event stream; upstream posts are queued to a per-session worker.
    EventStream {
        inbound: mpsc::UnboundedSender<JsonRpcMessage>,
    },
}

impl SessionBinding {
    pub fn kind(&self) -> &'static str {
        match self {
            SessionBinding::Stdio => "stdio",
            SessionBinding::Streamable => "streamable-http",
            SessionBinding::EventStream { .. } => "sse",
        }
    }
}

/// A live client session: one engine, one binding.
pub struct Session {
    id: String,
    engine: Arc<ProtocolEngine>,
    binding: SessionBinding,
    created_at: DateTime<Utc>,
    turn: tokio::sync::Mutex<()>,
}

impl Session {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn engine(&self) -> Arc<ProtocolEngine> {
        self.engine.clone()
    }

    pub fn binding(&self) -> &SessionBinding {
        &self.binding
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Process one message. Messages for the same session are handled one at
    /// a time, in the order they reach this call.
    pub async fn exchange(&self, msg: JsonRpcMessage) -> Option<Value> {
        let _turn = self.turn.lock().await;
        self.engine.handle_message(msg).await
    }

    /// Queue a message for an event-stream session's worker.
    pub fn enqueue(&self, msg: JsonRpcMessage) -> McpResult<()> {
        match &self.binding {
            SessionBinding::EventStream { inbound } => inbound
                .send(msg)
                .map_err(|_| McpError::Transport("Event stream closed".to_string())),
            other => Err(McpError::Transport(format!(
                "Session {} uses the {} binding and has no queue",
                self.id,
                other.kind()
            ))),
        }
    }
}

/// Process-wide session table.
///
/// Lookup and insert happen under one lock with no await in between, so two
/// concurrent handshakes can never produce two sessions for one id.
pub struct SessionManager {
    dispatcher: Arc<Dispatcher>,
    sessions: Mutex<HashMap<String, Arc<Session>>>,
}

impl SessionManager {
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self {
            dispatcher,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    /// Create a session with a fresh id and a new engine.
    pub fn create(&self, binding: SessionBinding) -> Arc<Session> {
        let engine = Arc::new(ProtocolEngine::new(self.dispatcher.clone()));
        let mut sessions = self.lock();

        let id = loop {
            let candidate = uuid::Uuid::new_v4().to_string();
            if !sessions.contains_key(&candidate) {
                break candidate;
            }
        };

        let session = Arc::new(Session {
            id: id.clone(),
            engine,
            binding,
            created_at: Utc::now(),
            turn: tokio::sync::Mutex::new(()),
        });
        sessions.insert(id, session.clone());

        tracing::info!(
            session_id = %session.id,
            binding = session.binding.kind(),
            "Session created ({} active)",
            sessions.len()
        );
        session
    }

    /// Create a session for a handshake. Allowed only when the client supplied
    /// no session id and the message is a valid `initialize` request.
    pub fn create_for_initialize(
        &self,
        session_id: Option<&str>,
        message: &JsonRpcMessage,
        binding: SessionBinding,
    ) -> McpResult<Arc<Session>> {
        if session_id.is_some() || !message.is_initialize_request() {
            return Err(McpError::NoValidSession);
        }
        Ok(self.create(binding))
    }

    pub fn resolve(&self, session_id: &str) -> Option<Arc<Session>> {
        self.lock().get(session_id).cloned()
    }

    /// Remove a session and close its engine. Returns false if it was unknown.
    pub fn destroy(&self, session_id: &str) -> bool {
        let removed = self.lock().remove(session_id);
        match removed {
            Some(session) => {
                session.engine.close();
                tracing::info!(session_id, "Session closed");
                true
            }
            None => false,
        }
    }

    pub fn count(&self) -> usize {
        self.lock().len()
    }

    pub fn ids(&self) -> Vec<String> {
        self.lock().keys().cloned().collect()
    }

    /// Close every session. Used on shutdown.
    pub fn close_all(&self) -> usize {
        let drained: Vec<Arc<Session>> = self.lock().drain().map(|(_, s)| s).collect();
        for session in &drained {
            session.engine.close();
        }
        if !drained.is_empty() {
            tracing::info!("Closed {} sessions", drained.len());
        }
        drained.len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Arc<Session>>> {
        self.sessions.lock().unwrap_or_else(|e| e.into_inner())
    }
}
