//! Protocol engine: one per session; routes JSON-RPC messages to handlers.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

use serde_json::Value;

use crate::types::*;

use super::dispatcher::{Dispatcher, InvocationOutcome};
use super::negotiation::NegotiatedCapabilities;
use super::validator::validate_request;

/// Lifecycle of an engine: `Uninitialized → Active → Closed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Uninitialized,
    Active,
    Closed,
}

impl EngineState {
    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => EngineState::Uninitialized,
            1 => EngineState::Active,
            _ => EngineState::Closed,
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            EngineState::Uninitialized => 0,
            EngineState::Active => 1,
            EngineState::Closed => 2,
        }
    }
}

/// Methods the engine answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Route {
    Initialize,
    Ping,
    ListTools,
    CallTool,
}

impl Route {
    fn from_method(method: &str) -> Option<Self> {
        match method {
            "initialize" => Some(Route::Initialize),
            "ping" => Some(Route::Ping),
            "tools/list" => Some(Route::ListTools),
            "tools/call" => Some(Route::CallTool),
            _ => None,
        }
    }
}

/// The per-session protocol handler. All sessions share one [`Dispatcher`].
pub struct ProtocolEngine {
    dispatcher: Arc<Dispatcher>,
    capabilities: Mutex<NegotiatedCapabilities>,
    state: AtomicU8,
}

impl ProtocolEngine {
    /// Build an engine and activate it. Handlers are static routes, so
    /// activation cannot fail.
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        let engine = Self {
            dispatcher,
            capabilities: Mutex::new(NegotiatedCapabilities::default()),
            state: AtomicU8::new(EngineState::Uninitialized.as_u8()),
        };
        engine.transition(EngineState::Uninitialized, EngineState::Active);
        engine
    }

    pub fn state(&self) -> EngineState {
        EngineState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Move to `Closed`. Returns false if the engine was already closed.
    pub fn close(&self) -> bool {
        let previous = self
            .state
            .swap(EngineState::Closed.as_u8(), Ordering::AcqRel);
        EngineState::from_u8(previous) != EngineState::Closed
    }

    fn transition(&self, from: EngineState, to: EngineState) -> bool {
        self.state
            .compare_exchange(from.as_u8(), to.as_u8(), Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub async fn handle_message(&self, msg: JsonRpcMessage) -> Option<Value> {
        match msg {
            JsonRpcMessage::Request(req) => Some(self.handle_request(req).await),
            JsonRpcMessage::Notification(notif) => {
                self.handle_notification(notif).await;
                None
            }
            JsonRpcMessage::Invalid(raw) => {
                tracing::warn!("Rejecting malformed JSON-RPC message: {raw}");
                let error = McpError::InvalidRequest("Not a valid JSON-RPC message".to_string());
                Some(to_value(error.to_json_rpc_error(RequestId::Null)))
            }
            _ => {
                tracing::warn!("Received unexpected message type from client");
                None
            }
        }
    }

    async fn handle_request(&self, request: JsonRpcRequest) -> Value {
        let id = request.id.clone();

        if self.state() != EngineState::Active {
            return to_value(McpError::SessionClosed.to_json_rpc_error(id));
        }
        if let Err(e) = validate_request(&request) {
            return to_value(e.to_json_rpc_error(id));
        }

        match self.dispatch_request(request).await {
            Ok(value) => to_value(JsonRpcResponse::new(id, value)),
            Err(e) => to_value(e.to_json_rpc_error(id)),
        }
    }

    async fn dispatch_request(&self, request: JsonRpcRequest) -> McpResult<Value> {
        let route = Route::from_method(&request.method)
            .ok_or_else(|| McpError::MethodNotFound(request.method.clone()))?;

        match route {
            Route::Initialize => self.handle_initialize(request.params).await,
            Route::Ping => Ok(Value::Object(serde_json::Map::new())),
            Route::ListTools => {
                let result = ToolListResult {
                    tools: self.handle_enumerate(),
                    next_cursor: None,
                };
                serde_json::to_value(result).map_err(|e| McpError::InternalError(e.to_string()))
            }
            Route::CallTool => {
                let params: ToolCallParams = request
                    .params
                    .map(serde_json::from_value)
                    .transpose()
                    .map_err(|e| McpError::InvalidParams(e.to_string()))?
                    .ok_or_else(|| McpError::InvalidParams("Tool call params required".to_string()))?;

                let result = self.handle_invoke(params).await?;
                serde_json::to_value(result).map_err(|e| McpError::InternalError(e.to_string()))
            }
        }
    }

    async fn handle_notification(&self, notification: JsonRpcNotification) {
        match notification.method.as_str() {
            "notifications/initialized" | "initialized" => {
                self.capabilities.lock().await.mark_initialized();
            }
            "notifications/cancelled" => {
                tracing::info!("Received cancellation notification");
            }
            _ => {
                tracing::debug!("Unknown notification: {}", notification.method);
            }
        }
    }

    async fn handle_initialize(&self, params: Option<Value>) -> McpResult<Value> {
        let init_params: InitializeParams = params
            .map(serde_json::from_value)
            .transpose()
            .map_err(|e| McpError::InvalidParams(e.to_string()))?
            .ok_or_else(|| McpError::InvalidParams("Initialize params required".to_string()))?;

        let tools = self.dispatcher.registry().list();
        let mut caps = self.capabilities.lock().await;
        let result = caps.negotiate(init_params, &tools)?;

        serde_json::to_value(result).map_err(|e| McpError::InternalError(e.to_string()))
    }

    /// Every registered tool as `{name, description, inputSchema}`, in registry order.
    pub fn handle_enumerate(&self) -> Vec<ToolDefinition> {
        self.dispatcher.registry().list()
    }

    /// Invoke a tool and encode the outcome as a tool result or a protocol error.
    pub async fn handle_invoke(&self, params: ToolCallParams) -> McpResult<ToolCallResult> {
        let arguments = params
            .arguments
            .unwrap_or_else(|| Value::Object(serde_json::Map::new()));

        match self.dispatcher.dispatch(&params.name, arguments).await {
            InvocationOutcome::Success(payload) => Ok(ToolCallResult::json(&payload)),
            InvocationOutcome::Failure(kind, message) => {
                Err(McpError::Invocation { kind, message })
            }
        }
    }
}

fn to_value(value: impl serde::Serialize) -> Value {
    serde_json::to_value(value).unwrap_or_default()
}
