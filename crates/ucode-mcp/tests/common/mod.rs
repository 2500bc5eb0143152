//! Shared fixtures: in-memory tools and request builders.

#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use ucode_mcp::protocol::{Dispatcher, ProtocolEngine};
use ucode_mcp::session::SessionManager;
use ucode_mcp::tools::ToolRegistry;
use ucode_mcp::types::JsonRpcMessage;
use ucode_mcp::ExecutionPolicy;
use ucode_tools::{Tool, ToolError, ToolResult, ToolSpec};

/// Returns its arguments. Requires `a` and `b`.
pub struct EchoTool;

#[async_trait]
impl Tool for EchoTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "echo".to_string(),
            description: "Echo the arguments back".to_string(),
            parameters: json!({
                "type": "object",
                "properties": { "a": {}, "b": {} },
                "required": ["a", "b"]
            }),
        }
    }

    async fn execute(&self, args: Value) -> ToolResult<Value> {
        Ok(args)
    }
}

/// Always fails the way a rejected API call does.
pub struct FailingTool;

#[async_trait]
impl Tool for FailingTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "failing".to_string(),
            description: "Always fails".to_string(),
            parameters: json!({ "type": "object", "properties": {} }),
        }
    }

    async fn execute(&self, _args: Value) -> ToolResult<Value> {
        Err(ToolError::Api {
            status: 500,
            body: "upstream exploded".to_string(),
        })
    }
}

/// Never completes.
pub struct PendingTool;

#[async_trait]
impl Tool for PendingTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "pending".to_string(),
            description: "Never resolves".to_string(),
            parameters: json!({ "type": "object", "properties": {} }),
        }
    }

    async fn execute(&self, _args: Value) -> ToolResult<Value> {
        std::future::pending::<()>().await;
        Ok(Value::Null)
    }
}

/// A tool whose name and schema are set by the test, for registry edge cases.
pub struct RawTool {
    pub name: &'static str,
    pub parameters: Value,
}

#[async_trait]
impl Tool for RawTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: self.name.to_string(),
            description: String::new(),
            parameters: self.parameters.clone(),
        }
    }

    async fn execute(&self, _args: Value) -> ToolResult<Value> {
        Ok(json!({ "tool": self.name }))
    }
}

pub fn test_tools() -> Vec<Arc<dyn Tool>> {
    vec![Arc::new(EchoTool), Arc::new(FailingTool), Arc::new(PendingTool)]
}

pub fn dispatcher(policy: ExecutionPolicy) -> Arc<Dispatcher> {
    let registry = Arc::new(ToolRegistry::load(test_tools()));
    Arc::new(Dispatcher::new(registry, policy))
}

pub fn engine(policy: ExecutionPolicy) -> ProtocolEngine {
    ProtocolEngine::new(dispatcher(policy))
}

pub fn manager(policy: ExecutionPolicy) -> Arc<SessionManager> {
    Arc::new(SessionManager::new(dispatcher(policy)))
}

/// Build an MCP JSON-RPC request.
pub fn mcp_request(id: i64, method: &str, params: Value) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "method": method,
        "params": params
    })
}

/// Build an initialize request.
pub fn init_request() -> Value {
    mcp_request(
        0,
        "initialize",
        json!({
            "protocolVersion": "2024-11-05",
            "capabilities": {},
            "clientInfo": { "name": "test-client", "version": "1.0" }
        }),
    )
}

pub fn call_request(id: i64, name: &str, arguments: Value) -> Value {
    mcp_request(id, "tools/call", json!({ "name": name, "arguments": arguments }))
}

pub fn message(value: Value) -> JsonRpcMessage {
    serde_json::from_value(value).unwrap()
}

/// Send a JSON-RPC message through the engine and unwrap the response.
pub async fn send_unwrap(engine: &ProtocolEngine, msg: Value) -> Value {
    engine
        .handle_message(message(msg))
        .await
        .expect("expected response")
}

/// Decode the JSON payload carried in a tool result's first text block.
pub fn tool_payload(response: &Value) -> Value {
    let text = response["result"]["content"][0]["text"]
        .as_str()
        .expect("tool result text");
    serde_json::from_str(text).unwrap()
}
