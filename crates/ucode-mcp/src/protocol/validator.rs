//! JSON-RPC message validation and tool argument checks.

use serde_json::Value;

use crate::types::{JsonRpcRequest, McpError, McpResult, ToolDefinition, JSONRPC_VERSION};

/// Validate that a JSON-RPC request is well-formed.
pub fn validate_request(request: &JsonRpcRequest) -> McpResult<()> {
    if request.jsonrpc != JSONRPC_VERSION {
        return Err(McpError::InvalidRequest(format!(
            "Expected jsonrpc version \"{JSONRPC_VERSION}\", got \"{}\"",
            request.jsonrpc
        )));
    }

    if request.method.is_empty() {
        return Err(McpError::InvalidRequest(
            "Method name must not be empty".to_string(),
        ));
    }

    Ok(())
}

/// A required parameter absent from the invocation arguments.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("Missing required parameter: {0}")]
pub struct MissingParameter(pub String);

/// Parameter names listed in the schema's `required` array, in declared order.
pub fn required_parameters(schema: &Value) -> Vec<&str> {
    schema
        .get("required")
        .and_then(Value::as_array)
        .map(|names| names.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default()
}

/// Presence check for every required parameter. Reports the first one missing.
pub fn validate_arguments(
    definition: &ToolDefinition,
    arguments: &Value,
) -> Result<(), MissingParameter> {
    for name in required_parameters(&definition.input_schema) {
        if arguments.get(name).is_none() {
            return Err(MissingParameter(name.to_string()));
        }
    }
    Ok(())
}
