//! The fixed interface every tool implements.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::types::{ToolError, ToolResult, ToolSpec};

/// A named, independently invocable operation with a declared input schema.
#[async_trait]
pub trait Tool: Send + Sync {
    fn spec(&self) -> ToolSpec;

    async fn execute(&self, args: Value) -> ToolResult<Value>;
}

/// Deserialize tool arguments, reporting shape mismatches as invalid arguments.
pub fn parse_args<T: DeserializeOwned>(args: Value) -> ToolResult<T> {
    serde_json::from_value(args).map_err(|e| ToolError::InvalidArgument(e.to_string()))
}
