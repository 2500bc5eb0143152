//! Core data types shared by every tool.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Static description of a tool: its unique name and JSON Schema for arguments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    /// JSON Schema object (`type: object`, `properties`, optional `required`).
    pub parameters: Value,
}

/// Errors that can occur while executing a tool.
#[derive(thiserror::Error, Debug)]
pub enum ToolError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Ucode API returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type ToolResult<T> = Result<T, ToolError>;
