//! Error types and JSON-RPC error codes for the MCP server.

use super::message::{JsonRpcError, RequestId};

/// Standard JSON-RPC 2.0 error codes.
pub mod error_codes {
    pub const PARSE_ERROR: i32 = -32700;
    pub const INVALID_REQUEST: i32 = -32600;
    pub const METHOD_NOT_FOUND: i32 = -32601;
    pub const INVALID_PARAMS: i32 = -32602;
    pub const INTERNAL_ERROR: i32 = -32603;
}

/// Server-defined error codes (JSON-RPC reserves -32000..-32099).
pub mod server_error_codes {
    /// Request did not resolve to a live session and is not a valid initialize.
    pub const NO_VALID_SESSION: i32 = -32000;
}

/// Classification of a failed tool invocation, mapped 1:1 to a JSON-RPC code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    MethodNotFound,
    InvalidParams,
    InternalError,
}

impl FailureKind {
    pub fn code(self) -> i32 {
        match self {
            FailureKind::MethodNotFound => error_codes::METHOD_NOT_FOUND,
            FailureKind::InvalidParams => error_codes::INVALID_PARAMS,
            FailureKind::InternalError => error_codes::INTERNAL_ERROR,
        }
    }
}

/// All errors that can occur in the MCP server.
#[derive(thiserror::Error, Debug)]
pub enum McpError {
    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Method not found: {0}")]
    MethodNotFound(String),

    #[error("Invalid params: {0}")]
    InvalidParams(String),

    #[error("Internal error: {0}")]
    InternalError(String),

    /// A tool invocation failed; the message is surfaced to the client verbatim.
    #[error("{message}")]
    Invocation { kind: FailureKind, message: String },

    #[error("Bad Request: No valid session ID provided")]
    NoValidSession,

    #[error("Session closed")]
    SessionClosed,

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl McpError {
    pub fn code(&self) -> i32 {
        use error_codes::*;
        match self {
            McpError::ParseError(_) => PARSE_ERROR,
            McpError::InvalidRequest(_) | McpError::SessionClosed => INVALID_REQUEST,
            McpError::MethodNotFound(_) => METHOD_NOT_FOUND,
            McpError::InvalidParams(_) => INVALID_PARAMS,
            McpError::InternalError(_) => INTERNAL_ERROR,
            McpError::Invocation { kind, .. } => kind.code(),
            McpError::NoValidSession => server_error_codes::NO_VALID_SESSION,
            McpError::Transport(_) | McpError::Io(_) => INTERNAL_ERROR,
            McpError::Json(_) => PARSE_ERROR,
        }
    }

    pub fn to_json_rpc_error(&self, id: RequestId) -> JsonRpcError {
        JsonRpcError::new(id, self.code(), self.to_string())
    }
}

pub type McpResult<T> = Result<T, McpError>;
