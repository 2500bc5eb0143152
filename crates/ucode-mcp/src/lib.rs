//! ucode MCP server: exposes the ucode public API as MCP tools over stdio,
//! legacy SSE, and streamable HTTP.

pub mod config;
pub mod protocol;
pub mod session;
pub mod tools;
pub mod transport;
pub mod types;

pub use config::{resolve_base_url, resolve_http_addr, ExecutionPolicy};
pub use protocol::{Dispatcher, ProtocolEngine};
pub use session::SessionManager;
pub use tools::ToolRegistry;
#[cfg(feature = "sse")]
pub use transport::HttpTransport;
pub use transport::StdioTransport;
