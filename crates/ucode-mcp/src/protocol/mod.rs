//! MCP protocol handling: JSON-RPC dispatch.

pub mod dispatcher;
pub mod engine;
pub mod negotiation;
pub mod validator;

pub use dispatcher::{DetachedTasks, Dispatcher, InvocationOutcome};
pub use engine::{EngineState, ProtocolEngine};
