//! Tool registration and lookup.

pub mod registry;

pub use registry::{RegisteredTool, ToolRegistry};
