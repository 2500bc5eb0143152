//! MCP capability negotiation during initialization.

use crate::types::{
    ClientCapabilities, InitializeParams, InitializeResult, McpResult, ToolDefinition, MCP_VERSION,
};

/// Stored client capabilities after negotiation.
#[derive(Debug, Clone, Default)]
pub struct NegotiatedCapabilities {
    pub client: ClientCapabilities,
    pub client_name: Option<String>,
    pub initialized: bool,
}

impl NegotiatedCapabilities {
    pub fn negotiate(
        &mut self,
        params: InitializeParams,
        tools: &[ToolDefinition],
    ) -> McpResult<InitializeResult> {
        if params.protocol_version != MCP_VERSION {
            tracing::warn!(
                "Client requested protocol version {}, server supports {}. Proceeding with server version.",
                params.protocol_version,
                MCP_VERSION
            );
        }

        self.client = params.capabilities;
        self.client_name = Some(params.client_info.name.clone());

        tracing::info!(
            "Initialized with client: {} v{}",
            params.client_info.name,
            params.client_info.version
        );

        Ok(InitializeResult::with_tools(tools))
    }

    pub fn mark_initialized(&mut self) {
        self.initialized = true;
        tracing::info!("MCP handshake complete");
    }
}
