//! Tool registry: the fixed set of invocable tools, read-only after startup.

use std::collections::HashMap;
use std::sync::Arc;

use ucode_tools::{Tool, UcodeClient};

use crate::types::ToolDefinition;

/// A tool paired with the definition it was registered under.
pub struct RegisteredTool {
    definition: ToolDefinition,
    tool: Arc<dyn Tool>,
}

impl RegisteredTool {
    pub fn definition(&self) -> &ToolDefinition {
        &self.definition
    }

    pub fn tool(&self) -> Arc<dyn Tool> {
        self.tool.clone()
    }
}

pub struct ToolRegistry {
    entries: Vec<RegisteredTool>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    /// Register tools in order. A tool with an empty name, a non-object schema,
    /// or a name already taken is skipped; the rest still load.
    pub fn load(sources: Vec<Arc<dyn Tool>>) -> Self {
        let mut entries = Vec::with_capacity(sources.len());
        let mut index = HashMap::with_capacity(sources.len());

        for tool in sources {
            let spec = tool.spec();

            if spec.name.trim().is_empty() {
                tracing::warn!("Skipping tool with empty name");
                continue;
            }
            if !spec.parameters.is_object() {
                tracing::warn!("Skipping tool '{}': input schema is not an object", spec.name);
                continue;
            }
            if index.contains_key(&spec.name) {
                tracing::warn!("Skipping duplicate tool '{}'", spec.name);
                continue;
            }

            index.insert(spec.name.clone(), entries.len());
            entries.push(RegisteredTool {
                definition: ToolDefinition {
                    name: spec.name,
                    description: spec.description,
                    input_schema: spec.parameters,
                },
                tool,
            });
        }

        tracing::info!("Loaded {} tools", entries.len());
        Self { entries, index }
    }

    /// Registry of every built-in ucode tool.
    pub fn builtin(client: &UcodeClient) -> Self {
        Self::load(ucode_tools::all_tools(client))
    }

    pub fn list(&self) -> Vec<ToolDefinition> {
        self.entries.iter().map(|e| e.definition.clone()).collect()
    }

    pub fn resolve(&self, name: &str) -> Option<&RegisteredTool> {
        self.index.get(name).map(|&i| &self.entries[i])
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
