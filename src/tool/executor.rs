use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::tool::{ToolContext, ToolDefinition, ToolError, ToolRegistry, ToolResult};

/// Dispatches tool calls by name.
#[derive(Debug, Clone)]
pub struct ToolExecutor {
    registry: Arc<ToolRegistry>,
}

impl ToolExecutor {
    /// Creates a new tool executor over a fully populated registry.
    pub fn new(registry: ToolRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
        }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Returns all tool definitions for listing.
    pub fn get_tool_definitions(&self) -> Vec<ToolDefinition> {
        self.registry.to_tool_definitions()
    }

    pub fn has_tool(&self, name: &str) -> bool {
        self.registry.get(name).is_some()
    }

    /// Executes a single tool call.
    pub async fn execute(
        &self,
        name: &str,
        arguments: Value,
        ctx: &ToolContext,
    ) -> Result<ToolResult, ToolError> {
        let tool = self
            .registry
            .get(name)
            .cloned()
            .ok_or_else(|| ToolError::NotFound(name.to_string()))?;

        debug!(tool = name, "Executing tool");
        tool.execute(arguments, ctx).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unknown_tool_is_not_found() {
        let executor = ToolExecutor::new(ToolRegistry::new());
        let ctx = ToolContext::detached("nope");

        let err = executor
            .execute("nope", Value::Null, &ctx)
            .await
            .unwrap_err();

        assert!(matches!(err, ToolError::NotFound(name) if name == "nope"));
        assert!(!executor.has_tool("nope"));
    }
}
