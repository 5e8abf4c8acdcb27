pub mod context;
pub mod executor;
pub mod registry;

pub use context::{LogEvent, LogLevel, ToolContext};
pub use executor::ToolExecutor;
pub use registry::ToolRegistry;
pub use tool_trait::{DynTool, Tool};
pub use tool_types::{ToolDefinition, ToolError, ToolResult};

mod tool_types {
    use serde::{Deserialize, Serialize};
    use serde_json::Value;

    use crate::harvest::HarvestError;

    /// Definition of a tool as advertised to the caller.
    #[derive(Debug, Clone, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ToolDefinition {
        /// The name of the tool
        pub name: String,
        /// A description of what the tool does
        pub description: String,
        /// JSON Schema for the tool's input parameters
        pub input_schema: Value,
    }

    /// The result of executing a tool.
    #[derive(Debug, Clone)]
    pub struct ToolResult {
        /// Text rendering of the output
        pub output: String,
        /// The output as returned by the API, when it was JSON
        pub structured: Option<Value>,
    }

    impl ToolResult {
        /// Creates a result carrying a JSON value verbatim.
        pub fn json(value: Value) -> Self {
            let output = serde_json::to_string_pretty(&value).unwrap_or_else(|_| value.to_string());
            Self {
                output,
                structured: Some(value),
            }
        }
    }

    /// Errors that can occur when executing a tool.
    #[derive(Debug, thiserror::Error)]
    pub enum ToolError {
        #[error("Invalid arguments: {0}")]
        InvalidArguments(String),
        #[error("Tool not found: {0}")]
        NotFound(String),
        #[error(transparent)]
        Harvest(#[from] HarvestError),
    }
}

mod tool_trait {
    use super::context::ToolContext;
    use super::tool_types::{ToolDefinition, ToolError, ToolResult};
    use async_trait::async_trait;
    use serde_json::Value;
    use std::sync::Arc;

    /// An operation the caller can invoke by name.
    #[async_trait]
    pub trait Tool: Send + Sync {
        /// Returns the name of the tool.
        fn name(&self) -> &str;
        /// Returns a description of what the tool does.
        fn description(&self) -> &str;
        /// Returns the JSON Schema for the tool's input parameters.
        fn parameters_schema(&self) -> Value;

        /// Executes the tool with the given arguments.
        async fn execute(&self, args: Value, ctx: &ToolContext) -> Result<ToolResult, ToolError>;

        /// Converts the tool to its definition.
        fn to_definition(&self) -> ToolDefinition {
            ToolDefinition {
                name: self.name().to_string(),
                description: self.description().to_string(),
                input_schema: self.parameters_schema(),
            }
        }
    }

    /// A type alias for a dynamic tool reference.
    pub type DynTool = Arc<dyn Tool>;
}
