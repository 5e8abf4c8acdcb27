//! # Greenhouse MCP
//!
//! A typed client for the Greenhouse Harvest API and an MCP server that
//! exposes its read and write operations as assistant tools.
//!
//! ## Features
//!
//! - **Harvest Client**: Basic auth, client-side rate limiting and bounded 429 retries
//! - **Tool System**: Every Harvest operation wrapped as a schema-described tool
//! - **MCP Server**: Line-delimited JSON-RPC over stdio with per-call log notifications
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use greenhouse_mcp::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = HarvestClientBuilder::new()
//!         .with_api_key(std::env::var("GREENHOUSE_API_KEY")?)
//!         .build()?;
//!
//!     let jobs = client
//!         .list_jobs(JobQuery::new(Pagination::default()).with_status(JobStatus::Open))
//!         .await?;
//!     println!("{}", jobs);
//!
//!     // Or serve every operation to an MCP client over stdio
//!     let registry = greenhouse_mcp::tools::registry(Arc::new(client));
//!     McpServer::new(ToolExecutor::new(registry)).serve_stdio().await?;
//!
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod harvest;
pub mod mcp;
pub mod tool;
pub mod tools;

use std::sync::Arc;

// Re-exports for convenient usage
pub use config::HarvestConfig;
pub use error::ServerError;
pub use harvest::{HarvestApi, HarvestClient, HarvestClientBuilder, HarvestError};
pub use mcp::McpServer;
pub use tool::{DynTool, Tool, ToolContext, ToolDefinition, ToolError, ToolExecutor, ToolRegistry, ToolResult};

/// Instructions sent to clients on `initialize`.
pub const SERVER_INSTRUCTIONS: &str = "Tools for the Greenhouse recruiting system: jobs, job \
stages, candidates, applications, notes, departments, offices and users. List tools accept \
per_page and page for pagination.";

/// Builds a server with every Harvest tool backed by a client for `config`.
pub fn build_server(config: &HarvestConfig) -> Result<McpServer, ServerError> {
    let client = HarvestClientBuilder::from_config(config).build()?;
    let registry = tools::registry(Arc::new(client));
    Ok(McpServer::new(ToolExecutor::new(registry)).with_instructions(SERVER_INSTRUCTIONS))
}

/// Prelude module with commonly used types.
pub mod prelude {
    pub use crate::harvest::{
        ApplicationQuery, ApplicationStatus, CandidatePayload, CandidateQuery, HarvestApi,
        HarvestClient, HarvestClientBuilder, HarvestError, JobQuery, JobStatus, Pagination,
    };
    pub use crate::mcp::McpServer;
    pub use crate::tool::{DynTool, Tool, ToolContext, ToolExecutor, ToolRegistry, ToolResult};
    pub use std::sync::Arc;
}
