//! Model Context Protocol server exposing the Harvest tools.

pub mod protocol;
pub mod server;

pub use protocol::{
    CallToolResult, ContentBlock, JsonRpcError, JsonRpcMessage, JsonRpcResponse, RequestId,
};
pub use server::McpServer;
