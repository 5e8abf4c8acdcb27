use std::sync::{Arc, RwLock};

use futures::{SinkExt, StreamExt};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::codec::{FramedRead, FramedWrite, LinesCodec};
use tracing::{debug, error, info, warn};

use super::protocol::{
    CallToolParams, CallToolResult, INTERNAL_ERROR, INVALID_PARAMS, INVALID_REQUEST,
    InitializeResult, JsonRpcError, JsonRpcMessage, JsonRpcNotification, JsonRpcResponse,
    ListToolsResult, LoggingMessageParams, METHOD_NOT_FOUND, PARSE_ERROR, PROTOCOL_VERSION,
    RequestId, ServerCapabilities, ServerInfo, SetLevelParams, ToolsCapability,
};
use crate::error::ServerError;
use crate::tool::{LogEvent, LogLevel, ToolContext, ToolError, ToolExecutor};

/// Outgoing lines, one JSON-RPC message each.
pub type Outbound = mpsc::UnboundedSender<String>;

const LOGGER_NAME: &str = "greenhouse";

/// Longest incoming line accepted before the session is closed.
pub const DEFAULT_MAX_LINE_LENGTH: usize = 8 * 1024 * 1024;

/// An MCP server speaking line-delimited JSON-RPC.
///
/// `tools/call` requests run on their own tasks so a slow or throttled call
/// never holds up the rest of the session. Everything else is answered in
/// order.
pub struct McpServer {
    executor: ToolExecutor,
    info: ServerInfo,
    instructions: Option<String>,
    log_level: RwLock<LogLevel>,
    max_line_length: usize,
}

impl McpServer {
    /// Creates a new server around a populated executor.
    pub fn new(executor: ToolExecutor) -> Self {
        Self {
            executor,
            info: ServerInfo {
                name: env!("CARGO_PKG_NAME").to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            instructions: None,
            log_level: RwLock::new(LogLevel::Info),
            max_line_length: DEFAULT_MAX_LINE_LENGTH,
        }
    }

    /// Sets the instructions returned from `initialize`.
    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = Some(instructions.into());
        self
    }

    /// Caps the length of a single incoming message.
    pub fn with_max_line_length(mut self, max_line_length: usize) -> Self {
        self.max_line_length = max_line_length;
        self
    }

    pub fn executor(&self) -> &ToolExecutor {
        &self.executor
    }

    /// Minimum level of call-context messages forwarded to the client.
    pub fn log_level(&self) -> LogLevel {
        *self
            .log_level
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Serves on the process's stdin and stdout.
    pub async fn serve_stdio(self) -> Result<(), ServerError> {
        self.serve(tokio::io::stdin(), tokio::io::stdout()).await
    }

    /// Serves until `reader` reaches end of input and all in-flight calls
    /// have been answered.
    pub async fn serve<R, W>(self, reader: R, writer: W) -> Result<(), ServerError>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let server = Arc::new(self);
        let (out, mut outbound) = mpsc::unbounded_channel::<String>();

        let writer_task = tokio::spawn(async move {
            let mut sink = FramedWrite::new(writer, LinesCodec::new());
            while let Some(line) = outbound.recv().await {
                sink.send(line).await?;
            }
            Ok::<(), ServerError>(())
        });

        info!(tools = server.executor.registry().len(), "MCP server ready");

        let mut lines = FramedRead::new(
            reader,
            LinesCodec::new_with_max_length(server.max_line_length),
        );
        let mut calls = JoinSet::new();

        while let Some(line) = lines.next().await {
            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    error!("Closing session: {}", e);
                    return Err(e.into());
                }
            };
            if line.trim().is_empty() {
                continue;
            }

            let message = match parse_message(&line) {
                Ok(Some(message)) => message,
                Ok(None) => continue,
                Err(response) => {
                    send(&out, &response);
                    continue;
                }
            };

            if message.method == "tools/call" && !message.is_notification() {
                let server = server.clone();
                let out = out.clone();
                calls.spawn(async move {
                    if let Some(response) = server.handle_message(message, &out).await {
                        send(&out, &response);
                    }
                });
            } else if let Some(response) = server.handle_message(message, &out).await {
                send(&out, &response);
            }

            while let Some(joined) = calls.try_join_next() {
                if let Err(e) = joined {
                    error!("Tool call task failed: {}", e);
                }
            }
        }

        debug!("Input closed, waiting for {} in-flight calls", calls.len());
        while let Some(joined) = calls.join_next().await {
            if let Err(e) = joined {
                error!("Tool call task failed: {}", e);
            }
        }

        drop(out);
        writer_task.await??;
        info!("MCP server stopped");
        Ok(())
    }

    /// Handles one message. Notifications produce no response; log
    /// notifications raised by a tool call are sent to `out` before the
    /// call's response is returned.
    pub async fn handle_message(
        &self,
        message: JsonRpcMessage,
        out: &Outbound,
    ) -> Option<JsonRpcResponse> {
        let JsonRpcMessage {
            id, method, params, ..
        } = message;

        let Some(id) = id else {
            self.handle_notification(&method);
            return None;
        };

        debug!(method = %method, "Handling request");
        let result = match method.as_str() {
            "initialize" => self.initialize(),
            "ping" => Ok(json!({})),
            "tools/list" => to_result(&ListToolsResult {
                tools: self.executor.get_tool_definitions(),
            }),
            "tools/call" => self.call_tool(params, out).await,
            "logging/setLevel" => self.set_level(params),
            other => Err(JsonRpcError::new(
                METHOD_NOT_FOUND,
                format!("Method not found: {}", other),
            )),
        };

        Some(match result {
            Ok(value) => JsonRpcResponse::success(id, value),
            Err(error) => JsonRpcResponse::failure(Some(id), error),
        })
    }

    fn handle_notification(&self, method: &str) {
        match method {
            "notifications/initialized" => info!("Client initialized"),
            "notifications/cancelled" => debug!("Cancellation is not supported, ignoring"),
            other => debug!(method = other, "Ignoring notification"),
        }
    }

    fn initialize(&self) -> Result<Value, JsonRpcError> {
        to_result(&InitializeResult {
            protocol_version: PROTOCOL_VERSION.to_string(),
            capabilities: ServerCapabilities {
                tools: ToolsCapability {
                    list_changed: false,
                },
                logging: Default::default(),
            },
            server_info: self.info.clone(),
            instructions: self.instructions.clone(),
        })
    }

    fn set_level(&self, params: Option<Value>) -> Result<Value, JsonRpcError> {
        let params: SetLevelParams = parse_params(params)?;
        let mut level = self
            .log_level
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *level = params.level;
        Ok(json!({}))
    }

    async fn call_tool(&self, params: Option<Value>, out: &Outbound) -> Result<Value, JsonRpcError> {
        let params: CallToolParams = parse_params(params)?;
        if !self.executor.has_tool(&params.name) {
            return Err(JsonRpcError::new(
                INVALID_PARAMS,
                format!("Unknown tool: {}", params.name),
            ));
        }

        let (events, mut received) = mpsc::unbounded_channel::<LogEvent>();
        let ctx = ToolContext::with_sink(params.name.clone(), events);
        let outcome = self
            .executor
            .execute(&params.name, params.arguments.unwrap_or(Value::Null), &ctx)
            .await;
        drop(ctx);

        let threshold = self.log_level();
        while let Ok(event) = received.try_recv() {
            if event.level >= threshold {
                let params = LoggingMessageParams {
                    level: event.level,
                    logger: LOGGER_NAME.to_string(),
                    data: Value::String(event.message),
                };
                if let Ok(params) = serde_json::to_value(&params) {
                    send(out, &JsonRpcNotification::new("notifications/message", params));
                }
            }
        }

        let result = match outcome {
            Ok(result) => CallToolResult::from(result),
            Err(e) => {
                if let ToolError::InvalidArguments(reason) = &e {
                    warn!(tool = %params.name, "Rejected arguments: {}", reason);
                }
                CallToolResult::error(e.to_string())
            }
        };
        to_result(&result)
    }
}

/// Reads one line. `Ok(None)` for messages that need no answer (responses
/// from the client); `Err` carries the error response to send back.
fn parse_message(line: &str) -> Result<Option<JsonRpcMessage>, JsonRpcResponse> {
    let value: Value = serde_json::from_str(line).map_err(|e| {
        JsonRpcResponse::failure(None, JsonRpcError::new(PARSE_ERROR, format!("Parse error: {}", e)))
    })?;

    if value.get("method").is_none() && (value.get("result").is_some() || value.get("error").is_some()) {
        return Ok(None);
    }

    let id = value
        .get("id")
        .cloned()
        .and_then(|id| serde_json::from_value::<RequestId>(id).ok());
    serde_json::from_value(value).map(Some).map_err(|e| {
        JsonRpcResponse::failure(
            id,
            JsonRpcError::new(INVALID_REQUEST, format!("Invalid request: {}", e)),
        )
    })
}

fn parse_params<T: DeserializeOwned>(params: Option<Value>) -> Result<T, JsonRpcError> {
    serde_json::from_value(params.unwrap_or_else(|| json!({})))
        .map_err(|e| JsonRpcError::new(INVALID_PARAMS, format!("Invalid params: {}", e)))
}

fn to_result<T: Serialize>(value: &T) -> Result<Value, JsonRpcError> {
    serde_json::to_value(value).map_err(|e| JsonRpcError::new(INTERNAL_ERROR, e.to_string()))
}

fn send<T: Serialize>(out: &Outbound, message: &T) {
    match serde_json::to_string(message) {
        Ok(line) => {
            // Only fails once the writer has shut down.
            let _ = out.send(line);
        }
        Err(e) => error!("Failed to encode outgoing message: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::harvest::{HarvestError, MockHarvestApi};
    use crate::tools;

    fn server_with(api: MockHarvestApi) -> McpServer {
        McpServer::new(ToolExecutor::new(tools::registry(Arc::new(api))))
            .with_instructions("Greenhouse tools")
    }

    fn request(id: i64, method: &str, params: Value) -> JsonRpcMessage {
        serde_json::from_value(json!({"jsonrpc": "2.0", "id": id, "method": method, "params": params}))
            .unwrap()
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<String>) -> Vec<Value> {
        let mut messages = Vec::new();
        while let Ok(line) = rx.try_recv() {
            messages.push(serde_json::from_str(&line).unwrap());
        }
        messages
    }

    #[tokio::test]
    async fn test_initialize_advertises_tools_and_logging() {
        let server = server_with(MockHarvestApi::new());
        let (out, _rx) = mpsc::unbounded_channel();

        let response = server
            .handle_message(request(1, "initialize", json!({"protocolVersion": PROTOCOL_VERSION})), &out)
            .await
            .unwrap();

        let result = response.result.unwrap();
        assert_eq!(result["protocolVersion"], PROTOCOL_VERSION);
        assert_eq!(result["serverInfo"]["name"], "greenhouse-mcp");
        assert!(result["capabilities"]["tools"].is_object());
        assert!(result["capabilities"]["logging"].is_object());
        assert_eq!(result["instructions"], "Greenhouse tools");
    }

    #[tokio::test]
    async fn test_tools_list_returns_all_tools() {
        let server = server_with(MockHarvestApi::new());
        let (out, _rx) = mpsc::unbounded_channel();

        let response = server
            .handle_message(request(2, "tools/list", Value::Null), &out)
            .await
            .unwrap();

        let tools = response.result.unwrap()["tools"].as_array().unwrap().clone();
        assert_eq!(tools.len(), 17);
        assert!(tools.iter().all(|t| t["inputSchema"]["type"] == "object"));
    }

    #[tokio::test]
    async fn test_failed_call_is_error_result_with_log_notification() {
        let mut api = MockHarvestApi::new();
        api.expect_get_job().returning(|_| {
            Err(HarvestError::Api {
                status: 500,
                body: "boom".to_string(),
            })
        });
        let server = server_with(api);
        let (out, mut rx) = mpsc::unbounded_channel();

        let response = server
            .handle_message(
                request(3, "tools/call", json!({"name": "get_job", "arguments": {"job_id": 1}})),
                &out,
            )
            .await
            .unwrap();

        let result = response.result.unwrap();
        assert_eq!(result["isError"], true);
        assert!(result["content"][0]["text"].as_str().unwrap().contains("500"));

        let notifications = drain(&mut rx);
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0]["method"], "notifications/message");
        assert_eq!(notifications[0]["params"]["level"], "error");
    }

    #[tokio::test]
    async fn test_set_level_filters_info_messages() {
        let mut api = MockHarvestApi::new();
        api.expect_list_offices().returning(|_| Ok(json!([])));
        let server = server_with(api);
        let (out, mut rx) = mpsc::unbounded_channel();

        server
            .handle_message(request(4, "logging/setLevel", json!({"level": "warning"})), &out)
            .await
            .unwrap();
        let response = server
            .handle_message(request(5, "tools/call", json!({"name": "list_offices"})), &out)
            .await
            .unwrap();

        assert_eq!(response.result.unwrap()["isError"], false);
        assert!(drain(&mut rx).is_empty());
        assert_eq!(server.log_level(), LogLevel::Warning);
    }

    #[tokio::test]
    async fn test_unknown_tool_and_method_are_protocol_errors() {
        let server = server_with(MockHarvestApi::new());
        let (out, _rx) = mpsc::unbounded_channel();

        let response = server
            .handle_message(request(6, "tools/call", json!({"name": "delete_everything"})), &out)
            .await
            .unwrap();
        assert_eq!(response.error.unwrap().code, INVALID_PARAMS);

        let response = server
            .handle_message(request(7, "resources/list", Value::Null), &out)
            .await
            .unwrap();
        assert_eq!(response.error.unwrap().code, METHOD_NOT_FOUND);
    }

    #[tokio::test]
    async fn test_notifications_get_no_response() {
        let server = server_with(MockHarvestApi::new());
        let (out, _rx) = mpsc::unbounded_channel();
        let notification: JsonRpcMessage = serde_json::from_value(
            json!({"jsonrpc": "2.0", "method": "notifications/initialized"}),
        )
        .unwrap();

        assert!(server.handle_message(notification, &out).await.is_none());
    }

    #[test]
    fn test_parse_message_errors() {
        let err = parse_message("{not json").unwrap_err();
        assert_eq!(err.error.unwrap().code, PARSE_ERROR);
        assert!(err.id.is_none());

        let err = parse_message(r#"{"jsonrpc":"2.0","id":9}"#).unwrap_err();
        assert_eq!(err.error.unwrap().code, INVALID_REQUEST);
        assert_eq!(err.id, Some(RequestId::Number(9)));

        assert!(parse_message(r#"{"jsonrpc":"2.0","id":1,"result":{}}"#).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_oversized_line_closes_the_session() {
        let server = server_with(MockHarvestApi::new()).with_max_line_length(64);
        let (client, server_io) = tokio::io::duplex(4096);
        let (read, write) = tokio::io::split(server_io);
        let handle = tokio::spawn(server.serve(read, write));

        let (_client_read, mut client_write) = tokio::io::split(client);
        let line = format!("{}\n", "x".repeat(200));
        tokio::io::AsyncWriteExt::write_all(&mut client_write, line.as_bytes())
            .await
            .unwrap();

        let err = handle.await.unwrap().unwrap_err();
        assert!(matches!(
            err,
            ServerError::Transport(tokio_util::codec::LinesCodecError::MaxLineLengthExceeded)
        ));
    }
}
