use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Severity of a message reported to the caller during a tool call.
///
/// Ordered from least to most severe, matching MCP logging levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Notice,
    Warning,
    Error,
    Critical,
    Alert,
    Emergency,
}

/// A message reported to the caller during a tool call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEvent {
    pub level: LogLevel,
    pub message: String,
}

/// Per-call context handed to every tool.
///
/// Messages always go to `tracing`; when the call came from a client that
/// can receive them they are also forwarded to its sink.
#[derive(Debug, Clone, Default)]
pub struct ToolContext {
    tool: String,
    sink: Option<mpsc::UnboundedSender<LogEvent>>,
}

impl ToolContext {
    /// A context that only logs locally.
    pub fn detached(tool: impl Into<String>) -> Self {
        Self {
            tool: tool.into(),
            sink: None,
        }
    }

    /// A context forwarding messages to `sink`.
    pub fn with_sink(tool: impl Into<String>, sink: mpsc::UnboundedSender<LogEvent>) -> Self {
        Self {
            tool: tool.into(),
            sink: Some(sink),
        }
    }

    pub fn tool(&self) -> &str {
        &self.tool
    }

    pub fn info(&self, message: impl Into<String>) {
        let message = message.into();
        tracing::info!(tool = %self.tool, "{}", message);
        self.emit(LogLevel::Info, message);
    }

    pub fn error(&self, message: impl Into<String>) {
        let message = message.into();
        tracing::error!(tool = %self.tool, "{}", message);
        self.emit(LogLevel::Error, message);
    }

    fn emit(&self, level: LogLevel, message: String) {
        if let Some(sink) = &self.sink {
            // The receiver is gone once the call has been answered.
            let _ = sink.send(LogEvent { level, message });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_reach_the_sink_in_order() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let ctx = ToolContext::with_sink("get_job", tx);

        ctx.info("Retrieved job: Engineer");
        ctx.error("get_job failed");

        assert_eq!(rx.try_recv().unwrap().level, LogLevel::Info);
        let event = rx.try_recv().unwrap();
        assert_eq!(event.level, LogLevel::Error);
        assert_eq!(event.message, "get_job failed");
    }

    #[test]
    fn test_detached_context_and_closed_sink_do_not_panic() {
        ToolContext::detached("list_jobs").info("nobody listening");

        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);
        ToolContext::with_sink("list_jobs", tx).error("receiver dropped");
    }

    #[test]
    fn test_levels_are_ordered() {
        assert!(LogLevel::Error > LogLevel::Info);
        assert!(LogLevel::Debug < LogLevel::Warning);
        assert_eq!(serde_json::to_value(LogLevel::Warning).unwrap(), "warning");
    }
}
