//! Registry and bounded execution of client-side tools.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chucky_protocol::tools::input_to_map;
use chucky_protocol::{Error, McpServerDefinition, ToolCallPayload, ToolHandler, ToolResult};
use tracing::{debug, warn};

/// Handlers for the tools a session executes locally.
///
/// Built once from the session's client-tools MCP servers and never modified.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    handlers: HashMap<String, Arc<dyn ToolHandler>>,
}

impl ToolRegistry {
    /// Collect every tool with a handler. A later declaration of the same
    /// name replaces an earlier one.
    pub fn from_servers(servers: &[McpServerDefinition]) -> Self {
        let mut handlers = HashMap::new();
        for tool in servers.iter().flat_map(McpServerDefinition::client_tools) {
            if let Some(handler) = &tool.handler {
                if handlers.insert(tool.name.clone(), Arc::clone(handler)).is_some() {
                    warn!("Tool '{}' declared more than once; using the last one", tool.name);
                }
            }
        }
        Self { handlers }
    }

    /// Number of executable tools.
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Whether no tool is executable.
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Whether `name` is executable. Names are case-sensitive.
    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// Run the tool named by `call`, giving up after `timeout`.
    ///
    /// The handler runs on its own task so a panic is reported as a failure
    /// instead of unwinding through the caller.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ToolExecution`] when the tool is not registered, the
    /// handler fails or panics, or the timeout elapses. The error message is
    /// the text to send back in the error result.
    pub async fn execute(
        &self,
        call: &ToolCallPayload,
        timeout: Duration,
    ) -> Result<ToolResult, Error> {
        let Some(handler) = self.handlers.get(&call.tool_name) else {
            return Err(failure(call, format!("Tool not found: {}", call.tool_name)));
        };

        let handler = Arc::clone(handler);
        let input = input_to_map(&call.input);
        let mut task = tokio::spawn(async move { handler.call(input).await });

        debug!("Executing tool '{}' for call {}", call.tool_name, call.call_id);
        match tokio::time::timeout(timeout, &mut task).await {
            Ok(Ok(Ok(result))) => Ok(result),
            Ok(Ok(Err(e))) => Err(failure(call, format!("Tool execution error: {e}"))),
            Ok(Err(join_error)) => Err(failure(
                call,
                format!("Tool execution error: handler aborted: {join_error}"),
            )),
            Err(_) => {
                task.abort();
                Err(failure(
                    call,
                    format!("Tool execution timed out after {timeout:?}"),
                ))
            }
        }
    }
}

fn failure(call: &ToolCallPayload, message: String) -> Error {
    Error::ToolExecution {
        tool_name: call.tool_name.clone(),
        message,
    }
}

/// Error result sent back to the service for a failed call.
pub(crate) fn failure_result(error: &Error) -> ToolResult {
    match error {
        Error::ToolExecution { message, .. } => ToolResult::error(message.clone()),
        other => ToolResult::error(other.to_string()),
    }
}

impl fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.handlers.keys().collect();
        names.sort();
        f.debug_struct("ToolRegistry").field("tools", &names).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chucky_protocol::{McpClientToolsServer, ToolDefinition, ToolError, ToolInput};
    use serde_json::{Value, json};

    fn registry() -> ToolRegistry {
        let server = McpClientToolsServer::new("local", "1.0.0")
            .with_tool(ToolDefinition::new("remote_only", "No handler"))
            .with_tool(ToolDefinition::new("add", "Add").with_handler(|input: ToolInput| async move {
                let a = input.get("a").and_then(Value::as_i64).unwrap_or(0);
                let b = input.get("b").and_then(Value::as_i64).unwrap_or(0);
                Ok::<_, ToolError>(ToolResult::text((a + b).to_string()))
            }))
            .with_tool(ToolDefinition::new("fail", "Fails").with_handler(|_input: ToolInput| async {
                Err::<ToolResult, _>(ToolError::new("disk full"))
            }))
            .with_tool(ToolDefinition::new("slow", "Sleeps").with_handler(|_input: ToolInput| async {
                tokio::time::sleep(Duration::from_secs(10)).await;
                Ok::<_, ToolError>(ToolResult::text("late"))
            }));
        ToolRegistry::from_servers(&[server.into()])
    }

    fn call(tool: &str, input: Value) -> ToolCallPayload {
        ToolCallPayload {
            call_id: "c1".to_string(),
            tool_name: tool.to_string(),
            input,
        }
    }

    #[test]
    fn only_tools_with_handlers_are_registered() {
        let registry = registry();
        assert_eq!(registry.len(), 3);
        assert!(registry.contains("add"));
        assert!(!registry.contains("remote_only"));
        assert!(!registry.contains("Add"));
    }

    #[test]
    fn later_declarations_replace_earlier_ones() {
        let first = McpClientToolsServer::new("a", "1").with_tool(
            ToolDefinition::new("dup", "first")
                .with_handler(|_input: ToolInput| async { Ok::<_, ToolError>(ToolResult::text("first")) }),
        );
        let second = McpClientToolsServer::new("b", "1").with_tool(
            ToolDefinition::new("dup", "second")
                .with_handler(|_input: ToolInput| async { Ok::<_, ToolError>(ToolResult::text("second")) }),
        );
        let registry = ToolRegistry::from_servers(&[first.into(), second.into()]);
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn executes_registered_tool() {
        let result = registry()
            .execute(&call("add", json!({"a": 2, "b": 3})), Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(result.text_content(), "5");
        assert!(!result.is_error);
    }

    #[tokio::test]
    async fn unknown_tool_names_the_tool() {
        let err = registry()
            .execute(&call("missing", Value::Null), Duration::from_secs(1))
            .await
            .unwrap_err();
        let result = failure_result(&err);
        assert!(result.is_error);
        assert_eq!(result.text_content(), "Tool not found: missing");
    }

    #[tokio::test]
    async fn handler_errors_are_prefixed() {
        let err = registry()
            .execute(&call("fail", json!({})), Duration::from_secs(1))
            .await
            .unwrap_err();
        assert_eq!(
            failure_result(&err).text_content(),
            "Tool execution error: disk full"
        );
    }

    #[tokio::test]
    async fn slow_handlers_time_out() {
        let started = std::time::Instant::now();
        let err = registry()
            .execute(&call("slow", json!({})), Duration::from_millis(50))
            .await
            .unwrap_err();
        assert!(started.elapsed() < Duration::from_secs(5));
        assert!(failure_result(&err).text_content().contains("timed out"));
    }
}
