//! Payload types carried inside protocol envelopes.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::tools::ToolResult;

/// Author of a conversational message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The human side of the conversation
    User,
    /// The remote assistant
    Assistant,
    /// System-authored content
    System,
}

/// A single block of structured message content.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ContentBlock {
    /// Block kind: `text`, `image`, `tool_use` or `tool_result`
    #[serde(rename = "type")]
    pub block_type: String,
    /// Text body for `text` blocks
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Identifier of a `tool_use` block
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Tool name of a `tool_use` block
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Tool input of a `tool_use` block
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<Value>,
    /// Referenced tool use of a `tool_result` block
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_use_id: Option<String>,
    /// Body of a `tool_result` block
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Value>,
    /// Whether a `tool_result` block reports a failure
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_error: Option<bool>,
    /// Image source for `image` blocks
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<Value>,
}

/// Message body: plain text or a list of content blocks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    /// Plain text
    Text(String),
    /// Structured blocks
    Blocks(Vec<ContentBlock>),
}

impl Default for MessageContent {
    fn default() -> Self {
        Self::Text(String::new())
    }
}

/// A role-tagged conversational message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Author
    pub role: Role,
    /// Body
    #[serde(default)]
    pub content: MessageContent,
}

impl Message {
    /// Concatenated text of the message.
    ///
    /// Plain-text bodies are returned as-is; for block bodies only `text`
    /// blocks contribute.
    pub fn text(&self) -> String {
        match &self.content {
            MessageContent::Text(text) => text.clone(),
            MessageContent::Blocks(blocks) => blocks
                .iter()
                .filter(|block| block.block_type == "text")
                .filter_map(|block| block.text.as_deref())
                .collect(),
        }
    }
}

/// Outbound user turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserMessage {
    /// Fresh identifier for this turn
    pub uuid: String,
    /// Session identity, or the `unknown` placeholder
    pub session_id: String,
    /// The user's message
    pub message: Message,
    /// Always `null` for turns initiated by the SDK
    pub parent_tool_use_id: Option<String>,
}

/// Assistant response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssistantMessage {
    /// Message identifier
    #[serde(default)]
    pub uuid: String,
    /// Session identity
    #[serde(default)]
    pub session_id: String,
    /// Response body
    pub message: Message,
    /// Set when the response belongs to a nested tool use
    #[serde(default)]
    pub parent_tool_use_id: Option<String>,
}

impl AssistantMessage {
    /// Text content of the response.
    pub fn text(&self) -> String {
        self.message.text()
    }
}

/// Subtype of a `system` envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SystemSubtype {
    /// Session initialised; carries the session identity
    Init,
    /// Conversation history was compacted
    CompactBoundary,
    /// Subtype not known to this SDK
    #[serde(other)]
    Other,
}

/// Data attached to a `system`/`init` envelope.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SystemInitData {
    /// Working directory of the remote agent
    #[serde(default)]
    pub cwd: Option<String>,
    /// Tools available to the agent
    #[serde(default)]
    pub tools: Vec<String>,
    /// MCP servers attached to the session
    #[serde(default)]
    pub mcp_servers: Vec<String>,
    /// Model serving the session
    #[serde(default)]
    pub model: Option<String>,
    /// Effective permission mode
    #[serde(default, rename = "permissionMode")]
    pub permission_mode: Option<String>,
}

/// System notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemMessage {
    /// Notification kind
    pub subtype: SystemSubtype,
    /// Message identifier
    #[serde(default)]
    pub uuid: String,
    /// Session identity assigned by the service
    #[serde(default)]
    pub session_id: String,
    /// Subtype-specific data
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl SystemMessage {
    /// Decode the init data, if this is an `init` notification that carries it.
    pub fn init_data(&self) -> Option<SystemInitData> {
        if self.subtype != SystemSubtype::Init {
            return None;
        }
        self.data
            .as_ref()
            .and_then(|data| serde_json::from_value(data.clone()).ok())
    }
}

/// Subtype of a `result` envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultSubtype {
    /// The turn completed
    Success,
    /// The turn limit was reached
    ErrorMaxTurns,
    /// The agent failed while executing
    ErrorDuringExecution,
    /// The budget was exhausted
    ErrorBudget,
    /// Too many concurrent sessions
    ErrorConcurrency,
    /// The credential was rejected
    ErrorAuthentication,
    /// Subtype not known to this SDK
    #[serde(other)]
    Other,
}

/// Token accounting for a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Usage {
    /// Prompt tokens
    #[serde(default)]
    pub input_tokens: u64,
    /// Completion tokens
    #[serde(default)]
    pub output_tokens: u64,
    /// Tokens written to the prompt cache
    #[serde(default)]
    pub cache_creation_input_tokens: u64,
    /// Tokens served from the prompt cache
    #[serde(default)]
    pub cache_read_input_tokens: u64,
}

/// Final outcome of a prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultMessage {
    /// Outcome kind
    pub subtype: ResultSubtype,
    /// Message identifier
    #[serde(default)]
    pub uuid: String,
    /// Session identity
    #[serde(default)]
    pub session_id: String,
    /// Wall-clock duration of the turn
    #[serde(default)]
    pub duration_ms: u64,
    /// Time spent waiting on the model API
    #[serde(default)]
    pub duration_api_ms: u64,
    /// Whether the outcome is a failure
    #[serde(default)]
    pub is_error: bool,
    /// Number of agent turns
    #[serde(default)]
    pub num_turns: u32,
    /// Final text, when the turn succeeded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    /// Total spend in USD
    #[serde(default)]
    pub total_cost_usd: f64,
    /// Token accounting
    #[serde(default)]
    pub usage: Usage,
    /// Failure details
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

/// Summary returned by one-shot prompts.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionResult {
    /// Outcome kind
    pub subtype: ResultSubtype,
    /// Session the prompt ran in
    pub session_id: String,
    /// Final text
    pub result: Option<String>,
    /// Whether the outcome is a failure
    pub is_error: bool,
    /// Number of agent turns
    pub num_turns: u32,
    /// Wall-clock duration in milliseconds
    pub duration_ms: u64,
    /// Total spend in USD
    pub total_cost_usd: f64,
    /// Token accounting
    pub usage: Usage,
    /// Failure details
    pub errors: Vec<String>,
}

impl From<ResultMessage> for SessionResult {
    fn from(message: ResultMessage) -> Self {
        Self {
            subtype: message.subtype,
            session_id: message.session_id,
            result: message.result,
            is_error: message.is_error,
            num_turns: message.num_turns,
            duration_ms: message.duration_ms,
            total_cost_usd: message.total_cost_usd,
            usage: message.usage,
            errors: message.errors,
        }
    }
}

/// Partial assistant output while a response is being generated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamEventMessage {
    /// Raw streaming event
    #[serde(default)]
    pub event: Value,
    /// Message identifier
    #[serde(default)]
    pub uuid: String,
    /// Session identity
    #[serde(default)]
    pub session_id: String,
    /// Set when the event belongs to a nested tool use
    #[serde(default)]
    pub parent_tool_use_id: Option<String>,
}

/// Session-management actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlAction {
    /// The service is ready to accept turns
    Ready,
    /// Session metadata
    SessionInfo,
    /// No further input will be sent
    EndInput,
    /// Shut the session down
    Close,
    /// Action not known to this SDK
    #[serde(other)]
    Unknown,
}

/// Body of a `control` envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlPayload {
    /// Requested action
    pub action: ControlAction,
    /// Action-specific data
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl ControlPayload {
    /// Control payload without data.
    pub fn new(action: ControlAction) -> Self {
        Self { action, data: None }
    }

    /// Whether this payload marks the handshake as complete.
    pub fn signals_ready(&self) -> bool {
        matches!(self.action, ControlAction::Ready | ControlAction::SessionInfo)
    }
}

/// Body of an `error` envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorPayload {
    /// Human-readable description
    pub message: String,
    /// Wire error code
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Additional structured details
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

/// Body of an outgoing `ping` envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PingPayload {
    /// Milliseconds since the Unix epoch
    pub timestamp: i64,
}

impl PingPayload {
    /// Ping stamped with the current time.
    pub fn now() -> Self {
        Self {
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }
}

/// Body of an incoming `pong` envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PongPayload {
    /// Timestamp echoed from the ping
    #[serde(default)]
    pub timestamp: i64,
}

/// Request to run a locally registered tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallPayload {
    /// Correlation id echoed in the result
    #[serde(rename = "callId")]
    pub call_id: String,
    /// Tool to run
    #[serde(rename = "toolName")]
    pub tool_name: String,
    /// Untyped tool input
    #[serde(default)]
    pub input: Value,
}

/// Outcome of a tool call, addressed by call id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResultPayload {
    /// Correlation id from the originating call
    #[serde(rename = "callId")]
    pub call_id: String,
    /// Tool output
    pub result: ToolResult,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn assistant_text_concatenates_text_blocks() {
        let message: AssistantMessage = serde_json::from_value(json!({
            "uuid": "u1",
            "session_id": "s1",
            "message": {
                "role": "assistant",
                "content": [
                    {"type": "text", "text": "Hello, "},
                    {"type": "tool_use", "id": "t1", "name": "add", "input": {}},
                    {"type": "text", "text": "world"}
                ]
            },
            "parent_tool_use_id": null
        }))
        .unwrap();

        assert_eq!(message.text(), "Hello, world");
    }

    #[test]
    fn unknown_subtypes_decode_to_catch_all() {
        let system: SystemMessage =
            serde_json::from_value(json!({"subtype": "brand_new", "session_id": "s"})).unwrap();
        assert_eq!(system.subtype, SystemSubtype::Other);

        let control: ControlPayload =
            serde_json::from_value(json!({"action": "rewind"})).unwrap();
        assert_eq!(control.action, ControlAction::Unknown);
        assert!(!control.signals_ready());
    }

    #[test]
    fn system_init_exposes_init_data() {
        let system: SystemMessage = serde_json::from_value(json!({
            "subtype": "init",
            "session_id": "abc",
            "data": {"cwd": "/work", "tools": ["Read"], "model": "m"}
        }))
        .unwrap();

        let data = system.init_data().unwrap();
        assert_eq!(data.cwd.as_deref(), Some("/work"));
        assert_eq!(data.tools, vec!["Read".to_string()]);
    }

    #[test]
    fn result_message_becomes_session_result() {
        let message: ResultMessage = serde_json::from_value(json!({
            "subtype": "success",
            "session_id": "s1",
            "duration_ms": 1200,
            "duration_api_ms": 900,
            "is_error": false,
            "num_turns": 2,
            "result": "42",
            "total_cost_usd": 0.01,
            "usage": {"input_tokens": 10, "output_tokens": 5}
        }))
        .unwrap();

        let result = SessionResult::from(message);
        assert_eq!(result.subtype, ResultSubtype::Success);
        assert_eq!(result.result.as_deref(), Some("42"));
        assert_eq!(result.usage.output_tokens, 5);
        assert!(result.errors.is_empty());
    }
}
