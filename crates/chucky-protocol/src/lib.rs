//! # Chucky Protocol
//!
//! Wire data model for the Chucky assistant service. Every frame exchanged over
//! the session WebSocket is a JSON object tagged by a `type` field; this crate
//! defines those envelopes together with the declarations a session sends at
//! start-up (tools, MCP servers, session options) and the unified [`Error`] type
//! shared by the transport and client crates.
//!
//! ## Envelopes
//!
//! | direction | `type` values |
//! |-----------|---------------|
//! | outgoing  | `init`, `user`, `control`, `ping`, `tool_result` |
//! | incoming  | `assistant`, `system`, `result`, `stream_event`, `control`, `error`, `pong`, `tool_call` |
//!
//! Incoming frames with a tag this crate does not know decode into
//! [`IncomingMessage::Unknown`] instead of failing.
//!
//! ```rust
//! use chucky_protocol::IncomingMessage;
//!
//! let frame = r#"{"type":"tool_call","payload":{"callId":"c1","toolName":"add","input":{"a":1}}}"#;
//! match IncomingMessage::from_json(frame).unwrap() {
//!     IncomingMessage::ToolCall(call) => assert_eq!(call.tool_name, "add"),
//!     other => panic!("unexpected {other:?}"),
//! }
//! ```

#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub,
    clippy::all
)]
#![deny(unsafe_code)]

pub mod envelope;
pub mod error;
pub mod mcp;
pub mod options;
pub mod tools;
pub mod types;

pub use envelope::{IncomingMessage, OutgoingMessage};
pub use error::{Error, ErrorCode, Result};
pub use mcp::{McpClientToolsServer, McpServerDefinition};
pub use options::{InitPayload, OutputFormat, PermissionMode, SessionOptions, SystemPrompt};
pub use tools::{ToolContent, ToolDefinition, ToolError, ToolHandler, ToolInput, ToolResult};
pub use types::{
    AssistantMessage, ContentBlock, ControlAction, ControlPayload, ErrorPayload, Message,
    MessageContent, PingPayload, PongPayload, ResultMessage, ResultSubtype, Role, SessionResult,
    StreamEventMessage, SystemInitData, SystemMessage, SystemSubtype, ToolCallPayload, ToolResultPayload,
    UserMessage, Usage,
};

/// Placeholder session identity used on outbound user messages before the
/// remote side has assigned one.
pub const UNKNOWN_SESSION_ID: &str = "unknown";
