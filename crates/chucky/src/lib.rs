//! # Chucky - Rust SDK for the Chucky assistant service
//!
//! Talk to a hosted AI assistant over one persistent WebSocket per session,
//! and let the assistant call tools that run inside your process.
//!
//! ## Features
//!
//! - **Sessions** - Handshake, ordered message stream, idempotent close
//! - **Client-side tools** - Closures or [`ToolHandler`] types answering `tool_call` requests, bounded by a timeout
//! - **MCP servers** - Declare stdio, SSE and HTTP servers alongside in-process tool sets
//! - **One-shot prompts** - [`Client::prompt`] opens, prompts and closes in one call
//! - **Configuration** - Builders, or files and `CHUCKY_*` environment variables
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use chucky::prelude::*;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let weather = ToolDefinition::new("get_weather", "Current weather for a city")
//!     .with_input_schema(serde_json::json!({
//!         "type": "object",
//!         "properties": {"city": {"type": "string"}},
//!         "required": ["city"]
//!     }))
//!     .with_handler(|input: ToolInput| async move {
//!         let city = input.get("city").and_then(|v| v.as_str()).unwrap_or("nowhere");
//!         Ok::<_, ToolError>(ToolResult::text(format!("Sunny in {city}")))
//!     });
//!
//! let options = SessionOptions::default()
//!     .with_model("claude-sonnet-4-5")
//!     .with_mcp_server(McpClientToolsServer::new("weather", "1.0.0").with_tool(weather));
//!
//! let client = Client::new(ClientOptions::from_env()?);
//! let result = client
//!     .prompt("Is it sunny in Lisbon?", options, &CancellationToken::new())
//!     .await?;
//! println!("{}", result.result.unwrap_or_default());
//! # Ok(())
//! # }
//! ```
//!
//! ## Crates
//!
//! - [`protocol`] - Envelopes, payloads, options, tool declarations and errors
//! - [`transport`] - The [`Transport`](transport::Transport) trait and its WebSocket implementation
//! - [`client`] - Sessions, the client registry and configuration loading

#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub,
    clippy::all
)]
#![deny(unsafe_code)]

pub use chucky_client as client;
pub use chucky_protocol as protocol;
pub use chucky_transport as transport;

pub use chucky_client::{
    Client, ClientEventHandler, ClientOptions, ConfigError, Session, SessionEventHandler,
    SessionState,
};
pub use chucky_protocol::{
    Error, IncomingMessage, McpClientToolsServer, McpServerDefinition, OutgoingMessage, Result,
    SessionOptions, SessionResult, ToolDefinition, ToolError, ToolHandler, ToolInput, ToolResult,
};
pub use tokio_util::sync::CancellationToken;

/// Everything needed for typical use.
pub mod prelude {
    pub use super::{
        CancellationToken, Client, ClientEventHandler, ClientOptions, Error, IncomingMessage,
        McpClientToolsServer, McpServerDefinition, Result, Session, SessionEventHandler,
        SessionOptions, SessionResult, SessionState, ToolDefinition, ToolError, ToolHandler,
        ToolInput, ToolResult,
    };

    pub use chucky_protocol::{
        AssistantMessage, ContentBlock, OutputFormat, PermissionMode, ResultMessage,
        ResultSubtype, SystemMessage, SystemPrompt, ToolContent,
    };
}
