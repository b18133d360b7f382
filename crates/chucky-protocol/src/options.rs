//! Per-session options and the `init` payload built from them.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::mcp::McpServerDefinition;

/// System prompt: literal text or a named preset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SystemPrompt {
    /// Literal prompt text
    Text(String),
    /// Service-side preset, optionally extended
    Preset {
        /// Always `preset`
        #[serde(rename = "type")]
        kind: String,
        /// Preset name
        preset: String,
        /// Text appended to the preset
        #[serde(default, skip_serializing_if = "Option::is_none")]
        append: Option<String>,
    },
}

impl SystemPrompt {
    /// Named preset without additions.
    pub fn preset(name: impl Into<String>) -> Self {
        Self::Preset {
            kind: "preset".to_string(),
            preset: name.into(),
            append: None,
        }
    }
}

impl From<&str> for SystemPrompt {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

/// How the remote agent asks for permission before using tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PermissionMode {
    /// Service default
    Default,
    /// Plan only, no side effects
    Plan,
    /// Accept file edits automatically
    AcceptEdits,
    /// Skip all permission prompts
    BypassPermissions,
}

/// Structured output requested from the agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputFormat {
    /// Format kind, e.g. `json_schema`
    #[serde(rename = "type")]
    pub format_type: String,
    /// Schema the output must satisfy
    pub schema: Value,
}

impl OutputFormat {
    /// JSON output constrained by `schema`.
    pub fn json_schema(schema: Value) -> Self {
        Self {
            format_type: "json_schema".to_string(),
            schema,
        }
    }
}

/// Options for a single session.
#[derive(Debug, Clone, Default)]
pub struct SessionOptions {
    /// Model to use
    pub model: Option<String>,
    /// Model used when the primary one is unavailable
    pub fallback_model: Option<String>,
    /// System prompt
    pub system_prompt: Option<SystemPrompt>,
    /// Maximum agent turns
    pub max_turns: Option<u32>,
    /// Spending limit in USD
    pub max_budget_usd: Option<f64>,
    /// Extended thinking budget
    pub max_thinking_tokens: Option<u32>,
    /// Built-in tool selection, passed through untouched
    pub tools: Option<Value>,
    /// Attached MCP servers; client-tools servers also feed the local tool registry
    pub mcp_servers: Vec<McpServerDefinition>,
    /// Permission mode
    pub permission_mode: Option<PermissionMode>,
    /// Structured output
    pub output_format: Option<OutputFormat>,
    /// Stream partial assistant output as `stream_event` envelopes
    pub include_partial_messages: bool,
    /// Environment overrides for the remote agent
    pub env: HashMap<String, String>,
    /// Fork instead of continuing when resuming
    pub fork_session: bool,
    /// Resume at a specific message
    pub resume_session_at: Option<String>,
    /// Continue the previous conversation
    pub continue_session: bool,
}

impl SessionOptions {
    /// Set the model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Set the system prompt.
    pub fn with_system_prompt(mut self, prompt: impl Into<SystemPrompt>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    /// Limit agent turns.
    pub fn with_max_turns(mut self, max_turns: u32) -> Self {
        self.max_turns = Some(max_turns);
        self
    }

    /// Attach an MCP server.
    pub fn with_mcp_server(mut self, server: impl Into<McpServerDefinition>) -> Self {
        self.mcp_servers.push(server.into());
        self
    }
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// Body of the `init` envelope.
///
/// Never carries a session id; identities are assigned by the service.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InitPayload {
    /// Model
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Fallback model
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_model: Option<String>,
    /// System prompt
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<SystemPrompt>,
    /// Maximum agent turns
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_turns: Option<u32>,
    /// Spending limit
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_budget_usd: Option<f64>,
    /// Thinking budget
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_thinking_tokens: Option<u32>,
    /// Built-in tool selection
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Value>,
    /// Wire forms of the attached MCP servers
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mcp_servers: Option<Vec<Value>>,
    /// Permission mode
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permission_mode: Option<PermissionMode>,
    /// Structured output
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_format: Option<OutputFormat>,
    /// Partial output streaming
    #[serde(skip_serializing_if = "is_false")]
    pub include_partial_messages: bool,
    /// Environment overrides
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub env: HashMap<String, String>,
    /// Fork on resume
    #[serde(skip_serializing_if = "is_false")]
    pub fork_session: bool,
    /// Resume point
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resume_session_at: Option<String>,
    /// Continue the previous conversation
    #[serde(rename = "continue", skip_serializing_if = "is_false")]
    pub continue_session: bool,
}

impl InitPayload {
    /// Build the payload for `options`.
    pub fn from_options(options: &SessionOptions) -> Self {
        let mcp_servers = (!options.mcp_servers.is_empty()).then(|| {
            options
                .mcp_servers
                .iter()
                .map(McpServerDefinition::to_wire)
                .collect()
        });

        Self {
            model: options.model.clone(),
            fallback_model: options.fallback_model.clone(),
            system_prompt: options.system_prompt.clone(),
            max_turns: options.max_turns,
            max_budget_usd: options.max_budget_usd,
            max_thinking_tokens: options.max_thinking_tokens,
            tools: options.tools.clone(),
            mcp_servers,
            permission_mode: options.permission_mode,
            output_format: options.output_format.clone(),
            include_partial_messages: options.include_partial_messages,
            env: options.env.clone(),
            fork_session: options.fork_session,
            resume_session_at: options.resume_session_at.clone(),
            continue_session: options.continue_session,
        }
    }
}
