//! MCP server descriptors declared in the session `init` payload.

use std::collections::HashMap;

use serde_json::{Value, json};

use crate::tools::ToolDefinition;

/// A named bundle of tools implemented by the SDK caller.
#[derive(Debug, Clone)]
pub struct McpClientToolsServer {
    /// Server name
    pub name: String,
    /// Server version
    pub version: String,
    /// Declared tools; those with handlers run locally
    pub tools: Vec<ToolDefinition>,
}

impl McpClientToolsServer {
    /// Empty server.
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            tools: Vec::new(),
        }
    }

    /// Add a tool.
    pub fn with_tool(mut self, tool: ToolDefinition) -> Self {
        self.tools.push(tool);
        self
    }
}

/// MCP server attached to a session.
#[derive(Debug, Clone)]
pub enum McpServerDefinition {
    /// Tools implemented in this process
    ClientTools(McpClientToolsServer),
    /// Server spawned by the service over stdio
    Stdio {
        /// Server name
        name: String,
        /// Executable
        command: String,
        /// Arguments
        args: Vec<String>,
        /// Extra environment
        env: HashMap<String, String>,
    },
    /// Remote server reached over server-sent events
    Sse {
        /// Server name
        name: String,
        /// Endpoint
        url: String,
        /// Extra request headers
        headers: HashMap<String, String>,
    },
    /// Remote server reached over streamable HTTP
    Http {
        /// Server name
        name: String,
        /// Endpoint
        url: String,
        /// Extra request headers
        headers: HashMap<String, String>,
    },
}

impl McpServerDefinition {
    /// Server name.
    pub fn name(&self) -> &str {
        match self {
            Self::ClientTools(server) => &server.name,
            Self::Stdio { name, .. } | Self::Sse { name, .. } | Self::Http { name, .. } => name,
        }
    }

    /// Tools declared by a client-tools server; empty for other kinds.
    pub fn client_tools(&self) -> &[ToolDefinition] {
        match self {
            Self::ClientTools(server) => &server.tools,
            _ => &[],
        }
    }

    /// Form used in the `mcpServers` list of the init payload.
    pub fn to_wire(&self) -> Value {
        match self {
            Self::ClientTools(server) => json!({
                "name": server.name,
                "version": server.version,
                "tools": server.tools.iter().map(ToolDefinition::to_wire).collect::<Vec<_>>(),
            }),
            Self::Stdio {
                name,
                command,
                args,
                env,
            } => json!({
                "name": name,
                "type": "stdio",
                "command": command,
                "args": args,
                "env": env,
            }),
            Self::Sse { name, url, headers } => json!({
                "name": name,
                "type": "sse",
                "url": url,
                "headers": headers,
            }),
            Self::Http { name, url, headers } => json!({
                "name": name,
                "type": "http",
                "url": url,
                "headers": headers,
            }),
        }
    }
}

impl From<McpClientToolsServer> for McpServerDefinition {
    fn from(server: McpClientToolsServer) -> Self {
        Self::ClientTools(server)
    }
}
