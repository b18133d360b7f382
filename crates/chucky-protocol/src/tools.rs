//! Tool declarations and the handler capability for client-side tools.
//!
//! A [`ToolDefinition`] with a handler is executed inside the SDK process when
//! the service sends a `tool_call`; one without a handler is only advertised.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use thiserror::Error;

/// Name-to-value mapping passed to tool handlers.
pub type ToolInput = HashMap<String, Value>;

/// Errors returned by tool handlers.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ToolError {
    /// The tool ran and failed.
    #[error("{0}")]
    Failed(String),

    /// The input did not match what the tool expects.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl ToolError {
    /// Generic failure with a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}

impl From<serde_json::Error> for ToolError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidInput(err.to_string())
    }
}

/// Handler for a client-side tool.
///
/// Any `Fn(ToolInput) -> impl Future<Output = Result<ToolResult, ToolError>>`
/// closure implements this trait.
///
/// ```rust
/// use chucky_protocol::{ToolDefinition, ToolError, ToolInput, ToolResult};
///
/// let add = ToolDefinition::new("add", "Add two numbers").with_handler(
///     |input: ToolInput| async move {
///         let a = input.get("a").and_then(|v| v.as_f64()).unwrap_or(0.0);
///         let b = input.get("b").and_then(|v| v.as_f64()).unwrap_or(0.0);
///         Ok::<_, ToolError>(ToolResult::text((a + b).to_string()))
///     },
/// );
/// assert!(add.is_client_side());
/// ```
#[async_trait]
pub trait ToolHandler: Send + Sync {
    /// Run the tool.
    async fn call(&self, input: ToolInput) -> Result<ToolResult, ToolError>;
}

#[async_trait]
impl<F, Fut> ToolHandler for F
where
    F: Fn(ToolInput) -> Fut + Send + Sync,
    Fut: Future<Output = Result<ToolResult, ToolError>> + Send + 'static,
{
    async fn call(&self, input: ToolInput) -> Result<ToolResult, ToolError> {
        (self)(input).await
    }
}

/// Decode handler input into a typed struct.
pub fn decode_input<T: DeserializeOwned>(input: ToolInput) -> Result<T, ToolError> {
    let object = input.into_iter().collect::<serde_json::Map<_, _>>();
    Ok(serde_json::from_value(Value::Object(object))?)
}

/// Convert the untyped input of a `tool_call` into a [`ToolInput`].
///
/// Objects are used directly. A string holding an encoded JSON object is
/// decoded; any other value yields an empty mapping.
pub fn input_to_map(input: &Value) -> ToolInput {
    match input {
        Value::Object(map) => map.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
        Value::String(encoded) => serde_json::from_str(encoded).unwrap_or_default(),
        _ => ToolInput::new(),
    }
}

/// One item of tool output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ToolContent {
    /// Plain text
    Text {
        /// Text body
        text: String,
    },
    /// Base64-encoded image
    Image {
        /// Base64 image bytes
        data: String,
        /// Image media type
        #[serde(rename = "mimeType")]
        mime_type: String,
    },
    /// Embedded resource
    Resource {
        /// Resource location
        uri: String,
        /// Resource media type
        #[serde(rename = "mimeType", default, skip_serializing_if = "Option::is_none")]
        mime_type: Option<String>,
        /// Textual resource body
        #[serde(default, skip_serializing_if = "Option::is_none")]
        text: Option<String>,
        /// Base64 binary resource body
        #[serde(default, skip_serializing_if = "Option::is_none")]
        blob: Option<String>,
    },
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// Output of a tool call.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ToolResult {
    /// Output items
    pub content: Vec<ToolContent>,
    /// Marks the result as a failure; omitted from the wire when false
    #[serde(rename = "isError", default, skip_serializing_if = "is_false")]
    pub is_error: bool,
}

impl ToolResult {
    /// Successful result with arbitrary content.
    pub fn new(content: Vec<ToolContent>) -> Self {
        Self {
            content,
            is_error: false,
        }
    }

    /// Successful single-text result.
    pub fn text(text: impl Into<String>) -> Self {
        Self::new(vec![ToolContent::Text { text: text.into() }])
    }

    /// Failed single-text result.
    pub fn error(text: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent::Text { text: text.into() }],
            is_error: true,
        }
    }

    /// Concatenated text items.
    pub fn text_content(&self) -> String {
        self.content
            .iter()
            .filter_map(|item| match item {
                ToolContent::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// A tool advertised to the service.
#[derive(Clone)]
pub struct ToolDefinition {
    /// Unique, case-sensitive name
    pub name: String,
    /// Description shown to the model
    pub description: String,
    /// JSON schema of the input object
    pub input_schema: Value,
    /// Local executor; `None` for tools that run elsewhere
    pub handler: Option<Arc<dyn ToolHandler>>,
}

impl ToolDefinition {
    /// Tool without a handler and with an empty object schema.
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema: json!({"type": "object", "properties": {}}),
            handler: None,
        }
    }

    /// Set the input schema.
    pub fn with_input_schema(mut self, schema: Value) -> Self {
        self.input_schema = schema;
        self
    }

    /// Attach a local handler.
    pub fn with_handler<H: ToolHandler + 'static>(mut self, handler: H) -> Self {
        self.handler = Some(Arc::new(handler));
        self
    }

    /// Whether the tool executes inside this process.
    pub fn is_client_side(&self) -> bool {
        self.handler.is_some()
    }

    /// Wire form used inside MCP server descriptors.
    pub fn to_wire(&self) -> Value {
        let mut tool = json!({
            "name": self.name,
            "description": self.description,
            "inputSchema": self.input_schema,
        });
        if self.is_client_side() {
            tool["executeIn"] = Value::String("client".to_string());
        }
        tool
    }
}

impl fmt::Debug for ToolDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolDefinition")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("input_schema", &self.input_schema)
            .field("has_handler", &self.handler.is_some())
            .finish()
    }
}
