//! Tagged envelopes exchanged over the session connection.

use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::options::InitPayload;
use crate::tools::ToolResult;
use crate::types::{
    AssistantMessage, ControlAction, ControlPayload, ErrorPayload, Message, MessageContent,
    PingPayload, PongPayload, ResultMessage, Role, StreamEventMessage, SystemMessage,
    ToolCallPayload, ToolResultPayload, UserMessage,
};

/// Envelopes the SDK sends to the service.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutgoingMessage {
    /// Session start-up declaration
    Init {
        /// Session configuration
        payload: InitPayload,
    },
    /// A user turn
    User(UserMessage),
    /// Session management
    Control {
        /// Action and data
        payload: ControlPayload,
    },
    /// Keep-alive
    Ping {
        /// Send time
        payload: PingPayload,
    },
    /// Outcome of a locally executed tool
    ToolResult {
        /// Call id and result
        payload: ToolResultPayload,
    },
}

impl OutgoingMessage {
    /// User turn with a fresh uuid.
    pub fn user(session_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self::User(UserMessage {
            uuid: uuid::Uuid::new_v4().to_string(),
            session_id: session_id.into(),
            message: Message {
                role: Role::User,
                content: MessageContent::Text(content.into()),
            },
            parent_tool_use_id: None,
        })
    }

    /// Control envelope without data.
    pub fn control(action: ControlAction) -> Self {
        Self::Control {
            payload: ControlPayload::new(action),
        }
    }

    /// Keep-alive stamped with the current time.
    pub fn ping() -> Self {
        Self::Ping {
            payload: PingPayload::now(),
        }
    }

    /// Tool result addressed to `call_id`.
    pub fn tool_result(call_id: impl Into<String>, result: ToolResult) -> Self {
        Self::ToolResult {
            payload: ToolResultPayload {
                call_id: call_id.into(),
                result,
            },
        }
    }

    /// Wire tag of this envelope.
    pub fn message_type(&self) -> &'static str {
        match self {
            Self::Init { .. } => "init",
            Self::User(_) => "user",
            Self::Control { .. } => "control",
            Self::Ping { .. } => "ping",
            Self::ToolResult { .. } => "tool_result",
        }
    }

    /// Encode as a JSON text frame.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Envelopes the service sends to the SDK.
#[derive(Debug, Clone, PartialEq)]
pub enum IncomingMessage {
    /// Assistant response
    Assistant(AssistantMessage),
    /// System notification
    System(SystemMessage),
    /// Final outcome of a prompt
    Result(ResultMessage),
    /// Partial assistant output
    StreamEvent(StreamEventMessage),
    /// Session management
    Control(ControlPayload),
    /// Remote failure
    Error(ErrorPayload),
    /// Keep-alive reply
    Pong(PongPayload),
    /// Request to run a local tool
    ToolCall(ToolCallPayload),
    /// Envelope with a tag this SDK does not recognise
    Unknown {
        /// Raw `type` tag, empty when missing
        message_type: String,
        /// The whole envelope object
        data: Map<String, Value>,
    },
}

#[derive(Deserialize)]
struct PayloadFrame<T> {
    payload: T,
}

impl IncomingMessage {
    /// Decode a JSON text frame.
    ///
    /// Fails only when the text is not a JSON object or a recognised envelope
    /// has a malformed body.
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        let data: Map<String, Value> = serde_json::from_str(text)?;
        Self::from_object(data)
    }

    /// Decode an already-parsed envelope object.
    pub fn from_object(data: Map<String, Value>) -> serde_json::Result<Self> {
        let message_type = data
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        let message = match message_type.as_str() {
            "assistant" => Self::Assistant(decode(data)?),
            "system" => Self::System(decode(data)?),
            "result" => Self::Result(decode(data)?),
            "stream_event" => Self::StreamEvent(decode(data)?),
            "control" => Self::Control(decode_payload(data)?),
            "error" => Self::Error(decode_payload(data)?),
            "pong" => Self::Pong(decode_payload(data)?),
            "tool_call" => Self::ToolCall(decode_payload(data)?),
            _ => Self::Unknown { message_type, data },
        };
        Ok(message)
    }

    /// Wire tag of this envelope.
    pub fn message_type(&self) -> &str {
        match self {
            Self::Assistant(_) => "assistant",
            Self::System(_) => "system",
            Self::Result(_) => "result",
            Self::StreamEvent(_) => "stream_event",
            Self::Control(_) => "control",
            Self::Error(_) => "error",
            Self::Pong(_) => "pong",
            Self::ToolCall(_) => "tool_call",
            Self::Unknown { message_type, .. } => message_type,
        }
    }

    /// Whether this is the final `result` of a prompt.
    pub fn is_result(&self) -> bool {
        matches!(self, Self::Result(_))
    }
}

fn decode<T: DeserializeOwned>(data: Map<String, Value>) -> serde_json::Result<T> {
    serde_json::from_value(Value::Object(data))
}

fn decode_payload<T: DeserializeOwned>(data: Map<String, Value>) -> serde_json::Result<T> {
    decode::<PayloadFrame<T>>(data).map(|frame| frame.payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::SessionOptions;
    use crate::types::{ResultSubtype, SystemSubtype};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn user_envelope_has_null_parent_and_placeholder_id() {
        let message = OutgoingMessage::user(crate::UNKNOWN_SESSION_ID, "hi");
        let value = serde_json::to_value(&message).unwrap();

        assert_eq!(value["type"], "user");
        assert_eq!(value["session_id"], "unknown");
        assert_eq!(value["message"], json!({"role": "user", "content": "hi"}));
        assert!(value.get("parent_tool_use_id").unwrap().is_null());
        assert_eq!(value["uuid"].as_str().unwrap().len(), 36);
    }

    #[test]
    fn control_and_ping_are_wrapped_in_payload() {
        let value = serde_json::to_value(OutgoingMessage::control(ControlAction::Close)).unwrap();
        assert_eq!(value, json!({"type": "control", "payload": {"action": "close"}}));

        let value = serde_json::to_value(OutgoingMessage::ping()).unwrap();
        assert_eq!(value["type"], "ping");
        assert!(value["payload"]["timestamp"].as_i64().unwrap() > 0);
    }

    #[test]
    fn tool_result_omits_is_error_on_success() {
        let message = OutgoingMessage::tool_result("call-1", ToolResult::text("3"));
        let value = serde_json::to_value(message).unwrap();

        assert_eq!(
            value,
            json!({
                "type": "tool_result",
                "payload": {
                    "callId": "call-1",
                    "result": {"content": [{"type": "text", "text": "3"}]}
                }
            })
        );
    }

    #[test]
    fn init_envelope_never_carries_session_id() {
        let options = SessionOptions {
            model: Some("claude-sonnet".to_string()),
            continue_session: true,
            ..SessionOptions::default()
        };
        let message = OutgoingMessage::Init {
            payload: InitPayload::from_options(&options),
        };
        let value = serde_json::to_value(message).unwrap();

        assert_eq!(value["type"], "init");
        assert_eq!(value["payload"]["model"], "claude-sonnet");
        assert_eq!(value["payload"]["continue"], true);
        assert!(value["payload"].get("sessionId").is_none());
    }

    #[test]
    fn decodes_known_envelopes() {
        let frame = json!({
            "type": "system",
            "subtype": "init",
            "uuid": "u",
            "session_id": "abc"
        })
        .to_string();
        match IncomingMessage::from_json(&frame).unwrap() {
            IncomingMessage::System(system) => {
                assert_eq!(system.subtype, SystemSubtype::Init);
                assert_eq!(system.session_id, "abc");
            }
            other => panic!("unexpected {other:?}"),
        }

        let frame = r#"{"type":"control","payload":{"action":"ready"}}"#;
        assert_eq!(
            IncomingMessage::from_json(frame).unwrap(),
            IncomingMessage::Control(ControlPayload::new(ControlAction::Ready))
        );

        let frame = r#"{"type":"result","subtype":"error_budget","is_error":true}"#;
        let message = IncomingMessage::from_json(frame).unwrap();
        assert!(message.is_result());
        match message {
            IncomingMessage::Result(result) => {
                assert_eq!(result.subtype, ResultSubtype::ErrorBudget);
                assert!(result.is_error);
            }
            other => panic!("unexpected {other:?}"),
        }

        let frame = r#"{"type":"error","payload":{"message":"denied","code":"RATE_LIMIT"}}"#;
        match IncomingMessage::from_json(frame).unwrap() {
            IncomingMessage::Error(error) => {
                assert_eq!(error.message, "denied");
                assert_eq!(error.code.as_deref(), Some("RATE_LIMIT"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn unknown_and_missing_tags_are_preserved() {
        let message = IncomingMessage::from_json(r#"{"type":"telemetry","n":1}"#).unwrap();
        assert_eq!(message.message_type(), "telemetry");
        match message {
            IncomingMessage::Unknown { data, .. } => assert_eq!(data["n"], 1),
            other => panic!("unexpected {other:?}"),
        }

        let message = IncomingMessage::from_json(r#"{"n":1}"#).unwrap();
        assert_eq!(message.message_type(), "");
    }

    #[test]
    fn malformed_frames_fail_to_decode() {
        assert!(IncomingMessage::from_json("not json").is_err());
        assert!(IncomingMessage::from_json("[1,2]").is_err());
        assert!(IncomingMessage::from_json(r#"{"type":"tool_call"}"#).is_err());
    }
}
