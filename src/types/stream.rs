//! Streaming event types.

use serde::{Deserialize, Serialize};

use super::payload::NormalizedPayload;

/// One typed event decoded from a single logical chunk of the response body.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// Incremental text belonging to the current assistant message.
    Token { text: String },
    /// The model decided to invoke one or more tools.
    ///
    /// Calls arriving in the same chunk stay grouped so that one chunk still
    /// produces one event; they are dispatched in array order. Text the
    /// message carried alongside the calls comes first, so the calls anchor
    /// after it.
    ToolCallRequested {
        preamble: Option<String>,
        calls: Vec<ToolCallRequest>,
    },
    /// Result of an earlier tool call. The payload is either a JSON string or
    /// an already structured value.
    ToolCallResult {
        tool_call_id: String,
        payload: serde_json::Value,
    },
    /// Full assistant text carried by a message without tool calls.
    AssistantText { text: String },
    /// The backend reported a failure in-band.
    ServerError { message: String },
    /// Explicit end of stream.
    StreamDone,
    /// A chunk that could not be decoded. Always a no-op.
    Unparseable,
}

impl StreamEvent {
    /// Shorthand for a token event.
    pub fn token(text: impl Into<String>) -> Self {
        Self::Token { text: text.into() }
    }

    /// Shorthand for a single tool call without an explicit position.
    pub fn tool_call(
        id: impl Into<String>,
        name: impl Into<String>,
        arguments: serde_json::Value,
    ) -> Self {
        Self::ToolCallRequested {
            preamble: None,
            calls: vec![ToolCallRequest {
                id: id.into(),
                name: name.into(),
                arguments,
                position: None,
            }],
        }
    }

    /// Shorthand for a tool result.
    pub fn tool_result(tool_call_id: impl Into<String>, payload: serde_json::Value) -> Self {
        Self::ToolCallResult {
            tool_call_id: tool_call_id.into(),
            payload,
        }
    }
}

/// A tool invocation as announced by the stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallRequest {
    pub id: String,
    pub name: String,
    pub arguments: serde_json::Value,
    /// Offset supplied by the backend. When absent the dispatcher stamps the
    /// session's current position.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<usize>,
}

/// A registered tool call handed to [`StreamCallbacks::on_tool_call`](crate::stream::StreamCallbacks::on_tool_call).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub arguments: serde_json::Value,
    /// Character offset in the assistant message where the call was made.
    pub position: usize,
}

/// A tool result handed to [`StreamCallbacks::on_tool_result`](crate::stream::StreamCallbacks::on_tool_result).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    pub tool_call_id: String,
    pub payload: NormalizedPayload,
    /// True when no matching request was registered in this session.
    #[serde(default)]
    pub orphaned: bool,
}

/// What a session produced, returned when it ends.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    /// Full accumulated assistant text.
    pub text: String,
    /// Tool call ids in registration order.
    pub tool_call_ids: Vec<String>,
    /// Number of token deltas received.
    pub tokens: usize,
    /// False when the session ended without a `StreamDone` (transport
    /// closed early or the caller cancelled).
    pub completed: bool,
}
