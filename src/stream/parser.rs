//! Converts one logical record into a typed [`StreamEvent`].

use serde::Deserialize;
use serde_json::Value;

use crate::types::{StreamEvent, ToolCallRequest};

/// Prefix of an SSE data line.
pub const DATA_MARKER: &str = "data:";
/// Literal payload that ends the stream.
pub const DONE_TOKEN: &str = "[DONE]";

/// Parse a single record.
///
/// Returns `None` for records that carry no event at all (SSE comments and
/// non-data fields, or messages with nothing to show). Never panics: a
/// payload that is not valid JSON becomes [`StreamEvent::Unparseable`].
pub fn parse(chunk: &str) -> Option<StreamEvent> {
    let line = chunk.trim();
    if line.is_empty() || line.starts_with(':') {
        return None;
    }

    let payload = match line.strip_prefix(DATA_MARKER) {
        Some(rest) => rest.strip_prefix(' ').unwrap_or(rest).trim(),
        None if is_sse_field(line) => return None,
        None => line,
    };

    if payload == DONE_TOKEN {
        return Some(StreamEvent::StreamDone);
    }

    match serde_json::from_str::<WireEvent>(payload) {
        Ok(event) => event.into_stream_event(),
        Err(e) => {
            tracing::debug!(error = %e, "skipping unparseable stream chunk");
            Some(StreamEvent::Unparseable)
        }
    }
}

fn is_sse_field(line: &str) -> bool {
    ["event:", "id:", "retry:"]
        .iter()
        .any(|field| line.starts_with(field))
}

// Backend record shapes (internal)

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum WireEvent {
    Token {
        #[serde(default)]
        content: Option<Value>,
    },
    Message {
        content: WireMessage,
    },
    Done,
    Error {
        #[serde(default)]
        content: Option<Value>,
        #[serde(default)]
        message: Option<String>,
    },
}

#[derive(Deserialize)]
struct WireMessage {
    #[serde(rename = "type")]
    kind: WireMessageKind,
    #[serde(default)]
    content: Option<Value>,
    #[serde(default)]
    tool_calls: Vec<WireToolCall>,
    #[serde(default)]
    tool_call_id: Option<String>,
    #[serde(default)]
    position: Option<usize>,
}

#[derive(Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
enum WireMessageKind {
    Ai,
    Tool,
    #[serde(other)]
    Other,
}

#[derive(Deserialize)]
struct WireToolCall {
    id: String,
    name: String,
    #[serde(default, alias = "arguments")]
    args: Value,
    #[serde(default)]
    position: Option<usize>,
}

impl WireEvent {
    fn into_stream_event(self) -> Option<StreamEvent> {
        match self {
            Self::Token { content } => Some(StreamEvent::Token {
                text: content.map(value_to_text).unwrap_or_default(),
            }),
            Self::Done => Some(StreamEvent::StreamDone),
            Self::Error { content, message } => Some(StreamEvent::ServerError {
                message: message
                    .or_else(|| content.map(value_to_text))
                    .unwrap_or_else(|| "stream reported an error".to_string()),
            }),
            Self::Message { content } => content.into_stream_event(),
        }
    }
}

impl WireMessage {
    fn into_stream_event(self) -> Option<StreamEvent> {
        match self.kind {
            WireMessageKind::Tool => {
                let Some(tool_call_id) = self.tool_call_id else {
                    tracing::debug!("tool message without tool_call_id");
                    return Some(StreamEvent::Unparseable);
                };
                Some(StreamEvent::ToolCallResult {
                    tool_call_id,
                    payload: self.content.unwrap_or(Value::Null),
                })
            }
            WireMessageKind::Ai if !self.tool_calls.is_empty() => {
                let message_position = self.position;
                let preamble = self
                    .content
                    .map(value_to_text)
                    .filter(|text| !text.is_empty());
                let calls = self
                    .tool_calls
                    .into_iter()
                    .map(|tc| ToolCallRequest {
                        id: tc.id,
                        name: tc.name,
                        arguments: decode_arguments(tc.args),
                        position: tc.position.or(message_position),
                    })
                    .collect();
                Some(StreamEvent::ToolCallRequested { preamble, calls })
            }
            WireMessageKind::Ai => {
                let text = self.content.map(value_to_text).unwrap_or_default();
                if text.is_empty() {
                    None
                } else {
                    Some(StreamEvent::AssistantText { text })
                }
            }
            WireMessageKind::Other => None,
        }
    }
}

/// Arguments may arrive JSON-encoded inside a string.
fn decode_arguments(args: Value) -> Value {
    match args {
        Value::Null => Value::Object(Default::default()),
        Value::String(raw) => serde_json::from_str(&raw).unwrap_or(Value::String(raw)),
        other => other,
    }
}

fn value_to_text(value: Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s,
        other => other.to_string(),
    }
}
