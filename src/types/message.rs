//! Request and conversation message types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::stream::{SessionSummary, ToolCall};

/// Text shown in place of an assistant reply when the stream fails.
pub const FALLBACK_ERROR_TEXT: &str = "Sorry, something went wrong. Please try again.";

/// Body of the POST to the chat-streaming endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    pub thread_id: Option<String>,
    pub stream_tokens: bool,
}

impl ChatRequest {
    /// Start a new thread with token streaming enabled.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            thread_id: None,
            stream_tokens: true,
        }
    }

    /// Continue an existing thread.
    pub fn in_thread(mut self, thread_id: impl Into<String>) -> Self {
        self.thread_id = Some(thread_id.into());
        self
    }

    pub fn with_stream_tokens(mut self, stream_tokens: bool) -> Self {
        self.stream_tokens = stream_tokens;
        self
    }
}

/// Assistant turn as it should be appended to the conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub id: Uuid,
    pub text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
    pub is_error: bool,
    pub created_at: DateTime<Utc>,
}

impl ChatTurn {
    /// Build a completed assistant turn.
    pub fn assistant(text: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
            tool_calls,
            is_error: false,
            created_at: Utc::now(),
        }
    }

    /// The single synthetic message surfaced after a transport failure.
    pub fn fallback_error() -> Self {
        Self {
            id: Uuid::new_v4(),
            text: FALLBACK_ERROR_TEXT.to_string(),
            tool_calls: Vec::new(),
            is_error: true,
            created_at: Utc::now(),
        }
    }

    /// Turn the outcome of a streaming session into the message to display.
    ///
    /// Tool calls observed by the caller are passed in separately because
    /// the session itself only keeps their ids.
    pub fn from_result<E>(result: Result<SessionSummary, E>, tool_calls: Vec<ToolCall>) -> Self
    where
        E: std::fmt::Display,
    {
        match result {
            Ok(summary) => Self::assistant(summary.text, tool_calls),
            Err(e) => {
                tracing::warn!(error = %e, "chat stream failed");
                Self::fallback_error()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_serializes_null_thread() {
        let body = serde_json::to_value(ChatRequest::new("What was Q3 revenue?")).unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "message": "What was Q3 revenue?",
                "thread_id": null,
                "stream_tokens": true,
            })
        );
    }

    #[test]
    fn failed_result_becomes_fallback() {
        let turn = ChatTurn::from_result::<&str>(Err("connection reset"), Vec::new());
        assert!(turn.is_error);
        assert_eq!(turn.text, FALLBACK_ERROR_TEXT);
    }

    #[test]
    fn successful_result_keeps_text() {
        let summary = SessionSummary {
            text: "Hello".into(),
            completed: true,
            ..Default::default()
        };
        let turn = ChatTurn::from_result::<&str>(Ok(summary), Vec::new());
        assert!(!turn.is_error);
        assert_eq!(turn.text, "Hello");
    }
}
