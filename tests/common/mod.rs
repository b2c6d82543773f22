//! Shared test helpers: SSE body builders and an ordered callback log.

#![allow(dead_code)]

use finchat::stream::StreamCallbacks;
use finchat::types::{ToolCall, ToolResult};
use serde_json::{json, Value};

/// One callback invocation, in the order it happened.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Token(String),
    ToolCall(ToolCall),
    ToolResult(ToolResult),
}

/// Records every callback in order.
#[derive(Debug, Default)]
pub struct CallLog {
    pub calls: Vec<Call>,
}

impl CallLog {
    pub fn tokens(&self) -> Vec<&str> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                Call::Token(t) => Some(t.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn tool_calls(&self) -> Vec<&ToolCall> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                Call::ToolCall(tc) => Some(tc),
                _ => None,
            })
            .collect()
    }

    pub fn tool_results(&self) -> Vec<&ToolResult> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                Call::ToolResult(tr) => Some(tr),
                _ => None,
            })
            .collect()
    }
}

impl StreamCallbacks for CallLog {
    fn on_token(&mut self, delta: &str) {
        self.calls.push(Call::Token(delta.to_string()));
    }

    fn on_tool_call(&mut self, call: ToolCall) {
        self.calls.push(Call::ToolCall(call));
    }

    fn on_tool_result(&mut self, result: ToolResult) {
        self.calls.push(Call::ToolResult(result));
    }
}

pub fn data(payload: Value) -> String {
    format!("data: {payload}")
}

pub fn token(text: &str) -> String {
    data(json!({"type": "token", "content": text}))
}

pub fn tool_calls(calls: Value) -> String {
    data(json!({
        "type": "message",
        "content": {"type": "ai", "content": "", "tool_calls": calls},
    }))
}

/// A full `ai` message, optionally carrying tool calls next to its text.
pub fn ai_message(text: &str, calls: Value) -> String {
    data(json!({
        "type": "message",
        "content": {"type": "ai", "content": text, "tool_calls": calls},
    }))
}

pub fn tool_result(tool_call_id: &str, content: Value) -> String {
    data(json!({
        "type": "message",
        "content": {"type": "tool", "tool_call_id": tool_call_id, "content": content},
    }))
}

pub fn done() -> String {
    "data: [DONE]".to_string()
}

/// Join records into a newline-delimited body.
pub fn body(records: &[String]) -> String {
    let mut out = String::new();
    for record in records {
        out.push_str(record);
        out.push('\n');
    }
    out
}
