//! State owned by one streaming session.

use super::registry::ToolCallRegistry;
use crate::types::SessionSummary;

/// Everything one in-flight response needs to remember.
///
/// Each concurrent chat gets its own session; nothing here is shared.
#[derive(Debug, Default)]
pub struct StreamSession {
    text: String,
    position: usize,
    tokens: usize,
    streamed_deltas: bool,
    registry: ToolCallRegistry,
}

impl StreamSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a token delta and advance the position by its character count.
    pub fn push_token(&mut self, delta: &str) {
        self.text.push_str(delta);
        self.position += delta.chars().count();
        self.tokens += 1;
    }

    /// Append a streamed token delta. Once one has arrived, full `ai`
    /// message text in the same session is a duplicate.
    pub fn push_delta(&mut self, delta: &str) {
        self.streamed_deltas = true;
        self.push_token(delta);
    }

    /// Whether any token delta arrived in this session.
    pub fn streamed_deltas(&self) -> bool {
        self.streamed_deltas
    }

    /// Characters accumulated so far; used to anchor tool-call markers.
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn tokens(&self) -> usize {
        self.tokens
    }

    pub fn registry(&self) -> &ToolCallRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut ToolCallRegistry {
        &mut self.registry
    }

    /// Close the session and reset it so the next stream starts empty.
    pub fn end(&mut self, completed: bool) -> SessionSummary {
        let summary = SessionSummary {
            text: std::mem::take(&mut self.text),
            tool_call_ids: self.registry.ids().to_vec(),
            tokens: self.tokens,
            completed,
        };
        self.position = 0;
        self.tokens = 0;
        self.streamed_deltas = false;
        self.registry.reset();
        summary
    }
}
