//! Per-session record of tool calls already announced.

use std::collections::HashSet;

/// Append-only set of tool call ids, remembering registration order.
#[derive(Debug, Clone, Default)]
pub struct ToolCallRegistry {
    seen: HashSet<String>,
    order: Vec<String>,
}

impl ToolCallRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_seen(&self, id: &str) -> bool {
        self.seen.contains(id)
    }

    /// Record an id. Returns `false` if it was already registered.
    pub fn register(&mut self, id: &str) -> bool {
        if !self.seen.insert(id.to_string()) {
            return false;
        }
        self.order.push(id.to_string());
        true
    }

    pub fn reset(&mut self) {
        self.seen.clear();
        self.order.clear();
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Ids in the order they were registered.
    pub fn ids(&self) -> &[String] {
        &self.order
    }
}
