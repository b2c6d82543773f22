//! Convenience re-exports for common use.

pub use crate::client::ChatClient;
pub use crate::config::FinchatConfig;
pub use crate::error::{FinchatError, Result};
pub use crate::normalize::PayloadNormalizer;
pub use crate::stream::{FnCallbacks, StreamCallbacks, StreamDriver, StreamSession, Transcript};
pub use crate::types::{
    ChatRequest, ChatTurn, NormalizedPayload, SessionSummary, StreamEvent, ToolCall, ToolResult,
};
