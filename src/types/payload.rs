//! Side-panel payload shapes.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Normalized tool output ready for the side panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NormalizedPayload {
    /// The tool failed, or its output could not be interpreted.
    Error { message: String },
    /// Structured data (tables, chart series, objects).
    Structured { data: serde_json::Value },
    /// Plain text that is not JSON.
    Text { text: String },
}

/// Discriminant of a [`NormalizedPayload`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum PayloadKind {
    Error,
    Structured,
    Text,
}

impl NormalizedPayload {
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    pub fn kind(&self) -> PayloadKind {
        match self {
            Self::Error { .. } => PayloadKind::Error,
            Self::Structured { .. } => PayloadKind::Structured,
            Self::Text { .. } => PayloadKind::Text,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }
}
