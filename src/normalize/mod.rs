//! Best-effort interpretation of tool output for the side panel.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::types::NormalizedPayload;

const DEFAULT_MAX_PAYLOAD_BYTES: usize = 4 * 1024 * 1024;

/// Tuning for [`PayloadNormalizer`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizerConfig {
    /// Prefixes that mark a string payload as a tool failure.
    pub error_markers: Vec<String>,
    /// Largest string payload that is interpreted.
    pub max_payload_bytes: usize,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            error_markers: vec!["Error:".to_string()],
            max_payload_bytes: DEFAULT_MAX_PAYLOAD_BYTES,
        }
    }
}

/// Why a payload could not be interpreted.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NormalizeError {
    #[error("tool payload is {size} bytes, limit is {limit}")]
    TooLarge { size: usize, limit: usize },
}

/// Turns raw tool output into a [`NormalizedPayload`].
#[derive(Debug, Clone, Default)]
pub struct PayloadNormalizer {
    config: NormalizerConfig,
}

impl PayloadNormalizer {
    pub fn new(config: NormalizerConfig) -> Self {
        Self { config }
    }

    /// Interpret `raw`, failing only when it cannot be looked at at all.
    pub fn try_normalize(&self, raw: &Value) -> Result<NormalizedPayload, NormalizeError> {
        let text = match raw {
            Value::String(text) => text,
            other => {
                return Ok(NormalizedPayload::Structured {
                    data: other.clone(),
                })
            }
        };

        if text.len() > self.config.max_payload_bytes {
            return Err(NormalizeError::TooLarge {
                size: text.len(),
                limit: self.config.max_payload_bytes,
            });
        }

        if self.is_error_text(text) {
            return Ok(NormalizedPayload::Error {
                message: text.clone(),
            });
        }

        Ok(match serde_json::from_str::<Value>(text) {
            Ok(data) => NormalizedPayload::Structured { data },
            Err(_) => NormalizedPayload::Text { text: text.clone() },
        })
    }

    /// Total version of [`try_normalize`](Self::try_normalize): failures
    /// become an error payload for this tool call only.
    pub fn normalize(&self, raw: &Value) -> NormalizedPayload {
        self.try_normalize(raw).unwrap_or_else(|e| {
            tracing::debug!(error = %e, "tool payload normalization failed");
            NormalizedPayload::error(e.to_string())
        })
    }

    fn is_error_text(&self, text: &str) -> bool {
        let text = text.trim_start();
        self.config
            .error_markers
            .iter()
            .any(|marker| !marker.is_empty() && text.starts_with(marker.as_str()))
    }
}

/// Normalize with default settings.
pub fn normalize(raw: &Value) -> NormalizedPayload {
    PayloadNormalizer::default().normalize(raw)
}
