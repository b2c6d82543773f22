//! Error types for finchat.

use thiserror::Error;

/// Primary error type for all finchat operations.
///
/// Only transport-level and server-reported failures end a streaming
/// session. Chunk decode and parse problems never become errors, and tool
/// payload problems are folded into
/// [`NormalizedPayload::Error`](crate::types::NormalizedPayload::Error).
#[derive(Error, Debug)]
pub enum FinchatError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Config file error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Rate limited: retry after {retry_after_ms:?}ms")]
    RateLimited { retry_after_ms: Option<u64> },

    #[error("Timeout after {0}ms")]
    Timeout(u64),

    #[error("Stream error: {0}")]
    Stream(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

/// Broad error category, used to decide how a failure is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Authentication,
    RateLimit,
    Network,
    Timeout,
    Server,
    Api,
    Stream,
    Configuration,
    Serialization,
    Unknown,
}

impl FinchatError {
    /// Create an API error from a status code and body text.
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Classify this error into a category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Authentication(_) => ErrorCategory::Authentication,
            Self::RateLimited { .. } => ErrorCategory::RateLimit,
            Self::Network(_) => ErrorCategory::Network,
            Self::Timeout(_) => ErrorCategory::Timeout,
            Self::Configuration(_) | Self::Toml(_) => ErrorCategory::Configuration,
            Self::Serialization(_) => ErrorCategory::Serialization,
            Self::Stream(_) => ErrorCategory::Stream,
            Self::Api { status, .. } => match status {
                401 | 403 => ErrorCategory::Authentication,
                429 => ErrorCategory::RateLimit,
                500..=599 => ErrorCategory::Server,
                _ => ErrorCategory::Api,
            },
            _ => ErrorCategory::Unknown,
        }
    }

    /// Whether this error ended a streaming session (as opposed to failing
    /// before any request was sent).
    pub fn is_transport(&self) -> bool {
        matches!(
            self.category(),
            ErrorCategory::Authentication
                | ErrorCategory::RateLimit
                | ErrorCategory::Network
                | ErrorCategory::Timeout
                | ErrorCategory::Server
                | ErrorCategory::Api
                | ErrorCategory::Stream
        )
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, FinchatError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_status_maps_to_category() {
        assert_eq!(FinchatError::api(401, "no").category(), ErrorCategory::Authentication);
        assert_eq!(FinchatError::api(429, "slow").category(), ErrorCategory::RateLimit);
        assert_eq!(FinchatError::api(503, "down").category(), ErrorCategory::Server);
        assert_eq!(FinchatError::api(404, "gone").category(), ErrorCategory::Api);
    }

    #[test]
    fn configuration_errors_are_not_transport() {
        assert!(!FinchatError::Configuration("missing base url".into()).is_transport());
        assert!(!FinchatError::InvalidArgument("empty message".into()).is_transport());
        assert!(FinchatError::Stream("boom".into()).is_transport());
        assert!(FinchatError::Timeout(1000).is_transport());
    }
}
