//! Configuration system (layered: defaults < TOML file < env).

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use bon::Builder;
use serde::{Deserialize, Serialize};

use crate::error::{FinchatError, Result};
use crate::normalize::NormalizerConfig;
use crate::stream::DecoderConfig;

const DEFAULT_BASE_URL: &str = "http://localhost:8000";
const DEFAULT_STREAM_PATH: &str = "/chat/stream";
const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Settings for the chat-streaming client and the stream core.
///
/// ```
/// use finchat::config::FinchatConfig;
///
/// let config = FinchatConfig::builder()
///     .base_url("https://api.example.test")
///     .api_token("secret")
///     .build();
/// assert_eq!(config.stream_url(), "https://api.example.test/chat/stream");
/// ```
#[derive(Debug, Clone, Builder, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FinchatConfig {
    #[builder(into, default = DEFAULT_BASE_URL.to_string())]
    pub base_url: String,
    #[builder(into, default = DEFAULT_STREAM_PATH.to_string())]
    pub stream_path: String,
    #[builder(into)]
    pub api_token: Option<String>,
    #[builder(default = DEFAULT_TIMEOUT_SECS)]
    pub request_timeout_secs: u64,
    /// Default for `ChatRequest::stream_tokens` when built by the CLI.
    #[builder(default = true)]
    pub stream_tokens: bool,
    /// Extra headers sent with every request.
    #[builder(default)]
    pub headers: HashMap<String, String>,
    #[builder(default)]
    pub decoder: DecoderConfig,
    #[builder(default)]
    pub normalizer: NormalizerConfig,
}

impl Default for FinchatConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl FinchatConfig {
    /// Parse a TOML document. Missing keys keep their defaults.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    /// Read a TOML config file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    /// Platform config location, e.g. `~/.config/finchat/finchat.toml`.
    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "finchat")
            .map(|dirs| dirs.config_dir().join("finchat.toml"))
    }

    /// Load defaults, then the file (explicit path or the default location if
    /// it exists), then environment overrides. A `.env` file is honoured.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let _ = dotenvy::dotenv(); // load .env if present, ignore error

        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None => match Self::default_path() {
                Some(p) if p.is_file() => {
                    tracing::debug!(path = %p.display(), "loading config file");
                    Self::from_file(&p)?
                }
                _ => Self::default(),
            },
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `FINCHAT_*` overrides using the given lookup.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("FINCHAT_BASE_URL") {
            self.base_url = url;
        }
        if let Some(path) = lookup("FINCHAT_STREAM_PATH") {
            self.stream_path = path;
        }
        if let Some(token) = lookup("FINCHAT_API_TOKEN") {
            self.api_token = Some(token);
        }
        if let Some(secs) = lookup("FINCHAT_TIMEOUT_SECS") {
            self.request_timeout_secs = secs.trim().parse().map_err(|_| {
                FinchatError::Configuration(format!("FINCHAT_TIMEOUT_SECS is not a number: {secs}"))
            })?;
        }
        Ok(())
    }

    /// Reject settings the client cannot work with.
    pub fn validate(&self) -> Result<()> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(FinchatError::Configuration(format!(
                "base_url must be an http(s) URL, got '{}'",
                self.base_url
            )));
        }
        if self.request_timeout_secs == 0 {
            return Err(FinchatError::Configuration(
                "request_timeout_secs must be greater than zero".into(),
            ));
        }
        Ok(())
    }

    /// Full URL of the chat-streaming endpoint.
    pub fn stream_url(&self) -> String {
        let base = self.base_url.trim_end_matches('/');
        if self.stream_path.starts_with('/') {
            format!("{base}{}", self.stream_path)
        } else {
            format!("{base}/{}", self.stream_path)
        }
    }
}
