//! HTTP client construction, headers, and status mapping.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};

use crate::config::FinchatConfig;
use crate::error::FinchatError;

/// Build a reqwest client. The timeout bounds connecting and each read; a
/// long reply that keeps streaming is never cut off.
pub fn build_client(config: &FinchatConfig) -> Result<reqwest::Client, FinchatError> {
    let limit = Duration::from_secs(config.request_timeout_secs);
    Ok(reqwest::Client::builder()
        .connect_timeout(limit)
        .read_timeout(limit)
        .pool_max_idle_per_host(10)
        .build()?)
}

/// Headers for the streaming POST: JSON body, event-stream response,
/// optional bearer token, then configured extras.
pub fn stream_headers(config: &FinchatConfig) -> Result<HeaderMap, FinchatError> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(ACCEPT, HeaderValue::from_static("text/event-stream"));

    if let Some(token) = config.api_token.as_deref() {
        let value = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|_| FinchatError::Configuration("api_token is not a valid header value".into()))?;
        headers.insert(AUTHORIZATION, value);
    }

    for (name, value) in &config.headers {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| FinchatError::Configuration(format!("invalid header name '{name}'")))?;
        let value = HeaderValue::from_str(value)
            .map_err(|_| FinchatError::Configuration(format!("invalid value for header '{name}'")))?;
        headers.insert(name, value);
    }

    Ok(headers)
}

/// Map a non-success status to a typed error.
pub fn status_to_error(status: u16, retry_after: Option<&str>, body: &str) -> FinchatError {
    match status {
        401 | 403 => FinchatError::Authentication(body.to_string()),
        429 => FinchatError::RateLimited {
            retry_after_ms: retry_after
                .and_then(|v| v.trim().parse::<f64>().ok())
                .map(|secs| (secs * 1000.0) as u64)
                .or_else(|| extract_retry_after(body)),
        },
        _ => FinchatError::api(status, body),
    }
}

fn extract_retry_after(body: &str) -> Option<u64> {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .and_then(|e| e.get("retry_after"))
                .and_then(|r| r.as_f64())
                .map(|s| (s * 1000.0) as u64)
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bearer_and_extra_headers() {
        let mut config = FinchatConfig::builder().api_token("abc").build();
        config.headers.insert("x-org-id".into(), "org-7".into());

        let headers = stream_headers(&config).unwrap();
        assert_eq!(headers[AUTHORIZATION], "Bearer abc");
        assert_eq!(headers["x-org-id"], "org-7");
        assert_eq!(headers[ACCEPT], "text/event-stream");
    }

    #[test]
    fn invalid_header_name_is_configuration_error() {
        let mut config = FinchatConfig::default();
        config.headers.insert("bad header".into(), "v".into());
        assert!(matches!(
            stream_headers(&config),
            Err(FinchatError::Configuration(_))
        ));
    }

    #[test]
    fn rate_limit_reads_header_then_body() {
        match status_to_error(429, Some("2"), "") {
            FinchatError::RateLimited { retry_after_ms } => assert_eq!(retry_after_ms, Some(2000)),
            other => panic!("unexpected {other:?}"),
        }
        match status_to_error(429, None, r#"{"error":{"retry_after":0.5}}"#) {
            FinchatError::RateLimited { retry_after_ms } => assert_eq!(retry_after_ms, Some(500)),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn other_statuses() {
        assert!(matches!(status_to_error(403, None, "no"), FinchatError::Authentication(_)));
        assert!(matches!(
            status_to_error(502, None, "bad gateway"),
            FinchatError::Api { status: 502, .. }
        ));
    }
}
