//! Shared HTTP client and status mapping.

use std::sync::OnceLock;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};

use crate::error::BrookError;

static SHARED_CLIENT: OnceLock<reqwest::Client> = OnceLock::new();

/// Get (or create) the shared reqwest client.
///
/// No overall request timeout: a response stream may legitimately stay open
/// for minutes. Only connecting is bounded.
pub fn shared_client() -> &'static reqwest::Client {
    SHARED_CLIENT.get_or_init(|| {
        reqwest::Client::builder()
            .connect_timeout(std::time::Duration::from_secs(30))
            .pool_max_idle_per_host(10)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new())
    })
}

/// Build headers for a Bearer-token streaming API.
pub fn bearer_headers(api_key: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(ACCEPT, HeaderValue::from_static("text/event-stream"));
    if let Ok(val) = HeaderValue::from_str(&format!("Bearer {api_key}")) {
        headers.insert(AUTHORIZATION, val);
    }
    headers
}

/// Map a non-success HTTP status to an error.
pub fn status_to_error(status: u16, body: &str) -> BrookError {
    match status {
        401 | 403 => BrookError::Authentication(error_message(body)),
        429 => BrookError::RateLimited {
            retry_after_ms: extract_retry_after(body),
        },
        _ => BrookError::api(status, error_message(body)),
    }
}

fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .and_then(|e| e.get("message"))
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.to_string())
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
    fn rate_limit_body_yields_retry_hint() {
        let err = status_to_error(429, r#"{"error":{"message":"slow down","retry_after":1.5}}"#);
        assert!(matches!(
            err,
            BrookError::RateLimited {
                retry_after_ms: Some(1500)
            }
        ));
    }

    #[test]
    fn api_error_prefers_json_message() {
        let err = status_to_error(400, r#"{"error":{"message":"unsupported parameter"}}"#);
        assert_eq!(err.to_string(), "API error (status 400): unsupported parameter");
        assert!(matches!(status_to_error(401, "nope"), BrookError::Authentication(_)));
    }
}
