//! HTTP client utilities.
//!
//! Provides the shared HTTP client used by the pipeline, the refresh
//! exchange and the streaming call.

use std::time::Duration;

use futures::StreamExt;
use reqwest::{Client, ClientBuilder, Response};

use crate::error::{DocstreamError, Result};

/// Default timeout for non-streaming requests.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Connect timeout for every request, streaming included.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

const MAX_ERROR_BODY_BYTES: usize = 32 * 1024;

/// Build a configured HTTP client.
///
/// No overall request timeout is set on the client because a generation
/// stream may legitimately run for minutes; per-request timeouts are applied
/// by the caller and stream reads use an idle timeout instead.
///
/// # Errors
///
/// Returns error if client construction fails.
pub fn build_client() -> Result<Client> {
    ClientBuilder::new()
        .connect_timeout(CONNECT_TIMEOUT)
        .user_agent(format!("docstream/{}", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| DocstreamError::Network(e.to_string()))
}

/// Map a reqwest transport error to a docstream error.
#[must_use]
pub fn map_transport_error(e: &reqwest::Error, timeout: Duration) -> DocstreamError {
    if e.is_timeout() {
        DocstreamError::Timeout(timeout.as_secs())
    } else {
        DocstreamError::Network(e.to_string())
    }
}

/// Read at most 32 KiB of a response body as text.
///
/// Used for error bodies, which are only ever shown to the user.
pub async fn read_capped_body(response: Response) -> String {
    let mut body = Vec::new();
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let Ok(chunk) = chunk else { break };
        body.extend_from_slice(&chunk);
        if body.len() > MAX_ERROR_BODY_BYTES {
            body.truncate(MAX_ERROR_BODY_BYTES);
            let text = String::from_utf8_lossy(&body);
            return format!("{text}...(truncated)");
        }
    }
    String::from_utf8_lossy(&body).into_owned()
}

/// Extract a human-readable message from a DRF-style error body.
///
/// Looks for `error`, `detail` or `message`; otherwise returns the raw text.
#[must_use]
pub fn error_message(body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        for key in ["error", "detail", "message"] {
            if let Some(text) = value.get(key).and_then(serde_json::Value::as_str) {
                return text.to_string();
            }
        }
    }
    body.trim().to_string()
}
