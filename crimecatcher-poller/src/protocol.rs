//! Status endpoint wire contract

use crate::error::{PollError, PollResult};
use crimecatcher_core::StatusPayload;

/// Base URL of a locally running detection backend
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5001";

/// Path of the status endpoint
pub const DEFAULT_STATUS_PATH: &str = "/api/status";

/// Join a base URL and an endpoint path with exactly one slash between them
pub fn status_url(base_url: &str, status_path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        status_path.trim_start_matches('/')
    )
}

/// Build the endpoint URL, rejecting anything that is not absolute http(s)
pub fn endpoint_url(base_url: &str, status_path: &str) -> PollResult<String> {
    let url = status_url(base_url, status_path);
    let parsed = reqwest::Url::parse(&url).map_err(|e| PollError::InvalidConfiguration {
        message: format!("invalid status URL {url}: {e}"),
    })?;

    match parsed.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(PollError::InvalidConfiguration {
            message: format!("unsupported scheme {scheme:?} in {url}"),
        }),
    }
}

/// Decode one response body.
///
/// A present `lastAlert` missing any of its fields rejects the whole payload.
pub fn decode(body: &[u8]) -> PollResult<StatusPayload> {
    serde_json::from_slice(body).map_err(|e| PollError::Decode {
        reason: e.to_string(),
    })
}
