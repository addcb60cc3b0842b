//! Status sources
//!
//! A [`StatusSource`] fetches exactly one status payload. The poller decides when to
//! call it and how long to wait; sources only report what happened.

use crate::error::{PollError, PollResult};
use crate::protocol::{decode, endpoint_url};
use async_trait::async_trait;
use crimecatcher_core::StatusPayload;
use parking_lot::Mutex;
use reqwest::Client;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tracing::debug;

/// Capability to fetch the backend's current status
#[async_trait]
pub trait StatusSource: Send + Sync {
    /// Fetch and decode one payload
    async fn fetch(&self) -> PollResult<StatusPayload>;

    /// Where payloads come from, for logs
    fn describe(&self) -> String;
}

/// Status source backed by the detection backend's HTTP API
#[derive(Debug, Clone)]
pub struct HttpStatusSource {
    client: Client,
    url: String,
    timeout: Duration,
}

impl HttpStatusSource {
    /// Create a source for `GET {base_url}{status_path}`
    pub fn new(base_url: &str, status_path: &str, timeout: Duration) -> PollResult<Self> {
        let url = endpoint_url(base_url, status_path)?;

        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("crimecatcher/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| PollError::InvalidConfiguration {
                message: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            client,
            url,
            timeout,
        })
    }

    /// Full endpoint URL
    pub fn url(&self) -> &str {
        &self.url
    }

    fn transport(&self, e: reqwest::Error) -> PollError {
        if e.is_timeout() {
            PollError::Timeout {
                duration: self.timeout,
            }
        } else {
            PollError::Transport {
                reason: e.to_string(),
            }
        }
    }
}

#[async_trait]
impl StatusSource for HttpStatusSource {
    async fn fetch(&self) -> PollResult<StatusPayload> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| self.transport(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PollError::HttpStatus {
                code: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(|e| self.transport(e))?;
        debug!(url = %self.url, bytes = body.len(), "Status response received");
        decode(&body)
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}

#[derive(Debug, Clone)]
struct ScriptedStep {
    delay: Duration,
    outcome: PollResult<StatusPayload>,
}

/// Source that replays a queue of prepared outcomes.
///
/// Once the queue is drained the last outcome repeats, like a backend whose status
/// stopped changing. Used by tests and the headless demo.
#[derive(Debug, Default)]
pub struct ScriptedStatusSource {
    steps: Mutex<VecDeque<ScriptedStep>>,
    last: Mutex<Option<ScriptedStep>>,
    fetches: AtomicUsize,
}

impl ScriptedStatusSource {
    /// Create an empty script; fetching from it fails until something is queued
    pub fn new() -> Self {
        Self::default()
    }

    /// Script one raw response body per fetch
    pub fn from_json(bodies: &[&str]) -> Self {
        let source = Self::new();
        for body in bodies {
            source.push_json(body);
        }
        source
    }

    /// Queue a raw response body, decoded when fetched
    pub fn push_json(&self, body: &str) {
        self.push(Duration::ZERO, decode(body.as_bytes()));
    }

    /// Queue a payload
    pub fn push_payload(&self, payload: StatusPayload) {
        self.push(Duration::ZERO, Ok(payload));
    }

    /// Queue a failure
    pub fn push_error(&self, error: PollError) {
        self.push(Duration::ZERO, Err(error));
    }

    /// Queue an outcome that takes `delay` to arrive
    pub fn push_delayed(&self, delay: Duration, outcome: PollResult<StatusPayload>) {
        self.push(delay, outcome);
    }

    fn push(&self, delay: Duration, outcome: PollResult<StatusPayload>) {
        self.steps.lock().push_back(ScriptedStep { delay, outcome });
    }

    /// Fetches served so far
    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    fn next_step(&self) -> Option<ScriptedStep> {
        let mut steps = self.steps.lock();
        match steps.pop_front() {
            Some(step) => {
                if steps.is_empty() {
                    *self.last.lock() = Some(step.clone());
                }
                Some(step)
            }
            None => self.last.lock().clone(),
        }
    }
}

#[async_trait]
impl StatusSource for ScriptedStatusSource {
    async fn fetch(&self) -> PollResult<StatusPayload> {
        self.fetches.fetch_add(1, Ordering::SeqCst);

        let step = self.next_step().ok_or_else(|| PollError::Transport {
            reason: "no scripted response".to_string(),
        })?;
        if !step.delay.is_zero() {
            tokio::time::sleep(step.delay).await;
        }
        step.outcome
    }

    fn describe(&self) -> String {
        "scripted".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scripted_repeats_last_step() {
        let source = ScriptedStatusSource::from_json(&[
            r#"{"status":"SUSPICIOUS"}"#,
            r#"{"status":"SECURE"}"#,
        ]);

        let first = source.fetch().await.unwrap();
        assert_eq!(first.status_label(), Some("SUSPICIOUS"));
        for _ in 0..3 {
            let next = source.fetch().await.unwrap();
            assert_eq!(next.status_label(), Some("SECURE"));
        }
        assert_eq!(source.fetches(), 4);
    }

    #[tokio::test]
    async fn test_scripted_bad_body_is_decode_error() {
        let source = ScriptedStatusSource::from_json(&["not json"]);
        assert!(source.fetch().await.unwrap_err().is_decode());
    }

    #[tokio::test]
    async fn test_empty_script_fails() {
        let source = ScriptedStatusSource::new();
        assert!(source.fetch().await.unwrap_err().is_transport());
    }

    #[test]
    fn test_http_source_rejects_bad_url() {
        let err = HttpStatusSource::new("not a url", "/api/status", Duration::from_secs(1))
            .unwrap_err();
        assert!(matches!(err, PollError::InvalidConfiguration { .. }));
    }

    #[test]
    fn test_http_source_url() {
        let source =
            HttpStatusSource::new("http://127.0.0.1:5001/", "/api/status", Duration::from_secs(1))
                .unwrap();
        assert_eq!(source.url(), "http://127.0.0.1:5001/api/status");
        assert_eq!(source.describe(), source.url());
    }
}
