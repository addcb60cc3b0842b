//! Poll loop timing and cancellation tests
//!
//! All tests run on Tokio's paused clock, so intervals and timeouts elapse
//! deterministically.

use crimecatcher_core::{StateReducer, Status, StatusPayload};
use crimecatcher_poller::*;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone, Default)]
struct Recorder {
    payloads: Arc<Mutex<Vec<StatusPayload>>>,
    errors: Arc<Mutex<Vec<PollError>>>,
}

impl Recorder {
    fn start(&self, poller: &StatusPoller) -> CancelToken {
        let payloads = self.payloads.clone();
        let errors = self.errors.clone();
        poller.start(
            move |payload| payloads.lock().push(payload),
            move |error| errors.lock().push(error.clone()),
        )
    }

    fn payloads(&self) -> usize {
        self.payloads.lock().len()
    }

    fn errors(&self) -> Vec<PollError> {
        self.errors.lock().clone()
    }
}

fn poller(source: &Arc<ScriptedStatusSource>, config: PollerConfig) -> StatusPoller {
    StatusPoller::new(source.clone(), config).unwrap()
}

fn config(interval_ms: u64, timeout_ms: u64) -> PollerConfig {
    PollerConfig {
        interval: Duration::from_millis(interval_ms),
        request_timeout: Duration::from_millis(timeout_ms),
        backoff: BackoffPolicy::Fixed,
    }
}

async fn advance(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}

// ============================================================================
// DELIVERY TESTS
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_first_poll_is_immediate() {
    let source = Arc::new(ScriptedStatusSource::from_json(&[r#"{"status":"SECURE"}"#]));
    let poller = poller(&source, PollerConfig::default());
    let recorder = Recorder::default();

    let token = recorder.start(&poller);
    advance(10).await;

    assert_eq!(recorder.payloads(), 1);
    assert_eq!(poller.stats().polls_issued, 1);
    token.cancel();
}

#[tokio::test(start_paused = true)]
async fn test_polls_follow_interval() {
    let source = Arc::new(ScriptedStatusSource::from_json(&[r#"{"status":"SECURE"}"#]));
    let poller = poller(&source, config(2000, 1500));
    let recorder = Recorder::default();

    let token = recorder.start(&poller);
    advance(5000).await;

    // t = 0, 2000, 4000
    assert_eq!(recorder.payloads(), 3);
    assert_eq!(poller.stats().polls_succeeded, 3);
    assert_eq!(poller.stats().ticks_skipped, 0);
    token.cancel();
}

#[tokio::test(start_paused = true)]
async fn test_failed_poll_leaves_state_unchanged() {
    let source = Arc::new(ScriptedStatusSource::new());
    source.push_json(r#"{"status":"SUSPICIOUS"}"#);
    source.push_error(PollError::Transport {
        reason: "connection refused".to_string(),
    });
    source.push_json("{truncated");

    let reducer = Arc::new(Mutex::new(StateReducer::new()));
    let errors = Arc::new(Mutex::new(Vec::new()));
    let poller = poller(&source, config(2000, 1500));

    let sink = reducer.clone();
    let failures = errors.clone();
    let token = poller.start(
        move |payload| {
            sink.lock().apply_payload(payload);
        },
        move |error| failures.lock().push(error.clone()),
    );

    advance(100).await;
    let before = reducer.lock().snapshot();
    assert_eq!(before.status, Status::Suspicious);

    advance(4000).await;
    assert_eq!(reducer.lock().snapshot(), before);

    let errors = errors.lock().clone();
    assert_eq!(errors.len(), 2);
    assert!(errors[0].is_transport());
    assert!(errors[1].is_decode());

    let stats = poller.stats();
    assert_eq!(stats.polls_failed, 2);
    assert_eq!(stats.consecutive_failures, 2);
    assert!(stats.last_success.is_some());
    assert!(stats.last_error.is_some());
    token.cancel();
}

// ============================================================================
// TIMEOUT AND OVERRUN TESTS
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_slow_request_times_out() {
    let source = Arc::new(ScriptedStatusSource::new());
    source.push_delayed(
        Duration::from_secs(5),
        Ok(StatusPayload::with_status("SUSPICIOUS")),
    );
    let poller = poller(&source, config(2000, 1500));
    let recorder = Recorder::default();

    let token = recorder.start(&poller);
    advance(1600).await;

    assert_eq!(recorder.payloads(), 0);
    assert_eq!(
        recorder.errors(),
        vec![PollError::Timeout {
            duration: Duration::from_millis(1500)
        }]
    );
    token.cancel();
}

#[tokio::test(start_paused = true)]
async fn test_overrunning_poll_skips_ticks() {
    let source = Arc::new(ScriptedStatusSource::new());
    source.push_delayed(
        Duration::from_millis(250),
        Ok(StatusPayload::with_status("SECURE")),
    );
    let poller = poller(&source, config(100, 1000));
    let recorder = Recorder::default();

    let token = recorder.start(&poller);
    advance(260).await;

    // Ticks at 100 and 200 passed while the first request was in flight
    assert_eq!(source.fetches(), 1);
    assert_eq!(recorder.payloads(), 1);
    assert_eq!(poller.stats().ticks_skipped, 2);

    // Next poll starts at 300, not immediately
    advance(30).await;
    assert_eq!(source.fetches(), 1);
    advance(20).await;
    assert_eq!(source.fetches(), 2);
    token.cancel();
}

// ============================================================================
// CANCELLATION TESTS
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_cancel_discards_in_flight_result() {
    let source = Arc::new(ScriptedStatusSource::new());
    source.push_delayed(
        Duration::from_millis(500),
        Ok(StatusPayload::with_status("WEAPON_DETECTED")),
    );
    let poller = poller(&source, PollerConfig::default());
    let recorder = Recorder::default();

    let token = recorder.start(&poller);
    advance(100).await;
    poller.cancel(&token);
    token.stopped().await;

    assert!(token.is_cancelled());
    assert_eq!(recorder.payloads(), 0);
    assert!(recorder.errors().is_empty());

    let stats = poller.stats();
    assert_eq!(stats.polls_issued, 1);
    assert_eq!(stats.discarded_after_cancel, 1);
}

#[tokio::test(start_paused = true)]
async fn test_no_polls_after_cancel() {
    let source = Arc::new(ScriptedStatusSource::from_json(&[r#"{"status":"SECURE"}"#]));
    let poller = poller(&source, config(2000, 1500));
    let recorder = Recorder::default();

    let token = recorder.start(&poller);
    advance(100).await;
    token.cancel();
    token.stopped().await;

    advance(10_000).await;
    assert_eq!(source.fetches(), 1);
    assert_eq!(recorder.payloads(), 1);
}

// ============================================================================
// BACKOFF TESTS
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_exponential_backoff_grows_and_resets() {
    let source = Arc::new(ScriptedStatusSource::new());
    for _ in 0..3 {
        source.push_error(PollError::HttpStatus { code: 503 });
    }
    source.push_json(r#"{"status":"SECURE"}"#);

    let poller = poller(
        &source,
        PollerConfig {
            interval: Duration::from_secs(1),
            request_timeout: Duration::from_millis(500),
            backoff: BackoffPolicy::Exponential {
                multiplier: 2.0,
                max_interval: Duration::from_secs(8),
            },
        },
    );
    let recorder = Recorder::default();
    let token = recorder.start(&poller);

    // Failures at t = 0, 2, 6 push the delay to 2s, 4s, then 8s
    advance(6_500).await;
    let stats = poller.stats();
    assert_eq!(stats.polls_issued, 3);
    assert_eq!(stats.consecutive_failures, 3);
    assert_eq!(stats.current_interval_ms, 8000);

    // Success at t = 14 restores the base interval
    advance(8_000).await;
    let stats = poller.stats();
    assert_eq!(stats.polls_succeeded, 1);
    assert_eq!(stats.consecutive_failures, 0);
    assert_eq!(stats.current_interval_ms, 1000);
    assert_eq!(recorder.payloads(), 1);
    token.cancel();
}

#[test]
fn test_invalid_config_is_rejected() {
    let source: Arc<dyn StatusSource> = Arc::new(ScriptedStatusSource::new());
    let result = StatusPoller::new(source, config(0, 1500));
    assert!(matches!(
        result,
        Err(PollError::InvalidConfiguration { .. })
    ));
}
