//! Periodic status polling
//!
//! One spawned task per started poll loop. Requests are issued strictly one after
//! another: a request that overruns the interval makes the loop skip the ticks it
//! missed instead of queueing them. Results are delivered through a gate shared
//! with the [`CancelToken`], so nothing reaches the callbacks once `cancel` returns.

use crate::error::{PollError, PollResult};
use crate::source::StatusSource;
use chrono::{DateTime, Utc};
use crimecatcher_core::StatusPayload;
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Default delay between polls
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(2000);

/// Default bound on a single request
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_millis(1500);

/// How the delay grows while polls keep failing
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum BackoffPolicy {
    /// Always wait the configured interval
    #[default]
    Fixed,
    /// Multiply the interval per consecutive failure, up to a cap
    Exponential {
        /// Growth factor per failure, at least 1
        multiplier: f64,
        /// Largest delay ever used
        max_interval: Duration,
    },
}

impl BackoffPolicy {
    /// Delay before the next poll after `consecutive_failures` failures in a row
    pub fn delay(&self, interval: Duration, consecutive_failures: u32) -> Duration {
        match *self {
            BackoffPolicy::Fixed => interval,
            BackoffPolicy::Exponential {
                multiplier,
                max_interval,
            } => {
                if consecutive_failures == 0 {
                    return interval;
                }
                let factor = multiplier.powi(consecutive_failures.min(32) as i32);
                let millis = (interval.as_millis() as f64 * factor)
                    .min(max_interval.as_millis() as f64);
                Duration::from_millis(millis.round() as u64).max(interval)
            }
        }
    }
}

/// Poll loop configuration
#[derive(Debug, Clone, PartialEq)]
pub struct PollerConfig {
    /// Delay between the start of consecutive polls
    pub interval: Duration,
    /// Bound on a single request, enforced by the poller
    pub request_timeout: Duration,
    /// Delay growth on failure
    pub backoff: BackoffPolicy,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            backoff: BackoffPolicy::Fixed,
        }
    }
}

impl PollerConfig {
    /// Validate configuration
    pub fn validate(&self) -> PollResult<()> {
        if self.interval.is_zero() {
            return Err(PollError::InvalidConfiguration {
                message: "Poll interval must be > 0".to_string(),
            });
        }

        if self.request_timeout.is_zero() {
            return Err(PollError::InvalidConfiguration {
                message: "Request timeout must be > 0".to_string(),
            });
        }

        if let BackoffPolicy::Exponential {
            multiplier,
            max_interval,
        } = self.backoff
        {
            if !multiplier.is_finite() || multiplier < 1.0 {
                return Err(PollError::InvalidConfiguration {
                    message: "Backoff multiplier must be >= 1".to_string(),
                });
            }
            if max_interval < self.interval {
                return Err(PollError::InvalidConfiguration {
                    message: "Backoff cap must not be below the poll interval".to_string(),
                });
            }
        }

        Ok(())
    }
}

/// Poll loop statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PollStats {
    /// Requests started
    pub polls_issued: u64,
    /// Payloads forwarded
    pub polls_succeeded: u64,
    /// Transport, timeout and decode failures
    pub polls_failed: u64,
    /// Ticks dropped because a request was still in flight
    pub ticks_skipped: u64,
    /// Results that arrived after cancellation and were dropped
    pub discarded_after_cancel: u64,
    /// Failures since the last success
    pub consecutive_failures: u32,
    /// Wall-clock time of the last forwarded payload
    pub last_success: Option<DateTime<Utc>>,
    /// Most recent failure message
    pub last_error: Option<String>,
    /// Delay currently applied between polls
    pub current_interval_ms: u64,
}

impl PollStats {
    fn record_success(&mut self) {
        self.polls_succeeded += 1;
        self.consecutive_failures = 0;
        self.last_success = Some(Utc::now());
    }

    fn record_failure(&mut self, error: &PollError) {
        self.polls_failed += 1;
        self.consecutive_failures += 1;
        self.last_error = Some(error.to_string());
    }

    /// Polls that completed either way
    pub fn polls_completed(&self) -> u64 {
        self.polls_succeeded + self.polls_failed
    }
}

#[derive(Debug)]
struct CancelState {
    cancelled: Mutex<bool>,
    wake: watch::Sender<bool>,
    task: Mutex<Option<JoinHandle<()>>>,
}

/// Handle that stops a running poll loop.
///
/// Clones refer to the same loop.
#[derive(Debug, Clone)]
pub struct CancelToken {
    state: Arc<CancelState>,
}

impl CancelToken {
    fn new() -> Self {
        let (wake, _) = watch::channel(false);
        Self {
            state: Arc::new(CancelState {
                cancelled: Mutex::new(false),
                wake,
                task: Mutex::new(None),
            }),
        }
    }

    /// Stop future polls.
    ///
    /// Waits for a delivery in progress to finish; once this returns no callback
    /// runs again. Must not be called from inside a poll callback.
    pub fn cancel(&self) {
        let mut cancelled = self.state.cancelled.lock();
        if *cancelled {
            return;
        }
        *cancelled = true;
        drop(cancelled);

        self.state.wake.send_replace(true);
        debug!("Poll loop cancelled");
    }

    /// Check if the loop was cancelled
    pub fn is_cancelled(&self) -> bool {
        *self.state.cancelled.lock()
    }

    /// Wait for the loop task to exit
    pub async fn stopped(&self) {
        let task = self.state.task.lock().take();
        if let Some(task) = task {
            let _ = task.await;
        }
    }

    /// Run `deliver` unless cancelled, holding the gate for its duration
    fn deliver<R>(&self, deliver: impl FnOnce() -> R) -> Option<R> {
        let cancelled = self.state.cancelled.lock();
        if *cancelled {
            None
        } else {
            Some(deliver())
        }
    }
}

/// Periodically fetches the backend status and forwards decoded payloads
pub struct StatusPoller {
    source: Arc<dyn StatusSource>,
    config: PollerConfig,
    stats: Arc<RwLock<PollStats>>,
}

impl StatusPoller {
    /// Create a poller over `source`
    pub fn new(source: Arc<dyn StatusSource>, config: PollerConfig) -> PollResult<Self> {
        config.validate()?;

        let stats = PollStats {
            current_interval_ms: config.interval.as_millis() as u64,
            ..PollStats::default()
        };
        Ok(Self {
            source,
            config,
            stats: Arc::new(RwLock::new(stats)),
        })
    }

    /// Start a poll loop; the first poll is issued immediately.
    ///
    /// Successful payloads go to `on_payload`; every failure goes to `on_error` and
    /// nothing is forwarded for that tick. Must be called within a Tokio runtime.
    pub fn start<P, E>(&self, on_payload: P, on_error: E) -> CancelToken
    where
        P: FnMut(StatusPayload) + Send + 'static,
        E: FnMut(&PollError) + Send + 'static,
    {
        let token = CancelToken::new();

        info!(
            source = %self.source.describe(),
            interval_ms = self.config.interval.as_millis() as u64,
            timeout_ms = self.config.request_timeout.as_millis() as u64,
            "Status polling started"
        );

        let task = tokio::spawn(run_loop(
            self.source.clone(),
            self.config.clone(),
            self.stats.clone(),
            token.clone(),
            on_payload,
            on_error,
        ));
        *token.state.task.lock() = Some(task);

        token
    }

    /// Stop the loop behind `token`
    pub fn cancel(&self, token: &CancelToken) {
        token.cancel();
    }

    /// Get current statistics
    pub fn stats(&self) -> PollStats {
        self.stats.read().clone()
    }

    /// Loop configuration
    pub fn config(&self) -> &PollerConfig {
        &self.config
    }
}

async fn run_loop<P, E>(
    source: Arc<dyn StatusSource>,
    config: PollerConfig,
    stats: Arc<RwLock<PollStats>>,
    token: CancelToken,
    mut on_payload: P,
    mut on_error: E,
) where
    P: FnMut(StatusPayload) + Send + 'static,
    E: FnMut(&PollError) + Send + 'static,
{
    let mut wake = token.state.wake.subscribe();
    let description = source.describe();

    loop {
        if token.is_cancelled() {
            break;
        }

        let issued_at = Instant::now();
        stats.write().polls_issued += 1;

        let result = match tokio::time::timeout(config.request_timeout, source.fetch()).await {
            Ok(result) => result,
            Err(_) => Err(PollError::Timeout {
                duration: config.request_timeout,
            }),
        };

        let delivered = token.deliver(|| match result {
            Ok(payload) => {
                stats.write().record_success();
                debug!(
                    source = %description,
                    status = ?payload.status_label(),
                    "Status payload received"
                );
                on_payload(payload);
            }
            Err(error) => {
                stats.write().record_failure(&error);
                warn!(source = %description, error = %error, "Status poll failed");
                on_error(&error);
            }
        });
        if delivered.is_none() {
            stats.write().discarded_after_cancel += 1;
            debug!("Discarding poll result that completed after cancellation");
            break;
        }

        let failures = stats.read().consecutive_failures;
        let delay = config.backoff.delay(config.interval, failures);

        // Ticks that passed while the request was in flight are skipped
        let now = Instant::now();
        let mut next_tick = issued_at + delay;
        let mut skipped = 0u64;
        while next_tick < now {
            skipped += 1;
            next_tick += delay;
        }

        {
            let mut stats = stats.write();
            stats.current_interval_ms = delay.as_millis() as u64;
            stats.ticks_skipped += skipped;
        }
        if skipped > 0 {
            debug!(skipped, "Poll overran its interval");
        }

        tokio::select! {
            _ = tokio::time::sleep_until(next_tick) => {}
            _ = wake.changed() => break,
        }
    }

    info!(source = %description, "Status polling stopped");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_backoff() {
        let policy = BackoffPolicy::Fixed;
        assert_eq!(policy.delay(Duration::from_secs(2), 0), Duration::from_secs(2));
        assert_eq!(policy.delay(Duration::from_secs(2), 5), Duration::from_secs(2));
    }

    #[test]
    fn test_exponential_backoff_caps() {
        let policy = BackoffPolicy::Exponential {
            multiplier: 2.0,
            max_interval: Duration::from_secs(30),
        };
        let interval = Duration::from_secs(2);

        assert_eq!(policy.delay(interval, 0), Duration::from_secs(2));
        assert_eq!(policy.delay(interval, 1), Duration::from_secs(4));
        assert_eq!(policy.delay(interval, 3), Duration::from_secs(16));
        assert_eq!(policy.delay(interval, 4), Duration::from_secs(30));
        assert_eq!(policy.delay(interval, 1000), Duration::from_secs(30));
    }

    #[test]
    fn test_config_validation() {
        assert!(PollerConfig::default().validate().is_ok());

        let zero = PollerConfig {
            interval: Duration::ZERO,
            ..PollerConfig::default()
        };
        assert!(zero.validate().is_err());

        let no_timeout = PollerConfig {
            request_timeout: Duration::ZERO,
            ..PollerConfig::default()
        };
        assert!(no_timeout.validate().is_err());

        let shrinking = PollerConfig {
            backoff: BackoffPolicy::Exponential {
                multiplier: 0.5,
                max_interval: Duration::from_secs(30),
            },
            ..PollerConfig::default()
        };
        assert!(shrinking.validate().is_err());

        let low_cap = PollerConfig {
            backoff: BackoffPolicy::Exponential {
                multiplier: 2.0,
                max_interval: Duration::from_secs(1),
            },
            ..PollerConfig::default()
        };
        assert!(low_cap.validate().is_err());
    }

    #[test]
    fn test_cancel_closes_delivery_gate() {
        let token = CancelToken::new();
        assert_eq!(token.deliver(|| 1), Some(1));

        token.cancel();
        token.cancel();
        assert!(token.is_cancelled());
        assert_eq!(token.deliver(|| 1), None);
    }
}
