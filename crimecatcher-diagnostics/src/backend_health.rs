//! Detection backend health derived from poll statistics

use chrono::{DateTime, Utc};
use crimecatcher_core::{CoreError, CoreResult};
use crimecatcher_poller::PollStats;
use serde::{Deserialize, Serialize};

/// Reachability of the detection backend as seen by the poller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum BackendHealth {
    /// No poll has completed yet
    Pending,
    /// The last poll succeeded
    Online,
    /// Recent polls failed; the displayed status may be stale
    Degraded {
        /// Failures since the last success
        consecutive_failures: u32,
    },
    /// Enough polls failed in a row to consider the backend gone
    Offline {
        /// Failures since the last success
        consecutive_failures: u32,
    },
}

impl BackendHealth {
    /// Short label for the status bar
    pub fn label(&self) -> &'static str {
        match self {
            BackendHealth::Pending => "Connecting",
            BackendHealth::Online => "Online",
            BackendHealth::Degraded { .. } => "Degraded",
            BackendHealth::Offline { .. } => "Offline",
        }
    }

    /// Whether the displayed status reflects the last poll
    pub fn is_current(&self) -> bool {
        matches!(self, BackendHealth::Online)
    }
}

/// Failure counts at which health degrades
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthThresholds {
    /// Consecutive failures before `Degraded`
    pub degraded_after: u32,
    /// Consecutive failures before `Offline`
    pub offline_after: u32,
}

impl Default for HealthThresholds {
    fn default() -> Self {
        Self {
            degraded_after: 1,
            offline_after: 3,
        }
    }
}

impl HealthThresholds {
    /// Validate configuration
    pub fn validate(&self) -> CoreResult<()> {
        if self.degraded_after == 0 {
            return Err(CoreError::InvalidConfiguration {
                message: "degraded_after must be > 0".to_string(),
            });
        }
        if self.offline_after < self.degraded_after {
            return Err(CoreError::InvalidConfiguration {
                message: "offline_after must be >= degraded_after".to_string(),
            });
        }
        Ok(())
    }
}

/// Classify backend health from poll statistics
pub fn assess(stats: &PollStats, thresholds: &HealthThresholds) -> BackendHealth {
    let failures = stats.consecutive_failures;

    if failures >= thresholds.offline_after {
        BackendHealth::Offline {
            consecutive_failures: failures,
        }
    } else if failures >= thresholds.degraded_after {
        BackendHealth::Degraded {
            consecutive_failures: failures,
        }
    } else if stats.polls_completed() == 0 {
        BackendHealth::Pending
    } else {
        BackendHealth::Online
    }
}

/// Health summary shown alongside the status badge
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthReport {
    /// Current classification
    pub health: BackendHealth,
    /// Time of the last successful poll
    pub last_success: Option<DateTime<Utc>>,
    /// Most recent failure message
    pub last_error: Option<String>,
    /// Polls that completed either way
    pub polls_completed: u64,
    /// Ticks skipped because a poll overran
    pub ticks_skipped: u64,
}

impl HealthReport {
    /// Build a report from poll statistics
    pub fn from_stats(stats: &PollStats, thresholds: &HealthThresholds) -> Self {
        Self {
            health: assess(stats, thresholds),
            last_success: stats.last_success,
            last_error: stats.last_error.clone(),
            polls_completed: stats.polls_completed(),
            ticks_skipped: stats.ticks_skipped,
        }
    }
}
