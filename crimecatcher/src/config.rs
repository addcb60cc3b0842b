//! Configuration types and defaults
//!
//! Every field has a default, so an empty TOML document is a valid configuration.
//! Environment overrides are applied on top of whatever was loaded.

use crate::error::{MonitorError, MonitorResult};
use crimecatcher_diagnostics::{parse_filter, HealthThresholds, LogConfig};
use crimecatcher_media::{CaptureConstraints, FacingMode, SinkConfig, VideoResolution};
use crimecatcher_poller::{
    endpoint_url, BackoffPolicy, HttpStatusSource, PollerConfig, DEFAULT_BASE_URL,
    DEFAULT_STATUS_PATH,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Overrides `endpoint.base_url`
pub const ENV_ENDPOINT: &str = "CRIMECATCHER_ENDPOINT";
/// Overrides `poll.interval_ms`
pub const ENV_POLL_INTERVAL_MS: &str = "CRIMECATCHER_POLL_INTERVAL_MS";
/// Overrides `endpoint.request_timeout_ms`
pub const ENV_REQUEST_TIMEOUT_MS: &str = "CRIMECATCHER_REQUEST_TIMEOUT_MS";
/// Overrides `logging.filter`
pub const ENV_LOG: &str = "CRIMECATCHER_LOG";

/// Complete monitor configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Detection backend endpoint
    pub endpoint: EndpointConfig,
    /// Poll loop timing
    pub poll: PollConfig,
    /// Local camera
    pub capture: CaptureConfig,
    /// Incident history
    pub incidents: IncidentConfig,
    /// Backend health thresholds
    pub health: HealthThresholds,
    /// Log output
    pub logging: LogConfig,
}

/// Detection backend endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointConfig {
    /// Scheme, host and port of the backend
    pub base_url: String,
    /// Path of the status endpoint
    pub status_path: String,
    /// Bound on a single status request
    pub request_timeout_ms: u64,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            status_path: DEFAULT_STATUS_PATH.to_string(),
            request_timeout_ms: 1500,
        }
    }
}

/// Delay growth while polls fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackoffKind {
    /// Keep polling at the configured interval
    #[default]
    Fixed,
    /// Grow the delay per consecutive failure
    Exponential,
}

/// Poll loop timing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollConfig {
    /// Delay between polls
    pub interval_ms: u64,
    /// Delay growth on failure
    pub backoff: BackoffKind,
    /// Growth factor for exponential backoff
    pub backoff_multiplier: f64,
    /// Largest delay exponential backoff reaches
    pub max_interval_ms: u64,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_ms: 2000,
            backoff: BackoffKind::Fixed,
            backoff_multiplier: 2.0,
            max_interval_ms: 30_000,
        }
    }
}

/// Local camera
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Preferred width
    pub width: u32,
    /// Preferred height
    pub height: u32,
    /// Preferred frame rate
    pub framerate: f64,
    /// Preferred camera
    pub facing: FacingMode,
    /// Mirror the preview
    pub mirrored: bool,
    /// Never play captured audio
    pub muted: bool,
    /// Start the preview immediately
    pub autoplay: bool,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        let constraints = CaptureConstraints::default();
        let sink = SinkConfig::default();
        Self {
            width: constraints.resolution.width,
            height: constraints.resolution.height,
            framerate: constraints.framerate,
            facing: constraints.facing,
            mirrored: sink.mirrored,
            muted: sink.muted,
            autoplay: sink.autoplay,
        }
    }
}

/// Incident history
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IncidentConfig {
    /// Incidents kept, newest first
    pub capacity: usize,
}

impl Default for IncidentConfig {
    fn default() -> Self {
        Self { capacity: 20 }
    }
}

impl MonitorConfig {
    /// Parse a TOML document
    pub fn from_toml_str(source: &str) -> MonitorResult<Self> {
        toml::from_str(source).map_err(|e| MonitorError::config(e.to_string()))
    }

    /// Load a TOML file
    pub fn load(path: impl AsRef<Path>) -> MonitorResult<Self> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }

    /// Apply overrides from the process environment
    pub fn apply_env_overrides(&mut self) -> MonitorResult<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from `lookup`, keyed by the `CRIMECATCHER_*` variable names
    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> MonitorResult<()> {
        if let Some(url) = lookup(ENV_ENDPOINT) {
            self.endpoint.base_url = url.trim().to_string();
        }
        if let Some(value) = lookup(ENV_POLL_INTERVAL_MS) {
            self.poll.interval_ms = parse_millis(ENV_POLL_INTERVAL_MS, &value)?;
        }
        if let Some(value) = lookup(ENV_REQUEST_TIMEOUT_MS) {
            self.endpoint.request_timeout_ms = parse_millis(ENV_REQUEST_TIMEOUT_MS, &value)?;
        }
        if let Some(filter) = lookup(ENV_LOG) {
            self.logging.filter = filter;
        }
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> MonitorResult<()> {
        endpoint_url(&self.endpoint.base_url, &self.endpoint.status_path)?;
        self.poller_config().validate()?;
        self.capture_constraints().validate()?;
        self.health.validate()?;
        parse_filter(&self.logging.filter)?;
        Ok(())
    }

    /// Poll loop settings
    pub fn poller_config(&self) -> PollerConfig {
        let backoff = match self.poll.backoff {
            BackoffKind::Fixed => BackoffPolicy::Fixed,
            BackoffKind::Exponential => BackoffPolicy::Exponential {
                multiplier: self.poll.backoff_multiplier,
                max_interval: Duration::from_millis(self.poll.max_interval_ms),
            },
        };

        PollerConfig {
            interval: Duration::from_millis(self.poll.interval_ms),
            request_timeout: Duration::from_millis(self.endpoint.request_timeout_ms),
            backoff,
        }
    }

    /// Constraints for acquiring the camera
    pub fn capture_constraints(&self) -> CaptureConstraints {
        CaptureConstraints {
            resolution: VideoResolution::new(self.capture.width, self.capture.height),
            framerate: self.capture.framerate,
            facing: self.capture.facing,
            ..CaptureConstraints::default()
        }
    }

    /// Presentation flags of the preview
    pub fn sink_config(&self) -> SinkConfig {
        SinkConfig {
            mirrored: self.capture.mirrored,
            muted: self.capture.muted,
            autoplay: self.capture.autoplay,
        }
    }

    /// HTTP status source for the configured endpoint
    pub fn http_source(&self) -> MonitorResult<HttpStatusSource> {
        Ok(HttpStatusSource::new(
            &self.endpoint.base_url,
            &self.endpoint.status_path,
            Duration::from_millis(self.endpoint.request_timeout_ms),
        )?)
    }
}

fn parse_millis(key: &str, value: &str) -> MonitorResult<u64> {
    value.trim().parse().map_err(|e| {
        MonitorError::config(format!("{key}={value:?} is not a millisecond count: {e}"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = MonitorConfig::default();
        assert_eq!(config.endpoint.base_url, "http://127.0.0.1:5001");
        assert_eq!(config.endpoint.status_path, "/api/status");
        assert_eq!(config.poll.interval_ms, 2000);
        assert_eq!(config.poll.backoff, BackoffKind::Fixed);
        assert_eq!(config.capture.width, 1280);
        assert_eq!(config.capture.height, 720);
        assert_eq!(config.capture.facing, FacingMode::User);
        assert!(config.capture.mirrored && config.capture.muted && config.capture.autoplay);
        assert_eq!(config.incidents.capacity, 20);
        assert!(config.validate().is_ok());

        let poller = config.poller_config();
        assert_eq!(poller.interval, Duration::from_millis(2000));
        assert_eq!(poller.request_timeout, Duration::from_millis(1500));
    }

    #[test]
    fn test_empty_document_is_default() {
        let config = MonitorConfig::from_toml_str("").unwrap();
        assert_eq!(config, MonitorConfig::default());
    }

    #[test]
    fn test_partial_document() {
        let config = MonitorConfig::from_toml_str(
            r#"
            [endpoint]
            base_url = "http://detector.local:8000"

            [poll]
            backoff = "exponential"
            max_interval_ms = 10000

            [capture]
            facing = "environment"
            mirrored = false

            [health]
            offline_after = 5
            "#,
        )
        .unwrap();

        assert_eq!(config.endpoint.base_url, "http://detector.local:8000");
        assert_eq!(config.endpoint.status_path, "/api/status");
        assert_eq!(config.capture.facing, FacingMode::Environment);
        assert!(!config.sink_config().mirrored);
        assert_eq!(config.health.degraded_after, 1);
        assert_eq!(config.health.offline_after, 5);
        assert_eq!(
            config.poller_config().backoff,
            BackoffPolicy::Exponential {
                multiplier: 2.0,
                max_interval: Duration::from_secs(10),
            }
        );
    }

    #[test]
    fn test_unknown_backoff_rejected() {
        let err = MonitorConfig::from_toml_str("[poll]\nbackoff = \"random\"").unwrap_err();
        assert!(matches!(err, MonitorError::Config { .. }));
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> = [
            (ENV_ENDPOINT, " http://10.0.0.7:5001 "),
            (ENV_POLL_INTERVAL_MS, "500"),
            (ENV_REQUEST_TIMEOUT_MS, "400"),
            (ENV_LOG, "debug"),
        ]
        .into_iter()
        .collect();

        let mut config = MonitorConfig::default();
        config
            .apply_overrides(|key| env.get(key).map(|value| value.to_string()))
            .unwrap();

        assert_eq!(config.endpoint.base_url, "http://10.0.0.7:5001");
        assert_eq!(config.poll.interval_ms, 500);
        assert_eq!(config.endpoint.request_timeout_ms, 400);
        assert_eq!(config.logging.filter, "debug");
    }

    #[test]
    fn test_bad_override_rejected() {
        let mut config = MonitorConfig::default();
        let err = config
            .apply_overrides(|key| (key == ENV_POLL_INTERVAL_MS).then(|| "2s".to_string()))
            .unwrap_err();
        assert!(err.to_string().contains(ENV_POLL_INTERVAL_MS));
        assert_eq!(config.poll.interval_ms, 2000);
    }

    #[test]
    fn test_validation() {
        let mut config = MonitorConfig::default();
        config.poll.interval_ms = 0;
        assert!(config.validate().is_err());

        let mut config = MonitorConfig::default();
        config.endpoint.request_timeout_ms = 0;
        assert!(config.validate().is_err());

        let mut config = MonitorConfig::default();
        config.capture.width = 0;
        assert!(matches!(config.validate(), Err(MonitorError::Media(_))));

        let mut config = MonitorConfig::default();
        config.capture.framerate = -1.0;
        assert!(config.validate().is_err());

        let mut config = MonitorConfig::default();
        config.endpoint.base_url = "detector".to_string();
        assert!(matches!(config.validate(), Err(MonitorError::Poll(_))));

        let mut config = MonitorConfig::default();
        config.poll.backoff = BackoffKind::Exponential;
        config.poll.backoff_multiplier = 0.5;
        assert!(config.validate().is_err());

        let mut config = MonitorConfig::default();
        config.logging.filter = "crimecatcher=loud".to_string();
        assert!(matches!(config.validate(), Err(MonitorError::Core(_))));
    }
}
