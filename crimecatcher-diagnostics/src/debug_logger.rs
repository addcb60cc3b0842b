//! Structured logging setup

use crimecatcher_core::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// `EnvFilter` directives used when `RUST_LOG` is not set
    pub filter: String,
    /// Colorize terminal output
    pub ansi: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            ansi: true,
        }
    }
}

/// Parse filter directives such as `info,crimecatcher_poller=debug`
pub fn parse_filter(directives: &str) -> CoreResult<EnvFilter> {
    EnvFilter::try_new(directives).map_err(|e| CoreError::InvalidConfiguration {
        message: format!("invalid log filter {directives:?}: {e}"),
    })
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins over the configured filter. Fails if a subscriber is already
/// installed.
pub fn init_logging(config: &LogConfig) -> CoreResult<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => parse_filter(&config.filter)?,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_ansi(config.ansi).with_target(true))
        .try_init()
        .map_err(|e| CoreError::Initialization {
            reason: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LogConfig::default();
        assert_eq!(config.filter, "info");
        assert!(config.ansi);
    }

    #[test]
    fn test_parse_filter() {
        assert!(parse_filter("info,crimecatcher_poller=debug").is_ok());

        let err = parse_filter("crimecatcher=loud").unwrap_err();
        assert!(matches!(err, CoreError::InvalidConfiguration { .. }));
    }
}
