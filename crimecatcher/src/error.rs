//! Monitor error type

use crimecatcher_core::CoreError;
use crimecatcher_media::MediaError;
use crimecatcher_poller::PollError;
use thiserror::Error;

/// Error surfaced by the monitor facade
#[derive(Error, Debug)]
pub enum MonitorError {
    /// Configuration could not be read or is invalid
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// Reading a configuration file failed
    #[error("I/O error: {source}")]
    Io {
        /// Underlying error
        #[from]
        source: std::io::Error,
    },

    /// Core model error
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Capture error
    #[error(transparent)]
    Media(#[from] MediaError),

    /// Polling error
    #[error(transparent)]
    Poll(#[from] PollError),

    /// Operation not allowed in the current view phase
    #[error("Invalid state: expected {expected}, got {actual}")]
    InvalidState {
        /// Phase the operation requires
        expected: String,
        /// Phase the view is in
        actual: String,
    },
}

/// Result type alias for monitor operations
pub type MonitorResult<T> = Result<T, MonitorError>;

impl MonitorError {
    pub(crate) fn config(message: impl Into<String>) -> Self {
        MonitorError::Config {
            message: message.into(),
        }
    }
}
