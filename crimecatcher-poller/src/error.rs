//! Polling error types
//!
//! A failed poll never changes monitor state; these errors are only logged and
//! handed to the poller's error callback.

use std::time::Duration;
use thiserror::Error;

/// Error produced by a single poll
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PollError {
    /// Connection, DNS or body transfer failure
    #[error("Transport error: {reason}")]
    Transport {
        /// Underlying failure
        reason: String,
    },

    /// The backend answered with a non-success status code
    #[error("Backend returned HTTP {code}")]
    HttpStatus {
        /// HTTP status code
        code: u16,
    },

    /// The request did not complete within the per-request timeout
    #[error("Request timed out after {duration:?}")]
    Timeout {
        /// Timeout that elapsed
        duration: Duration,
    },

    /// The response body is not a valid status payload
    #[error("Failed to decode status payload: {reason}")]
    Decode {
        /// Decoder message
        reason: String,
    },

    /// Invalid poller or source configuration
    #[error("Invalid configuration: {message}")]
    InvalidConfiguration {
        /// Error message
        message: String,
    },
}

/// Result type alias for polling operations
pub type PollResult<T> = Result<T, PollError>;

impl PollError {
    /// Network-level failure, including non-2xx and timeouts
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            PollError::Transport { .. } | PollError::HttpStatus { .. } | PollError::Timeout { .. }
        )
    }

    /// Malformed response body
    pub fn is_decode(&self) -> bool {
        matches!(self, PollError::Decode { .. })
    }

    /// Check if the next poll may succeed
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, PollError::InvalidConfiguration { .. })
    }
}
