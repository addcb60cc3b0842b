//! Error types for the CrimeCatcher core

use thiserror::Error;

/// Main error type for core model operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    /// Initialization error
    #[error("Initialization failed: {reason}")]
    Initialization {
        /// Reason for initialization failure
        reason: String,
    },

    /// Invalid configuration value
    #[error("Invalid configuration: {message}")]
    InvalidConfiguration {
        /// Error message
        message: String,
    },

    /// A timestamp could not be read as an instant
    #[error("Invalid timestamp: {value}")]
    InvalidTimestamp {
        /// The offending raw value
        value: String,
    },
}

/// Result type alias for core operations
pub type CoreResult<T> = Result<T, CoreError>;
