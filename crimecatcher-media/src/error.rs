//! Media error types and handling
//!
//! This module defines the error types used by capture backends and the stream
//! manager.

use thiserror::Error;

/// Main error type for capture operations
#[derive(Error, Debug)]
pub enum MediaError {
    /// I/O operation failed
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// Invalid configuration provided
    #[error("Invalid configuration: {message}")]
    InvalidConfiguration {
        /// Error message
        message: String,
    },

    /// Capture device denied or absent
    #[error("Capture device unavailable: {reason}")]
    DeviceUnavailable {
        /// Why the device could not be acquired
        reason: String,
    },

    /// A stream is already active on this manager
    #[error("Capture already active (handle {handle_id})")]
    CaptureAlreadyActive {
        /// Handle of the stream still held
        handle_id: u64,
    },

    /// One or more tracks failed to stop
    #[error("Failed to release tracks {track_ids:?}: {reason}")]
    ReleaseFailed {
        /// Tracks that reported an error on stop
        track_ids: Vec<String>,
        /// First failure reason
        reason: String,
    },

    /// Error surfaced by a capture backend library
    #[error("Backend error: {backend} - {message}")]
    Backend {
        /// Backend name
        backend: String,
        /// Error message
        message: String,
    },
}

/// Result type alias for media operations
pub type MediaResult<T> = Result<T, MediaError>;

impl MediaError {
    /// Check if error is recoverable
    pub fn is_recoverable(&self) -> bool {
        match self {
            MediaError::Io { .. } => true,
            MediaError::DeviceUnavailable { .. } => true,
            MediaError::CaptureAlreadyActive { .. } => true,
            MediaError::InvalidConfiguration { .. } => false,
            MediaError::ReleaseFailed { .. } => false,
            MediaError::Backend { .. } => false,
        }
    }

    /// Get error category
    pub fn category(&self) -> ErrorCategory {
        match self {
            MediaError::Io { .. } => ErrorCategory::System,
            MediaError::InvalidConfiguration { .. } => ErrorCategory::Configuration,
            MediaError::DeviceUnavailable { .. } => ErrorCategory::Device,
            MediaError::CaptureAlreadyActive { .. } => ErrorCategory::State,
            MediaError::ReleaseFailed { .. } => ErrorCategory::Device,
            MediaError::Backend { .. } => ErrorCategory::System,
        }
    }
}

/// Error categories for classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// System-level errors (I/O, native libraries)
    System,
    /// Configuration and parameter errors
    Configuration,
    /// Device and hardware errors
    Device,
    /// State management errors
    State,
}
