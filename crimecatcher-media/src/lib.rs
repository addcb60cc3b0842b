//! # CrimeCatcher Media
//!
//! Local camera capture for the monitor view. Capture hardware is reached through an
//! injected [`CaptureBackend`]; the [`StreamManager`] owns whatever the backend hands
//! out, forwards frames to a [`VideoSink`], and releases every track on stop.

#![warn(clippy::all)]

pub mod capture;
pub mod error;
pub mod sink;
pub mod stream_manager;
pub mod tracks;

// Re-export main types
pub use capture::{
    default_backend, AcquiredStream, CaptureBackend, CaptureConstraints, CaptureTrack,
    FacingMode, MockCaptureBackend, TrackSettings, UnavailableCaptureBackend, VideoResolution,
};
#[cfg(feature = "native")]
pub use capture::NokhwaCaptureBackend;
pub use error::{ErrorCategory, MediaError, MediaResult};
pub use sink::{LatestFrameSink, NullSink, SinkConfig, VideoSink};
pub use stream_manager::{CaptureHandle, CaptureStats, StreamManager};
pub use tracks::VideoFrame;
