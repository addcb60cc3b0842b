pub mod mock;
#[cfg(feature = "native")]
pub mod native;
pub mod unavailable;

pub use mock::MockCaptureBackend;
#[cfg(feature = "native")]
pub use native::NokhwaCaptureBackend;
pub use unavailable::UnavailableCaptureBackend;

use crate::error::{MediaError, MediaResult};
use crate::tracks::VideoFrame;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Video resolution information
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VideoResolution {
    pub width: u32,
    pub height: u32,
}

impl VideoResolution {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub const HD: Self = Self::new(1280, 720);
    pub const VGA: Self = Self::new(640, 480);

    pub fn pixel_count(&self) -> u32 {
        self.width * self.height
    }
}

/// Which way the requested camera should face
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FacingMode {
    /// Front-facing, towards the operator
    #[default]
    User,
    /// Rear-facing
    Environment,
}

/// What the stream manager asks a backend for.
///
/// Resolution and framerate are targets; a backend may substitute lower values
/// instead of failing.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureConstraints {
    pub resolution: VideoResolution,
    pub framerate: f64,
    pub facing: FacingMode,
    /// Frames buffered between the backend and the sink before dropping
    pub frame_buffer: usize,
}

impl Default for CaptureConstraints {
    fn default() -> Self {
        Self {
            resolution: VideoResolution::HD,
            framerate: 30.0,
            facing: FacingMode::User,
            frame_buffer: 3,
        }
    }
}

impl CaptureConstraints {
    /// Validate configuration
    pub fn validate(&self) -> MediaResult<()> {
        if self.resolution.width == 0 || self.resolution.height == 0 {
            return Err(MediaError::InvalidConfiguration {
                message: "Invalid resolution".to_string(),
            });
        }

        if self.framerate <= 0.0 || self.framerate > 120.0 {
            return Err(MediaError::InvalidConfiguration {
                message: "Invalid framerate".to_string(),
            });
        }

        if self.frame_buffer == 0 {
            return Err(MediaError::InvalidConfiguration {
                message: "Frame buffer must be > 0".to_string(),
            });
        }

        Ok(())
    }
}

/// Settings a backend actually negotiated
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrackSettings {
    pub resolution: VideoResolution,
    pub framerate: f64,
    pub facing: Option<FacingMode>,
}

/// One hardware track handed out by a backend.
///
/// The stream manager is the only owner; a track is stopped exactly once.
pub trait CaptureTrack: Send {
    fn id(&self) -> &str;
    fn is_live(&self) -> bool;
    fn stop(&mut self) -> MediaResult<()>;
}

/// Everything a backend produced for one acquisition
pub struct AcquiredStream {
    pub device: String,
    pub settings: TrackSettings,
    pub tracks: Vec<Box<dyn CaptureTrack>>,
    /// Decoded frames, if the backend produces any
    pub frames: Option<mpsc::Receiver<VideoFrame>>,
}

impl std::fmt::Debug for AcquiredStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AcquiredStream")
            .field("device", &self.device)
            .field("settings", &self.settings)
            .field("tracks", &self.tracks.len())
            .field("frames", &self.frames.is_some())
            .finish()
    }
}

/// Capability to acquire a local capture device.
///
/// Denial or absence of hardware is reported as [`MediaError::DeviceUnavailable`].
#[async_trait]
pub trait CaptureBackend: Send + Sync {
    fn name(&self) -> &str;
    async fn acquire(&self, constraints: &CaptureConstraints) -> MediaResult<AcquiredStream>;
}

/// Get the capture backend compiled into this build
pub fn default_backend() -> Arc<dyn CaptureBackend> {
    #[cfg(feature = "native")]
    {
        Arc::new(NokhwaCaptureBackend::new(0))
    }
    #[cfg(not(feature = "native"))]
    {
        Arc::new(UnavailableCaptureBackend::new(
            "no native capture backend compiled in",
        ))
    }
}

/// Budget of consecutive frame grab failures for a capture thread.
///
/// Each failure asks for a short pause before the next grab; once the budget is
/// spent the thread should give up on the device.
#[cfg_attr(not(feature = "native"), allow(dead_code))]
#[derive(Debug)]
pub(crate) struct GrabFailures {
    consecutive: u32,
    limit: u32,
    pause: Duration,
}

#[cfg_attr(not(feature = "native"), allow(dead_code))]
impl GrabFailures {
    pub(crate) const DEFAULT_LIMIT: u32 = 50;
    pub(crate) const DEFAULT_PAUSE: Duration = Duration::from_millis(20);

    pub(crate) fn new(limit: u32, pause: Duration) -> Self {
        Self {
            consecutive: 0,
            limit,
            pause,
        }
    }

    /// Record a failed grab. Returns the pause before retrying, or `None` once
    /// `limit` failures have happened in a row.
    pub(crate) fn record_failure(&mut self) -> Option<Duration> {
        self.consecutive = self.consecutive.saturating_add(1);
        (self.consecutive < self.limit).then_some(self.pause)
    }

    pub(crate) fn record_success(&mut self) {
        self.consecutive = 0;
    }

    pub(crate) fn consecutive(&self) -> u32 {
        self.consecutive
    }
}

impl Default for GrabFailures {
    fn default() -> Self {
        Self::new(Self::DEFAULT_LIMIT, Self::DEFAULT_PAUSE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_constraints() {
        let constraints = CaptureConstraints::default();
        assert_eq!(constraints.resolution, VideoResolution::new(1280, 720));
        assert_eq!(constraints.framerate, 30.0);
        assert_eq!(constraints.facing, FacingMode::User);
        assert!(constraints.validate().is_ok());
    }

    #[test]
    fn test_invalid_constraints() {
        let zero = CaptureConstraints {
            resolution: VideoResolution::new(0, 720),
            ..CaptureConstraints::default()
        };
        assert!(matches!(
            zero.validate(),
            Err(MediaError::InvalidConfiguration { .. })
        ));

        let fast = CaptureConstraints {
            framerate: 240.0,
            ..CaptureConstraints::default()
        };
        assert!(fast.validate().is_err());
    }

    #[test]
    fn test_grab_failures_pause_then_give_up() {
        let mut failures = GrabFailures::new(3, Duration::from_millis(5));

        assert_eq!(failures.record_failure(), Some(Duration::from_millis(5)));
        assert_eq!(failures.record_failure(), Some(Duration::from_millis(5)));
        assert_eq!(failures.record_failure(), None);
        assert_eq!(failures.consecutive(), 3);
    }

    #[test]
    fn test_grab_success_resets_budget() {
        let mut failures = GrabFailures::new(2, Duration::from_millis(5));

        assert!(failures.record_failure().is_some());
        failures.record_success();
        assert_eq!(failures.consecutive(), 0);

        // A fresh run of failures gets the full budget again
        assert!(failures.record_failure().is_some());
        assert!(failures.record_failure().is_none());
    }
}
