//! Mock capture backend for testing and headless hosts

use super::{
    AcquiredStream, CaptureBackend, CaptureConstraints, CaptureTrack, TrackSettings,
    VideoResolution,
};
use crate::error::{MediaError, MediaResult};
use crate::tracks::VideoFrame;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::debug;

/// Availability the mock device reports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Availability {
    Available,
    Denied,
    Absent,
}

#[derive(Debug, Clone)]
struct MockSettings {
    availability: Availability,
    max_resolution: Option<VideoResolution>,
    track_count: usize,
    failing_track: Option<usize>,
    frames: u64,
    acquire_delay: Duration,
}

#[derive(Debug)]
struct MockDevice {
    settings: Mutex<MockSettings>,
    live_tracks: AtomicUsize,
    acquisitions: AtomicUsize,
    releases: AtomicUsize,
}

/// Deterministic capture device.
///
/// Clones share the same device, so a test can keep one clone to observe how many
/// tracks are still live after handing the other to a stream manager.
#[derive(Debug, Clone)]
pub struct MockCaptureBackend {
    device: Arc<MockDevice>,
}

impl MockCaptureBackend {
    /// An available device producing one video track and no frames
    pub fn new() -> Self {
        Self {
            device: Arc::new(MockDevice {
                settings: Mutex::new(MockSettings {
                    availability: Availability::Available,
                    max_resolution: None,
                    track_count: 1,
                    failing_track: None,
                    frames: 0,
                    acquire_delay: Duration::ZERO,
                }),
                live_tracks: AtomicUsize::new(0),
                acquisitions: AtomicUsize::new(0),
                releases: AtomicUsize::new(0),
            }),
        }
    }

    fn configure(self, apply: impl FnOnce(&mut MockSettings)) -> Self {
        apply(&mut self.device.settings.lock());
        self
    }

    /// Operator denied camera permission
    pub fn denied(self) -> Self {
        self.configure(|s| s.availability = Availability::Denied)
    }

    /// No camera attached
    pub fn absent(self) -> Self {
        self.configure(|s| s.availability = Availability::Absent)
    }

    /// Cap the resolution the device can deliver
    pub fn with_max_resolution(self, resolution: VideoResolution) -> Self {
        self.configure(|s| s.max_resolution = Some(resolution))
    }

    /// Number of tracks each acquisition hands out
    pub fn with_tracks(self, count: usize) -> Self {
        self.configure(|s| s.track_count = count)
    }

    /// Make the track at `index` fail when stopped
    pub fn with_failing_track(self, index: usize) -> Self {
        self.configure(|s| s.failing_track = Some(index))
    }

    /// Emit `count` synthetic frames after acquisition
    pub fn with_frames(self, count: u64) -> Self {
        self.configure(|s| s.frames = count)
    }

    /// Suspend acquisition for `delay`
    pub fn with_acquire_delay(self, delay: Duration) -> Self {
        self.configure(|s| s.acquire_delay = delay)
    }

    /// Flip availability at runtime, e.g. after permission is granted
    pub fn set_available(&self, available: bool) {
        self.device.settings.lock().availability = if available {
            Availability::Available
        } else {
            Availability::Absent
        };
    }

    /// Tracks acquired and not yet stopped
    pub fn live_tracks(&self) -> usize {
        self.device.live_tracks.load(Ordering::SeqCst)
    }

    /// Successful acquisitions so far
    pub fn acquisitions(&self) -> usize {
        self.device.acquisitions.load(Ordering::SeqCst)
    }

    /// Tracks stopped successfully so far
    pub fn releases(&self) -> usize {
        self.device.releases.load(Ordering::SeqCst)
    }
}

impl Default for MockCaptureBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CaptureBackend for MockCaptureBackend {
    fn name(&self) -> &str {
        "mock"
    }

    async fn acquire(&self, constraints: &CaptureConstraints) -> MediaResult<AcquiredStream> {
        let delay = self.device.settings.lock().acquire_delay;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let settings = self.device.settings.lock().clone();
        match settings.availability {
            Availability::Denied => {
                return Err(MediaError::DeviceUnavailable {
                    reason: "permission denied".to_string(),
                })
            }
            Availability::Absent => {
                return Err(MediaError::DeviceUnavailable {
                    reason: "no capture device found".to_string(),
                })
            }
            Availability::Available => {}
        }

        let resolution = match settings.max_resolution {
            Some(max) if max.pixel_count() < constraints.resolution.pixel_count() => max,
            _ => constraints.resolution,
        };
        let negotiated = TrackSettings {
            resolution,
            framerate: constraints.framerate,
            facing: Some(constraints.facing),
        };

        let tracks: Vec<Box<dyn CaptureTrack>> = (0..settings.track_count)
            .map(|index| {
                self.device.live_tracks.fetch_add(1, Ordering::SeqCst);
                Box::new(MockTrack {
                    id: format!("mock-video-{}", uuid::Uuid::new_v4()),
                    live: true,
                    fails_on_stop: settings.failing_track == Some(index),
                    device: self.device.clone(),
                }) as Box<dyn CaptureTrack>
            })
            .collect();

        let frames = if settings.frames > 0 {
            let (tx, rx) = mpsc::channel(settings.frames as usize);
            for sequence in 0..settings.frames {
                let _ = tx.try_send(synthetic_frame(sequence));
            }
            Some(rx)
        } else {
            None
        };

        self.device.acquisitions.fetch_add(1, Ordering::SeqCst);
        debug!(tracks = tracks.len(), ?resolution, "Mock device acquired");

        Ok(AcquiredStream {
            device: "Mock Camera".to_string(),
            settings: negotiated,
            tracks,
            frames,
        })
    }
}

/// 2x1 frame whose left pixel is darker than its right
fn synthetic_frame(sequence: u64) -> VideoFrame {
    VideoFrame {
        width: 2,
        height: 1,
        data: vec![0, 0, 0, 255, 255, 255],
        timestamp: sequence * 33,
        sequence,
    }
}

struct MockTrack {
    id: String,
    live: bool,
    fails_on_stop: bool,
    device: Arc<MockDevice>,
}

impl CaptureTrack for MockTrack {
    fn id(&self) -> &str {
        &self.id
    }

    fn is_live(&self) -> bool {
        self.live
    }

    fn stop(&mut self) -> MediaResult<()> {
        if !self.live {
            return Ok(());
        }
        if self.fails_on_stop {
            return Err(MediaError::Backend {
                backend: "mock".to_string(),
                message: "track refused to stop".to_string(),
            });
        }

        self.live = false;
        self.device.live_tracks.fetch_sub(1, Ordering::SeqCst);
        self.device.releases.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
