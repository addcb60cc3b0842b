//! Native camera capture through nokhwa
//!
//! nokhwa cameras are not `Send`, so each acquisition opens the camera on its own
//! capture thread and hands decoded frames back over a bounded channel. Frames are
//! dropped, not queued, when the sink falls behind.

use super::{
    AcquiredStream, CaptureBackend, CaptureConstraints, CaptureTrack, GrabFailures,
    TrackSettings, VideoResolution,
};
use crate::error::{MediaError, MediaResult};
use crate::tracks::VideoFrame;
use async_trait::async_trait;
use nokhwa::pixel_format::RgbFormat;
use nokhwa::utils::{
    CameraFormat, CameraIndex, FrameFormat, RequestedFormat, RequestedFormatType, Resolution,
};
use nokhwa::Camera;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

/// Capture backend for the host's camera at a given index
#[derive(Debug, Clone)]
pub struct NokhwaCaptureBackend {
    index: u32,
}

impl NokhwaCaptureBackend {
    pub fn new(index: u32) -> Self {
        Self { index }
    }
}

struct Opened {
    device: String,
    settings: TrackSettings,
}

#[async_trait]
impl CaptureBackend for NokhwaCaptureBackend {
    fn name(&self) -> &str {
        "nokhwa"
    }

    async fn acquire(&self, constraints: &CaptureConstraints) -> MediaResult<AcquiredStream> {
        let (frame_tx, frame_rx) = mpsc::channel(constraints.frame_buffer);
        let (ready_tx, ready_rx) = oneshot::channel::<MediaResult<Opened>>();
        let running = Arc::new(AtomicBool::new(true));

        let index = self.index;
        let requested = constraints.clone();
        let thread_running = running.clone();
        let thread = std::thread::Builder::new()
            .name(format!("crimecatcher-capture-{index}"))
            .spawn(move || capture_loop(index, requested, frame_tx, ready_tx, thread_running))?;

        let opened = match ready_rx.await {
            Ok(result) => result?,
            Err(_) => {
                return Err(MediaError::DeviceUnavailable {
                    reason: "capture thread exited before opening the device".to_string(),
                })
            }
        };

        info!(device = %opened.device, settings = ?opened.settings, "Camera opened");

        let track = NokhwaTrack {
            id: format!("nokhwa-{index}-{}", uuid::Uuid::new_v4()),
            running,
            thread: Some(thread),
        };

        Ok(AcquiredStream {
            device: opened.device,
            settings: opened.settings,
            tracks: vec![Box::new(track)],
            frames: Some(frame_rx),
        })
    }
}

fn capture_loop(
    index: u32,
    constraints: CaptureConstraints,
    frames: mpsc::Sender<VideoFrame>,
    ready: oneshot::Sender<MediaResult<Opened>>,
    running: Arc<AtomicBool>,
) {
    let target = CameraFormat::new(
        Resolution::new(constraints.resolution.width, constraints.resolution.height),
        FrameFormat::MJPEG,
        constraints.framerate.round() as u32,
    );
    let requested = RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(target));

    let mut camera = match Camera::new(CameraIndex::Index(index), requested) {
        Ok(camera) => camera,
        Err(e) => {
            let _ = ready.send(Err(MediaError::DeviceUnavailable {
                reason: e.to_string(),
            }));
            return;
        }
    };

    if let Err(e) = camera.open_stream() {
        let _ = ready.send(Err(MediaError::DeviceUnavailable {
            reason: e.to_string(),
        }));
        return;
    }

    let resolution = camera.resolution();
    let opened = Opened {
        device: camera.info().human_name(),
        settings: TrackSettings {
            resolution: VideoResolution::new(resolution.width(), resolution.height()),
            framerate: f64::from(camera.frame_rate()),
            // nokhwa does not report facing
            facing: None,
        },
    };
    if ready.send(Ok(opened)).is_err() {
        let _ = camera.stop_stream();
        return;
    }

    let mut sequence = 0u64;
    let mut dropped = 0u64;
    let mut failures = GrabFailures::default();
    while running.load(Ordering::Acquire) {
        let buffer = match camera.frame() {
            Ok(buffer) => {
                failures.record_success();
                buffer
            }
            Err(e) => match failures.record_failure() {
                Some(pause) => {
                    debug!(
                        error = %e,
                        consecutive = failures.consecutive(),
                        "Failed to grab frame"
                    );
                    std::thread::sleep(pause);
                    continue;
                }
                None => {
                    warn!(
                        error = %e,
                        consecutive = failures.consecutive(),
                        "Camera stopped producing frames, ending capture"
                    );
                    break;
                }
            },
        };
        let image = match buffer.decode_image::<RgbFormat>() {
            Ok(image) => image,
            Err(e) => {
                debug!(error = %e, "Failed to decode frame");
                continue;
            }
        };

        let frame = VideoFrame {
            width: image.width(),
            height: image.height(),
            data: image.into_raw(),
            timestamp: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default()
                .as_millis() as u64,
            sequence,
        };
        sequence += 1;

        match frames.try_send(frame) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => dropped += 1,
            Err(mpsc::error::TrySendError::Closed(_)) => break,
        }
    }

    if let Err(e) = camera.stop_stream() {
        warn!(error = %e, "Failed to stop camera stream");
    }
    debug!(frames = sequence, dropped, "Capture thread exiting");
}

struct NokhwaTrack {
    id: String,
    running: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl CaptureTrack for NokhwaTrack {
    fn id(&self) -> &str {
        &self.id
    }

    fn is_live(&self) -> bool {
        self.thread.is_some()
    }

    fn stop(&mut self) -> MediaResult<()> {
        let Some(thread) = self.thread.take() else {
            return Ok(());
        };

        self.running.store(false, Ordering::Release);
        thread.join().map_err(|_| MediaError::Backend {
            backend: "nokhwa".to_string(),
            message: "capture thread panicked".to_string(),
        })
    }
}

impl Drop for NokhwaTrack {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}
