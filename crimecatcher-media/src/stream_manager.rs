//! Capture stream lifecycle
//!
//! The [`StreamManager`] acquires a device through its backend, attaches the stream
//! to a sink, and is the only component allowed to release it.

use crate::capture::{CaptureBackend, CaptureConstraints, CaptureTrack, TrackSettings};
use crate::error::{MediaError, MediaResult};
use crate::sink::{NullSink, SinkConfig, VideoSink};
use crate::tracks::VideoFrame;
use parking_lot::RwLock;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Opaque handle to an active capture stream
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CaptureHandle {
    id: u64,
    settings: TrackSettings,
}

impl CaptureHandle {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Settings the backend negotiated
    pub fn settings(&self) -> &TrackSettings {
        &self.settings
    }
}

/// Capture statistics
#[derive(Debug, Clone, Default, Serialize)]
pub struct CaptureStats {
    pub streams_started: u64,
    pub streams_stopped: u64,
    pub frames_rendered: u64,
    pub release_failures: u64,
}

struct ActiveStream {
    handle: CaptureHandle,
    device: String,
    tracks: Vec<Box<dyn CaptureTrack>>,
    forward_task: Option<JoinHandle<()>>,
}

/// Owner of the local capture stream
pub struct StreamManager {
    backend: Arc<dyn CaptureBackend>,
    constraints: CaptureConstraints,
    sink: Arc<dyn VideoSink>,
    sink_config: SinkConfig,
    active: Option<ActiveStream>,
    next_handle_id: u64,
    stats: Arc<RwLock<CaptureStats>>,
}

impl StreamManager {
    /// Create a manager with default constraints and a discarding sink
    pub fn new(backend: Arc<dyn CaptureBackend>) -> Self {
        Self {
            backend,
            constraints: CaptureConstraints::default(),
            sink: Arc::new(NullSink),
            sink_config: SinkConfig::default(),
            active: None,
            next_handle_id: 0,
            stats: Arc::new(RwLock::new(CaptureStats::default())),
        }
    }

    /// Set the constraints used for the next acquisition
    pub fn with_constraints(mut self, constraints: CaptureConstraints) -> Self {
        self.constraints = constraints;
        self
    }

    /// Set the sink streams are attached to
    pub fn with_sink(mut self, sink: Arc<dyn VideoSink>, config: SinkConfig) -> Self {
        self.sink = sink;
        self.sink_config = config;
        self
    }

    /// Acquire the capture device and attach it to the sink.
    ///
    /// Fails with [`MediaError::CaptureAlreadyActive`] if a stream is still held.
    pub async fn start(&mut self) -> MediaResult<CaptureHandle> {
        if let Some(active) = &self.active {
            return Err(MediaError::CaptureAlreadyActive {
                handle_id: active.handle.id,
            });
        }

        // Validate configuration
        self.constraints.validate()?;

        debug!(
            backend = self.backend.name(),
            requested = ?self.constraints.resolution,
            "Requesting capture device"
        );
        let acquired = self.backend.acquire(&self.constraints).await.map_err(|e| {
            warn!(backend = self.backend.name(), error = %e, "Capture acquisition failed");
            e
        })?;

        if acquired.settings.resolution != self.constraints.resolution {
            info!(
                requested = ?self.constraints.resolution,
                negotiated = ?acquired.settings.resolution,
                "Capture device substituted resolution"
            );
        }

        self.next_handle_id += 1;
        let handle = CaptureHandle {
            id: self.next_handle_id,
            settings: acquired.settings,
        };

        self.sink.attach(&handle, &self.sink_config);
        let forward_task = acquired.frames.map(|frames| self.spawn_forwarder(frames));

        info!(
            handle_id = handle.id,
            device = %acquired.device,
            tracks = acquired.tracks.len(),
            "Capture started"
        );
        self.stats.write().streams_started += 1;
        self.active = Some(ActiveStream {
            handle,
            device: acquired.device,
            tracks: acquired.tracks,
            forward_task,
        });

        Ok(handle)
    }

    /// Forward backend frames to the sink until the stream is released
    fn spawn_forwarder(&self, mut frames: mpsc::Receiver<VideoFrame>) -> JoinHandle<()> {
        let sink = self.sink.clone();
        let mirrored = self.sink_config.mirrored;
        let stats = self.stats.clone();

        tokio::spawn(async move {
            while let Some(mut frame) = frames.recv().await {
                if mirrored {
                    frame.mirror_horizontal();
                }
                sink.render(&frame);
                stats.write().frames_rendered += 1;
            }
        })
    }

    /// Release the stream behind `handle`.
    ///
    /// A `None`, stale, or already released handle is a no-op. Every track is
    /// stopped even if an earlier one fails; failures are reported afterwards.
    pub fn stop(&mut self, handle: Option<CaptureHandle>) -> MediaResult<()> {
        let Some(handle) = handle else {
            return Ok(());
        };

        match self.active.take() {
            Some(active) if active.handle.id == handle.id => self.release(active),
            other => {
                self.active = other;
                debug!(handle_id = handle.id, "Capture handle already released");
                Ok(())
            }
        }
    }

    fn release(&mut self, mut active: ActiveStream) -> MediaResult<()> {
        if let Some(task) = active.forward_task.take() {
            task.abort();
        }

        let mut failed = Vec::new();
        let mut first_reason = None;
        for track in active.tracks.iter_mut() {
            if let Err(e) = track.stop() {
                warn!(track_id = track.id(), error = %e, "Failed to stop capture track");
                failed.push(track.id().to_string());
                first_reason.get_or_insert_with(|| e.to_string());
            }
        }

        self.sink.detach();

        let mut stats = self.stats.write();
        stats.streams_stopped += 1;

        match first_reason {
            None => {
                info!(handle_id = active.handle.id, device = %active.device, "Capture stopped");
                Ok(())
            }
            Some(reason) => {
                stats.release_failures += 1;
                Err(MediaError::ReleaseFailed {
                    track_ids: failed,
                    reason,
                })
            }
        }
    }

    /// Handle of the active stream, if any
    pub fn active_handle(&self) -> Option<CaptureHandle> {
        self.active.as_ref().map(|active| active.handle)
    }

    /// Check if currently capturing
    pub fn is_capturing(&self) -> bool {
        self.active
            .as_ref()
            .map(|active| active.tracks.iter().any(|track| track.is_live()))
            .unwrap_or(false)
    }

    /// Get current statistics
    pub fn stats(&self) -> CaptureStats {
        self.stats.read().clone()
    }

    /// Constraints used for acquisition
    pub fn constraints(&self) -> &CaptureConstraints {
        &self.constraints
    }

    /// Presentation flags of the sink
    pub fn sink_config(&self) -> &SinkConfig {
        &self.sink_config
    }
}

impl Drop for StreamManager {
    fn drop(&mut self) {
        if let Some(active) = self.active.take() {
            warn!(
                handle_id = active.handle.id,
                "Stream manager dropped with an active stream, releasing"
            );
            let _ = self.release(active);
        }
    }
}
