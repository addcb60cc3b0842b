//! Renderable sinks the capture stream is attached to

use crate::stream_manager::CaptureHandle;
use crate::tracks::VideoFrame;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// How the preview is presented
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SinkConfig {
    /// Flip frames left-to-right, as a front camera preview expects
    pub mirrored: bool,
    /// Never play captured audio back
    pub muted: bool,
    /// Start presenting as soon as frames arrive
    pub autoplay: bool,
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            mirrored: true,
            muted: true,
            autoplay: true,
        }
    }
}

/// Destination for a live capture stream
pub trait VideoSink: Send + Sync {
    /// A stream was acquired and is about to produce frames
    fn attach(&self, handle: &CaptureHandle, config: &SinkConfig);
    /// Present one frame
    fn render(&self, frame: &VideoFrame);
    /// The stream was released
    fn detach(&self);
}

/// Sink that discards frames
#[derive(Debug, Default)]
pub struct NullSink;

impl VideoSink for NullSink {
    fn attach(&self, handle: &CaptureHandle, config: &SinkConfig) {
        debug!(handle_id = handle.id(), ?config, "Null sink attached");
    }

    fn render(&self, _frame: &VideoFrame) {}

    fn detach(&self) {
        debug!("Null sink detached");
    }
}

#[derive(Debug, Default)]
struct LatestFrameState {
    attached: Option<(CaptureHandle, SinkConfig)>,
    latest: Option<VideoFrame>,
    rendered: u64,
}

/// Sink that keeps the most recent frame for whoever draws the preview
#[derive(Debug, Default)]
pub struct LatestFrameSink {
    state: RwLock<LatestFrameState>,
}

impl LatestFrameSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle currently attached, if any
    pub fn attached(&self) -> Option<CaptureHandle> {
        self.state.read().attached.map(|(handle, _)| handle)
    }

    /// Presentation flags of the attached stream
    pub fn config(&self) -> Option<SinkConfig> {
        self.state.read().attached.map(|(_, config)| config)
    }

    /// Most recent frame rendered while attached
    pub fn latest_frame(&self) -> Option<VideoFrame> {
        self.state.read().latest.clone()
    }

    /// Frames rendered since creation
    pub fn frames_rendered(&self) -> u64 {
        self.state.read().rendered
    }
}

impl VideoSink for LatestFrameSink {
    fn attach(&self, handle: &CaptureHandle, config: &SinkConfig) {
        let mut state = self.state.write();
        state.attached = Some((*handle, *config));
        state.latest = None;
    }

    fn render(&self, frame: &VideoFrame) {
        let mut state = self.state.write();
        if state.attached.is_some() {
            state.latest = Some(frame.clone());
            state.rendered += 1;
        }
    }

    fn detach(&self) {
        let mut state = self.state.write();
        state.attached = None;
        state.latest = None;
    }
}
