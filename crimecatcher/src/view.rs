//! Monitor view lifecycle
//!
//! A [`MonitorView`] ties the status poller, the state reducer and the camera stream
//! together. Mounting starts polling and capture independently; unmounting stops both,
//! always, whichever of them fails.

use crate::config::MonitorConfig;
use crate::error::{MonitorError, MonitorResult};
use crate::event::{EventBus, EventStream, MonitorEvent};
use crate::render::{RenderModel, VideoPanel};
use crimecatcher_core::{Incident, MonitorState, StateReducer};
use crimecatcher_diagnostics::{assess, BackendHealth, HealthReport};
use crimecatcher_media::{
    default_backend, CaptureBackend, CaptureHandle, CaptureStats, MediaError, NullSink,
    StreamManager, VideoSink,
};
use crimecatcher_poller::{CancelToken, PollError, PollStats, StatusPoller, StatusSource};
use parking_lot::RwLock;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};

/// Lifecycle phase of a view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewPhase {
    /// Nothing running
    Unmounted,
    /// Polling started, capture being acquired
    Mounting,
    /// Polling and rendering
    Active,
    /// Teardown in progress
    Unmounting,
}

impl fmt::Display for ViewPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ViewPhase::Unmounted => "unmounted",
            ViewPhase::Mounting => "mounting",
            ViewPhase::Active => "active",
            ViewPhase::Unmounting => "unmounting",
        };
        f.write_str(name)
    }
}

/// Outcome of an unmount.
///
/// Both teardown steps run regardless of each other.
#[derive(Debug, Default)]
pub struct TeardownReport {
    /// A running poll loop was cancelled
    pub poller_cancelled: bool,
    /// An active capture stream was released cleanly
    pub capture_released: bool,
    /// Release failure, if any track could not be stopped
    pub capture_error: Option<MediaError>,
}

impl TeardownReport {
    /// Check if every step succeeded
    pub fn is_clean(&self) -> bool {
        self.capture_error.is_none()
    }
}

#[derive(Debug, Clone)]
enum CaptureState {
    Pending,
    Live(CaptureHandle),
    Unavailable { notice: String },
}

/// Fluent builder for a monitor view
pub struct MonitorViewBuilder {
    config: MonitorConfig,
    source: Option<Arc<dyn StatusSource>>,
    capture_backend: Option<Arc<dyn CaptureBackend>>,
    sink: Option<Arc<dyn VideoSink>>,
}

impl MonitorViewBuilder {
    /// Start from `config`
    pub fn new(config: MonitorConfig) -> Self {
        Self {
            config,
            source: None,
            capture_backend: None,
            sink: None,
        }
    }

    /// Poll `source` instead of the configured HTTP endpoint
    pub fn source(mut self, source: Arc<dyn StatusSource>) -> Self {
        self.source = Some(source);
        self
    }

    /// Acquire the camera through `backend`
    pub fn capture_backend(mut self, backend: Arc<dyn CaptureBackend>) -> Self {
        self.capture_backend = Some(backend);
        self
    }

    /// Send preview frames to `sink`
    pub fn sink(mut self, sink: Arc<dyn VideoSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Validate the configuration and assemble the view
    pub fn build(self) -> MonitorResult<MonitorView> {
        self.config.validate()?;

        let source: Arc<dyn StatusSource> = match self.source {
            Some(source) => source,
            None => Arc::new(self.config.http_source()?),
        };
        let backend = self.capture_backend.unwrap_or_else(default_backend);
        let sink: Arc<dyn VideoSink> = self.sink.unwrap_or_else(|| Arc::new(NullSink));

        let poller = StatusPoller::new(source, self.config.poller_config())?;
        let streams = StreamManager::new(backend)
            .with_constraints(self.config.capture_constraints())
            .with_sink(sink, self.config.sink_config());
        let reducer = StateReducer::with_incident_capacity(self.config.incidents.capacity);

        Ok(MonitorView {
            config: self.config,
            reducer: Arc::new(RwLock::new(reducer)),
            streams,
            poller,
            poll_token: None,
            capture: CaptureState::Pending,
            phase: ViewPhase::Unmounted,
            events: EventBus::default(),
        })
    }
}

/// Live monitor: polls the backend, shows the camera, renders the current threat status
pub struct MonitorView {
    config: MonitorConfig,
    reducer: Arc<RwLock<StateReducer>>,
    streams: StreamManager,
    poller: StatusPoller,
    poll_token: Option<CancelToken>,
    capture: CaptureState,
    phase: ViewPhase,
    events: EventBus,
}

impl MonitorView {
    /// Create a builder from `config`
    pub fn builder(config: MonitorConfig) -> MonitorViewBuilder {
        MonitorViewBuilder::new(config)
    }

    /// Start polling and acquire the camera.
    ///
    /// Polling starts first and keeps running if the camera is unavailable; that
    /// failure only shows up as a notice in the video panel. State starts over from
    /// secure on every mount. Must be called within a Tokio runtime.
    pub async fn mount(&mut self) -> MonitorResult<()> {
        self.expect_phase(ViewPhase::Unmounted)?;
        self.phase = ViewPhase::Mounting;

        let capacity = self.config.incidents.capacity;
        *self.reducer.write() = StateReducer::with_incident_capacity(capacity);
        self.capture = CaptureState::Pending;

        let reducer = self.reducer.clone();
        let payload_events = self.events.clone();
        let error_events = self.events.clone();
        let token = self.poller.start(
            move |payload| {
                let changes = reducer.write().apply_payload(payload);
                for change in changes {
                    payload_events.emit(change.into());
                }
            },
            move |error: &PollError| {
                error_events.emit(MonitorEvent::PollFailed {
                    error: error.to_string(),
                    transport: error.is_transport(),
                });
            },
        );
        self.poll_token = Some(token);

        self.start_capture().await;

        self.phase = ViewPhase::Active;
        info!(capture = ?self.capture, "Monitor view mounted");
        self.events.emit(MonitorEvent::Mounted);
        Ok(())
    }

    /// Try the camera again after it was unavailable.
    ///
    /// Returns whether a stream is live afterwards. A live stream is left alone.
    pub async fn retry_capture(&mut self) -> MonitorResult<bool> {
        self.expect_phase(ViewPhase::Active)?;

        if !matches!(self.capture, CaptureState::Live(_)) {
            self.start_capture().await;
        }
        Ok(matches!(self.capture, CaptureState::Live(_)))
    }

    async fn start_capture(&mut self) {
        match self.streams.start().await {
            Ok(handle) => {
                self.capture = CaptureState::Live(handle);
                self.events.emit(MonitorEvent::CaptureStarted {
                    handle_id: handle.id(),
                    settings: *handle.settings(),
                });
            }
            Err(e) => {
                warn!(error = %e, "Camera unavailable, monitoring continues without preview");
                self.capture = CaptureState::Unavailable {
                    notice: e.to_string(),
                };
                self.events.emit(MonitorEvent::CaptureUnavailable {
                    reason: e.to_string(),
                });
            }
        }
    }

    /// Stop polling and release the camera.
    ///
    /// Both steps always run. No poll result is applied once this returns. Calling it
    /// on an unmounted view does nothing.
    pub fn unmount(&mut self) -> TeardownReport {
        if self.phase == ViewPhase::Unmounted {
            return TeardownReport::default();
        }
        self.phase = ViewPhase::Unmounting;

        let mut report = TeardownReport::default();

        if let Some(token) = self.poll_token.take() {
            self.poller.cancel(&token);
            report.poller_cancelled = true;
        }

        // The manager's own handle also covers a mount abandoned mid-acquire
        let handle = self.streams.active_handle();
        match self.streams.stop(handle) {
            Ok(()) => report.capture_released = handle.is_some(),
            Err(e) => {
                warn!(error = %e, "Camera release failed during unmount");
                self.events.emit(MonitorEvent::TeardownError {
                    component: "capture",
                    error: e.to_string(),
                });
                report.capture_error = Some(e);
            }
        }
        self.capture = CaptureState::Pending;

        self.phase = ViewPhase::Unmounted;
        info!(
            poller_cancelled = report.poller_cancelled,
            capture_released = report.capture_released,
            "Monitor view unmounted"
        );
        self.events.emit(MonitorEvent::Unmounted);
        report
    }

    /// Build the render model; `None` unless the view is active
    pub fn render(&self) -> Option<RenderModel> {
        if self.phase != ViewPhase::Active {
            return None;
        }

        let video = match &self.capture {
            CaptureState::Pending => VideoPanel::Pending,
            CaptureState::Live(handle) => {
                VideoPanel::live(handle.settings(), self.streams.sink_config())
            }
            CaptureState::Unavailable { notice } => VideoPanel::Unavailable {
                notice: notice.clone(),
            },
        };
        let backend = HealthReport::from_stats(&self.poller.stats(), &self.config.health);

        let reducer = self.reducer.read();
        Some(RenderModel::build(
            reducer.state(),
            reducer.incidents(),
            video,
            backend,
            reducer.revision(),
        ))
    }

    /// Subscribe to view events
    pub fn subscribe(&self) -> EventStream {
        self.events.subscribe()
    }

    /// Copy of the current status and alert
    pub fn snapshot(&self) -> MonitorState {
        self.reducer.read().snapshot()
    }

    /// Incident history, newest first
    pub fn incidents(&self) -> Vec<Incident> {
        self.reducer.read().incidents().iter().cloned().collect()
    }

    /// Number of state changes since the last mount
    pub fn revision(&self) -> u64 {
        self.reducer.read().revision()
    }

    /// Current lifecycle phase
    pub fn phase(&self) -> ViewPhase {
        self.phase
    }

    /// Poll loop statistics
    pub fn poll_stats(&self) -> PollStats {
        self.poller.stats()
    }

    /// Capture statistics
    pub fn capture_stats(&self) -> CaptureStats {
        self.streams.stats()
    }

    /// Detection backend reachability
    pub fn health(&self) -> BackendHealth {
        assess(&self.poller.stats(), &self.config.health)
    }

    /// Configuration the view was built from
    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    fn expect_phase(&self, expected: ViewPhase) -> MonitorResult<()> {
        if self.phase == expected {
            Ok(())
        } else {
            Err(MonitorError::InvalidState {
                expected: expected.to_string(),
                actual: self.phase.to_string(),
            })
        }
    }
}

impl fmt::Debug for MonitorView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MonitorView")
            .field("phase", &self.phase)
            .field("capture", &self.capture)
            .field("revision", &self.revision())
            .finish_non_exhaustive()
    }
}

impl Drop for MonitorView {
    fn drop(&mut self) {
        if self.phase != ViewPhase::Unmounted {
            warn!(phase = %self.phase, "Monitor view dropped while mounted, unmounting");
            self.unmount();
        }
    }
}
