//! # CrimeCatcher - Live Threat Monitor
//!
//! CrimeCatcher shows a live camera preview next to the threat status reported by a
//! detection backend. The backend is polled over HTTP; each response updates a status
//! badge, an alert panel and an incident history.
//!
//! ## Key Features
//!
//! - **Status Polling**: Fixed-interval polling with per-request timeouts and optional backoff
//! - **Camera Capture**: Injected capture backends, with a mock for tests and headless runs
//! - **Clean Teardown**: Unmounting always cancels polling and always releases the camera
//! - **Render Model**: A serializable description of the view for any frontend to draw
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use crimecatcher::{MonitorConfig, MonitorView};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut config = MonitorConfig::default();
//!     config.apply_env_overrides()?;
//!
//!     let mut view = MonitorView::builder(config).build()?;
//!     view.mount().await?;
//!
//!     let mut events = view.subscribe();
//!     while let Some(event) = events.next().await {
//!         println!("Monitor event: {:?}", event);
//!         if let Some(model) = view.render() {
//!             println!("Status: {}", model.badge.label);
//!         }
//!     }
//!
//!     view.unmount();
//!     Ok(())
//! }
//! ```

#![deny(missing_docs)]
#![warn(clippy::all)]

// Re-export core types for easy access
pub use crimecatcher_core::{
    AlertRecord, ConfidenceScore, CoreError, Incident, MonitorState, PresentationCategory,
    StateChange, Status, StatusPayload,
};

pub use crimecatcher_media::{
    CaptureBackend, CaptureConstraints, FacingMode, LatestFrameSink, MediaError,
    MockCaptureBackend, SinkConfig, TrackSettings, UnavailableCaptureBackend, VideoResolution,
    VideoSink,
};

#[cfg(feature = "native-capture")]
pub use crimecatcher_media::NokhwaCaptureBackend;

pub use crimecatcher_poller::{
    BackoffPolicy, HttpStatusSource, PollError, PollStats, ScriptedStatusSource, StatusSource,
};

pub use crimecatcher_diagnostics::{init_logging, BackendHealth, HealthReport, LogConfig};

// Public API modules
pub mod config;
pub mod error;
pub mod event;
pub mod render;
pub mod view;

// Re-export main API types
pub use config::MonitorConfig;
pub use error::{MonitorError, MonitorResult};
pub use event::{EventStream, MonitorEvent};
pub use render::{AlertPanel, Badge, IncidentCard, RenderModel, VideoPanel};
pub use view::{MonitorView, MonitorViewBuilder, TeardownReport, ViewPhase};
