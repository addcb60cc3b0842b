//! # CrimeCatcher Core
//!
//! Domain model for the CrimeCatcher live monitor: the discrete threat status reported
//! by the detection backend, the alert records attached to it, and the reducer that
//! folds decoded status payloads into the state the monitor view renders from.

#![deny(missing_docs)]
#![warn(clippy::all)]

pub mod alert;
pub mod error;
pub mod incident;
pub mod payload;
pub mod reducer;
pub mod status;

// Re-export main types
pub use alert::{parse_instant, AlertRecord, ConfidenceScore};
pub use error::{CoreError, CoreResult};
pub use incident::{Incident, IncidentLog};
pub use payload::StatusPayload;
pub use reducer::{MonitorState, StateChange, StateReducer};
pub use status::{categorize, PresentationCategory, Status};
