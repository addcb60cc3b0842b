//! # CrimeCatcher Diagnostics
//!
//! Structured logging setup and health assessment of the detection backend,
//! derived from the status poller's statistics.

#![deny(missing_docs)]
#![warn(clippy::all)]

pub mod backend_health;
pub mod debug_logger;

// Re-export main types
pub use backend_health::{assess, BackendHealth, HealthReport, HealthThresholds};
pub use debug_logger::{init_logging, parse_filter, LogConfig};
