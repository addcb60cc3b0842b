//! # CrimeCatcher Poller
//!
//! Periodic polling of the detection backend's status endpoint. A [`StatusSource`]
//! fetches one payload; the [`StatusPoller`] decides when, bounds each request with a
//! timeout, and forwards decoded payloads until its [`CancelToken`] is cancelled.

#![deny(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod poller;
pub mod protocol;
pub mod source;

// Re-export main types
pub use error::{PollError, PollResult};
pub use poller::{
    BackoffPolicy, CancelToken, PollStats, PollerConfig, StatusPoller, DEFAULT_POLL_INTERVAL,
    DEFAULT_REQUEST_TIMEOUT,
};
pub use protocol::{decode, endpoint_url, status_url, DEFAULT_BASE_URL, DEFAULT_STATUS_PATH};
pub use source::{HttpStatusSource, ScriptedStatusSource, StatusSource};
