//! Event system for monitor lifecycle and status changes

use crimecatcher_core::{AlertRecord, StateChange, Status};
use crimecatcher_media::TrackSettings;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::debug;

/// Events emitted by a monitor view
#[derive(Debug, Clone, PartialEq)]
pub enum MonitorEvent {
    /// The view finished mounting
    Mounted,
    /// The backend reported a different status
    StatusChanged {
        /// Previous status
        from: Status,
        /// New status
        to: Status,
    },
    /// A new alert record replaced the previous one
    AlertReceived {
        /// The new record
        alert: AlertRecord,
    },
    /// A poll failed; state was left unchanged
    PollFailed {
        /// Failure message
        error: String,
        /// Whether the failure was network-level rather than a bad body
        transport: bool,
    },
    /// The camera stream was acquired
    CaptureStarted {
        /// Handle identifier
        handle_id: u64,
        /// Negotiated settings
        settings: TrackSettings,
    },
    /// The camera could not be acquired; polling continues
    CaptureUnavailable {
        /// Why the device was unavailable
        reason: String,
    },
    /// A teardown step failed; the other steps still ran
    TeardownError {
        /// Component whose teardown failed
        component: &'static str,
        /// Failure message
        error: String,
    },
    /// The view finished unmounting
    Unmounted,
}

impl MonitorEvent {
    /// Get the event type as a string
    pub fn event_type(&self) -> &'static str {
        match self {
            MonitorEvent::Mounted => "mounted",
            MonitorEvent::StatusChanged { .. } => "status_changed",
            MonitorEvent::AlertReceived { .. } => "alert_received",
            MonitorEvent::PollFailed { .. } => "poll_failed",
            MonitorEvent::CaptureStarted { .. } => "capture_started",
            MonitorEvent::CaptureUnavailable { .. } => "capture_unavailable",
            MonitorEvent::TeardownError { .. } => "teardown_error",
            MonitorEvent::Unmounted => "unmounted",
        }
    }

    /// Check if this event reflects a change in backend state
    pub fn is_status_event(&self) -> bool {
        matches!(
            self,
            MonitorEvent::StatusChanged { .. } | MonitorEvent::AlertReceived { .. }
        )
    }

    /// Check if this is a capture-related event
    pub fn is_capture_event(&self) -> bool {
        matches!(
            self,
            MonitorEvent::CaptureStarted { .. } | MonitorEvent::CaptureUnavailable { .. }
        )
    }

    /// Check if this is an error event
    pub fn is_error_event(&self) -> bool {
        matches!(
            self,
            MonitorEvent::PollFailed { .. }
                | MonitorEvent::CaptureUnavailable { .. }
                | MonitorEvent::TeardownError { .. }
        )
    }
}

impl From<StateChange> for MonitorEvent {
    fn from(change: StateChange) -> Self {
        match change {
            StateChange::Status { from, to } => MonitorEvent::StatusChanged { from, to },
            StateChange::Alert(alert) => MonitorEvent::AlertReceived { alert },
        }
    }
}

/// Stream of monitor events for async iteration
#[derive(Debug)]
pub struct EventStream {
    receiver: mpsc::UnboundedReceiver<MonitorEvent>,
}

impl EventStream {
    /// Get the next event, or `None` once the view is gone
    pub async fn next(&mut self) -> Option<MonitorEvent> {
        self.receiver.recv().await
    }

    /// Try to get the next event without blocking
    pub fn try_next(&mut self) -> Option<MonitorEvent> {
        self.receiver.try_recv().ok()
    }

    /// Drain every event already queued
    pub fn drain(&mut self) -> Vec<MonitorEvent> {
        std::iter::from_fn(|| self.try_next()).collect()
    }

    /// Close the event stream
    pub fn close(&mut self) {
        self.receiver.close();
    }
}

/// Fan-out of events to every live subscriber
#[derive(Debug, Clone, Default)]
pub(crate) struct EventBus {
    subscribers: Arc<Mutex<Vec<mpsc::UnboundedSender<MonitorEvent>>>>,
}

impl EventBus {
    pub(crate) fn subscribe(&self) -> EventStream {
        let (tx, receiver) = mpsc::unbounded_channel();
        self.subscribers.lock().push(tx);
        EventStream { receiver }
    }

    pub(crate) fn emit(&self, event: MonitorEvent) {
        debug!(event = event.event_type(), "Monitor event");
        self.subscribers
            .lock()
            .retain(|subscriber| subscriber.send(event.clone()).is_ok());
    }
}
