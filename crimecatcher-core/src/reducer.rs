//! Folding status payloads into monitor state

use crate::alert::AlertRecord;
use crate::incident::IncidentLog;
use crate::payload::StatusPayload;
use crate::status::{PresentationCategory, Status};
use serde::Serialize;
use tracing::{debug, info, warn};

/// Current status plus the latest alert
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct MonitorState {
    /// Current status
    pub status: Status,
    /// Latest alert received during the current non-secure period
    pub last_alert: Option<AlertRecord>,
}

impl MonitorState {
    /// Badge category for the current status
    pub fn category(&self) -> PresentationCategory {
        self.status.category()
    }

    /// Alert to display, hidden whenever the status is secure
    pub fn visible_alert(&self) -> Option<&AlertRecord> {
        if self.status.is_secure() {
            None
        } else {
            self.last_alert.as_ref()
        }
    }
}

/// A change applied by the reducer
#[derive(Debug, Clone, PartialEq)]
pub enum StateChange {
    /// The status moved from one value to another
    Status {
        /// Previous status
        from: Status,
        /// New status
        to: Status,
    },
    /// A different alert record replaced the previous one
    Alert(AlertRecord),
}

/// Sole writer of [`MonitorState`]
#[derive(Debug, Default)]
pub struct StateReducer {
    state: MonitorState,
    incidents: IncidentLog,
    /// Alert taken down by the last return to secure; repeats of it stay hidden
    retired: Option<AlertRecord>,
    revision: u64,
}

impl StateReducer {
    /// Create a reducer in the initial secure state
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a reducer whose incident log keeps `capacity` records
    pub fn with_incident_capacity(capacity: usize) -> Self {
        Self {
            incidents: IncidentLog::new(capacity),
            ..Self::default()
        }
    }

    /// Apply a raw status label.
    ///
    /// Blank labels are ignored. Unknown labels are kept as [`Status::Unrecognized`]
    /// and fall into the nominal category. Returning to secure retires the current
    /// alert, so a later non-secure period starts without one.
    pub fn apply_status(&mut self, raw: &str) -> Option<StateChange> {
        if raw.trim().is_empty() {
            return None;
        }

        let next = Status::parse(raw);
        if next == self.state.status {
            return None;
        }

        if let Status::Unrecognized(label) = &next {
            warn!(
                status = %label,
                "Backend reported an unrecognized status, presenting as nominal"
            );
        } else {
            info!(from = %self.state.status, to = %next, "Status changed");
        }

        if next.is_secure() {
            if let Some(alert) = self.state.last_alert.take() {
                debug!(event_type = %alert.event_type, "Alert retired on return to secure");
                self.retired = Some(alert);
            }
        }

        let from = std::mem::replace(&mut self.state.status, next.clone());
        self.revision += 1;
        Some(StateChange::Status { from, to: next })
    }

    /// Replace the latest alert record.
    ///
    /// A record equal to the current or the retired one is ignored. A new record
    /// arriving while secure goes to the incident log and is retired immediately.
    pub fn apply_alert(&mut self, alert: AlertRecord) -> Option<StateChange> {
        if self.state.last_alert.as_ref() == Some(&alert)
            || self.retired.as_ref() == Some(&alert)
        {
            return None;
        }

        debug!(
            event_type = %alert.event_type,
            timestamp = %alert.timestamp,
            "Alert record replaced"
        );
        self.incidents.record(&alert, self.state.category());
        if self.state.status.is_secure() {
            self.retired = Some(alert.clone());
        } else {
            self.state.last_alert = Some(alert.clone());
        }
        self.revision += 1;
        Some(StateChange::Alert(alert))
    }

    /// Apply a decoded payload: status first, then alert
    pub fn apply_payload(&mut self, payload: StatusPayload) -> Vec<StateChange> {
        let mut changes = Vec::new();

        if let Some(label) = payload.status_label() {
            changes.extend(self.apply_status(label));
        }
        if let Some(alert) = payload.last_alert {
            changes.extend(self.apply_alert(alert));
        }

        changes
    }

    /// Copy of the current state
    pub fn snapshot(&self) -> MonitorState {
        self.state.clone()
    }

    /// Borrow the current state
    pub fn state(&self) -> &MonitorState {
        &self.state
    }

    /// Incident history
    pub fn incidents(&self) -> &IncidentLog {
        &self.incidents
    }

    /// Number of changes applied so far
    pub fn revision(&self) -> u64 {
        self.revision
    }
}
