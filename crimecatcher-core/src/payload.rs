//! Status payload returned by the detection backend

use crate::alert::AlertRecord;
use serde::{Deserialize, Serialize};

/// Decoded body of one status response.
///
/// Both fields are optional: an absent or blank `status` means "no change", and a
/// `lastAlert` of `null` is the same as no alert.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StatusPayload {
    /// Raw status label
    #[serde(default)]
    pub status: Option<String>,
    /// Latest alert, present only once one has fired
    #[serde(rename = "lastAlert", default)]
    pub last_alert: Option<AlertRecord>,
}

impl StatusPayload {
    /// Payload carrying only a status label
    pub fn with_status(status: impl Into<String>) -> Self {
        Self {
            status: Some(status.into()),
            last_alert: None,
        }
    }

    /// Attach an alert
    pub fn alert(mut self, alert: AlertRecord) -> Self {
        self.last_alert = Some(alert);
        self
    }

    /// Status label if present and not blank
    pub fn status_label(&self) -> Option<&str> {
        self.status
            .as_deref()
            .map(str::trim)
            .filter(|label| !label.is_empty())
    }
}
