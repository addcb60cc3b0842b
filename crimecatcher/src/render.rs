//! Render model
//!
//! A plain, serializable description of what the monitor shows. Whoever draws the
//! screen consumes this; nothing here depends on a UI toolkit.

use crimecatcher_core::{AlertRecord, IncidentLog, MonitorState, PresentationCategory};
use crimecatcher_diagnostics::HealthReport;
use crimecatcher_media::{SinkConfig, TrackSettings};
use serde::Serialize;

/// Format of incident and alert time labels, e.g. `11:30 PM, 1/30/26`
pub const TIME_LABEL_FORMAT: &str = "%-I:%M %p, %-m/%-d/%y";

/// Everything the monitor view displays
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderModel {
    /// Status badge
    pub badge: Badge,
    /// Alert details, shown only while the status is not secure
    pub alert: Option<AlertPanel>,
    /// Camera preview
    pub video: VideoPanel,
    /// Detection backend reachability
    pub backend: HealthReport,
    /// Incident history, newest first
    pub incidents: Vec<IncidentCard>,
    /// Reducer revision this model was built from
    pub revision: u64,
}

/// Status badge
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Badge {
    /// Status label as reported
    pub label: String,
    /// Severity category
    pub category: PresentationCategory,
    /// Badge color name
    pub color: &'static str,
}

/// Latest alert details
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlertPanel {
    /// Event type, e.g. `Weapon`
    pub title: String,
    /// Backend description
    pub description: String,
    /// Detection time as RFC 3339
    pub timestamp: String,
    /// Detection time for display
    pub time_label: String,
    /// Confidence text, e.g. `92%`
    pub confidence: String,
}

/// Camera preview state
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum VideoPanel {
    /// Capture has not completed yet
    Pending,
    /// Live preview
    Live {
        /// Negotiated width
        width: u32,
        /// Negotiated height
        height: u32,
        /// Negotiated frame rate
        framerate: f64,
        /// Preview is mirrored
        mirrored: bool,
        /// Audio is muted
        muted: bool,
        /// Preview plays on its own
        autoplay: bool,
    },
    /// No camera; the rest of the view keeps working
    Unavailable {
        /// Notice shown in place of the preview
        notice: String,
    },
}

impl VideoPanel {
    /// Live preview with the stream's negotiated settings
    pub fn live(settings: &TrackSettings, sink: &SinkConfig) -> Self {
        VideoPanel::Live {
            width: settings.resolution.width,
            height: settings.resolution.height,
            framerate: settings.framerate,
            mirrored: sink.mirrored,
            muted: sink.muted,
            autoplay: sink.autoplay,
        }
    }
}

/// One entry of the incident dashboard
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IncidentCard {
    /// Event type
    pub title: String,
    /// Detection time for display
    pub time_label: String,
    /// Backend description
    pub description: String,
    /// Category shown when the incident arrived
    pub category: PresentationCategory,
    /// Card color name
    pub color: &'static str,
}

impl RenderModel {
    /// Build the model from a state snapshot
    pub fn build(
        state: &MonitorState,
        incidents: &IncidentLog,
        video: VideoPanel,
        backend: HealthReport,
        revision: u64,
    ) -> Self {
        let category = state.category();

        Self {
            badge: Badge {
                label: state.status.label().to_string(),
                category,
                color: category.color(),
            },
            alert: state.visible_alert().map(AlertPanel::from_alert),
            video,
            backend,
            incidents: incidents
                .iter()
                .map(|incident| IncidentCard {
                    title: incident.alert.event_type.clone(),
                    time_label: time_label(&incident.alert),
                    description: incident.alert.description.clone(),
                    category: incident.category,
                    color: incident.category.color(),
                })
                .collect(),
            revision,
        }
    }
}

impl AlertPanel {
    fn from_alert(alert: &AlertRecord) -> Self {
        Self {
            title: alert.event_type.clone(),
            description: alert.description.clone(),
            timestamp: alert.timestamp.to_rfc3339(),
            time_label: time_label(alert),
            confidence: alert.confidence_label(),
        }
    }
}

fn time_label(alert: &AlertRecord) -> String {
    alert.timestamp.format(TIME_LABEL_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crimecatcher_core::{parse_instant, StateReducer, StatusPayload};
    use crimecatcher_diagnostics::{BackendHealth, HealthThresholds};
    use crimecatcher_media::{FacingMode, VideoResolution};
    use crimecatcher_poller::PollStats;

    fn assault(at: &str) -> AlertRecord {
        AlertRecord {
            event_type: "Assault".to_string(),
            description: "Individual is in fighting stance".to_string(),
            timestamp: parse_instant(at).unwrap(),
            confidence_score: 97.into(),
        }
    }

    fn build(reducer: &StateReducer) -> RenderModel {
        RenderModel::build(
            reducer.state(),
            reducer.incidents(),
            VideoPanel::Pending,
            HealthReport::from_stats(&PollStats::default(), &HealthThresholds::default()),
            reducer.revision(),
        )
    }

    #[test]
    fn test_initial_model() {
        let model = build(&StateReducer::new());

        assert_eq!(model.badge.label, "SECURE");
        assert_eq!(model.badge.category, PresentationCategory::Nominal);
        assert_eq!(model.badge.color, "green");
        assert!(model.alert.is_none());
        assert!(model.incidents.is_empty());
        assert_eq!(model.backend.health, BackendHealth::Pending);
    }

    #[test]
    fn test_alert_panel_and_incident_card() {
        let mut reducer = StateReducer::new();
        reducer.apply_payload(
            StatusPayload::with_status("THREAT_DETECTED").alert(assault("2026-01-30T23:35:00Z")),
        );

        let model = build(&reducer);
        assert_eq!(model.badge.category, PresentationCategory::Critical);
        assert_eq!(model.badge.color, "red");

        let alert = model.alert.unwrap();
        assert_eq!(alert.title, "Assault");
        assert_eq!(alert.confidence, "97%");
        assert_eq!(alert.time_label, "11:35 PM, 1/30/26");
        assert_eq!(alert.timestamp, "2026-01-30T23:35:00+00:00");

        assert_eq!(model.incidents.len(), 1);
        assert_eq!(model.incidents[0].time_label, "11:35 PM, 1/30/26");
        assert_eq!(model.incidents[0].category, PresentationCategory::Critical);
    }

    #[test]
    fn test_alert_hidden_when_secure() {
        let mut reducer = StateReducer::new();
        reducer.apply_payload(
            StatusPayload::with_status("SUSPICIOUS").alert(assault("2026-01-30T23:35:00Z")),
        );
        reducer.apply_status("SECURE");

        let model = build(&reducer);
        assert!(model.alert.is_none());
        // History keeps the incident
        assert_eq!(model.incidents.len(), 1);
        assert_eq!(model.incidents[0].category, PresentationCategory::Warning);
    }

    #[test]
    fn test_video_panel_serialization() {
        let settings = TrackSettings {
            resolution: VideoResolution::VGA,
            framerate: 30.0,
            facing: Some(FacingMode::User),
        };
        let panel = VideoPanel::live(&settings, &SinkConfig::default());
        let json = serde_json::to_value(&panel).unwrap();

        assert_eq!(json["state"], "live");
        assert_eq!(json["width"], 640);
        assert_eq!(json["mirrored"], true);

        let unavailable = VideoPanel::Unavailable {
            notice: "Camera unavailable".to_string(),
        };
        assert_eq!(serde_json::to_value(&unavailable).unwrap()["state"], "unavailable");
    }
}
