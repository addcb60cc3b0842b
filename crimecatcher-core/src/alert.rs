//! Alert records attached to non-secure statuses

use crate::error::{CoreError, CoreResult};
use chrono::{DateTime, FixedOffset, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Most recent incident reported by the detection backend.
///
/// Records are immutable once received and are replaced wholesale by the next one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertRecord {
    /// Human label of the incident, e.g. "Weapon"
    pub event_type: String,
    /// Free-text detail
    pub description: String,
    /// When the event occurred, as reported by the source
    #[serde(deserialize_with = "deserialize_instant")]
    pub timestamp: DateTime<FixedOffset>,
    /// Confidence percentage, 0-100
    pub confidence_score: ConfidenceScore,
}

impl AlertRecord {
    /// Confidence formatted for display, e.g. "92%"
    pub fn confidence_label(&self) -> String {
        format!("{}%", self.confidence_score)
    }
}

/// Confidence percentage exactly as the backend sent it.
///
/// The number is kept opaque so that `92` renders as `92` and `92.5` as `92.5`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfidenceScore(serde_json::Number);

impl ConfidenceScore {
    /// Wrap a JSON number
    pub fn new(value: serde_json::Number) -> Self {
        Self(value)
    }

    /// Numeric value, if representable
    pub fn as_f64(&self) -> Option<f64> {
        self.0.as_f64()
    }

    /// Whether the value lies in 0..=100
    pub fn is_percentage(&self) -> bool {
        self.as_f64()
            .map(|v| (0.0..=100.0).contains(&v))
            .unwrap_or(false)
    }
}

impl From<u32> for ConfidenceScore {
    fn from(value: u32) -> Self {
        Self(value.into())
    }
}

impl fmt::Display for ConfidenceScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Read a source timestamp as an instant.
///
/// RFC 3339 values keep their offset. Offset-less ISO values such as
/// `2026-01-30T23:30:00.123456` are read as UTC.
pub fn parse_instant(value: &str) -> CoreResult<DateTime<FixedOffset>> {
    let trimmed = value.trim();
    if let Ok(instant) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(instant);
    }

    NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc().fixed_offset())
        .map_err(|_| CoreError::InvalidTimestamp {
            value: value.to_string(),
        })
}

fn deserialize_instant<'de, D>(deserializer: D) -> Result<DateTime<FixedOffset>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_instant(&raw).map_err(serde::de::Error::custom)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn weapon_json() -> &'static str {
        r#"{"event_type":"Weapon","description":"Knife detected","timestamp":"2026-01-30T23:30:00Z","confidence_score":92}"#
    }

    #[test]
    fn test_decode_alert() {
        let alert: AlertRecord = serde_json::from_str(weapon_json()).unwrap();
        assert_eq!(alert.event_type, "Weapon");
        assert_eq!(alert.description, "Knife detected");
        assert_eq!(alert.timestamp.to_rfc3339(), "2026-01-30T23:30:00+00:00");
        assert_eq!(alert.confidence_label(), "92%");
    }

    #[test]
    fn test_confidence_kept_opaque() {
        let json = r#"{"event_type":"Assault","description":"Active Fighting Detected","timestamp":"2026-01-30T23:35:00Z","confidence_score":97.5}"#;
        let alert: AlertRecord = serde_json::from_str(json).unwrap();
        assert_eq!(alert.confidence_label(), "97.5%");
        assert!(alert.confidence_score.is_percentage());
    }

    #[test]
    fn test_missing_field_rejected() {
        let json = r#"{"event_type":"Weapon","timestamp":"2026-01-30T23:30:00Z","confidence_score":92}"#;
        assert!(serde_json::from_str::<AlertRecord>(json).is_err());
    }

    #[test]
    fn test_string_confidence_rejected() {
        let json = r#"{"event_type":"Weapon","description":"x","timestamp":"2026-01-30T23:30:00Z","confidence_score":"92"}"#;
        assert!(serde_json::from_str::<AlertRecord>(json).is_err());
    }

    #[test]
    fn test_parse_instant_variants() {
        let with_offset = parse_instant("2026-01-30T23:30:00-05:00").unwrap();
        assert_eq!(with_offset.offset().local_minus_utc(), -5 * 3600);

        let naive = parse_instant("2026-01-30T23:30:00.123456").unwrap();
        assert_eq!(naive.offset().local_minus_utc(), 0);
        assert_eq!(naive.timestamp_subsec_micros(), 123456);

        let err = parse_instant("yesterday").unwrap_err();
        assert_eq!(
            err,
            CoreError::InvalidTimestamp {
                value: "yesterday".to_string()
            }
        );
    }
}
