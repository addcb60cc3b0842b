//! Threat status labels and their presentation categories

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Discrete threat-assessment label reported by the detection backend
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Status {
    /// Nothing of interest in frame
    #[default]
    Secure,
    /// Aggressive stance or similar precursor
    Suspicious,
    /// A subject is lying on the ground
    PersonDown,
    /// A weapon is visible
    WeaponDetected,
    /// Active fighting detected
    ThreatDetected,
    /// A label this client does not know, kept verbatim
    Unrecognized(String),
}

impl Status {
    /// The five labels the backend is known to emit
    pub const KNOWN: [Status; 5] = [
        Status::Secure,
        Status::Suspicious,
        Status::PersonDown,
        Status::WeaponDetected,
        Status::ThreatDetected,
    ];

    /// Parse a backend label.
    ///
    /// Matching ignores surrounding whitespace and ASCII case, and treats spaces and
    /// hyphens as underscores, so `"WEAPON DETECTED"` and `"weapon_detected"` are the
    /// same status. Anything else becomes [`Status::Unrecognized`]; parsing never fails.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        let normalized: String = trimmed
            .chars()
            .map(|c| match c {
                ' ' | '-' => '_',
                other => other.to_ascii_uppercase(),
            })
            .collect();

        match normalized.as_str() {
            "SECURE" => Status::Secure,
            "SUSPICIOUS" => Status::Suspicious,
            "PERSON_DOWN" => Status::PersonDown,
            "WEAPON_DETECTED" => Status::WeaponDetected,
            "THREAT_DETECTED" => Status::ThreatDetected,
            _ => Status::Unrecognized(trimmed.to_string()),
        }
    }

    /// Canonical label, or the raw value for unrecognized statuses
    pub fn label(&self) -> &str {
        match self {
            Status::Secure => "SECURE",
            Status::Suspicious => "SUSPICIOUS",
            Status::PersonDown => "PERSON_DOWN",
            Status::WeaponDetected => "WEAPON_DETECTED",
            Status::ThreatDetected => "THREAT_DETECTED",
            Status::Unrecognized(raw) => raw,
        }
    }

    /// Presentation category used for badge coloring
    pub fn category(&self) -> PresentationCategory {
        categorize(self)
    }

    /// Whether this is the all-clear status
    pub fn is_secure(&self) -> bool {
        matches!(self, Status::Secure)
    }

    /// Whether the label was one of the known five
    pub fn is_recognized(&self) -> bool {
        !matches!(self, Status::Unrecognized(_))
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl From<&str> for Status {
    fn from(raw: &str) -> Self {
        Status::parse(raw)
    }
}

impl Serialize for Status {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

impl<'de> Deserialize<'de> for Status {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Status::parse(&raw))
    }
}

/// Badge category a status is presented with, ordered by severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PresentationCategory {
    /// No threat
    Nominal,
    /// Needs a look, possibly medical
    Caution,
    /// Escalating behaviour
    Warning,
    /// Immediate threat
    Critical,
}

impl PresentationCategory {
    /// Lowercase name of the category
    pub fn as_str(&self) -> &'static str {
        match self {
            PresentationCategory::Nominal => "nominal",
            PresentationCategory::Caution => "caution",
            PresentationCategory::Warning => "warning",
            PresentationCategory::Critical => "critical",
        }
    }

    /// Badge color name
    pub fn color(&self) -> &'static str {
        match self {
            PresentationCategory::Nominal => "green",
            PresentationCategory::Caution => "yellow",
            PresentationCategory::Warning => "orange",
            PresentationCategory::Critical => "red",
        }
    }
}

impl fmt::Display for PresentationCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Map a status to its presentation category.
///
/// Total over every status: unrecognized labels fall through to
/// [`PresentationCategory::Nominal`].
pub fn categorize(status: &Status) -> PresentationCategory {
    match status {
        Status::WeaponDetected | Status::ThreatDetected => PresentationCategory::Critical,
        Status::Suspicious => PresentationCategory::Warning,
        Status::PersonDown => PresentationCategory::Caution,
        Status::Secure | Status::Unrecognized(_) => PresentationCategory::Nominal,
    }
}
