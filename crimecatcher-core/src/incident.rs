//! Bounded history of alerts seen during a session

use crate::alert::AlertRecord;
use crate::status::PresentationCategory;
use serde::Serialize;
use std::collections::VecDeque;

/// An alert together with the category shown when it arrived
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Incident {
    /// The alert record
    pub alert: AlertRecord,
    /// Badge category at the time the alert was recorded
    pub category: PresentationCategory,
}

/// Newest-first list of distinct alert records.
///
/// The backend repeats its latest alert on every poll, so a record equal to the
/// newest entry is not recorded twice.
#[derive(Debug, Clone)]
pub struct IncidentLog {
    entries: VecDeque<Incident>,
    capacity: usize,
}

impl IncidentLog {
    /// Default number of retained incidents
    pub const DEFAULT_CAPACITY: usize = 20;

    /// Create a log retaining at most `capacity` records
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Record an alert. Returns `false` if it repeats the newest entry.
    pub fn record(&mut self, alert: &AlertRecord, category: PresentationCategory) -> bool {
        if self.capacity == 0 || self.entries.front().map(|entry| &entry.alert) == Some(alert) {
            return false;
        }

        self.entries.push_front(Incident {
            alert: alert.clone(),
            category,
        });
        self.entries.truncate(self.capacity);
        true
    }

    /// Entries, newest first
    pub fn iter(&self) -> impl Iterator<Item = &Incident> {
        self.entries.iter()
    }

    /// Number of retained entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing has been recorded
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Maximum number of retained entries
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for IncidentLog {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alert::parse_instant;

    fn alert(event_type: &str, at: &str) -> AlertRecord {
        AlertRecord {
            event_type: event_type.to_string(),
            description: "Detection of violent movement in sector 4.".to_string(),
            timestamp: parse_instant(at).unwrap(),
            confidence_score: 98.into(),
        }
    }

    #[test]
    fn test_repeated_alert_recorded_once() {
        let mut log = IncidentLog::new(5);
        let assault = alert("Assault", "2026-01-30T23:35:00Z");

        assert!(log.record(&assault, PresentationCategory::Critical));
        assert!(!log.record(&assault, PresentationCategory::Critical));
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn test_capacity_drops_oldest() {
        let mut log = IncidentLog::new(2);
        log.record(&alert("Shoplifting", "2026-01-30T23:30:00Z"), PresentationCategory::Warning);
        log.record(&alert("Assault", "2026-01-30T23:35:00Z"), PresentationCategory::Critical);
        log.record(&alert("Assault", "2026-01-30T23:38:00Z"), PresentationCategory::Critical);

        let times: Vec<String> = log
            .iter()
            .map(|entry| entry.alert.timestamp.format("%H:%M").to_string())
            .collect();
        assert_eq!(times, vec!["23:38", "23:35"]);
        assert!(log
            .iter()
            .all(|entry| entry.category == PresentationCategory::Critical));
    }

    #[test]
    fn test_zero_capacity_records_nothing() {
        let mut log = IncidentLog::new(0);
        let assault = alert("Assault", "2026-01-30T23:35:00Z");
        assert!(!log.record(&assault, PresentationCategory::Critical));
        assert!(log.is_empty());
    }
}
