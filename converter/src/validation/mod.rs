//! Integrity checks over the derived records.
//!
//! These guard the identifiers the output tables link through; they do not
//! validate values against Darwin Core term definitions.
//!
//! Fatal:
//! - duplicate event or occurrence ids
//! - station events whose parent cruise event does not exist
//!
//! Reported only:
//! - occurrences and event-level facts naming a station with no station event
//! - occurrences with no station code at all

use serde::Serialize;
use std::collections::HashSet;

use crate::error::{BuildError, BuildResult};
use crate::models::{MeasurementOrFact, Occurrence, Subject};
use crate::transform::events::EventHierarchy;

/// Fail on the first identifier seen twice.
pub fn ensure_unique<'a>(
    kind: &'static str,
    ids: impl IntoIterator<Item = &'a str>,
) -> BuildResult<()> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(BuildError::DuplicateId {
                kind,
                id: id.to_string(),
            });
        }
    }
    Ok(())
}

/// Event ids are unique and every station's parent is a built cruise event.
pub fn check_event_hierarchy(events: &EventHierarchy) -> BuildResult<()> {
    ensure_unique("event", events.iter().map(|e| e.event_id.as_str()))?;

    let cruise_ids: HashSet<&str> = events.cruises.iter().map(|e| e.event_id.as_str()).collect();
    for station in &events.stations {
        let parent = station.parent_event_id.as_deref().unwrap_or_default();
        if !cruise_ids.contains(parent) {
            return Err(BuildError::DanglingParent {
                event_id: station.event_id.clone(),
                parent_id: parent.to_string(),
            });
        }
    }
    Ok(())
}

/// Links that point at stations with no station event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IntegrityReport {
    pub orphan_occurrences: usize,
    pub orphan_facts: usize,
    /// Occurrences whose row has no station code.
    pub unlinked_occurrences: usize,
    /// Station codes referenced but never defined, sorted.
    pub unknown_stations: Vec<String>,
}

impl IntegrityReport {
    pub fn is_clean(&self) -> bool {
        self.orphan_occurrences == 0 && self.orphan_facts == 0 && self.unlinked_occurrences == 0
    }
}

/// Count occurrences and event-level facts whose station is unknown.
pub fn check_links(
    events: &EventHierarchy,
    occurrences: &[Occurrence],
    facts: &[MeasurementOrFact],
) -> IntegrityReport {
    let stations: HashSet<&str> = events.stations.iter().map(|e| e.event_id.as_str()).collect();
    let mut unknown: HashSet<&str> = HashSet::new();
    let mut report = IntegrityReport::default();

    for occurrence in occurrences {
        let Some(station) = occurrence.event_id.as_deref() else {
            report.unlinked_occurrences += 1;
            continue;
        };
        if !stations.contains(station) {
            report.orphan_occurrences += 1;
            unknown.insert(station);
        }
    }

    for fact in facts {
        if let Subject::Event(station) = &fact.subject {
            if !stations.contains(station.as_str()) {
                report.orphan_facts += 1;
                unknown.insert(station.as_str());
            }
        }
    }

    let mut unknown: Vec<String> = unknown.into_iter().map(String::from).collect();
    unknown.sort();
    report.unknown_stations = unknown;
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BasisOfRecord, Event, OccurrenceOrigin};

    fn event(id: &str, parent: Option<&str>) -> Event {
        Event {
            event_id: id.to_string(),
            parent_event_id: parent.map(String::from),
            ..Event::default()
        }
    }

    fn hierarchy() -> EventHierarchy {
        EventHierarchy {
            cruises: vec![event("7_deployment", None)],
            stations: vec![event("S1", Some("7_deployment"))],
        }
    }

    #[test]
    fn test_unique_ids_pass() {
        assert!(ensure_unique("event", ["a", "b", "c"]).is_ok());
    }

    #[test]
    fn test_duplicate_id_reported() {
        let err = ensure_unique("event", ["a", "b", "a"]).unwrap_err();
        assert!(err.to_string().contains("'a'"));
    }

    #[test]
    fn test_hierarchy_ok() {
        assert!(check_event_hierarchy(&hierarchy()).is_ok());
    }

    #[test]
    fn test_station_code_colliding_with_cruise_id() {
        let mut events = hierarchy();
        events.stations.push(event("7_deployment", Some("7_deployment")));

        assert!(matches!(
            check_event_hierarchy(&events),
            Err(BuildError::DuplicateId { kind: "event", .. })
        ));
    }

    #[test]
    fn test_dangling_parent() {
        let mut events = hierarchy();
        events.stations.push(event("S2", Some("8_recovery")));

        assert!(matches!(
            check_event_hierarchy(&events),
            Err(BuildError::DanglingParent { .. })
        ));
    }

    #[test]
    fn test_orphan_links_counted() {
        let occurrences = vec![Occurrence {
            occurrence_id: "S9_1_scup_1".into(),
            event_id: Some("S9".into()),
            vernacular_name: Some("scup".into()),
            individual_count: None,
            occurrence_remarks: None,
            basis_of_record: BasisOfRecord::HumanObservation,
            sex: None,
            origin: OccurrenceOrigin::Catch,
        }];
        let facts = vec![
            MeasurementOrFact {
                subject: Subject::Event("S1".into()),
                measurement_type: "pot ID",
                value: "1".into(),
                unit: None,
                unit_id: None,
            },
            MeasurementOrFact {
                subject: Subject::Event("S9".into()),
                measurement_type: "pot ID",
                value: "1".into(),
                unit: None,
                unit_id: None,
            },
        ];

        let report = check_links(&hierarchy(), &occurrences, &facts);
        assert_eq!(report.orphan_occurrences, 1);
        assert_eq!(report.orphan_facts, 1);
        assert_eq!(report.unknown_stations, vec!["S9".to_string()]);
        assert!(!report.is_clean());
    }

    #[test]
    fn test_occurrence_without_station_counted_separately() {
        let occurrences = vec![Occurrence {
            occurrence_id: "_1_scup_1".into(),
            event_id: None,
            vernacular_name: Some("scup".into()),
            individual_count: None,
            occurrence_remarks: None,
            basis_of_record: BasisOfRecord::HumanObservation,
            sex: None,
            origin: OccurrenceOrigin::Catch,
        }];

        let report = check_links(&hierarchy(), &occurrences, &[]);
        assert_eq!(report.unlinked_occurrences, 1);
        assert_eq!(report.orphan_occurrences, 0);
        assert!(report.unknown_stations.is_empty());
        assert!(!report.is_clean());
    }
}
