//! Darwin Core output records.
//!
//! - [`Event`] - cruise or station event (event core)
//! - [`Occurrence`] - observed organism or catch (occurrence extension)
//! - [`MeasurementOrFact`] - long-format scalar fact (MoF extension)
//!
//! Field order in each struct is the column order of its output table;
//! `None` serializes as an empty field.

use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

// =============================================================================
// Event
// =============================================================================

/// Columns of the event table.
pub const EVENT_COLUMNS: [&str; 12] = [
    "eventID",
    "locationID",
    "parentEventID",
    "eventDate",
    "eventType",
    "decimalLatitude",
    "decimalLongitude",
    "minimumDepthInMeters",
    "maximumDepthInMeters",
    "eventRemarks",
    "recordedBy",
    "footprintWKT",
];

/// A row of the event table.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    #[serde(rename = "eventID")]
    pub event_id: String,
    #[serde(rename = "locationID")]
    pub location_id: Option<String>,
    #[serde(rename = "parentEventID")]
    pub parent_event_id: Option<String>,
    pub event_date: Option<String>,
    pub event_type: Option<String>,
    pub decimal_latitude: Option<String>,
    pub decimal_longitude: Option<String>,
    pub minimum_depth_in_meters: Option<String>,
    pub maximum_depth_in_meters: Option<String>,
    pub event_remarks: Option<String>,
    pub recorded_by: Option<String>,
    #[serde(rename = "footprintWKT")]
    pub footprint_wkt: Option<String>,
}

// =============================================================================
// Occurrence
// =============================================================================

/// Columns of the occurrence table.
pub const OCCURRENCE_COLUMNS: [&str; 7] = [
    "occurrenceID",
    "eventID",
    "vernacularName",
    "individualCount",
    "occurrenceRemarks",
    "basisOfRecord",
    "sex",
];

/// How an occurrence was recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum BasisOfRecord {
    #[default]
    HumanObservation,
}

/// Source table of an occurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OccurrenceOrigin {
    Catch,
    Measurement,
}

/// A row of the occurrence table.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Occurrence {
    #[serde(rename = "occurrenceID")]
    pub occurrence_id: String,
    #[serde(rename = "eventID")]
    pub event_id: Option<String>,
    pub vernacular_name: Option<String>,
    pub individual_count: Option<String>,
    pub occurrence_remarks: Option<String>,
    pub basis_of_record: BasisOfRecord,
    pub sex: Option<String>,
    #[serde(skip)]
    pub origin: OccurrenceOrigin,
}

// =============================================================================
// Measurement or Fact
// =============================================================================

/// Columns of the measurement-or-fact table.
pub const MEASUREMENT_COLUMNS: [&str; 6] = [
    "occurrenceID",
    "eventID",
    "measurementType",
    "measurementValue",
    "measurementUnit",
    "measurementUnitID",
];

/// What a fact is about. Exactly one link per fact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Subject {
    Occurrence(String),
    Event(String),
}

/// A row of the measurement-or-fact table.
#[derive(Debug, Clone, PartialEq)]
pub struct MeasurementOrFact {
    pub subject: Subject,
    pub measurement_type: &'static str,
    pub value: String,
    pub unit: Option<&'static str>,
    pub unit_id: Option<&'static str>,
}

impl Serialize for MeasurementOrFact {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let (occurrence_id, event_id) = match &self.subject {
            Subject::Occurrence(id) => (Some(id.as_str()), None),
            Subject::Event(id) => (None, Some(id.as_str())),
        };

        let mut row = serializer.serialize_struct("MeasurementOrFact", 6)?;
        row.serialize_field("occurrenceID", &occurrence_id)?;
        row.serialize_field("eventID", &event_id)?;
        row.serialize_field("measurementType", self.measurement_type)?;
        row.serialize_field("measurementValue", &self.value)?;
        row.serialize_field("measurementUnit", &self.unit)?;
        row.serialize_field("measurementUnitID", &self.unit_id)?;
        row.end()
    }
}
