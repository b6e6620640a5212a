//! Build the two-level event hierarchy from station rows.
//!
//! ```text
//! Station rows                         Event core
//! ┌──────────────────────────────┐     ┌───────────────────────────────┐
//! │ S1  cruise 7  deployment     │     │ 7_deployment   (cruise)       │
//! │ S2  cruise 7  deployment     │  →  │ 7_recovery     (cruise)       │
//! │ S3  cruise 7  recovery       │     │ S1 → 7_deployment  (station)  │
//! └──────────────────────────────┘     │ S2 → 7_deployment  (station)  │
//!                                      │ S3 → 7_recovery    (station)  │
//!                                      └───────────────────────────────┘
//! ```
//!
//! Cruise events come first, in the order their (cruise, type) key was first
//! seen, followed by one station event per row in row order. A cruise
//! footprint is a `LINESTRING` over every start/end position of its stations.

use std::collections::HashMap;

use crate::error::{BuildError, BuildResult};
use crate::models::Event;
use crate::parser::value::{as_integer, cell, text};
use crate::parser::{Row, Table, STATION};

/// Cruise events followed by station events.
#[derive(Debug, Clone, Default)]
pub struct EventHierarchy {
    pub cruises: Vec<Event>,
    pub stations: Vec<Event>,
}

impl EventHierarchy {
    pub fn len(&self) -> usize {
        self.cruises.len() + self.stations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All events in output order.
    pub fn iter(&self) -> impl Iterator<Item = &Event> {
        self.cruises.iter().chain(self.stations.iter())
    }
}

/// Build cruise and station events from the station table.
pub fn build_events(station: &Table) -> BuildResult<EventHierarchy> {
    let mut cruises: Vec<CruiseBuilder> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut stations = Vec::with_capacity(station.len());

    for (row_number, row) in station.records() {
        let cruise_type = required_text(row, row_number, "type")?;
        let parent_id = cruise_event_id(row, row_number)?;

        let slot = *index.entry(parent_id.clone()).or_insert_with(|| {
            cruises.push(CruiseBuilder::new(parent_id.clone(), &cruise_type));
            cruises.len() - 1
        });
        cruises[slot].add_station(row);

        stations.push(station_event(row, row_number, parent_id)?);
    }

    Ok(EventHierarchy {
        cruises: cruises.into_iter().map(CruiseBuilder::build).collect(),
        stations,
    })
}

/// Synthetic parent id `{cruise_id}_{type}` for a station row.
///
/// `row_number` is 1-based and only used for error reporting.
pub fn cruise_event_id(row: &Row, row_number: usize) -> BuildResult<String> {
    let cruise_id = cruise_number(row, row_number)?;
    let cruise_type = required_text(row, row_number, "type")?;
    Ok(format!("{}_{}", cruise_id, cruise_type))
}

/// The row's cruise id in integer form.
pub fn cruise_number(row: &Row, row_number: usize) -> BuildResult<i64> {
    let value = cell(row, "cruise_id").ok_or(BuildError::InvalidCruiseId {
        row: row_number,
        value: String::new(),
    })?;
    as_integer(value).ok_or_else(|| BuildError::InvalidCruiseId {
        row: row_number,
        value: value.to_string().trim_matches('"').to_string(),
    })
}

fn required_text(row: &Row, row_number: usize, column: &'static str) -> BuildResult<String> {
    text(row, column).ok_or(BuildError::MissingValue {
        table: STATION.name,
        row: row_number,
        column,
    })
}

fn station_event(row: &Row, row_number: usize, parent_id: String) -> BuildResult<Event> {
    let station_code = required_text(row, row_number, "station")?;
    let depth = text(row, "depth");

    Ok(Event {
        location_id: Some(station_code.clone()),
        event_id: station_code,
        parent_event_id: Some(parent_id),
        event_date: text(row, "datetime"),
        event_type: text(row, "type"),
        decimal_latitude: text(row, "lat_start"),
        decimal_longitude: text(row, "lon_start"),
        minimum_depth_in_meters: depth.clone(),
        maximum_depth_in_meters: depth,
        event_remarks: text(row, "notes"),
        recorded_by: text(row, "participants"),
        footprint_wkt: None,
    })
}

/// `"lon lat"` when both ordinates are present.
fn position(row: &Row, lon: &str, lat: &str) -> Option<String> {
    Some(format!("{} {}", text(row, lon)?, text(row, lat)?))
}

/// Render a vertex list as WKT; no vertices means no footprint.
pub fn footprint(vertices: &[String]) -> Option<String> {
    if vertices.is_empty() {
        None
    } else {
        Some(format!("LINESTRING ({})", vertices.join(", ")))
    }
}

/// Accumulates the stations of one (cruise, type) group.
struct CruiseBuilder {
    event_id: String,
    event_type: String,
    event_date: Option<String>,
    vertices: Vec<String>,
}

impl CruiseBuilder {
    fn new(event_id: String, cruise_type: &str) -> Self {
        Self {
            event_id,
            event_type: format!("{} cruise", cruise_type),
            event_date: None,
            vertices: Vec::new(),
        }
    }

    fn add_station(&mut self, row: &Row) {
        if self.event_date.is_none() {
            self.event_date = text(row, "datetime");
        }
        self.vertices.extend(position(row, "lon_start", "lat_start"));
        self.vertices.extend(position(row, "lon_end", "lat_end"));
    }

    fn build(self) -> Event {
        Event {
            footprint_wkt: footprint(&self.vertices),
            event_id: self.event_id,
            event_date: self.event_date,
            event_type: Some(self.event_type),
            ..Event::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn station_table(rows: Vec<Value>) -> Table {
        let mut table = Table::new("Station", STATION.columns.iter().map(|c| c.to_string()).collect());
        for row in rows {
            table.push_row(row.as_object().cloned().unwrap());
        }
        table
    }

    #[test]
    fn test_single_start_point_footprint() {
        let table = station_table(vec![json!({
            "station": "S1", "cruise_id": 7, "type": "deployment",
            "lon_start": -70.1, "lat_start": 41.5, "lon_end": null, "lat_end": null,
            "datetime": "2023-06-01T08:30:00", "depth": 30
        })]);

        let events = build_events(&table).unwrap();
        assert_eq!(events.cruises.len(), 1);
        let cruise = &events.cruises[0];
        assert_eq!(cruise.event_id, "7_deployment");
        assert_eq!(cruise.footprint_wkt.as_deref(), Some("LINESTRING (-70.1 41.5)"));
        assert_eq!(cruise.event_type.as_deref(), Some("deployment cruise"));
        assert_eq!(cruise.parent_event_id, None);
        assert_eq!(cruise.event_date.as_deref(), Some("2023-06-01T08:30:00"));
    }

    #[test]
    fn test_station_event_fields() {
        let table = station_table(vec![json!({
            "station": "S1", "cruise_id": 7.0, "type": "deployment",
            "lon_start": -70.1, "lat_start": 41.5, "lon_end": -70.2, "lat_end": 41.6,
            "depth": 30.5, "notes": "calm", "participants": "A. Diver | B. Diver"
        })]);

        let events = build_events(&table).unwrap();
        let station = &events.stations[0];
        assert_eq!(station.event_id, "S1");
        assert_eq!(station.location_id.as_deref(), Some("S1"));
        assert_eq!(station.parent_event_id.as_deref(), Some("7_deployment"));
        assert_eq!(station.event_type.as_deref(), Some("deployment"));
        assert_eq!(station.decimal_latitude.as_deref(), Some("41.5"));
        assert_eq!(station.decimal_longitude.as_deref(), Some("-70.1"));
        assert_eq!(station.minimum_depth_in_meters.as_deref(), Some("30.5"));
        assert_eq!(station.maximum_depth_in_meters.as_deref(), Some("30.5"));
        assert_eq!(station.event_remarks.as_deref(), Some("calm"));
        assert_eq!(station.recorded_by.as_deref(), Some("A. Diver | B. Diver"));
        assert_eq!(station.footprint_wkt, None);
    }

    #[test]
    fn test_grouping_keeps_first_seen_order_and_vertex_order() {
        let table = station_table(vec![
            json!({ "station": "S1", "cruise_id": 7, "type": "recovery",
                    "lon_start": 1.0, "lat_start": 2.0, "lon_end": 3.0, "lat_end": 4.0 }),
            json!({ "station": "S2", "cruise_id": 7, "type": "deployment",
                    "lon_start": 9.0, "lat_start": 9.5 }),
            json!({ "station": "S3", "cruise_id": 7, "type": "recovery",
                    "lon_start": null, "lat_start": null, "lon_end": 5.0, "lat_end": 6.0 }),
        ]);

        let events = build_events(&table).unwrap();
        let ids: Vec<&str> = events.iter().map(|e| e.event_id.as_str()).collect();
        assert_eq!(ids, vec!["7_recovery", "7_deployment", "S1", "S2", "S3"]);
        assert_eq!(
            events.cruises[0].footprint_wkt.as_deref(),
            Some("LINESTRING (1 2, 3 4, 5 6)")
        );
    }

    #[test]
    fn test_no_coordinates_means_absent_footprint() {
        let table = station_table(vec![json!({
            "station": "S1", "cruise_id": 3, "type": "deployment", "lon_start": -70.1
        })]);

        let events = build_events(&table).unwrap();
        assert_eq!(events.cruises[0].footprint_wkt, None);
    }

    #[test]
    fn test_first_present_datetime_dates_the_cruise() {
        let table = station_table(vec![
            json!({ "station": "S1", "cruise_id": 3, "type": "deployment" }),
            json!({ "station": "S2", "cruise_id": 3, "type": "deployment", "datetime": "2023-06-02T09:00:00" }),
        ]);

        let events = build_events(&table).unwrap();
        assert_eq!(events.cruises[0].event_date.as_deref(), Some("2023-06-02T09:00:00"));
    }

    #[test]
    fn test_invalid_cruise_id_fails() {
        for bad in [json!(null), json!(7.5), json!("seven")] {
            let table = station_table(vec![json!({
                "station": "S1", "cruise_id": bad, "type": "deployment"
            })]);
            assert!(matches!(
                build_events(&table),
                Err(BuildError::InvalidCruiseId { row: 1, .. })
            ));
        }
    }

    #[test]
    fn test_missing_station_code_fails() {
        let table = station_table(vec![json!({ "cruise_id": 7, "type": "deployment" })]);

        assert!(matches!(
            build_events(&table),
            Err(BuildError::MissingValue { column: "station", .. })
        ));
    }
}
