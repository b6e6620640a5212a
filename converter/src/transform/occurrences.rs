//! Map catch rows and measurement rows into one occurrence list.
//!
//! Identifiers are deterministic and built from the row's position in its
//! source table (1-based, blank rows included):
//!
//! - catch: `{Station}_{Pot_ID}_{Species}_{n}`
//! - measurement: `MEAS_{Station}_{Species}_{n}`

use crate::error::BuildResult;
use crate::models::{BasisOfRecord, Occurrence, OccurrenceOrigin};
use crate::parser::value::text;
use crate::parser::{Row, Table};
use crate::validation::ensure_unique;

/// Prefix that keeps measurement ids apart from catch ids.
pub const MEASUREMENT_ID_PREFIX: &str = "MEAS";

/// Id of the catch occurrence at 1-based `row_number` of the CPUE table.
pub fn catch_occurrence_id(row: &Row, row_number: usize) -> String {
    format!(
        "{}_{}_{}_{}",
        component(row, "Station"),
        component(row, "Pot_ID"),
        component(row, "Species"),
        row_number
    )
}

/// Id of the measured organism at 1-based `row_number` of the Measurements table.
pub fn measurement_occurrence_id(row: &Row, row_number: usize) -> String {
    format!(
        "{}_{}_{}_{}",
        MEASUREMENT_ID_PREFIX,
        component(row, "Station"),
        component(row, "Species"),
        row_number
    )
}

fn component(row: &Row, column: &str) -> String {
    text(row, column).unwrap_or_default()
}

/// `Barotrauma: {value}` and the free-text note, joined with `; `.
pub fn combine_remarks(row: &Row) -> Option<String> {
    let parts: Vec<String> = [
        text(row, "Barotrauma").map(|b| format!("Barotrauma: {}", b)),
        text(row, "Notes"),
    ]
    .into_iter()
    .flatten()
    .collect();

    if parts.is_empty() {
        None
    } else {
        Some(parts.join("; "))
    }
}

/// Occurrences from the CPUE table, in row order.
pub fn catch_occurrences(cpue: &Table) -> Vec<Occurrence> {
    cpue.records()
        .map(|(n, row)| Occurrence {
            occurrence_id: catch_occurrence_id(row, n),
            event_id: text(row, "Station"),
            vernacular_name: text(row, "Species"),
            individual_count: text(row, "Catch"),
            occurrence_remarks: text(row, "Notes"),
            basis_of_record: BasisOfRecord::HumanObservation,
            sex: None,
            origin: OccurrenceOrigin::Catch,
        })
        .collect()
}

/// Occurrences from the Measurements table, in row order.
pub fn measurement_occurrences(measurements: &Table) -> Vec<Occurrence> {
    measurements
        .records()
        .map(|(n, row)| Occurrence {
            occurrence_id: measurement_occurrence_id(row, n),
            event_id: text(row, "Station"),
            vernacular_name: text(row, "Species"),
            individual_count: None,
            occurrence_remarks: combine_remarks(row),
            basis_of_record: BasisOfRecord::HumanObservation,
            sex: text(row, "Sex"),
            origin: OccurrenceOrigin::Measurement,
        })
        .collect()
}

/// Catch occurrences followed by measurement occurrences.
///
/// Fails if two occurrences end up with the same id.
pub fn build_occurrences(cpue: &Table, measurements: &Table) -> BuildResult<Vec<Occurrence>> {
    let mut occurrences = catch_occurrences(cpue);
    occurrences.extend(measurement_occurrences(measurements));

    ensure_unique("occurrence", occurrences.iter().map(|o| o.occurrence_id.as_str()))?;
    Ok(occurrences)
}
