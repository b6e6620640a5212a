//! Pivot wide per-row fields into long measurement-or-fact records.
//!
//! The mapping is static: each [`FactSource`] scans one table, links its
//! facts either to the row's occurrence or to the row's station event, and
//! applies a list of [`FactRule`]s. A rule fires only when its column holds a
//! value in that row.

use serde::Serialize;

use crate::error::{BuildError, BuildResult};
use crate::logs::log_warning;
use crate::models::{MeasurementOrFact, Subject};
use crate::parser::value::{as_integer, cell, render, text};
use crate::parser::{Row, SurveyTables, Table};
use crate::transform::occurrences::measurement_occurrence_id;

pub const UNIT_MILLIMETRE: &str = "http://qudt.org/vocab/unit/MilliM";
pub const UNIT_GRAM: &str = "http://qudt.org/vocab/unit/GM";
pub const UNIT_KNOT: &str = "http://qudt.org/vocab/unit/KN";

/// Which input table a source scans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SourceTable {
    Station,
    Cpue,
    Measurements,
}

/// What the facts of a source are linked to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SubjectKind {
    /// The organism measured in this row.
    Occurrence,
    /// The station event named in this column.
    Event { column: &'static str },
}

/// How a cell becomes `measurementValue`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueForm {
    Natural,
    Integer,
}

/// One column → one fact.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FactRule {
    pub column: &'static str,
    pub measurement_type: &'static str,
    pub unit: Option<&'static str>,
    pub unit_id: Option<&'static str>,
    pub value: ValueForm,
}

impl FactRule {
    const fn new(column: &'static str, measurement_type: &'static str) -> Self {
        Self {
            column,
            measurement_type,
            unit: None,
            unit_id: None,
            value: ValueForm::Natural,
        }
    }

    const fn unit(mut self, unit: &'static str) -> Self {
        self.unit = Some(unit);
        self
    }

    const fn unit_id(mut self, unit_id: &'static str) -> Self {
        self.unit_id = Some(unit_id);
        self
    }

    const fn integer(mut self) -> Self {
        self.value = ValueForm::Integer;
        self
    }
}

/// A table scan with its subject link and rules.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FactSource {
    pub table: SourceTable,
    pub subject: SubjectKind,
    pub rules: &'static [FactRule],
}

/// The full mapping, in emission order.
pub const FACT_SOURCES: &[FactSource] = &[
    FactSource {
        table: SourceTable::Measurements,
        subject: SubjectKind::Occurrence,
        rules: &[
            FactRule::new("TL_mm", "total length").unit("mm").unit_id(UNIT_MILLIMETRE),
            FactRule::new("Wt_g_recorded", "weight (recorded)").unit("g").unit_id(UNIT_GRAM),
            FactRule::new("scale_tare_g", "scale tare weight").unit("g").unit_id(UNIT_GRAM),
            FactRule::new("Wt_g", "weight").unit("g").unit_id(UNIT_GRAM),
            FactRule::new("Retained", "retained"),
        ],
    },
    FactSource {
        table: SourceTable::Station,
        subject: SubjectKind::Event { column: "station" },
        rules: &[
            FactRule::new("wind_speed", "wind speed").unit("kn").unit_id(UNIT_KNOT),
            FactRule::new("wind_dir", "wind direction"),
            FactRule::new("wave_height", "wave height"),
            FactRule::new("cloud_cover_10th", "cloud cover").unit("tenths"),
            FactRule::new("ropeless_id", "ropeless gear ID"),
            FactRule::new("cruise_id", "cruise ID").integer(),
        ],
    },
    FactSource {
        table: SourceTable::Cpue,
        subject: SubjectKind::Event { column: "Station" },
        rules: &[
            FactRule::new("Pot_position", "pot position"),
            FactRule::new("Pot_ID", "pot ID"),
            FactRule::new("Near_Far", "distance category"),
        ],
    },
    FactSource {
        table: SourceTable::Measurements,
        subject: SubjectKind::Event { column: "Station" },
        rules: &[FactRule::new("Near/Far", "distance category")],
    },
];

/// Extracted facts plus the rows that had nothing to link to.
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    pub facts: Vec<MeasurementOrFact>,
    /// Facts dropped because the row had no station code.
    pub unlinked: usize,
}

/// Run every source over the survey tables.
pub fn extract_measurements(tables: &SurveyTables) -> BuildResult<Extraction> {
    let mut extraction = Extraction::default();

    for source in FACT_SOURCES {
        let table = match source.table {
            SourceTable::Station => &tables.station,
            SourceTable::Cpue => &tables.cpue,
            SourceTable::Measurements => &tables.measurements,
        };
        extract_source(source, table, &mut extraction)?;
    }

    if extraction.unlinked > 0 {
        log_warning(format!(
            "{} facts skipped: row has no station code to link to",
            extraction.unlinked
        ));
    }

    Ok(extraction)
}

fn extract_source(source: &FactSource, table: &Table, out: &mut Extraction) -> BuildResult<()> {
    for (row_number, row) in table.records() {
        let subject = match source.subject {
            SubjectKind::Occurrence => Some(Subject::Occurrence(measurement_occurrence_id(row, row_number))),
            SubjectKind::Event { column } => text(row, column).map(Subject::Event),
        };

        for rule in source.rules {
            let Some(value) = rule_value(rule, row, row_number)? else {
                continue;
            };
            match &subject {
                Some(subject) => out.facts.push(MeasurementOrFact {
                    subject: subject.clone(),
                    measurement_type: rule.measurement_type,
                    value,
                    unit: rule.unit,
                    unit_id: rule.unit_id,
                }),
                None => out.unlinked += 1,
            }
        }
    }
    Ok(())
}

/// The rule's value for this row, `None` when the cell is missing.
fn rule_value(rule: &FactRule, row: &Row, row_number: usize) -> BuildResult<Option<String>> {
    let Some(value) = cell(row, rule.column) else {
        return Ok(None);
    };
    match rule.value {
        ValueForm::Natural => Ok(render(value)),
        ValueForm::Integer => as_integer(value)
            .map(|n| Some(n.to_string()))
            .ok_or_else(|| BuildError::InvalidCruiseId {
                row: row_number,
                value: render(value).unwrap_or_default(),
            }),
    }
}

/// Human-readable listing of the mapping.
pub fn vocabulary_description() -> String {
    let mut out = String::from("Measurement-or-fact mapping\n");
    for source in FACT_SOURCES {
        let subject = match source.subject {
            SubjectKind::Occurrence => "occurrenceID".to_string(),
            SubjectKind::Event { column } => format!("eventID ← {}", column),
        };
        out.push_str(&format!("\n{:?} ({})\n", source.table, subject));
        for rule in source.rules {
            out.push_str(&format!(
                "  {:<18} → {:<20} {:<6} {}\n",
                rule.column,
                rule.measurement_type,
                rule.unit.unwrap_or("-"),
                rule.unit_id.unwrap_or("")
            ));
        }
    }
    out
}
