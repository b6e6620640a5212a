//! Survey input loading.
//!
//! Reads the three survey tables (`Station`, `CPUE`, `Measurements`) from a
//! spreadsheet workbook or from a directory of CSV exports, and checks that
//! every expected column is present before anything is derived from them.
//!
//! ```text
//! survey.xlsx ──┐                  ┌── Station
//!               ├──▶ load_survey ──┼── CPUE
//! survey/*.csv ─┘                  └── Measurements
//! ```

pub mod delimited;
pub mod value;
pub mod workbook;

use serde::Serialize;
use std::path::Path;

use crate::error::{LoadError, LoadResult};
use crate::logs::{log_info, log_success_indent};
pub use value::Row;
use workbook::{Workbook, WORKBOOK_EXTENSIONS};

/// Expected shape of one input table.
#[derive(Debug, Clone, Copy)]
pub struct TableSchema {
    pub name: &'static str,
    pub columns: &'static [&'static str],
}

/// Station metadata, one row per physical sampling point.
pub const STATION: TableSchema = TableSchema {
    name: "Station",
    columns: &[
        "station",
        "cruise_id",
        "type",
        "datetime",
        "lat_start",
        "lon_start",
        "lat_end",
        "lon_end",
        "depth",
        "notes",
        "participants",
        "wind_speed",
        "wind_dir",
        "wave_height",
        "cloud_cover_10th",
        "ropeless_id",
    ],
};

/// Catch per unit effort, one row per pot and species.
pub const CPUE: TableSchema = TableSchema {
    name: "CPUE",
    columns: &[
        "Station",
        "Pot_ID",
        "Species",
        "Catch",
        "Notes",
        "Pot_position",
        "Near_Far",
    ],
};

/// Biological measurements, one row per measured organism.
pub const MEASUREMENTS: TableSchema = TableSchema {
    name: "Measurements",
    columns: &[
        "Station",
        "Species",
        "Sex",
        "Barotrauma",
        "Notes",
        "TL_mm",
        "Wt_g_recorded",
        "scale_tare_g",
        "Wt_g",
        "Retained",
        "Near/Far",
    ],
};

/// An in-memory table: ordered rows keyed by column name.
#[derive(Debug, Clone, Serialize)]
pub struct Table {
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Row>,
    /// 1-based source position of each kept row
    #[serde(skip)]
    positions: Vec<usize>,
    #[serde(skip)]
    read: usize,
}

impl Table {
    pub fn new(name: impl Into<String>, headers: Vec<String>) -> Self {
        Self {
            name: name.into(),
            headers,
            rows: Vec::new(),
            positions: Vec::new(),
            read: 0,
        }
    }

    /// Append the next source row. Rows with no present cell are dropped
    /// but still count towards the positions of the rows after them.
    pub fn push_row(&mut self, row: Row) {
        self.read += 1;
        if row.values().any(|v| !v.is_null()) {
            self.rows.push(row);
            self.positions.push(self.read);
        }
    }

    /// Kept rows with their 1-based position in the source table.
    pub fn records(&self) -> impl Iterator<Item = (usize, &Row)> + '_ {
        self.positions.iter().copied().zip(self.rows.iter())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Fail on the first expected column the table lacks.
    pub fn require_columns(&self, schema: &TableSchema) -> LoadResult<()> {
        match schema
            .columns
            .iter()
            .find(|c| !self.headers.iter().any(|h| h == *c))
        {
            Some(column) => Err(LoadError::MissingColumn {
                table: self.name.clone(),
                column: column.to_string(),
            }),
            None => Ok(()),
        }
    }
}

/// The three survey tables.
#[derive(Debug, Clone, Serialize)]
pub struct SurveyTables {
    pub station: Table,
    pub cpue: Table,
    pub measurements: Table,
}

impl SurveyTables {
    /// Check every table against its schema.
    pub fn validate(&self) -> LoadResult<()> {
        self.station.require_columns(&STATION)?;
        self.cpue.require_columns(&CPUE)?;
        self.measurements.require_columns(&MEASUREMENTS)?;
        Ok(())
    }

    pub fn tables(&self) -> [&Table; 3] {
        [&self.station, &self.cpue, &self.measurements]
    }
}

/// Load the survey from a workbook file or a directory of CSV tables.
pub fn load_survey(path: &Path) -> LoadResult<SurveyTables> {
    log_info(format!("📖 Loading survey from {}", path.display()));

    let tables = if path.is_dir() {
        SurveyTables {
            station: delimited::read_table_file(path, STATION.name)?,
            cpue: delimited::read_table_file(path, CPUE.name)?,
            measurements: delimited::read_table_file(path, MEASUREMENTS.name)?,
        }
    } else if is_workbook(path) {
        let mut workbook = Workbook::open(path)?;
        SurveyTables {
            station: workbook.read_table(STATION.name)?,
            cpue: workbook.read_table(CPUE.name)?,
            measurements: workbook.read_table(MEASUREMENTS.name)?,
        }
    } else if !path.exists() {
        return Err(LoadError::Io {
            path: path.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file or directory"),
        });
    } else {
        return Err(LoadError::UnsupportedInput(path.to_path_buf()));
    };

    tables.validate()?;

    for table in tables.tables() {
        log_success_indent(format!("{}: {} rows", table.name, table.len()), 1);
    }

    Ok(tables)
}

fn is_workbook(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| WORKBOOK_EXTENSIONS.iter().any(|w| e.eq_ignore_ascii_case(w)))
}
