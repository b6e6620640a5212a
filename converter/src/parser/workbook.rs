//! Spreadsheet workbooks (xlsx, xlsm, xls, ods) via calamine.

use calamine::{open_workbook_auto, Data, Reader, Sheets};
use chrono::{NaiveDate, TimeDelta};
use serde_json::Value;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use super::value::{float_cell, string_cell, Row};
use super::Table;
use crate::error::{LoadError, LoadResult};

/// File extensions opened as workbooks.
pub const WORKBOOK_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xlsb", "xls", "ods"];

/// An open workbook.
pub struct Workbook {
    path: PathBuf,
    sheets: Sheets<BufReader<File>>,
}

impl Workbook {
    pub fn open(path: &Path) -> LoadResult<Self> {
        let sheets = open_workbook_auto(path).map_err(|e| LoadError::Workbook {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Ok(Self {
            path: path.to_path_buf(),
            sheets,
        })
    }

    pub fn sheet_names(&self) -> Vec<String> {
        self.sheets.sheet_names()
    }

    /// Read a named sheet. The first row holds the column names.
    pub fn read_table(&mut self, name: &str) -> LoadResult<Table> {
        let names = self.sheet_names();
        if !names.iter().any(|n| n == name) {
            return Err(LoadError::MissingTable {
                table: name.to_string(),
                available: names.join(", "),
            });
        }

        let range = self
            .sheets
            .worksheet_range(name)
            .map_err(|e| LoadError::Workbook {
                path: self.path.clone(),
                message: format!("sheet '{}': {}", name, e),
            })?;

        let mut rows = range.rows();
        let headers: Vec<String> = rows
            .next()
            .map(|cells| cells.iter().map(|c| c.to_string().trim().to_string()).collect())
            .unwrap_or_default();

        let mut table = Table::new(name, headers);

        for cells in rows {
            let mut row = Row::new();
            for (i, header) in table.headers.iter().enumerate() {
                if header.is_empty() {
                    continue;
                }
                let value = cells.get(i).map(cell_to_value).unwrap_or(Value::Null);
                row.insert(header.clone(), value);
            }
            table.push_row(row);
        }

        Ok(table)
    }
}

/// Convert a spreadsheet cell into a normalized JSON cell.
pub fn cell_to_value(cell: &Data) -> Value {
    match cell {
        Data::Int(i) => Value::from(*i),
        Data::Float(f) => float_cell(*f),
        Data::String(s) => string_cell(s),
        Data::Bool(b) => Value::Bool(*b),
        Data::DateTime(dt) => excel_serial_to_iso(dt.as_f64())
            .map(Value::String)
            .unwrap_or(Value::Null),
        Data::DateTimeIso(s) | Data::DurationIso(s) => string_cell(s),
        _ => Value::Null,
    }
}

/// Convert an Excel serial date (days since 1899-12-30) to ISO 8601.
pub fn excel_serial_to_iso(serial: f64) -> Option<String> {
    if !serial.is_finite() {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    let seconds = (serial * 86_400.0).round() as i64;
    let datetime = epoch.checked_add_signed(TimeDelta::try_seconds(seconds)?)?;
    Some(datetime.format("%Y-%m-%dT%H:%M:%S").to_string())
}
