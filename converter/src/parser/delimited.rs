//! Delimited-text tables with encoding and delimiter auto-detection.
//!
//! Used when the survey is exported as one CSV file per sheet instead of a
//! workbook. Every cell stays a string; blank cells become missing values.

use encoding_rs::{Encoding, UTF_8};
use serde_json::Value;
use std::path::Path;

use super::value::{string_cell, Row};
use super::Table;
use crate::error::{LoadError, LoadResult};

/// Decode raw bytes to text.
///
/// The charset guessed by chardet selects the decoder; a guess encoding_rs
/// does not know falls back to UTF-8. A leading byte order mark is dropped.
pub fn decode_bytes(bytes: &[u8]) -> String {
    let (charset, _confidence, _language) = chardet::detect(bytes);
    decode_as(bytes, &charset)
}

/// Decode bytes with a named charset.
pub fn decode_as(bytes: &[u8], charset: &str) -> String {
    let encoding = Encoding::for_label(charset.trim().as_bytes()).unwrap_or(UTF_8);
    let (text, _, _) = encoding.decode(bytes);
    text.into_owned()
}

/// Detect the delimiter by counting occurrences in the header line
pub fn detect_delimiter(content: &str) -> u8 {
    let first_line = content.lines().next().unwrap_or("");

    let separators = [b',', b';', b'\t', b'|'];
    let mut best_sep = b',';
    let mut best_count = 0;

    for sep in separators {
        let count = first_line.bytes().filter(|b| *b == sep).count();
        if count > best_count {
            best_count = count;
            best_sep = sep;
        }
    }

    best_sep
}

/// Parse decoded text into a table with an explicit delimiter.
pub fn parse_str(name: &str, content: &str, delimiter: u8) -> LoadResult<Table> {
    let csv_error = |e: csv::Error| LoadError::Csv {
        table: name.to_string(),
        message: e.to_string(),
    };

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(csv_error)?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    if headers.iter().all(|h| h.is_empty()) {
        return Err(LoadError::Csv {
            table: name.to_string(),
            message: "no header row".to_string(),
        });
    }

    let mut table = Table::new(name, headers);

    for record in reader.records() {
        let record = record.map_err(csv_error)?;
        let mut row = Row::new();

        for (i, header) in table.headers.iter().enumerate() {
            if header.is_empty() {
                continue;
            }
            let value = record.get(i).map(string_cell).unwrap_or(Value::Null);
            row.insert(header.clone(), value);
        }

        table.push_row(row);
    }

    Ok(table)
}

/// Parse raw bytes with auto-detected encoding and delimiter.
pub fn parse_bytes_auto(name: &str, bytes: &[u8]) -> LoadResult<Table> {
    let content = decode_bytes(bytes);
    let delimiter = detect_delimiter(&content);
    parse_str(name, &content, delimiter)
}

/// Read `{dir}/{name}.csv`.
pub fn read_table_file(dir: &Path, name: &str) -> LoadResult<Table> {
    let path = dir.join(format!("{}.csv", name));
    if !path.is_file() {
        return Err(LoadError::MissingTable {
            table: name.to_string(),
            available: list_csv_tables(dir).join(", "),
        });
    }

    let bytes = std::fs::read(&path).map_err(|source| LoadError::Io {
        path: path.clone(),
        source,
    })?;
    parse_bytes_auto(name, &bytes)
}

/// Names of the CSV tables in a directory, sorted.
fn list_csv_tables(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .flatten()
                .map(|e| e.path())
                .filter(|p| p.extension().is_some_and(|e| e.eq_ignore_ascii_case("csv")))
                .filter_map(|p| p.file_stem().and_then(|s| s.to_str()).map(String::from))
                .collect()
        })
        .unwrap_or_default();
    names.sort();
    names
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_csv() {
        let table = parse_str("CPUE", "Station,Catch\nS1,3\nS2,", b',').unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(table.headers, vec!["Station", "Catch"]);
        assert_eq!(table.rows[0]["Station"], "S1");
        assert_eq!(table.rows[0]["Catch"], "3");
        assert!(table.rows[1]["Catch"].is_null());
    }

    #[test]
    fn test_quoted_values_keep_delimiters() {
        let csv = "station;notes\nS1;\"rough; windy\"";
        let table = parse_str("Station", csv, b';').unwrap();

        assert_eq!(table.rows[0]["notes"], "rough; windy");
    }

    #[test]
    fn test_short_rows_fill_missing() {
        let table = parse_str("CPUE", "a,b,c\n1,2", b',').unwrap();

        assert_eq!(table.rows[0]["b"], "2");
        assert!(table.rows[0]["c"].is_null());
    }

    #[test]
    fn test_detect_delimiter() {
        assert_eq!(detect_delimiter("a;b;c\n1;2;3"), b';');
        assert_eq!(detect_delimiter("a,b,c\n1,2,3"), b',');
        assert_eq!(detect_delimiter("a\tb\tc\n1\t2\t3"), b'\t');
        assert_eq!(detect_delimiter("a|b|c\n1|2|3"), b'|');
    }

    #[test]
    fn test_bom_is_stripped() {
        let bytes = "\u{feff}station,type\nS1,deployment".as_bytes();
        let table = parse_bytes_auto("Station", bytes).unwrap();

        assert_eq!(table.headers[0], "station");
    }

    #[test]
    fn test_latin1_decoding() {
        // "Société" in ISO-8859-1
        let bytes: &[u8] = &[0x53, 0x6F, 0x63, 0x69, 0xE9, 0x74, 0xE9];
        assert_eq!(decode_as(bytes, "iso-8859-1"), "Société");
    }

    #[test]
    fn test_unknown_charset_falls_back_to_utf8() {
        assert_eq!(decode_as("Société".as_bytes(), "not-a-charset"), "Société");
    }

    #[test]
    fn test_missing_file_reports_table() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("Station.csv"), "station\nS1").unwrap();

        let err = read_table_file(dir.path(), "CPUE").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("CPUE"));
        assert!(msg.contains("Station"));
    }
}
