//! Output tables.
//!
//! All three tables are serialized in memory first. Files are then written
//! next to their targets under a temporary name and renamed into place only
//! after every write succeeded. A failed run leaves earlier outputs as they
//! were: either all three tables are replaced or none is.

use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::{OutputError, OutputResult};
use crate::models::{
    Event, MeasurementOrFact, Occurrence, EVENT_COLUMNS, MEASUREMENT_COLUMNS, OCCURRENCE_COLUMNS,
};

const TEMP_SUFFIX: &str = ".partial";
const BACKUP_SUFFIX: &str = ".previous";

/// Target paths of the three output tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputPaths {
    pub event: PathBuf,
    pub occurrence: PathBuf,
    pub measurement_or_fact: PathBuf,
}

impl OutputPaths {
    /// `{dir}/{prefix}event.csv`, `{prefix}occurrence.csv`, `{prefix}measurementorfact.csv`.
    pub fn new(dir: &Path, prefix: &str) -> Self {
        Self {
            event: dir.join(format!("{}event.csv", prefix)),
            occurrence: dir.join(format!("{}occurrence.csv", prefix)),
            measurement_or_fact: dir.join(format!("{}measurementorfact.csv", prefix)),
        }
    }
}

/// Serialize records as CSV with an explicit header row.
///
/// The header is written even when there are no records.
pub fn render_table<T: Serialize>(columns: &[&str], records: &[T]) -> OutputResult<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer.write_record(columns)?;
    for record in records {
        writer.serialize(record)?;
    }

    writer
        .into_inner()
        .map_err(|e| OutputError::Flush(e.to_string()))
}

/// Serialize and commit the three tables.
pub fn write_outputs(
    paths: &OutputPaths,
    events: &[&Event],
    occurrences: &[Occurrence],
    facts: &[MeasurementOrFact],
) -> OutputResult<()> {
    let files = vec![
        (paths.event.clone(), render_table(&EVENT_COLUMNS, events)?),
        (paths.occurrence.clone(), render_table(&OCCURRENCE_COLUMNS, occurrences)?),
        (paths.measurement_or_fact.clone(), render_table(&MEASUREMENT_COLUMNS, facts)?),
    ];
    commit(files)
}

/// A table written under its temporary name, waiting to be renamed into place.
struct Staged {
    temp: PathBuf,
    target: PathBuf,
    backup: PathBuf,
}

/// Write every file under a temporary name, then rename them all.
///
/// If any rename fails, targets already replaced in this call get their
/// previous content back (or are removed) and the remaining temporary
/// files are deleted.
fn commit(files: Vec<(PathBuf, Vec<u8>)>) -> OutputResult<()> {
    let staged = stage(files)?;

    if let Some(blocked) = staged
        .iter()
        .find(|s| s.target.exists() && !s.target.is_file())
    {
        discard(&staged);
        return Err(OutputError::Io {
            path: blocked.target.clone(),
            source: io::Error::other("exists and is not a regular file"),
        });
    }

    let mut committed: Vec<(&Staged, bool)> = Vec::with_capacity(staged.len());
    for (i, entry) in staged.iter().enumerate() {
        match replace(entry) {
            Ok(backed_up) => committed.push((entry, backed_up)),
            Err(source) => {
                rollback(&committed);
                discard(&staged[i..]);
                return Err(OutputError::Io {
                    path: entry.target.clone(),
                    source,
                });
            }
        }
    }

    for (entry, backed_up) in &committed {
        if *backed_up {
            let _ = fs::remove_file(&entry.backup);
        }
    }
    Ok(())
}

fn stage(files: Vec<(PathBuf, Vec<u8>)>) -> OutputResult<Vec<Staged>> {
    let mut staged = Vec::with_capacity(files.len());

    for (target, bytes) in files {
        if let Some(dir) = target.parent().filter(|d| !d.as_os_str().is_empty()) {
            if let Err(source) = fs::create_dir_all(dir) {
                discard(&staged);
                return Err(OutputError::Io {
                    path: dir.to_path_buf(),
                    source,
                });
            }
        }

        let temp = sibling(&target, TEMP_SUFFIX);
        if let Err(source) = fs::write(&temp, &bytes) {
            discard(&staged);
            return Err(OutputError::Io { path: temp, source });
        }
        staged.push(Staged {
            temp,
            backup: sibling(&target, BACKUP_SUFFIX),
            target,
        });
    }
    Ok(staged)
}

/// Move an existing target aside, then move the temporary file into place.
///
/// Returns whether a previous target was kept as backup.
fn replace(entry: &Staged) -> io::Result<bool> {
    let backed_up = entry.target.is_file();
    if backed_up {
        fs::rename(&entry.target, &entry.backup)?;
    }
    if let Err(e) = fs::rename(&entry.temp, &entry.target) {
        if backed_up {
            let _ = fs::rename(&entry.backup, &entry.target);
        }
        return Err(e);
    }
    Ok(backed_up)
}

/// Undo `replace` for every committed target, newest first.
fn rollback(committed: &[(&Staged, bool)]) {
    for (entry, backed_up) in committed.iter().rev() {
        if *backed_up {
            let _ = fs::rename(&entry.backup, &entry.target);
        } else {
            let _ = fs::remove_file(&entry.target);
        }
    }
}

fn sibling(target: &Path, suffix: &str) -> PathBuf {
    let mut name = target.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

fn discard(staged: &[Staged]) {
    for entry in staged {
        let _ = fs::remove_file(&entry.temp);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Subject;

    #[test]
    fn test_header_written_for_empty_table() {
        let bytes = render_table::<Occurrence>(&OCCURRENCE_COLUMNS, &[]).unwrap();
        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            "occurrenceID,eventID,vernacularName,individualCount,occurrenceRemarks,basisOfRecord,sex\n"
        );
    }

    #[test]
    fn test_fact_row_blank_fields() {
        let fact = MeasurementOrFact {
            subject: Subject::Event("S1".into()),
            measurement_type: "wind direction",
            value: "NE".into(),
            unit: None,
            unit_id: None,
        };
        let bytes = render_table(&MEASUREMENT_COLUMNS, &[fact]).unwrap();
        let text = String::from_utf8(bytes).unwrap();

        assert_eq!(text.lines().nth(1), Some(",S1,wind direction,NE,,"));
    }

    #[test]
    fn test_footprint_is_quoted() {
        let event = Event {
            event_id: "7_deployment".into(),
            footprint_wkt: Some("LINESTRING (-70.1 41.5, -70.2 41.6)".into()),
            ..Event::default()
        };
        let bytes = render_table(&EVENT_COLUMNS, &[&event]).unwrap();
        let text = String::from_utf8(bytes).unwrap();

        assert_eq!(
            text.lines().nth(1),
            Some("7_deployment,,,,,,,,,,,\"LINESTRING (-70.1 41.5, -70.2 41.6)\"")
        );
    }

    #[test]
    fn test_write_outputs_creates_all_files() {
        let dir = tempfile::tempdir().unwrap();
        let paths = OutputPaths::new(&dir.path().join("out"), "dwc_");

        write_outputs(&paths, &[], &[], &[]).unwrap();

        assert!(paths.event.is_file());
        assert!(paths.occurrence.is_file());
        assert!(paths.measurement_or_fact.is_file());
        assert!(!sibling(&paths.event, TEMP_SUFFIX).exists());
    }

    fn entries(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_blocked_target_commits_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let paths = OutputPaths::new(dir.path(), "dwc_");
        fs::write(&paths.event, "previous\n").unwrap();
        fs::create_dir_all(paths.occurrence.join("keep")).unwrap();

        let err = write_outputs(&paths, &[], &[], &[]).unwrap_err();

        assert!(matches!(err, OutputError::Io { ref path, .. } if path == &paths.occurrence));
        assert_eq!(fs::read_to_string(&paths.event).unwrap(), "previous\n");
        assert_eq!(entries(dir.path()), vec!["dwc_event.csv", "dwc_occurrence.csv"]);
    }

    #[test]
    fn test_rollback_restores_previous_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let paths = OutputPaths::new(dir.path(), "dwc_");
        fs::write(&paths.event, "previous\n").unwrap();

        let staged = stage(vec![
            (paths.event.clone(), b"new event\n".to_vec()),
            (paths.occurrence.clone(), b"new occurrence\n".to_vec()),
        ])
        .unwrap();
        let committed: Vec<(&Staged, bool)> =
            staged.iter().map(|s| (s, replace(s).unwrap())).collect();
        assert_eq!(fs::read_to_string(&paths.event).unwrap(), "new event\n");
        assert!(committed[0].1);
        assert!(!committed[1].1);

        rollback(&committed);

        assert_eq!(fs::read_to_string(&paths.event).unwrap(), "previous\n");
        assert_eq!(entries(dir.path()), vec!["dwc_event.csv"]);
    }

    #[test]
    fn test_rewrite_replaces_previous_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let paths = OutputPaths::new(dir.path(), "dwc_");
        fs::write(&paths.event, "previous\n").unwrap();

        write_outputs(&paths, &[], &[], &[]).unwrap();

        assert!(fs::read_to_string(&paths.event).unwrap().starts_with("eventID,"));
        assert_eq!(
            entries(dir.path()),
            vec!["dwc_event.csv", "dwc_measurementorfact.csv", "dwc_occurrence.csv"]
        );
    }
}
