//! High-level conversion pipeline.
//!
//! ```text
//! load_survey ──▶ build_events ──────────┐
//!             ├─▶ build_occurrences ─────┼──▶ integrity checks ──▶ write_outputs
//!             └─▶ extract_measurements ──┘
//! ```
//!
//! Nothing is written until every table has been built and checked.
//!
//! # Example
//!
//! ```rust,ignore
//! use survey2dwc::{convert, ConvertOptions};
//! use std::path::Path;
//!
//! let summary = convert(Path::new("Data_sample.xlsx"), &ConvertOptions::default())?;
//! println!("{} events", summary.events.total);
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::events::{build_events, EventHierarchy};
use super::measurements::extract_measurements;
use super::occurrences::build_occurrences;
use crate::error::PipelineResult;
use crate::logs::{log_error, log_info, log_info_indent, log_success, log_warning, LogEntry, LOG_BOOK};
use crate::models::{MeasurementOrFact, Occurrence, OccurrenceOrigin};
use crate::parser::{load_survey, SurveyTables};
use crate::validation::{check_event_hierarchy, check_links, IntegrityReport};
use crate::writer::{write_outputs, OutputPaths};

/// Options for a conversion run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConvertOptions {
    /// Directory receiving the three output tables
    pub output_dir: PathBuf,

    /// File name prefix for the output tables
    pub prefix: String,

    /// Build and check everything but write nothing
    pub dry_run: bool,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("outputs"),
            prefix: "dwc_".to_string(),
            dry_run: false,
        }
    }
}

/// The three derived tables of one survey.
#[derive(Debug, Clone)]
pub struct DarwinCoreArchive {
    pub events: EventHierarchy,
    pub occurrences: Vec<Occurrence>,
    pub facts: Vec<MeasurementOrFact>,
    /// Facts dropped for lack of a station code
    pub unlinked_facts: usize,
    pub integrity: IntegrityReport,
}

/// Row counts of the input tables
#[derive(Debug, Clone, Serialize)]
pub struct InputCounts {
    pub station: usize,
    pub cpue: usize,
    pub measurements: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct EventCounts {
    pub cruises: usize,
    pub stations: usize,
    pub total: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct OccurrenceCounts {
    pub catch: usize,
    pub measurement: usize,
    pub total: usize,
}

/// Summary of a conversion run
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    pub input: PathBuf,
    pub rows: InputCounts,
    pub events: EventCounts,
    pub occurrences: OccurrenceCounts,
    pub measurements: usize,
    pub unlinked_facts: usize,
    pub integrity: IntegrityReport,
    /// `None` on a dry run
    pub outputs: Option<OutputPaths>,
    pub log: Vec<LogEntry>,
}

/// Derive all three tables from loaded survey tables.
pub fn build_archive(tables: &SurveyTables) -> PipelineResult<DarwinCoreArchive> {
    log_info("🧭 Building event hierarchy...");
    let events = build_events(&tables.station)?;
    check_event_hierarchy(&events)?;
    log_success(format!(
        "{} cruise events, {} station events",
        events.cruises.len(),
        events.stations.len()
    ));

    log_info("🐟 Building occurrences...");
    let occurrences = build_occurrences(&tables.cpue, &tables.measurements)?;
    log_success(format!("{} occurrences", occurrences.len()));

    log_info("📏 Extracting measurements and facts...");
    let extraction = extract_measurements(tables)?;
    log_success(format!("{} measurement-or-fact records", extraction.facts.len()));

    let integrity = check_links(&events, &occurrences, &extraction.facts);
    if integrity.orphan_occurrences + integrity.orphan_facts > 0 {
        log_warning(format!(
            "{} occurrences and {} facts reference stations without station metadata",
            integrity.orphan_occurrences, integrity.orphan_facts
        ));
        for station in &integrity.unknown_stations {
            log_info_indent(format!("unknown station '{}'", station), 1);
        }
    }
    if integrity.unlinked_occurrences > 0 {
        log_warning(format!(
            "{} occurrences have no station code",
            integrity.unlinked_occurrences
        ));
    }

    Ok(DarwinCoreArchive {
        events,
        occurrences,
        facts: extraction.facts,
        unlinked_facts: extraction.unlinked,
        integrity,
    })
}

/// Load, build, check and write.
pub fn convert(input: &Path, options: &ConvertOptions) -> PipelineResult<RunSummary> {
    LOG_BOOK.drain();

    let result = run(input, options);
    if let Err(ref e) = result {
        log_error(e.to_string());
    }
    result
}

fn run(input: &Path, options: &ConvertOptions) -> PipelineResult<RunSummary> {
    let tables = load_survey(input)?;
    let archive = build_archive(&tables)?;

    let outputs = if options.dry_run {
        log_info("Dry run: no files written");
        None
    } else {
        let paths = OutputPaths::new(&options.output_dir, &options.prefix);
        log_info(format!("💾 Writing tables to {}", options.output_dir.display()));
        let events: Vec<_> = archive.events.iter().collect();
        write_outputs(&paths, &events, &archive.occurrences, &archive.facts)?;
        log_success("All three tables written");
        Some(paths)
    };

    Ok(summarize(input, &tables, archive, outputs))
}

fn summarize(
    input: &Path,
    tables: &SurveyTables,
    archive: DarwinCoreArchive,
    outputs: Option<OutputPaths>,
) -> RunSummary {
    let catch = archive
        .occurrences
        .iter()
        .filter(|o| o.origin == OccurrenceOrigin::Catch)
        .count();

    RunSummary {
        input: input.to_path_buf(),
        rows: InputCounts {
            station: tables.station.len(),
            cpue: tables.cpue.len(),
            measurements: tables.measurements.len(),
        },
        events: EventCounts {
            cruises: archive.events.cruises.len(),
            stations: archive.events.stations.len(),
            total: archive.events.len(),
        },
        occurrences: OccurrenceCounts {
            catch,
            measurement: archive.occurrences.len() - catch,
            total: archive.occurrences.len(),
        },
        measurements: archive.facts.len(),
        unlinked_facts: archive.unlinked_facts,
        integrity: archive.integrity,
        outputs,
        log: LOG_BOOK.drain(),
    }
}
