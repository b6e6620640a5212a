//! # survey2dwc - pot-survey workbooks to Darwin Core
//!
//! Converts a field-survey workbook (station metadata, catch per unit effort,
//! biological measurements) into three linked Darwin Core tables: an event
//! core, an occurrence extension and a measurement-or-fact extension.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐     ┌────────────┐     ┌─────────────────┐     ┌────────────────┐
//! │ Workbook or  │────▶│   Parser   │────▶│    Transform    │────▶│ event.csv      │
//! │ CSV tables   │     │ (3 tables) │     │ events / occ /  │     │ occurrence.csv │
//! └──────────────┘     └────────────┘     │ measurements    │     │ mof.csv        │
//!                                         └─────────────────┘     └────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use survey2dwc::{convert, ConvertOptions};
//!
//! let summary = convert("Data_sample.xlsx".as_ref(), &ConvertOptions::default()).unwrap();
//! println!("{} occurrences", summary.occurrences.total);
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Layered error types
//! - [`logs`] - Pipeline progress log
//! - [`models`] - Darwin Core records
//! - [`parser`] - Workbook and CSV loading
//! - [`transform`] - Event, occurrence and measurement builders, pipeline
//! - [`validation`] - Identifier integrity checks
//! - [`writer`] - CSV output with all-or-nothing commit

// Core modules
pub mod error;
pub mod logs;
pub mod models;

// Input
pub mod parser;

// Transformation
pub mod transform;

// Checks
pub mod validation;

// Output
pub mod writer;

// =============================================================================
// Re-exports - Errors
// =============================================================================

pub use error::{BuildError, LoadError, OutputError, PipelineError};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{
    BasisOfRecord,
    Event,
    MeasurementOrFact,
    Occurrence,
    OccurrenceOrigin,
    Subject,
};

// =============================================================================
// Re-exports - Parsing
// =============================================================================

pub use parser::{load_survey, SurveyTables, Table, TableSchema, CPUE, MEASUREMENTS, STATION};

// =============================================================================
// Re-exports - Pipeline
// =============================================================================

pub use transform::{
    build_archive,
    build_events,
    build_occurrences,
    convert,
    extract_measurements,
    vocabulary_description,
    ConvertOptions,
    DarwinCoreArchive,
    EventHierarchy,
    RunSummary,
};

pub use writer::OutputPaths;
