//! Transformation module.
//!
//! Survey tables to Darwin Core:
//! - Events: cruise/station hierarchy
//! - Occurrences: catch and measured organisms
//! - Measurements: long-format facts
//! - Pipeline: load, build, check, write

pub mod events;
pub mod measurements;
pub mod occurrences;
pub mod pipeline;

pub use events::{build_events, EventHierarchy};
pub use measurements::{extract_measurements, vocabulary_description, Extraction, FACT_SOURCES};
pub use occurrences::build_occurrences;
pub use pipeline::*;
