//! phonocat core - manifest loading, dataset validation and key lookup.
//!
//! This crate builds an immutable [`Registry`] over a catalog of
//! pronunciation datasets: one TSV file per language, script, dialect,
//! filtering and transcription depth combination.

pub mod config;
pub mod error;
pub mod index;
pub mod languages;
pub mod manifest;
pub mod model;
pub mod query;
pub mod registry;
pub mod report;
pub mod schema;
pub mod script;
pub mod validate;

pub use config::{RegistryConfig, ValidationMode};
pub use error::Error;
pub use index::KeyIndex;
pub use languages::{LanguageInfo, LanguageTable};
pub use manifest::ManifestFormat;
pub use model::{CatalogEntry, Depth, EntryKey, PronunciationRow};
pub use query::{Query, QueryIter};
pub use registry::{CatalogSummary, Registry, Rows};
pub use report::{DetectedScript, FileReport, Severity, ValidationIssue, ValidationReport};
pub use schema::ColumnSchema;
