//! Validation findings.

use serde::Serialize;
use thiserror::Error;

use crate::model::EntryKey;

/// How much a finding matters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Reported; the entry stays in the registry.
    Warning,
    /// The entry is excluded from a best-effort registry, or the load
    /// fails in strict mode.
    Error,
}

/// A single validation finding, tied to the manifest row it concerns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValidationIssue {
    /// A dataset line does not match the column schema.
    #[error("{file}:{line}: schema violation: {detail}")]
    SchemaViolation {
        row: usize,
        file: String,
        line: usize,
        detail: String,
    },

    /// Declared and actual row counts differ.
    #[error("{file}: declared {expected} entries, found {actual}")]
    CountMismatch {
        row: usize,
        file: String,
        expected: u64,
        actual: u64,
    },

    /// A dataset file is not well-formed UTF-8.
    #[error("{file}:{line}: invalid UTF-8 at byte {offset}")]
    EncodingError {
        row: usize,
        file: String,
        line: usize,
        offset: usize,
    },

    /// A dataset file is missing or cannot be read.
    #[error("{file}: unreadable: {reason}")]
    Unreadable {
        row: usize,
        file: String,
        reason: String,
    },

    /// A filtered entry has no unfiltered counterpart.
    #[error("row {row}: filtered entry {key} has no unfiltered counterpart")]
    OrphanFiltered { row: usize, key: EntryKey },

    /// The language code is absent from the language table.
    #[error("row {row}: language `{code}` is not in the language table")]
    UnknownLanguage { row: usize, code: String },

    /// A manifest field disagrees with the language table.
    #[error("row {row}: {field} is `{found}`, language table says `{expected}`")]
    MetadataMismatch {
        row: usize,
        field: &'static str,
        found: String,
        expected: String,
    },

    /// The dataset file name does not follow the naming convention.
    #[error("row {row}: file `{file}` does not match expected name `{expected}`")]
    FileNameMismatch {
        row: usize,
        file: String,
        expected: String,
    },

    /// The words of a dataset are written in a different script than the
    /// manifest or language table declares.
    #[error("{file}: words are in `{found}` script, expected `{expected}`")]
    ScriptMismatch {
        row: usize,
        file: String,
        expected: String,
        found: String,
    },
}

impl ValidationIssue {
    /// Severity of this finding.
    pub fn severity(&self) -> Severity {
        match self {
            ValidationIssue::SchemaViolation { .. }
            | ValidationIssue::EncodingError { .. }
            | ValidationIssue::Unreadable { .. } => Severity::Error,
            ValidationIssue::CountMismatch { .. }
            | ValidationIssue::OrphanFiltered { .. }
            | ValidationIssue::UnknownLanguage { .. }
            | ValidationIssue::MetadataMismatch { .. }
            | ValidationIssue::FileNameMismatch { .. }
            | ValidationIssue::ScriptMismatch { .. } => Severity::Warning,
        }
    }

    /// Manifest row of the entry this finding concerns.
    pub fn row(&self) -> usize {
        match self {
            ValidationIssue::SchemaViolation { row, .. }
            | ValidationIssue::CountMismatch { row, .. }
            | ValidationIssue::EncodingError { row, .. }
            | ValidationIssue::Unreadable { row, .. }
            | ValidationIssue::OrphanFiltered { row, .. }
            | ValidationIssue::UnknownLanguage { row, .. }
            | ValidationIssue::MetadataMismatch { row, .. }
            | ValidationIssue::FileNameMismatch { row, .. }
            | ValidationIssue::ScriptMismatch { row, .. } => *row,
        }
    }

    /// Short machine-readable name of the finding.
    pub fn kind(&self) -> &'static str {
        match self {
            ValidationIssue::SchemaViolation { .. } => "schema_violation",
            ValidationIssue::CountMismatch { .. } => "count_mismatch",
            ValidationIssue::EncodingError { .. } => "encoding_error",
            ValidationIssue::Unreadable { .. } => "unreadable",
            ValidationIssue::OrphanFiltered { .. } => "orphan_filtered",
            ValidationIssue::UnknownLanguage { .. } => "unknown_language",
            ValidationIssue::MetadataMismatch { .. } => "metadata_mismatch",
            ValidationIssue::FileNameMismatch { .. } => "file_name_mismatch",
            ValidationIssue::ScriptMismatch { .. } => "script_mismatch",
        }
    }
}

/// Scan summary of one dataset file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileReport {
    pub row: usize,
    pub file: String,
    /// Number of data lines.
    pub rows: u64,
    pub bytes: u64,
    /// Lines that did not match the column schema.
    pub schema_violations: u64,
    /// Hex blake3 digest of the file content.
    pub digest: String,
    /// Dominant Unicode script of the word column, if any word could be
    /// classified.
    pub script: Option<DetectedScript>,
}

/// Unicode script detected in a dataset's word column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DetectedScript {
    /// Script name, e.g. `Latin` or `Old Italic`.
    pub name: String,
    /// Lowercase ISO 15924 code, e.g. `latn`.
    pub code: String,
    /// Words written entirely in this script.
    pub words: u64,
    /// Words written entirely in a single script.
    pub classified: u64,
}

/// Everything the build phase found, returned alongside the registry.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationReport {
    /// Findings ordered by manifest row, errors before warnings.
    pub issues: Vec<ValidationIssue>,
    /// Per-file scan results, in manifest order.
    pub files: Vec<FileReport>,
    /// Entries left out of the registry because of error findings.
    pub excluded: Vec<EntryKey>,
}

impl ValidationReport {
    /// No findings at all.
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    /// Whether any error-severity finding was recorded.
    pub fn has_errors(&self) -> bool {
        self.errors().next().is_some()
    }

    /// Error-severity findings.
    pub fn errors(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues
            .iter()
            .filter(|i| i.severity() == Severity::Error)
    }

    /// Warning-severity findings.
    pub fn warnings(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues
            .iter()
            .filter(|i| i.severity() == Severity::Warning)
    }

    /// `(expected, actual)` pairs of every count mismatch.
    pub fn count_mismatches(&self) -> Vec<(u64, u64)> {
        self.issues
            .iter()
            .filter_map(|i| match i {
                ValidationIssue::CountMismatch {
                    expected, actual, ..
                } => Some((*expected, *actual)),
                _ => None,
            })
            .collect()
    }

    /// Total data lines scanned.
    pub fn rows_scanned(&self) -> u64 {
        self.files.iter().map(|f| f.rows).sum()
    }

    pub(crate) fn sort(&mut self) {
        self.issues
            .sort_by_key(|i| (i.row(), std::cmp::Reverse(i.severity())));
        self.files.sort_by_key(|f| f.row);
    }
}
