//! Core error types.

use std::time::Duration;

use thiserror::Error;

use crate::model::EntryKey;
use crate::report::ValidationIssue;

/// Registry errors.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error while reading a manifest or metadata file.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON manifest or language table could not be decoded.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// A manifest row is missing a required field or holds an invalid value.
    #[error("malformed manifest row {row}: field `{field}`: {reason}")]
    MalformedEntry {
        row: usize,
        field: &'static str,
        reason: String,
    },

    /// Two manifest rows share the same composite key.
    #[error("duplicate key {key}: rows {first_row} and {second_row}")]
    DuplicateKey {
        key: EntryKey,
        first_row: usize,
        second_row: usize,
    },

    /// No entry exists for the requested key.
    #[error("no entry for {0}")]
    NotFound(EntryKey),

    /// A dataset file failed validation in strict mode, or a streamed row
    /// was not valid UTF-8.
    #[error("validation failed: {0}")]
    Validation(ValidationIssue),

    /// The validation phase ran past the configured deadline.
    #[error("validation exceeded deadline of {deadline:?} after {elapsed:?}")]
    DeadlineExceeded { deadline: Duration, elapsed: Duration },
}

impl Error {
    /// Whether this error aborts a registry load.
    ///
    /// Everything except a lookup miss is fatal to the build phase.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Error::NotFound(_))
    }
}
