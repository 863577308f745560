//! Registry configuration.

use std::path::PathBuf;
use std::time::Duration;

use crate::manifest::ManifestFormat;
use crate::schema::ColumnSchema;

/// When dataset files are scanned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValidationMode {
    /// Scan every file while loading.
    #[default]
    Eager,
    /// Scan only on request, through `Registry::validate_entry`.
    Lazy,
}

fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|count| count.get())
        .unwrap_or(4)
        .max(1)
}

/// Configuration for building a registry.
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Directory that file references are resolved against. Defaults to the
    /// manifest's parent directory.
    pub data_dir: Option<PathBuf>,

    /// Manifest format. Detected from the file extension when unset.
    pub manifest_format: Option<ManifestFormat>,

    /// Expected column shape of dataset files.
    pub schema: ColumnSchema,

    /// Eager or lazy file validation.
    pub validation: ValidationMode,

    /// Fail the load on the first error-severity finding instead of
    /// excluding the affected entry.
    pub strict: bool,

    /// Number of validation worker threads.
    pub workers: usize,

    /// Upper bound on the eager validation phase.
    pub deadline: Option<Duration>,

    /// Optional `languages.json` to cross-check manifest rows against.
    pub languages: Option<PathBuf>,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            manifest_format: None,
            schema: ColumnSchema::default(),
            validation: ValidationMode::Eager,
            strict: false,
            workers: default_workers(),
            deadline: None,
            languages: None,
        }
    }
}

impl RegistryConfig {
    /// Create a configuration resolving files against `data_dir`.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: Some(data_dir.into()),
            ..Default::default()
        }
    }

    /// Set the data directory.
    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = Some(dir.into());
        self
    }

    /// Force a manifest format.
    pub fn with_manifest_format(mut self, format: ManifestFormat) -> Self {
        self.manifest_format = Some(format);
        self
    }

    /// Set the column schema.
    pub fn with_schema(mut self, schema: ColumnSchema) -> Self {
        self.schema = schema;
        self
    }

    /// Set the validation mode.
    pub fn with_validation(mut self, mode: ValidationMode) -> Self {
        self.validation = mode;
        self
    }

    /// Enable or disable strict mode.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Set the number of validation workers.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Bound the validation phase.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Cross-check against a language table.
    pub fn with_languages(mut self, path: impl Into<PathBuf>) -> Self {
        self.languages = Some(path.into());
        self
    }
}
