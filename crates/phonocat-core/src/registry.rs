//! The corpus registry.
//!
//! Building a registry is the only phase that does work: the manifest is
//! parsed, dataset files are scanned, and the key index is constructed.
//! The finished registry is an immutable value; every read operation takes
//! `&self` and needs no synchronisation.

use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::time::Instant;

use serde::Serialize;

use crate::config::{RegistryConfig, ValidationMode};
use crate::error::Error;
use crate::index::KeyIndex;
use crate::languages::LanguageTable;
use crate::manifest;
use crate::model::{CatalogEntry, Depth, EntryKey, PronunciationRow};
use crate::query::{Query, QueryIter};
use crate::report::{ValidationIssue, ValidationReport};
use crate::schema::ColumnSchema;
use crate::validate;

/// Headline numbers of a catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CatalogSummary {
    /// Number of dataset files.
    pub datasets: usize,
    /// Sum of declared entry counts.
    pub entries: u64,
    pub languages: usize,
    pub scripts: usize,
    pub dialects: usize,
    pub broad: usize,
    pub narrow: usize,
    pub filtered: usize,
}

/// Immutable, indexed view of a pronunciation dataset catalog.
#[derive(Debug)]
pub struct Registry {
    index: KeyIndex,
    report: ValidationReport,
    data_dir: PathBuf,
    schema: ColumnSchema,
    languages: Option<LanguageTable>,
}

impl Registry {
    /// Load a manifest with the default configuration.
    pub fn load(manifest_path: impl AsRef<Path>) -> Result<Self, Error> {
        Self::load_with(manifest_path, RegistryConfig::default())
    }

    /// Load a manifest.
    ///
    /// Dataset files are resolved against `config.data_dir`, or against the
    /// manifest's directory when unset.
    pub fn load_with(manifest_path: impl AsRef<Path>, config: RegistryConfig) -> Result<Self, Error> {
        let manifest_path = manifest_path.as_ref();
        let started = Instant::now();

        let entries = manifest::load_manifest(manifest_path, config.manifest_format)?;
        tracing::info!(
            manifest = %manifest_path.display(),
            entries = entries.len(),
            "manifest loaded"
        );

        let data_dir = config.data_dir.clone().unwrap_or_else(|| {
            manifest_path
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from("."))
        });

        let registry = Self::from_entries(entries, data_dir, &config)?;
        tracing::info!(
            entries = registry.len(),
            issues = registry.report.issues.len(),
            excluded = registry.report.excluded.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "registry ready"
        );
        Ok(registry)
    }

    /// Build a registry from already-parsed entries.
    pub fn from_entries(
        entries: Vec<CatalogEntry>,
        data_dir: impl Into<PathBuf>,
        config: &RegistryConfig,
    ) -> Result<Self, Error> {
        let data_dir = data_dir.into();
        let mut report = ValidationReport::default();

        let languages = match &config.languages {
            Some(path) => {
                let table = LanguageTable::from_path(path)?;
                report.issues.extend(table.cross_check(&entries));
                Some(table)
            }
            None => None,
        };

        // Duplicate keys are fatal before any file is touched.
        let index = KeyIndex::build(entries)?;

        let index = match config.validation {
            ValidationMode::Lazy => index,
            ValidationMode::Eager => {
                let scans = validate::scan_all(
                    index.as_slice(),
                    &data_dir,
                    &config.schema,
                    config.workers,
                    config.strict,
                    config.deadline,
                )?;

                let mut rejected = HashSet::new();
                for (pos, (entry, scan)) in index.iter().zip(scans).enumerate() {
                    if scan.has_errors() {
                        rejected.insert(pos);
                        report.excluded.push(entry.key());
                    }
                    if let (Some(table), Some(detected)) = (
                        &languages,
                        scan.report.as_ref().and_then(|r| r.script.as_ref()),
                    ) {
                        report.issues.extend(table.check_detected_script(entry, detected));
                    }
                    report.files.extend(scan.report);
                    report.issues.extend(scan.issues);
                }

                if rejected.is_empty() {
                    index
                } else {
                    for key in &report.excluded {
                        tracing::warn!(%key, "entry excluded from registry");
                    }
                    let kept = index
                        .iter()
                        .enumerate()
                        .filter(|(pos, _)| !rejected.contains(pos))
                        .map(|(_, e)| e.clone())
                        .collect();
                    KeyIndex::build(kept)?
                }
            }
        };

        report.issues.extend(index.orphan_filtered());
        report.sort();

        for issue in report.warnings() {
            tracing::debug!(%issue, "validation warning");
        }

        Ok(Self {
            index,
            report,
            data_dir,
            schema: config.schema.clone(),
            languages,
        })
    }

    /// Number of entries in the registry.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// All entries in manifest order.
    pub fn iter(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.index.iter()
    }

    /// The underlying key index.
    pub fn index(&self) -> &KeyIndex {
        &self.index
    }

    /// Findings collected while building the registry.
    pub fn report(&self) -> &ValidationReport {
        &self.report
    }

    /// Directory that file references resolve against.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Exact lookup by key.
    pub fn get(&self, key: &EntryKey) -> Option<&CatalogEntry> {
        self.index.get(key)
    }

    /// Exact lookup by key fields. A miss is [`Error::NotFound`].
    pub fn lookup(
        &self,
        language_code: &str,
        script: &str,
        dialect: Option<&str>,
        filtered: bool,
        depth: Depth,
    ) -> Result<&CatalogEntry, Error> {
        self.index
            .lookup(language_code, script, dialect, filtered, depth)
    }

    /// Entries of one language ordered by script, dialect and depth.
    pub fn entries_for_language(&self, language_code: &str) -> Vec<&CatalogEntry> {
        self.index.entries_for_language(language_code)
    }

    /// Lazily evaluate `query`.
    pub fn query(&self, query: &Query) -> QueryIter<'_> {
        query.run(&self.index)
    }

    /// Full path of an entry's dataset file.
    pub fn resolve(&self, entry: &CatalogEntry) -> PathBuf {
        self.data_dir.join(&entry.file_reference)
    }

    /// Scan one entry's dataset file now.
    pub fn validate_entry(&self, key: &EntryKey) -> Result<Vec<ValidationIssue>, Error> {
        let entry = self
            .get(key)
            .ok_or_else(|| Error::NotFound(key.clone()))?;
        let scan = validate::scan_entry(entry, &self.data_dir, &self.schema);
        let mut issues = scan.issues;
        if let (Some(table), Some(detected)) = (
            &self.languages,
            scan.report.as_ref().and_then(|r| r.script.as_ref()),
        ) {
            issues.extend(table.check_detected_script(entry, detected));
        }
        Ok(issues)
    }

    /// Stream the pronunciations of one entry.
    pub fn rows(&self, key: &EntryKey) -> Result<Rows<'_>, Error> {
        let entry = self
            .get(key)
            .ok_or_else(|| Error::NotFound(key.clone()))?;
        let file = File::open(self.resolve(entry))?;
        Ok(Rows {
            entry,
            reader: BufReader::new(file),
            buf: Vec::new(),
            line: 0,
            offset: 0,
            done: false,
        })
    }

    /// Headline numbers over the indexed entries.
    pub fn summary(&self) -> CatalogSummary {
        let mut summary = CatalogSummary {
            datasets: self.index.len(),
            languages: self.index.languages().count(),
            scripts: self.index.scripts().count(),
            dialects: self.index.dialects().len(),
            ..Default::default()
        };
        for entry in self.index.iter() {
            summary.entries += entry.entry_count.unwrap_or(0);
            match entry.depth {
                Depth::Broad => summary.broad += 1,
                Depth::Narrow => summary.narrow += 1,
            }
            if entry.filtered {
                summary.filtered += 1;
            }
        }
        summary
    }
}

/// Pronunciation rows read from one dataset file.
///
/// The first column is the word and the second the transcription; further
/// columns are kept in `extra`. Lines without a tab yield an empty
/// transcription. A line that is not valid UTF-8 yields an
/// [`ValidationIssue::EncodingError`] naming it, and reading continues with
/// the next line. Iteration ends after an I/O error.
pub struct Rows<'a> {
    entry: &'a CatalogEntry,
    reader: BufReader<File>,
    buf: Vec<u8>,
    line: usize,
    /// Byte offset of the start of the current line.
    offset: usize,
    done: bool,
}

impl<'a> Iterator for Rows<'a> {
    type Item = Result<PronunciationRow<'a>, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        self.buf.clear();
        let read = match self.reader.read_until(b'\n', &mut self.buf) {
            Ok(0) => return None,
            Ok(read) => read,
            Err(e) => {
                self.done = true;
                self.line += 1;
                return Some(Err(e.into()));
            }
        };
        self.line += 1;
        let start = self.offset;
        self.offset += read;

        let text = match std::str::from_utf8(&self.buf) {
            Ok(text) => text,
            Err(e) => {
                return Some(Err(Error::Validation(ValidationIssue::EncodingError {
                    row: self.entry.row,
                    file: self.entry.file_reference.clone(),
                    line: self.line,
                    offset: start + e.valid_up_to(),
                })));
            }
        };
        let text = text.trim_end_matches('\n').trim_end_matches('\r');
        let text = if self.line == 1 {
            text.trim_start_matches('\u{feff}')
        } else {
            text
        };
        let mut fields = text.split('\t');
        let word = fields.next().unwrap_or_default().to_string();
        let transcription = fields.next().unwrap_or_default().to_string();
        let extra = fields.map(str::to_string).collect();

        Some(Ok(PronunciationRow {
            entry: self.entry,
            line: self.line,
            word,
            transcription,
            extra,
        }))
    }
}
