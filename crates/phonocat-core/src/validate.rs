//! Dataset file validation.
//!
//! Each file is read once and checked for UTF-8 well-formedness, column
//! shape, row count and the script of its words. Files are independent,
//! so the eager pass fans out over scoped worker threads pulling entries
//! from a shared cursor.

use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use crate::error::Error;
use crate::model::CatalogEntry;
use crate::report::{FileReport, Severity, ValidationIssue};
use crate::schema::ColumnSchema;
use crate::script::{same_script, ScriptTally};

const UTF8_BOM: &str = "\u{feff}";

/// Result of scanning one dataset file.
#[derive(Debug, Clone)]
pub struct FileScan {
    /// `None` when the file could not be read at all.
    pub report: Option<FileReport>,
    pub issues: Vec<ValidationIssue>,
}

impl FileScan {
    /// Whether the scan produced an error-severity finding.
    pub fn has_errors(&self) -> bool {
        self.issues.iter().any(|i| i.severity() == Severity::Error)
    }
}

/// Read and scan the backing file of `entry`.
pub fn scan_entry(entry: &CatalogEntry, data_dir: &Path, schema: &ColumnSchema) -> FileScan {
    let path = data_dir.join(&entry.file_reference);
    match fs::read(&path) {
        Ok(bytes) => scan_bytes(entry, &bytes, schema),
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "dataset unreadable");
            FileScan {
                report: None,
                issues: vec![ValidationIssue::Unreadable {
                    row: entry.row,
                    file: entry.file_reference.clone(),
                    reason: e.to_string(),
                }],
            }
        }
    }
}

/// Scan in-memory dataset content for `entry`.
///
/// Only the first schema violation is reported; the rest are counted in the
/// file report.
pub fn scan_bytes(entry: &CatalogEntry, bytes: &[u8], schema: &ColumnSchema) -> FileScan {
    let file = entry.file_reference.clone();
    let digest = hex::encode(blake3::hash(bytes).as_bytes());

    let text = match std::str::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => {
            let offset = e.valid_up_to();
            let line = bytes[..offset].iter().filter(|&&b| b == b'\n').count() + 1;
            return FileScan {
                report: Some(FileReport {
                    row: entry.row,
                    file: file.clone(),
                    rows: 0,
                    bytes: bytes.len() as u64,
                    schema_violations: 0,
                    digest,
                    script: None,
                }),
                issues: vec![ValidationIssue::EncodingError {
                    row: entry.row,
                    file,
                    line,
                    offset,
                }],
            };
        }
    };
    let text = text.strip_prefix(UTF8_BOM).unwrap_or(text);

    let mut issues = Vec::new();
    let mut rows = 0u64;
    let mut violations = 0u64;
    let mut tally = ScriptTally::default();

    for (i, line) in text.lines().enumerate() {
        rows += 1;
        let fields: Vec<&str> = line.split('\t').collect();
        tally.add(fields[0]);
        if let Err(detail) = schema.check(&fields) {
            violations += 1;
            if violations == 1 {
                issues.push(ValidationIssue::SchemaViolation {
                    row: entry.row,
                    file: file.clone(),
                    line: i + 1,
                    detail,
                });
            }
        }
    }

    if let Some(expected) = entry.entry_count {
        if expected != rows {
            issues.push(ValidationIssue::CountMismatch {
                row: entry.row,
                file: file.clone(),
                expected,
                actual: rows,
            });
        }
    }

    let script = tally.dominant();
    if let Some(detected) = &script {
        if !same_script(&entry.script, detected) {
            issues.push(ValidationIssue::ScriptMismatch {
                row: entry.row,
                file: file.clone(),
                expected: entry.script.clone(),
                found: detected.name.clone(),
            });
        }
    }

    FileScan {
        report: Some(FileReport {
            row: entry.row,
            file,
            rows,
            bytes: bytes.len() as u64,
            schema_violations: violations,
            digest,
            script,
        }),
        issues,
    }
}

/// Scan every entry's file in parallel.
///
/// Returns one scan per entry, aligned with `entries`. In strict mode the
/// first error-severity finding stops the remaining scans and is returned
/// as [`Error::Validation`].
pub fn scan_all(
    entries: &[CatalogEntry],
    data_dir: &Path,
    schema: &ColumnSchema,
    workers: usize,
    strict: bool,
    deadline: Option<Duration>,
) -> Result<Vec<FileScan>, Error> {
    if entries.is_empty() {
        return Ok(Vec::new());
    }

    let workers = workers.clamp(1, entries.len());
    let cursor = AtomicUsize::new(0);
    let abort = AtomicBool::new(false);
    let started = Instant::now();

    tracing::debug!(files = entries.len(), workers, "scanning dataset files");

    let outcomes: Vec<Result<Vec<(usize, FileScan)>, Error>> = thread::scope(|s| {
        let handles: Vec<_> = (0..workers)
            .map(|_| {
                s.spawn(|| {
                    let mut done = Vec::new();
                    loop {
                        if abort.load(Ordering::Acquire) {
                            return Ok(done);
                        }

                        let i = cursor.fetch_add(1, Ordering::Relaxed);
                        let Some(entry) = entries.get(i) else {
                            return Ok(done);
                        };
                        if let Some(deadline) = deadline {
                            let elapsed = started.elapsed();
                            if elapsed >= deadline {
                                abort.store(true, Ordering::Release);
                                return Err(Error::DeadlineExceeded { deadline, elapsed });
                            }
                        }

                        let scan = scan_entry(entry, data_dir, schema);
                        if strict {
                            if let Some(issue) = scan
                                .issues
                                .iter()
                                .find(|issue| issue.severity() == Severity::Error)
                            {
                                abort.store(true, Ordering::Release);
                                return Err(Error::Validation(issue.clone()));
                            }
                        }
                        done.push((i, scan));
                    }
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|h| h.join().unwrap_or_else(|panic| std::panic::resume_unwind(panic)))
            .collect()
    });

    let mut slots: Vec<Option<FileScan>> = vec![None; entries.len()];
    for outcome in outcomes {
        for (i, scan) in outcome? {
            slots[i] = Some(scan);
        }
    }

    tracing::debug!(
        files = entries.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "dataset scan complete"
    );

    // Without an abort every slot has been filled exactly once.
    Ok(slots.into_iter().flatten().collect())
}
