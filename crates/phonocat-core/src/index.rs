//! Composite-key index over catalog entries.
//!
//! Entries live in a single vector; the primary and secondary indexes hold
//! positions into it. The index is built once and never mutated, so shared
//! references can be read from any number of threads without locking.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::error::Error;
use crate::model::{CatalogEntry, Depth, EntryKey};
use crate::report::ValidationIssue;

/// Immutable index keyed by (language, script, dialect, filtered, depth).
#[derive(Debug, Default)]
pub struct KeyIndex {
    entries: Vec<CatalogEntry>,
    by_key: HashMap<EntryKey, usize>,
    /// Positions per language, in language order.
    by_language: BTreeMap<String, Vec<usize>>,
    /// Positions per script, in manifest order.
    by_script: BTreeMap<String, Vec<usize>>,
    /// Positions per depth, in manifest order.
    by_depth: BTreeMap<Depth, Vec<usize>>,
}

impl KeyIndex {
    /// Build the index, rejecting duplicate keys.
    pub fn build(entries: Vec<CatalogEntry>) -> Result<Self, Error> {
        let mut by_key = HashMap::with_capacity(entries.len());
        let mut by_language: BTreeMap<String, Vec<usize>> = BTreeMap::new();
        let mut by_script: BTreeMap<String, Vec<usize>> = BTreeMap::new();
        let mut by_depth: BTreeMap<Depth, Vec<usize>> = BTreeMap::new();

        for (pos, entry) in entries.iter().enumerate() {
            if let Some(&first) = by_key.get(&entry.key()) {
                let first: &CatalogEntry = &entries[first];
                return Err(Error::DuplicateKey {
                    key: entry.key(),
                    first_row: first.row,
                    second_row: entry.row,
                });
            }
            by_key.insert(entry.key(), pos);
            by_language
                .entry(entry.language_code.clone())
                .or_default()
                .push(pos);
            by_script.entry(entry.script.clone()).or_default().push(pos);
            by_depth.entry(entry.depth).or_default().push(pos);
        }

        for positions in by_language.values_mut() {
            positions.sort_by(|&a, &b| entries[a].language_order().cmp(&entries[b].language_order()));
        }

        Ok(Self {
            entries,
            by_key,
            by_language,
            by_script,
            by_depth,
        })
    }

    /// Number of indexed entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the index is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All entries in manifest order.
    pub fn iter(&self) -> std::slice::Iter<'_, CatalogEntry> {
        self.entries.iter()
    }

    /// All entries in manifest order, as a slice.
    pub fn as_slice(&self) -> &[CatalogEntry] {
        &self.entries
    }

    /// Exact lookup by key.
    pub fn get(&self, key: &EntryKey) -> Option<&CatalogEntry> {
        self.by_key.get(key).map(|&pos| &self.entries[pos])
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
        let key = EntryKey::new(language_code, script, depth)
            .with_dialect(dialect.unwrap_or_default())
            .with_filtered(filtered);
        match self.get(&key) {
            Some(entry) => Ok(entry),
            None => {
                tracing::trace!(%key, "lookup miss");
                Err(Error::NotFound(key))
            }
        }
    }

    /// Entries of one language ordered by script, dialect, depth, then
    /// unfiltered before filtered.
    pub fn entries_for_language(&self, language_code: &str) -> Vec<&CatalogEntry> {
        self.resolve(self.by_language.get(language_code))
    }

    /// Entries written in `script`, in manifest order.
    pub fn entries_for_script(&self, script: &str) -> Vec<&CatalogEntry> {
        self.resolve(self.by_script.get(script))
    }

    /// Entries of one transcription depth, in manifest order.
    pub fn entries_for_depth(&self, depth: Depth) -> Vec<&CatalogEntry> {
        self.resolve(self.by_depth.get(&depth))
    }

    /// Distinct language codes, sorted.
    pub fn languages(&self) -> impl Iterator<Item = &str> {
        self.by_language.keys().map(String::as_str)
    }

    /// Distinct scripts, sorted.
    pub fn scripts(&self) -> impl Iterator<Item = &str> {
        self.by_script.keys().map(String::as_str)
    }

    /// Distinct non-empty dialects, sorted.
    pub fn dialects(&self) -> BTreeSet<&str> {
        self.entries
            .iter()
            .filter_map(CatalogEntry::dialect)
            .collect()
    }

    /// Filtered entries whose unfiltered counterpart is missing.
    pub fn orphan_filtered(&self) -> Vec<ValidationIssue> {
        self.entries
            .iter()
            .filter(|e| e.filtered && !self.by_key.contains_key(&e.key().unfiltered()))
            .map(|e| ValidationIssue::OrphanFiltered {
                row: e.row,
                key: e.key(),
            })
            .collect()
    }

    pub(crate) fn entry(&self, pos: usize) -> &CatalogEntry {
        &self.entries[pos]
    }

    pub(crate) fn language_positions(&self, language_code: &str) -> &[usize] {
        positions(self.by_language.get(language_code))
    }

    pub(crate) fn script_positions(&self, script: &str) -> &[usize] {
        positions(self.by_script.get(script))
    }

    pub(crate) fn depth_positions(&self, depth: Depth) -> &[usize] {
        positions(self.by_depth.get(&depth))
    }

    fn resolve(&self, positions: Option<&Vec<usize>>) -> Vec<&CatalogEntry> {
        positions
            .map(|p| p.iter().map(|&pos| &self.entries[pos]).collect())
            .unwrap_or_default()
    }
}

fn positions(list: Option<&Vec<usize>>) -> &[usize] {
    list.map(Vec::as_slice).unwrap_or(&[])
}
