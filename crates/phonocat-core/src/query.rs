//! Predicate queries over the key index.

use std::collections::BTreeSet;

use crate::index::KeyIndex;
use crate::model::{CatalogEntry, Depth};

/// A set of predicates. Unset predicates match everything.
///
/// ```
/// use phonocat_core::{Depth, Query};
///
/// let query = Query::new().language("eng").depth(Depth::Broad).filtered(false);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    language: Option<String>,
    scripts: BTreeSet<String>,
    depth: Option<Depth>,
    filtered: Option<bool>,
    dialect: Option<String>,
    min_entries: Option<u64>,
}

impl Query {
    /// A query matching every entry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict to one ISO 639-3 code.
    pub fn language(mut self, code: impl Into<String>) -> Self {
        self.language = Some(code.into());
        self
    }

    /// Add a script to the accepted set.
    pub fn script(mut self, script: impl Into<String>) -> Self {
        self.scripts.insert(script.into());
        self
    }

    /// Add several scripts to the accepted set.
    pub fn scripts<I, S>(mut self, scripts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scripts.extend(scripts.into_iter().map(Into::into));
        self
    }

    /// Restrict to broad or narrow transcriptions.
    pub fn depth(mut self, depth: Depth) -> Self {
        self.depth = Some(depth);
        self
    }

    /// Restrict to filtered or unfiltered entries.
    pub fn filtered(mut self, filtered: bool) -> Self {
        self.filtered = Some(filtered);
        self
    }

    /// Restrict to one dialect. An empty string selects the unmarked dialect.
    pub fn dialect(mut self, dialect: impl Into<String>) -> Self {
        self.dialect = Some(dialect.into());
        self
    }

    /// Require at least `min` declared entries.
    ///
    /// Entries without a declared count never match.
    pub fn min_entries(mut self, min: u64) -> Self {
        self.min_entries = Some(min);
        self
    }

    /// Whether `entry` satisfies every predicate.
    pub fn matches(&self, entry: &CatalogEntry) -> bool {
        if let Some(language) = &self.language {
            if &entry.language_code != language {
                return false;
            }
        }
        if !self.scripts.is_empty() && !self.scripts.contains(&entry.script) {
            return false;
        }
        if self.depth.is_some_and(|d| d != entry.depth) {
            return false;
        }
        if self.filtered.is_some_and(|f| f != entry.filtered) {
            return false;
        }
        if let Some(dialect) = &self.dialect {
            if &entry.dialect != dialect {
                return false;
            }
        }
        if let Some(min) = self.min_entries {
            if entry.entry_count.map_or(true, |count| count < min) {
                return false;
            }
        }
        true
    }

    /// Run the query against `index`.
    ///
    /// Candidates come from the narrowest applicable secondary index.
    /// Language-scoped queries yield entries in language order, others in
    /// manifest order.
    pub fn run<'a>(&self, index: &'a KeyIndex) -> QueryIter<'a> {
        let mut candidates = Candidates::All(0..index.len());

        if let Some(language) = &self.language {
            candidates = Candidates::Positions(index.language_positions(language).iter());
        } else {
            let mut narrowest: Option<&[usize]> = None;
            if self.scripts.len() == 1 {
                if let Some(script) = self.scripts.iter().next() {
                    narrowest = Some(index.script_positions(script));
                }
            }
            if let Some(depth) = self.depth {
                let by_depth = index.depth_positions(depth);
                if narrowest.map_or(true, |n| by_depth.len() < n.len()) {
                    narrowest = Some(by_depth);
                }
            }
            if let Some(positions) = narrowest {
                candidates = Candidates::Positions(positions.iter());
            }
        }

        QueryIter {
            index,
            candidates,
            query: self.clone(),
        }
    }
}

#[derive(Debug, Clone)]
enum Candidates<'a> {
    All(std::ops::Range<usize>),
    Positions(std::slice::Iter<'a, usize>),
}

impl Iterator for Candidates<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        match self {
            Candidates::All(range) => range.next(),
            Candidates::Positions(iter) => iter.next().copied(),
        }
    }
}

/// Lazy query results.
///
/// Clones continue independently from the current position. To start over,
/// call [`Query::run`] again.
#[derive(Debug, Clone)]
pub struct QueryIter<'a> {
    index: &'a KeyIndex,
    candidates: Candidates<'a>,
    query: Query,
}

impl<'a> Iterator for QueryIter<'a> {
    type Item = &'a CatalogEntry;

    fn next(&mut self) -> Option<Self::Item> {
        for pos in self.candidates.by_ref() {
            let entry = self.index.entry(pos);
            if self.query.matches(entry) {
                return Some(entry);
            }
        }
        None
    }
}
