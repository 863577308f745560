//! Catalog data model.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Transcription granularity.
///
/// `Broad` sorts before `Narrow`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Depth {
    /// Phonemic transcription.
    Broad,
    /// Phonetic transcription.
    Narrow,
}

impl Depth {
    /// Lowercase name, as used in dataset file names.
    pub fn as_str(&self) -> &'static str {
        match self {
            Depth::Broad => "broad",
            Depth::Narrow => "narrow",
        }
    }
}

impl fmt::Display for Depth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Depth {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "broad" => Ok(Depth::Broad),
            "narrow" => Ok(Depth::Narrow),
            other => Err(format!("expected `Broad` or `Narrow`, got `{other}`")),
        }
    }
}

/// Composite primary key of a catalog entry.
///
/// An empty `dialect` denotes the unmarked dialect.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntryKey {
    pub language_code: String,
    pub script: String,
    pub dialect: String,
    pub filtered: bool,
    pub depth: Depth,
}

impl EntryKey {
    /// Create a key for the unmarked dialect, unfiltered.
    pub fn new(language_code: impl Into<String>, script: impl Into<String>, depth: Depth) -> Self {
        Self {
            language_code: language_code.into(),
            script: script.into(),
            dialect: String::new(),
            filtered: false,
            depth,
        }
    }

    /// Set the dialect qualifier.
    pub fn with_dialect(mut self, dialect: impl Into<String>) -> Self {
        self.dialect = dialect.into();
        self
    }

    /// Set the filtered flag.
    pub fn with_filtered(mut self, filtered: bool) -> Self {
        self.filtered = filtered;
        self
    }

    /// The same key with the filtered flag cleared.
    pub fn unfiltered(&self) -> Self {
        self.clone().with_filtered(false)
    }
}

impl fmt::Display for EntryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dialect = if self.dialect.is_empty() {
            "-"
        } else {
            self.dialect.as_str()
        };
        write!(
            f,
            "{}/{}/{}/{}",
            self.language_code, self.script, dialect, self.depth
        )?;
        if self.filtered {
            f.write_str("/filtered")?;
        }
        Ok(())
    }
}

/// One row of the catalog manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// 1-based position of the row in the manifest.
    pub row: usize,
    /// ISO 639-3 code.
    pub language_code: String,
    pub language_name: String,
    pub wiktionary_name: String,
    pub script: String,
    /// Empty for the unmarked dialect.
    pub dialect: String,
    pub filtered: bool,
    pub depth: Depth,
    /// Path of the backing TSV file, relative to the data directory.
    pub file_reference: String,
    /// Declared number of pronunciation rows, if the manifest states one.
    pub entry_count: Option<u64>,
}

impl CatalogEntry {
    /// The composite key of this entry.
    pub fn key(&self) -> EntryKey {
        EntryKey {
            language_code: self.language_code.clone(),
            script: self.script.clone(),
            dialect: self.dialect.clone(),
            filtered: self.filtered,
            depth: self.depth,
        }
    }

    /// Whether this entry's fields match `key` exactly.
    pub fn has_key(&self, key: &EntryKey) -> bool {
        self.language_code == key.language_code
            && self.script == key.script
            && self.dialect == key.dialect
            && self.filtered == key.filtered
            && self.depth == key.depth
    }

    /// The dialect qualifier, or `None` for the unmarked dialect.
    pub fn dialect(&self) -> Option<&str> {
        if self.dialect.is_empty() {
            None
        } else {
            Some(&self.dialect)
        }
    }

    /// Ordering used within a language: script, dialect, depth, then
    /// unfiltered before filtered.
    pub(crate) fn language_order(&self) -> (&str, &str, Depth, bool) {
        (&self.script, &self.dialect, self.depth, self.filtered)
    }
}

/// A single pronunciation read from a dataset file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PronunciationRow<'a> {
    /// The catalog entry the row belongs to.
    pub entry: &'a CatalogEntry,
    /// 1-based line number in the dataset file.
    pub line: usize,
    pub word: String,
    pub transcription: String,
    /// Columns beyond the first two, verbatim.
    pub extra: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_depth_parse() {
        assert_eq!("Broad".parse::<Depth>().unwrap(), Depth::Broad);
        assert_eq!(" narrow ".parse::<Depth>().unwrap(), Depth::Narrow);
        assert!("phonemic".parse::<Depth>().is_err());
        assert!("".parse::<Depth>().is_err());
    }

    #[test]
    fn test_depth_order() {
        assert!(Depth::Broad < Depth::Narrow);
    }

    #[test]
    fn test_key_display() {
        let key = EntryKey::new("eng", "Latin", Depth::Broad)
            .with_dialect("US")
            .with_filtered(true);
        assert_eq!(key.to_string(), "eng/Latin/US/broad/filtered");

        let key = EntryKey::new("aar", "Latin", Depth::Narrow);
        assert_eq!(key.to_string(), "aar/Latin/-/narrow");
    }

    #[test]
    fn test_entry_key_roundtrip() {
        let entry = CatalogEntry {
            row: 1,
            language_code: "ara".into(),
            language_name: "Arabic".into(),
            wiktionary_name: "Arabic".into(),
            script: "Arabic".into(),
            dialect: String::new(),
            filtered: false,
            depth: Depth::Narrow,
            file_reference: "ara_arab_narrow.tsv".into(),
            entry_count: Some(10),
        };

        let key = entry.key();
        assert!(entry.has_key(&key));
        assert!(!entry.has_key(&key.clone().with_filtered(true)));
        assert_eq!(entry.dialect(), None);
    }
}
