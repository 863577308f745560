//! Language metadata table.
//!
//! `languages.json` maps ISO 639-3 codes to display names and to the
//! scripts a language is published in, keyed by lowercase ISO 15924 code:
//!
//! ```json
//! "aze": {
//!     "iso639_name": "Azerbaijani",
//!     "wiktionary_name": "Azerbaijani",
//!     "wiktionary_code": "az",
//!     "casefold": true,
//!     "script": { "latn": "Latin", "cyrl": "Cyrillic", "arab": "Arabic" }
//! }
//! ```
//!
//! The registry uses it only to cross-check manifest rows; findings are
//! warnings.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::model::CatalogEntry;
use crate::report::{DetectedScript, ValidationIssue};
use crate::script::same_script;

/// Metadata of one language.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageInfo {
    #[serde(default)]
    pub iso639_name: String,
    #[serde(default)]
    pub wiktionary_name: String,
    #[serde(default)]
    pub wiktionary_code: Option<String>,
    #[serde(default)]
    pub casefold: bool,
    /// ISO 15924 code (lowercase) to script name.
    #[serde(default)]
    pub script: BTreeMap<String, String>,
}

impl LanguageInfo {
    /// ISO 15924 code for a script name, compared case-insensitively.
    pub fn script_code(&self, script_name: &str) -> Option<&str> {
        self.script
            .iter()
            .find(|(_, name)| name.eq_ignore_ascii_case(script_name))
            .map(|(code, _)| code.as_str())
    }
}

/// Languages keyed by ISO 639-3 code.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LanguageTable {
    languages: BTreeMap<String, LanguageInfo>,
}

impl LanguageTable {
    /// Load a `languages.json` file.
    pub fn from_path(path: &Path) -> Result<Self, Error> {
        let text = fs::read_to_string(path)?;
        let table = Self::from_json(&text)?;
        tracing::debug!(path = %path.display(), languages = table.len(), "language table loaded");
        Ok(table)
    }

    /// Parse a language table from JSON text.
    pub fn from_json(text: &str) -> Result<Self, Error> {
        Ok(serde_json::from_str(text)?)
    }

    /// Metadata for an ISO 639-3 code.
    pub fn get(&self, code: &str) -> Option<&LanguageInfo> {
        self.languages.get(code)
    }

    pub fn len(&self) -> usize {
        self.languages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.languages.is_empty()
    }

    /// Cross-check manifest entries against the table.
    pub fn cross_check(&self, entries: &[CatalogEntry]) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();
        for entry in entries {
            self.check_entry(entry, &mut issues);
        }
        issues
    }

    /// Check the script detected in an entry's words against the scripts
    /// the table lists for its language.
    ///
    /// A disagreement between the words and the manifest's own script is
    /// reported by the file scan, so this only fires when both agree on a
    /// script the table does not know for the language.
    pub fn check_detected_script(
        &self,
        entry: &CatalogEntry,
        detected: &DetectedScript,
    ) -> Option<ValidationIssue> {
        let info = self.get(&entry.language_code)?;
        if info.script.is_empty()
            || info.script.contains_key(&detected.code)
            || !same_script(&entry.script, detected)
        {
            return None;
        }
        let known: Vec<&str> = info.script.keys().map(String::as_str).collect();
        Some(ValidationIssue::ScriptMismatch {
            row: entry.row,
            file: entry.file_reference.clone(),
            expected: known.join(" | "),
            found: detected.code.clone(),
        })
    }

    fn check_entry(&self, entry: &CatalogEntry, issues: &mut Vec<ValidationIssue>) {
        let Some(info) = self.get(&entry.language_code) else {
            issues.push(ValidationIssue::UnknownLanguage {
                row: entry.row,
                code: entry.language_code.clone(),
            });
            return;
        };

        let mut mismatch = |field: &'static str, found: &str, expected: &str| {
            if !found.is_empty() && !expected.is_empty() && found != expected {
                issues.push(ValidationIssue::MetadataMismatch {
                    row: entry.row,
                    field,
                    found: found.to_string(),
                    expected: expected.to_string(),
                });
            }
        };
        mismatch("language_name", &entry.language_name, &info.iso639_name);
        mismatch("wiktionary_name", &entry.wiktionary_name, &info.wiktionary_name);

        let script_code = info.script_code(&entry.script);
        if script_code.is_none() && !info.script.is_empty() {
            let known: Vec<&str> = info.script.values().map(String::as_str).collect();
            issues.push(ValidationIssue::MetadataMismatch {
                row: entry.row,
                field: "script",
                found: entry.script.clone(),
                expected: known.join(" | "),
            });
        }

        if let Some(expected) = check_file_name(entry, script_code) {
            issues.push(ValidationIssue::FileNameMismatch {
                row: entry.row,
                file: entry.file_reference.clone(),
                expected,
            });
        }
    }
}

/// Check the dataset file name against
/// `{code}_{script}[_{dialect}]_{broad|narrow}[_filtered].tsv`.
///
/// Returns the expected pattern when the name does not conform. The dialect
/// segment is not derivable from the display name, so any segment is
/// accepted there; an unknown script code likewise accepts any segment.
pub fn check_file_name(entry: &CatalogEntry, script_code: Option<&str>) -> Option<String> {
    let expected = || {
        let mut name = format!(
            "{}_{}",
            entry.language_code,
            script_code.unwrap_or("<script>")
        );
        if entry.dialect().is_some() {
            name.push_str("_<dialect>");
        }
        name.push('_');
        name.push_str(entry.depth.as_str());
        if entry.filtered {
            name.push_str("_filtered");
        }
        name.push_str(".tsv");
        name
    };

    let file_name = Path::new(&entry.file_reference)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();
    let Some(stem) = file_name.strip_suffix(".tsv") else {
        return Some(expected());
    };

    let mut parts: Vec<&str> = stem.split('_').collect();
    if entry.filtered {
        if parts.last() != Some(&"filtered") {
            return Some(expected());
        }
        parts.pop();
    }

    let conforms = match parts.as_slice() {
        [code, script, middle @ .., depth] => {
            *code == entry.language_code
                && script_code.map_or(true, |s| *script == s)
                && *depth == entry.depth.as_str()
                && middle.is_empty() == entry.dialect().is_none()
        }
        _ => false,
    };

    if conforms {
        None
    } else {
        Some(expected())
    }
}
