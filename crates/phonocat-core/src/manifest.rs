//! Manifest loading.
//!
//! A manifest lists one catalog entry per row. Two formats are understood:
//!
//! - a Markdown table, as published in the corpus README, whose columns are
//!   located by their header names;
//! - a JSON array of objects carrying the same fields.
//!
//! Both formats are first reduced to raw string cells and then validated by
//! the same code path, so the two formats reject the same mistakes.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::Error;
use crate::model::{CatalogEntry, Depth, EntryKey};

/// Manifest source format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManifestFormat {
    /// Markdown table.
    Markdown,
    /// JSON array of entry objects.
    Json,
}

impl ManifestFormat {
    /// Pick a format from the file extension; anything but `.json` is Markdown.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => ManifestFormat::Json,
            _ => ManifestFormat::Markdown,
        }
    }
}

/// Read and parse a manifest file.
pub fn load_manifest(path: &Path, format: Option<ManifestFormat>) -> Result<Vec<CatalogEntry>, Error> {
    let format = format.unwrap_or_else(|| ManifestFormat::from_path(path));
    let text = fs::read_to_string(path)?;
    let entries = match format {
        ManifestFormat::Markdown => parse_markdown(&text)?,
        ManifestFormat::Json => parse_json(&text)?,
    };
    tracing::debug!(
        path = %path.display(),
        format = ?format,
        entries = entries.len(),
        "manifest parsed"
    );
    Ok(entries)
}

/// Parse a Markdown manifest.
///
/// Every table whose header names both a language code column and a file
/// column is treated as catalog data; other tables and prose are ignored.
pub fn parse_markdown(text: &str) -> Result<Vec<CatalogEntry>, Error> {
    let mut raw = Vec::new();
    let lines: Vec<&str> = text.lines().map(str::trim).collect();

    let mut i = 0;
    while i < lines.len() {
        if !is_table_line(lines[i]) {
            i += 1;
            continue;
        }

        let start = i;
        while i < lines.len() && is_table_line(lines[i]) {
            i += 1;
        }
        collect_table(&lines[start..i], &mut raw);
    }

    finish(raw)
}

/// Parse a JSON manifest.
pub fn parse_json(text: &str) -> Result<Vec<CatalogEntry>, Error> {
    let rows: Vec<JsonRow> = serde_json::from_str(text)?;
    let raw = rows
        .into_iter()
        .enumerate()
        .map(|(i, row)| row.into_raw(i + 1))
        .collect();
    finish(raw)
}

/// Validate raw rows and enforce key uniqueness.
fn finish(raw: Vec<RawRow>) -> Result<Vec<CatalogEntry>, Error> {
    let mut seen: HashMap<EntryKey, usize> = HashMap::with_capacity(raw.len());
    let mut entries = Vec::with_capacity(raw.len());

    for row in raw {
        let entry = row.into_entry()?;
        let key = entry.key();
        if let Some(&first_row) = seen.get(&key) {
            return Err(Error::DuplicateKey {
                key,
                first_row,
                second_row: entry.row,
            });
        }
        seen.insert(key, entry.row);
        entries.push(entry);
    }

    Ok(entries)
}

fn is_table_line(line: &str) -> bool {
    line.starts_with('|')
}

/// Split a table line into trimmed cells. `\|` is an escaped pipe inside
/// a cell.
fn split_cells(line: &str) -> Vec<String> {
    let inner = line.trim();
    let inner = inner.strip_prefix('|').unwrap_or(inner);
    let inner = match inner.strip_suffix('|') {
        Some(rest) if !rest.ends_with('\\') => rest,
        _ => inner,
    };

    let mut cells = Vec::new();
    let mut cell = String::new();
    let mut chars = inner.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' if chars.peek() == Some(&'|') => {
                cell.push('|');
                chars.next();
            }
            '|' => {
                cells.push(cell.trim().to_string());
                cell.clear();
            }
            _ => cell.push(c),
        }
    }
    cells.push(cell.trim().to_string());
    cells
}

fn is_separator(line: &str) -> bool {
    split_cells(line).iter().all(|cell| {
        !cell.is_empty() && cell.chars().all(|c| matches!(c, '-' | ':' | ' '))
    })
}

fn collect_table(block: &[&str], raw: &mut Vec<RawRow>) {
    // A header is the line directly above the separator.
    let Some(sep) = block.iter().position(|line| is_separator(line)) else {
        return;
    };
    if sep == 0 {
        return;
    }

    let columns = ColumnMap::from_header(&split_cells(block[sep - 1]));
    if !columns.is_catalog() {
        tracing::debug!(header = block[sep - 1], "skipping non-catalog table");
        return;
    }

    for line in &block[sep + 1..] {
        if is_separator(line) {
            continue;
        }
        let row = raw.len() + 1;
        raw.push(columns.read_row(row, &split_cells(line)));
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Column {
    FileReference,
    LanguageCode,
    LanguageName,
    WiktionaryName,
    Script,
    Dialect,
    Filtered,
    Depth,
    EntryCount,
}

impl Column {
    fn from_header(header: &str) -> Option<Self> {
        let h = header.to_ascii_lowercase();
        let column = if h.contains("wiktionary") {
            Column::WiktionaryName
        } else if h.contains("639-3") || h == "code" {
            Column::LanguageCode
        } else if h.contains("language") {
            Column::LanguageName
        } else if h.contains("script") {
            Column::Script
        } else if h.contains("dialect") {
            Column::Dialect
        } else if h.contains("filtered") {
            Column::Filtered
        } else if h.contains("broad") || h.contains("narrow") || h.contains("depth") {
            Column::Depth
        } else if h.contains("entries") || h.contains("count") || h.starts_with('#') {
            Column::EntryCount
        } else if h.contains("link") || h.contains("file") || h.contains("tsv") {
            Column::FileReference
        } else {
            return None;
        };
        Some(column)
    }
}

/// Header-derived positions of each known column.
#[derive(Debug)]
struct ColumnMap {
    columns: Vec<Option<Column>>,
}

impl ColumnMap {
    fn from_header(cells: &[String]) -> Self {
        Self {
            columns: cells.iter().map(|c| Column::from_header(c)).collect(),
        }
    }

    fn has(&self, column: Column) -> bool {
        self.columns.contains(&Some(column))
    }

    fn is_catalog(&self) -> bool {
        self.has(Column::LanguageCode) && self.has(Column::FileReference)
    }

    fn read_row(&self, row: usize, cells: &[String]) -> RawRow {
        let mut raw = RawRow {
            row,
            ..RawRow::default()
        };
        if cells.len() != self.columns.len() {
            raw.cell_count = Some((cells.len(), self.columns.len()));
        }

        for (column, cell) in self.columns.iter().zip(cells) {
            let Some(column) = column else { continue };
            let value = Some(cell.clone());
            match column {
                Column::FileReference => raw.file_reference = Some(link_target(cell).to_string()),
                Column::LanguageCode => raw.language_code = value,
                Column::LanguageName => raw.language_name = value,
                Column::WiktionaryName => raw.wiktionary_name = value,
                Column::Script => raw.script = value,
                Column::Dialect => raw.dialect = value,
                Column::Filtered => raw.filtered = value,
                Column::Depth => raw.depth = value,
                Column::EntryCount => raw.entry_count = value,
            }
        }

        raw
    }
}

/// Extract the target of a `[text](target)` link, or return the cell as-is.
fn link_target(cell: &str) -> &str {
    let cell = cell.trim();
    if let Some(open) = cell.find("](") {
        let rest = &cell[open + 2..];
        if let Some(close) = rest.find(')') {
            return rest[..close].trim();
        }
    }
    cell
}

/// One manifest row before validation.
#[derive(Debug, Default)]
struct RawRow {
    row: usize,
    /// `(found, expected)` when a table row is wider or narrower than its
    /// header.
    cell_count: Option<(usize, usize)>,
    file_reference: Option<String>,
    language_code: Option<String>,
    language_name: Option<String>,
    wiktionary_name: Option<String>,
    script: Option<String>,
    dialect: Option<String>,
    filtered: Option<String>,
    depth: Option<String>,
    entry_count: Option<String>,
}

impl RawRow {
    fn into_entry(self) -> Result<CatalogEntry, Error> {
        let row = self.row;
        let malformed = |field: &'static str, reason: String| Error::MalformedEntry {
            row,
            field,
            reason,
        };

        if let Some((found, expected)) = self.cell_count {
            return Err(malformed(
                "row",
                format!("expected {expected} cells, found {found}"),
            ));
        }

        let language_code = required(row, "language_code", self.language_code)?;
        let script = required(row, "script", self.script)?;
        let depth = required(row, "depth", self.depth)?
            .parse::<Depth>()
            .map_err(|reason| malformed("depth", reason))?;
        let file_reference = required(row, "file_reference", self.file_reference)?;

        let filtered = match optional(self.filtered) {
            None => false,
            Some(value) => parse_flag(&value)
                .ok_or_else(|| malformed("filtered", format!("expected a boolean, got `{value}`")))?,
        };

        let entry_count = match optional(self.entry_count) {
            None => None,
            Some(value) => Some(
                parse_count(&value)
                    .ok_or_else(|| malformed("entry_count", format!("expected a count, got `{value}`")))?,
            ),
        };

        Ok(CatalogEntry {
            row,
            language_code,
            language_name: optional(self.language_name).unwrap_or_default(),
            wiktionary_name: optional(self.wiktionary_name).unwrap_or_default(),
            script,
            dialect: optional(self.dialect).unwrap_or_default(),
            filtered,
            depth,
            file_reference,
            entry_count,
        })
    }
}

fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn required(row: usize, field: &'static str, value: Option<String>) -> Result<String, Error> {
    optional(value).ok_or_else(|| Error::MalformedEntry {
        row,
        field,
        reason: "missing value".to_string(),
    })
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "yes" | "y" | "1" => Some(true),
        "false" | "no" | "n" | "0" => Some(false),
        _ => None,
    }
}

fn parse_count(value: &str) -> Option<u64> {
    let digits: String = value
        .chars()
        .filter(|c| !matches!(c, ',' | '_' | ' '))
        .collect();
    digits.parse().ok()
}

/// JSON manifest row. Scalars are kept loosely typed so that JSON and
/// Markdown share validation.
#[derive(Debug, Deserialize)]
struct JsonRow {
    #[serde(default, alias = "file", alias = "link")]
    file_reference: Option<String>,
    #[serde(default, alias = "iso639_code", alias = "code")]
    language_code: Option<String>,
    #[serde(default, alias = "iso639_name")]
    language_name: Option<String>,
    #[serde(default)]
    wiktionary_name: Option<String>,
    #[serde(default)]
    script: Option<String>,
    #[serde(default)]
    dialect: Option<String>,
    #[serde(default)]
    filtered: Option<serde_json::Value>,
    #[serde(default, alias = "narrow_broad")]
    depth: Option<String>,
    #[serde(default, alias = "count", alias = "entries")]
    entry_count: Option<serde_json::Value>,
}

impl JsonRow {
    fn into_raw(self, row: usize) -> RawRow {
        RawRow {
            row,
            cell_count: None,
            file_reference: self.file_reference,
            language_code: self.language_code,
            language_name: self.language_name,
            wiktionary_name: self.wiktionary_name,
            script: self.script,
            dialect: self.dialect,
            filtered: self.filtered.and_then(scalar_to_string),
            depth: self.depth,
            entry_count: self.entry_count.and_then(scalar_to_string),
        }
    }
}

fn scalar_to_string(value: serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}
