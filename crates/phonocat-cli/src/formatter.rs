//! Output formatters for command results.

use clap::ValueEnum;
use comfy_table::{Cell, Table};
use phonocat_core::{CatalogEntry, CatalogSummary, PronunciationRow, ValidationReport};
use serde::Serialize;

/// Output format for results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// ASCII table format
    Table,
    /// JSON format
    Json,
    /// CSV format
    Csv,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Table => write!(f, "table"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Csv => write!(f, "csv"),
        }
    }
}

/// Trait for formatting output.
pub trait Formatter: Send + Sync {
    /// Format a list of catalog entries.
    fn format_entries(&self, entries: &[&CatalogEntry]) -> String;

    /// Format pronunciation rows read from one dataset.
    fn format_rows(&self, rows: &[PronunciationRow<'_>]) -> String;

    /// Format a validation report. `indexed` is the number of entries that
    /// made it into the registry.
    fn format_report(&self, report: &ValidationReport, indexed: usize) -> String;

    /// Format catalog headline numbers.
    fn format_summary(&self, summary: &CatalogSummary) -> String;

    /// Format an error message.
    fn format_error(&self, error: &str) -> String;
}

/// Create a formatter for the given output format.
pub fn create_formatter(format: OutputFormat) -> Box<dyn Formatter> {
    match format {
        OutputFormat::Table => Box::new(TableFormatter),
        OutputFormat::Json => Box::new(JsonFormatter),
        OutputFormat::Csv => Box::new(CsvFormatter),
    }
}

const ENTRY_HEADERS: [&str; 9] = [
    "row", "code", "language", "script", "dialect", "filtered", "depth", "entries", "file",
];

fn entry_cells(entry: &CatalogEntry) -> [String; 9] {
    [
        entry.row.to_string(),
        entry.language_code.clone(),
        entry.language_name.clone(),
        entry.script.clone(),
        entry.dialect.clone(),
        entry.filtered.to_string(),
        entry.depth.to_string(),
        entry
            .entry_count
            .map(|c| c.to_string())
            .unwrap_or_default(),
        entry.file_reference.clone(),
    ]
}

/// Table formatter using comfy-table.
pub struct TableFormatter;

impl Formatter for TableFormatter {
    fn format_entries(&self, entries: &[&CatalogEntry]) -> String {
        if entries.is_empty() {
            return "No entries".to_string();
        }

        let mut table = Table::new();
        table.set_header(ENTRY_HEADERS);
        for entry in entries {
            table.add_row(entry_cells(entry));
        }
        format!("{}\n{} entry(ies)", table, entries.len())
    }

    fn format_rows(&self, rows: &[PronunciationRow<'_>]) -> String {
        let mut table = Table::new();
        table.set_header(vec!["line", "word", "transcription"]);
        for row in rows {
            table.add_row(vec![
                Cell::new(row.line),
                Cell::new(&row.word),
                Cell::new(&row.transcription),
            ]);
        }
        format!("{}\n{} row(s)", table, rows.len())
    }

    fn format_report(&self, report: &ValidationReport, indexed: usize) -> String {
        let mut output = String::new();

        if !report.issues.is_empty() {
            let mut table = Table::new();
            table.set_header(vec!["severity", "row", "kind", "detail"]);
            for issue in &report.issues {
                table.add_row(vec![
                    Cell::new(format!("{:?}", issue.severity()).to_lowercase()),
                    Cell::new(issue.row()),
                    Cell::new(issue.kind()),
                    Cell::new(issue),
                ]);
            }
            output.push_str(&table.to_string());
            output.push('\n');
        }

        output.push_str(&format!(
            "{} file(s) scanned, {} row(s), {} error(s), {} warning(s), {} excluded, {} indexed",
            report.files.len(),
            report.rows_scanned(),
            report.errors().count(),
            report.warnings().count(),
            report.excluded.len(),
            indexed,
        ));
        output
    }

    fn format_summary(&self, summary: &CatalogSummary) -> String {
        let mut table = Table::new();
        table.set_header(vec!["metric", "value"]);
        for (name, value) in summary_pairs(summary) {
            table.add_row(vec![Cell::new(name), Cell::new(value)]);
        }
        table.to_string()
    }

    fn format_error(&self, error: &str) -> String {
        format!("Error: {}", error)
    }
}

/// JSON formatter.
pub struct JsonFormatter;

#[derive(Serialize)]
struct ReportJson<'a> {
    #[serde(flatten)]
    report: &'a ValidationReport,
    errors: usize,
    warnings: usize,
    indexed: usize,
}

#[derive(Serialize)]
struct RowJson<'a> {
    line: usize,
    word: &'a str,
    transcription: &'a str,
    #[serde(skip_serializing_if = "no_extra")]
    extra: &'a [String],
}

fn no_extra(extra: &&[String]) -> bool {
    extra.is_empty()
}

impl Formatter for JsonFormatter {
    fn format_entries(&self, entries: &[&CatalogEntry]) -> String {
        to_json(&entries, "[]")
    }

    fn format_rows(&self, rows: &[PronunciationRow<'_>]) -> String {
        let rows: Vec<RowJson<'_>> = rows
            .iter()
            .map(|row| RowJson {
                line: row.line,
                word: &row.word,
                transcription: &row.transcription,
                extra: &row.extra,
            })
            .collect();
        to_json(&rows, "[]")
    }

    fn format_report(&self, report: &ValidationReport, indexed: usize) -> String {
        to_json(
            &ReportJson {
                report,
                errors: report.errors().count(),
                warnings: report.warnings().count(),
                indexed,
            },
            "{}",
        )
    }

    fn format_summary(&self, summary: &CatalogSummary) -> String {
        to_json(summary, "{}")
    }

    fn format_error(&self, error: &str) -> String {
        serde_json::json!({
            "error": error
        })
        .to_string()
    }
}

fn to_json<T: Serialize + ?Sized>(value: &T, fallback: &str) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| fallback.to_string())
}

/// CSV formatter.
pub struct CsvFormatter;

impl Formatter for CsvFormatter {
    fn format_entries(&self, entries: &[&CatalogEntry]) -> String {
        let mut output = ENTRY_HEADERS.join(",");
        output.push('\n');
        for entry in entries {
            let cells: Vec<String> = entry_cells(entry).iter().map(|c| csv_cell(c)).collect();
            output.push_str(&cells.join(","));
            output.push('\n');
        }
        output
    }

    fn format_rows(&self, rows: &[PronunciationRow<'_>]) -> String {
        let mut output = String::from("line,word,transcription\n");
        for row in rows {
            output.push_str(&format!(
                "{},{},{}\n",
                row.line,
                csv_cell(&row.word),
                csv_cell(&row.transcription)
            ));
        }
        output
    }

    fn format_report(&self, report: &ValidationReport, _indexed: usize) -> String {
        let mut output = String::from("severity,row,kind,detail\n");
        for issue in &report.issues {
            output.push_str(&format!(
                "{},{},{},{}\n",
                format!("{:?}", issue.severity()).to_lowercase(),
                issue.row(),
                issue.kind(),
                csv_cell(&issue.to_string())
            ));
        }
        output
    }

    fn format_summary(&self, summary: &CatalogSummary) -> String {
        let mut output = String::from("metric,value\n");
        for (name, value) in summary_pairs(summary) {
            output.push_str(&format!("{},{}\n", name, value));
        }
        output
    }

    fn format_error(&self, error: &str) -> String {
        format!("error\n\"{}\"", escape_csv(error))
    }
}

fn summary_pairs(summary: &CatalogSummary) -> [(&'static str, u64); 8] {
    [
        ("datasets", summary.datasets as u64),
        ("entries", summary.entries),
        ("languages", summary.languages as u64),
        ("scripts", summary.scripts as u64),
        ("dialects", summary.dialects as u64),
        ("broad", summary.broad as u64),
        ("narrow", summary.narrow as u64),
        ("filtered", summary.filtered as u64),
    ]
}

/// Quote a cell when it holds a separator, quote or newline.
fn csv_cell(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", escape_csv(value))
    } else {
        value.to_string()
    }
}

/// Escape a string for CSV.
fn escape_csv(s: &str) -> String {
    s.replace('"', "\"\"")
}
