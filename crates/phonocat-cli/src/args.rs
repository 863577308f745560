//! Command-line arguments.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use phonocat_core::{ColumnSchema, Depth, RegistryConfig, ValidationMode};

use crate::formatter::OutputFormat;

/// Pronunciation dataset catalog tool.
#[derive(Parser, Debug)]
#[command(name = "phonocat")]
#[command(version, about = "Validate and query pronunciation dataset catalogs", long_about = None)]
pub struct Cli {
    /// Output format.
    #[arg(long, global = true, default_value = "table", value_enum)]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Scan every dataset file and print the validation report.
    Validate(ValidateArgs),
    /// Look up one entry by its full key.
    Lookup(LookupArgs),
    /// List entries matching a set of predicates.
    Query(QueryArgs),
    /// List every entry of one language.
    Languages(LanguagesArgs),
    /// Print headline numbers of the catalog.
    Summary(SummaryArgs),
}

/// Options shared by every command that loads a registry.
#[derive(Args, Debug, Clone)]
pub struct LoadArgs {
    /// Manifest file (Markdown README or JSON).
    pub manifest: PathBuf,

    /// Directory that dataset file references resolve against.
    /// Defaults to the manifest's directory.
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Column schema of dataset lines: `N`, `MIN-MAX` or `MIN+`.
    #[arg(long, default_value = "2")]
    pub columns: ColumnSchema,

    /// Allow empty fields in dataset lines.
    #[arg(long)]
    pub allow_empty: bool,

    /// `languages.json` to cross-check manifest rows against.
    #[arg(long)]
    pub languages: Option<PathBuf>,

    /// Validation worker threads (0 = auto).
    #[arg(long, default_value_t = 0)]
    pub workers: usize,

    /// Abort validation after this many seconds (0 = no deadline).
    #[arg(long, default_value_t = 0)]
    pub deadline_secs: u64,
}

impl LoadArgs {
    /// Convert arguments to a registry configuration.
    pub fn into_config(self, validation: ValidationMode, strict: bool) -> RegistryConfig {
        let mut config = RegistryConfig::default()
            .with_schema(self.columns.allow_empty(self.allow_empty))
            .with_validation(validation)
            .strict(strict);

        if let Some(dir) = self.data_dir {
            config = config.with_data_dir(dir);
        }
        if let Some(path) = self.languages {
            config = config.with_languages(path);
        }
        if self.workers > 0 {
            config = config.with_workers(self.workers);
        }
        if self.deadline_secs > 0 {
            config = config.with_deadline(Duration::from_secs(self.deadline_secs));
        }
        config
    }
}

#[derive(Args, Debug)]
pub struct ValidateArgs {
    #[command(flatten)]
    pub load: LoadArgs,

    /// Fail on the first error instead of excluding the entry.
    #[arg(long)]
    pub strict: bool,

    /// Exit non-zero on warnings as well as errors.
    #[arg(long)]
    pub deny_warnings: bool,
}

#[derive(Args, Debug)]
pub struct LookupArgs {
    #[command(flatten)]
    pub load: LoadArgs,

    /// ISO 639-3 language code.
    pub code: String,

    /// Script name, e.g. `Latin`.
    pub script: String,

    /// Dialect; omit for the unmarked dialect.
    #[arg(long)]
    pub dialect: Option<String>,

    /// Select the filtered variant.
    #[arg(long)]
    pub filtered: bool,

    /// Transcription depth.
    #[arg(long)]
    pub depth: Depth,

    /// Also print the first N pronunciations.
    #[arg(long, default_value_t = 0)]
    pub rows: usize,
}

#[derive(Args, Debug)]
pub struct QueryArgs {
    #[command(flatten)]
    pub load: LoadArgs,

    /// Restrict to one ISO 639-3 code.
    #[arg(long)]
    pub language: Option<String>,

    /// Accept this script; may be repeated.
    #[arg(long = "script")]
    pub scripts: Vec<String>,

    #[arg(long)]
    pub depth: Option<Depth>,

    #[arg(long)]
    pub filtered: Option<bool>,

    /// Restrict to one dialect; an empty value selects the unmarked dialect.
    #[arg(long)]
    pub dialect: Option<String>,

    /// Minimum declared entry count.
    #[arg(long)]
    pub min_entries: Option<u64>,

    /// Scan dataset files first and drop entries that fail validation.
    #[arg(long)]
    pub scan: bool,
}

#[derive(Args, Debug)]
pub struct LanguagesArgs {
    #[command(flatten)]
    pub load: LoadArgs,

    /// ISO 639-3 language code.
    pub code: String,
}

#[derive(Args, Debug)]
pub struct SummaryArgs {
    #[command(flatten)]
    pub load: LoadArgs,

    /// Scan dataset files first and drop entries that fail validation.
    #[arg(long)]
    pub scan: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("phonocat").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_validate_args_into_config() {
        let cli = parse(&[
            "validate",
            "README.md",
            "--strict",
            "--columns",
            "2-3",
            "--workers",
            "3",
            "--deadline-secs",
            "30",
            "--data-dir",
            "/srv/corpus",
        ]);
        let Command::Validate(args) = cli.command else {
            panic!("expected validate");
        };
        assert!(args.strict);

        let config = args.load.into_config(ValidationMode::Eager, true);
        assert!(config.strict);
        assert_eq!(config.schema, ColumnSchema::range(2, 3));
        assert_eq!(config.workers, 3);
        assert_eq!(config.deadline, Some(Duration::from_secs(30)));
        assert_eq!(config.data_dir, Some(PathBuf::from("/srv/corpus")));
    }

    #[test]
    fn test_defaults() {
        let cli = parse(&["summary", "README.md"]);
        assert_eq!(cli.format, OutputFormat::Table);
        let Command::Summary(args) = cli.command else {
            panic!("expected summary");
        };
        let config = args.load.into_config(ValidationMode::Lazy, false);
        assert_eq!(config.schema, ColumnSchema::default());
        assert_eq!(config.validation, ValidationMode::Lazy);
        assert!(config.deadline.is_none());
        assert!(config.data_dir.is_none());
        assert!(config.workers >= 1);
    }

    #[test]
    fn test_lookup_args() {
        let cli = parse(&[
            "--format", "json", "lookup", "README.md", "eng", "Latin", "--dialect", "US",
            "--filtered", "--depth", "broad",
        ]);
        assert_eq!(cli.format, OutputFormat::Json);
        let Command::Lookup(args) = cli.command else {
            panic!("expected lookup");
        };
        assert_eq!(args.code, "eng");
        assert_eq!(args.dialect.as_deref(), Some("US"));
        assert!(args.filtered);
        assert_eq!(args.depth, Depth::Broad);
    }

    #[test]
    fn test_query_repeated_scripts() {
        let cli = parse(&[
            "query", "README.md", "--script", "Latin", "--script", "Cyrillic", "--filtered",
            "false",
        ]);
        let Command::Query(args) = cli.command else {
            panic!("expected query");
        };
        assert_eq!(args.scripts, ["Latin", "Cyrillic"]);
        assert_eq!(args.filtered, Some(false));
    }

    #[test]
    fn test_bad_columns_rejected() {
        let result = Cli::try_parse_from(["phonocat", "validate", "README.md", "--columns", "x"]);
        assert!(result.is_err());
    }
}
