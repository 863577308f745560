//! Subcommand execution.

use phonocat_core::{Error, Query, Registry, ValidationMode};
use thiserror::Error as ThisError;

use crate::args::{
    Command, LanguagesArgs, LoadArgs, LookupArgs, QueryArgs, SummaryArgs, ValidateArgs,
};
use crate::formatter::Formatter;

/// Command failures that are not registry errors.
#[derive(Debug, ThisError)]
pub enum CommandError {
    /// Loading or reading the registry failed.
    #[error(transparent)]
    Registry(#[from] Error),

    /// A dataset row could not be read.
    #[error("reading {file}: {source}")]
    Rows {
        file: String,
        #[source]
        source: Error,
    },
}

/// Result of executing a command.
#[derive(Debug)]
pub enum CommandResult {
    /// Output to display; exit successfully.
    Output(String),
    /// Output to display; exit with a failure status.
    Failed(String),
}

/// Execute a parsed command.
pub fn execute(command: Command, formatter: &dyn Formatter) -> Result<CommandResult, CommandError> {
    match command {
        Command::Validate(args) => validate(args, formatter),
        Command::Lookup(args) => lookup(args, formatter),
        Command::Query(args) => query(args, formatter),
        Command::Languages(args) => languages(args, formatter),
        Command::Summary(args) => summary(args, formatter),
    }
}

fn validate(args: ValidateArgs, formatter: &dyn Formatter) -> Result<CommandResult, CommandError> {
    let manifest = args.load.manifest.clone();
    let config = args.load.into_config(ValidationMode::Eager, args.strict);
    let registry = Registry::load_with(&manifest, config)?;

    let report = registry.report();
    let output = formatter.format_report(report, registry.len());
    if report.has_errors() || (args.deny_warnings && !report.is_clean()) {
        Ok(CommandResult::Failed(output))
    } else {
        Ok(CommandResult::Output(output))
    }
}

fn lookup(args: LookupArgs, formatter: &dyn Formatter) -> Result<CommandResult, CommandError> {
    let registry = load(args.load, false)?;

    let entry = match registry.lookup(
        &args.code,
        &args.script,
        args.dialect.as_deref(),
        args.filtered,
        args.depth,
    ) {
        Ok(entry) => entry,
        Err(e @ Error::NotFound(_)) => {
            return Ok(CommandResult::Failed(formatter.format_error(&e.to_string())));
        }
        Err(e) => return Err(e.into()),
    };

    let mut output = formatter.format_entries(&[entry]);
    if args.rows > 0 {
        let rows = registry
            .rows(&entry.key())?
            .take(args.rows)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|source| CommandError::Rows {
                file: entry.file_reference.clone(),
                source,
            })?;
        output.push('\n');
        output.push_str(&formatter.format_rows(&rows));
    }
    Ok(CommandResult::Output(output))
}

fn query(args: QueryArgs, formatter: &dyn Formatter) -> Result<CommandResult, CommandError> {
    let mut query = Query::new().scripts(args.scripts);
    if let Some(language) = args.language {
        query = query.language(language);
    }
    if let Some(depth) = args.depth {
        query = query.depth(depth);
    }
    if let Some(filtered) = args.filtered {
        query = query.filtered(filtered);
    }
    if let Some(dialect) = args.dialect {
        query = query.dialect(dialect);
    }
    if let Some(min) = args.min_entries {
        query = query.min_entries(min);
    }

    let registry = load(args.load, args.scan)?;
    let entries: Vec<_> = registry.query(&query).collect();
    tracing::debug!(?query, matches = entries.len(), "query evaluated");
    Ok(CommandResult::Output(formatter.format_entries(&entries)))
}

fn languages(args: LanguagesArgs, formatter: &dyn Formatter) -> Result<CommandResult, CommandError> {
    let registry = load(args.load, false)?;
    let entries = registry.entries_for_language(&args.code);
    if entries.is_empty() {
        let message = format!("no entries for language `{}`", args.code);
        return Ok(CommandResult::Failed(formatter.format_error(&message)));
    }
    Ok(CommandResult::Output(formatter.format_entries(&entries)))
}

fn summary(args: SummaryArgs, formatter: &dyn Formatter) -> Result<CommandResult, CommandError> {
    let registry = load(args.load, args.scan)?;
    Ok(CommandResult::Output(formatter.format_summary(&registry.summary())))
}

fn load(args: LoadArgs, scan: bool) -> Result<Registry, Error> {
    let mode = if scan {
        ValidationMode::Eager
    } else {
        ValidationMode::Lazy
    };
    let manifest = args.manifest.clone();
    Registry::load_with(&manifest, args.into_config(mode, false))
}
