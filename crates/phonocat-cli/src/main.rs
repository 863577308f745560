//! phonocat command-line tool
//!
//! Validates pronunciation dataset catalogs and answers lookups and
//! queries against them.

mod args;
mod commands;
mod formatter;

use args::Cli;
use clap::Parser;
use commands::CommandResult;

fn main() {
    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::from_default_env();
    let filter = match "phonocat=info".parse::<tracing_subscriber::filter::Directive>() {
        Ok(directive) => filter.add_directive(directive),
        Err(_) => filter,
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

/// Run one command. Returns whether it succeeded.
fn run(cli: Cli) -> Result<bool, Box<dyn std::error::Error>> {
    let formatter = formatter::create_formatter(cli.format);

    match commands::execute(cli.command, &*formatter)? {
        CommandResult::Output(output) => {
            println!("{}", output);
            Ok(true)
        }
        CommandResult::Failed(output) => {
            println!("{}", output);
            Ok(false)
        }
    }
}
