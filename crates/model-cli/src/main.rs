//! Domain model sync CLI
//!
//! Describes model files, plans the operations between two models and
//! applies an incoming description to a live model.

mod cli;
mod commands;
mod error;

use clap::Parser;
use colored::Colorize;

use cli::{Cli, Commands};
use error::Result;

fn main() {
    if let Err(e) = run() {
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    if let Err(e) = model_sync::logging::init_with_default(default_filter) {
        eprintln!("{}: {}", "warning".yellow().bold(), e);
    }
    tracing::debug!("Verbose mode enabled");

    match cli.command {
        Some(cmd) => execute_command(cmd),
        None => {
            println!("{} domain model sync", "model-sync".green().bold());
            println!();
            println!("Run {} for available commands.", "model-sync --help".cyan());
            Ok(())
        }
    }
}

fn execute_command(cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Describe {
            model,
            address,
            for_secondary,
        } => commands::run_describe(&model, address.as_deref(), for_secondary),
        Commands::Plan {
            original,
            incoming,
            no_indexed_add,
            config,
            json,
        } => commands::run_plan(&original, &incoming, config.as_deref(), no_indexed_add, json),
        Commands::Apply {
            live,
            incoming,
            host,
            config,
            dry_run,
            json,
        } => commands::run_apply(
            &live,
            &incoming,
            commands::ApplyArgs {
                host,
                config,
                dry_run,
                json,
            },
        ),
        Commands::Validate { model, config } => commands::run_validate(&model, config.as_deref()),
    }
}
