//! Apply command implementation

use std::path::{Path, PathBuf};

use colored::Colorize;
use model_controller::RequiredAction;
use model_sync::{ModelStore, Reconciler, SyncReport};

use super::{load_options, render_operation};
use crate::error::{CliError, Result};

/// Flags of the apply command
#[derive(Debug, Clone, Default)]
pub struct ApplyArgs {
    pub host: Option<String>,
    pub config: Option<PathBuf>,
    pub dry_run: bool,
    pub json: bool,
}

/// Run the apply command
///
/// Reconciles the model at `live` with `incoming` and writes it back. With
/// `dry_run` nothing is written.
pub fn run_apply(live: &Path, incoming: &Path, args: ApplyArgs) -> Result<()> {
    if live == incoming {
        return Err(CliError::user(
            "The live model and the incoming description must be different files",
        ));
    }

    let mut options = load_options(args.config.as_deref())?;
    if let Some(host) = args.host {
        options.host = host;
    }

    let store = ModelStore::new(live);
    let incoming = ModelStore::new(incoming).load()?;
    let reconciler = Reconciler::new(options);
    let controller = reconciler.controller(store.load_resource()?)?;

    let report = if args.dry_run {
        reconciler.dry_run(&controller, &incoming)?
    } else {
        let report = reconciler.apply(&controller, &incoming)?;
        if !report.is_noop() {
            store.save_resource(&controller.into_root()?)?;
        }
        report
    };

    if args.json {
        println!("{}", report.to_json_string()?);
    } else {
        print_report(&report);
    }
    Ok(())
}

fn print_report(report: &SyncReport) {
    if report.is_noop() {
        println!("{} Already up to date. No changes needed.", "OK".green().bold());
        return;
    }

    if report.dry_run {
        println!(
            "{} Would apply {} operation(s):",
            "DRY RUN".yellow().bold(),
            report.operations.len()
        );
    } else {
        println!(
            "{} Applied {} operation(s):",
            "OK".green().bold(),
            report.operations.len()
        );
    }
    for op in &report.operations {
        println!("{}", render_operation(op));
    }

    if !report.server_actions.is_empty() {
        println!();
        println!("{} Servers need attention:", "!".yellow().bold());
        for action in &report.server_actions {
            let label = match action.action {
                RequiredAction::Reload => action.action.to_string().yellow(),
                RequiredAction::Restart => action.action.to_string().red(),
            };
            println!("   {} {}", action.server, label);
        }
    }
}
