//! Plan command implementation

use std::path::Path;

use colored::Colorize;
use model_sync::{ModelStore, Planner};

use super::{load_options, render_operation};
use crate::error::Result;

/// Run the plan command
///
/// Prints the operations that would turn `original` into `incoming`.
pub fn run_plan(
    original: &Path,
    incoming: &Path,
    config: Option<&Path>,
    no_indexed_add: bool,
    json: bool,
) -> Result<()> {
    let mut options = load_options(config)?;
    if no_indexed_add {
        options.local_indexed_add = false;
    }

    let original = ModelStore::new(original).load()?;
    let incoming = ModelStore::new(incoming).load()?;
    let plan = Planner::new(&options).plan(&original, &incoming);

    if json {
        println!("{}", serde_json::to_string_pretty(plan.operations())?);
        return Ok(());
    }

    if plan.is_empty() {
        println!("{} Models are in sync. No operations needed.", "OK".green().bold());
        return Ok(());
    }

    println!("{} {} operation(s):", "=>".blue().bold(), plan.len());
    for op in &plan {
        println!("{}", render_operation(op));
    }
    Ok(())
}
