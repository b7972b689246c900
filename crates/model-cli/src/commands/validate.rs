//! Validate command implementation

use std::path::Path;

use colored::Colorize;
use model_controller::IncludesValidator;
use model_sync::ModelStore;

use super::load_options;
use crate::error::Result;

/// Run the validate command
///
/// Fails on the first include cycle, missing include or conflicting
/// included child.
pub fn run_validate(path: &Path, config: Option<&Path>) -> Result<()> {
    let options = load_options(config)?;
    let root = ModelStore::new(path).load_resource()?;

    let validator = IncludesValidator::new(options.includes_types.iter().cloned());
    validator.validate_all(&root)?;

    let types: Vec<&str> = validator.types().iter().map(String::as_str).collect();
    println!(
        "{} Includes are valid ({}).",
        "OK".green().bold(),
        types.join(", ")
    );
    Ok(())
}
