//! Command implementations for model-cli

pub mod apply;
pub mod describe;
pub mod plan;
pub mod validate;

use std::path::Path;

use colored::{ColoredString, Colorize};
use model_controller::{ModelOperation, OperationKind};
use model_sync::SyncOptions;

use crate::error::Result;

pub use apply::{ApplyArgs, run_apply};
pub use describe::run_describe;
pub use plan::run_plan;
pub use validate::run_validate;

/// Options from `config`, or the defaults when no file is given.
pub fn load_options(config: Option<&Path>) -> Result<SyncOptions> {
    match config {
        Some(path) => Ok(SyncOptions::load(path)?),
        None => Ok(SyncOptions::default()),
    }
}

/// One operation line, marked and colored by kind.
pub fn render_operation(op: &ModelOperation) -> String {
    let marker: ColoredString = match op.kind() {
        OperationKind::Add => "+".green(),
        OperationKind::Remove => "-".red(),
        OperationKind::WriteAttribute | OperationKind::UndefineAttribute => "~".yellow(),
    };
    format!("   {} {}", marker, op)
}
