//! Describe command implementation

use std::path::Path;

use model_sync::ModelStore;
use model_tree::{IgnoredResources, ModelReader, PathAddress, ReadOptions};

use crate::error::Result;

/// Run the describe command
///
/// Prints the description of the model at `path`, or of the subtree at
/// `address`, as pretty JSON.
pub fn run_describe(path: &Path, address: Option<&str>, for_secondary: bool) -> Result<()> {
    let root = ModelStore::new(path).load_resource()?;

    let reader = if for_secondary {
        ModelReader::with_options(ReadOptions::for_secondary(IgnoredResources::new()))
    } else {
        ModelReader::new()
    };
    let described = match address {
        Some(address) => {
            let address: PathAddress = address.parse()?;
            reader.describe_at(&root, &address)?
        }
        None => reader.describe(&root),
    };

    println!("{}", described.to_json_string()?);
    Ok(())
}
