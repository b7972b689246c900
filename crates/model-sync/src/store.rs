//! Persisting described models as JSON files
//!
//! Reads take a shared lock and writes an exclusive one. Writes go to a
//! temporary file that is then renamed over the target.

use std::fs::{self, File, OpenOptions};
use std::io::Read;
use std::path::{Path, PathBuf};

use fs2::FileExt;
use model_tree::{DescribedResource, Resource};

use crate::error::{Error, Result};

/// A model file on disk
#[derive(Debug, Clone)]
pub struct ModelStore {
    path: PathBuf,
}

impl ModelStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the described model with a shared lock.
    ///
    /// # Errors
    ///
    /// Returns `Io` if the file cannot be read or locked and `ModelParse` if
    /// it does not hold a described model.
    pub fn load(&self) -> Result<DescribedResource> {
        let file = File::open(&self.path)?;
        file.lock_shared()?;

        // Read through the locked handle
        let mut content = String::new();
        (&file).read_to_string(&mut content)?;
        DescribedResource::from_json_str(&content).map_err(|e| Error::ModelParse {
            path: self.path.clone(),
            message: e.to_string(),
        })
    }

    /// Load and rebuild the live tree.
    pub fn load_resource(&self) -> Result<Resource> {
        Ok(self.load()?.to_resource()?)
    }

    /// Save the described model atomically under an exclusive lock.
    ///
    /// # Arguments
    ///
    /// * `model` - Description to write as pretty JSON
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or locked.
    pub fn save(&self, model: &DescribedResource) -> Result<()> {
        let content = model.to_json_string()?;

        let lock_file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&self.path)?;
        lock_file.lock_exclusive()?;

        let temp_path = self.path.with_extension("json.tmp");
        fs::write(&temp_path, content)?;
        fs::rename(&temp_path, &self.path)?;

        tracing::debug!(path = %self.path.display(), "Saved model");
        // Lock released when lock_file is dropped
        Ok(())
    }

    /// Describe and save a live tree.
    pub fn save_resource(&self, root: &Resource) -> Result<()> {
        self.save(&DescribedResource::of(root))
    }
}
