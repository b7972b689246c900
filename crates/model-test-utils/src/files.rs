//! [`TestDir`] for tests that persist models.

use std::fs;
use std::path::{Path, PathBuf};

use model_tree::DescribedResource;
use tempfile::TempDir;

/// A temporary directory holding model and config files.
pub struct TestDir {
    temp_dir: TempDir,
}

impl Default for TestDir {
    fn default() -> Self {
        Self::new()
    }
}

impl TestDir {
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().unwrap(),
        }
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Write `content` to `name`, returning the full path.
    pub fn write(&self, name: &str, content: &str) -> PathBuf {
        let path = self.path().join(name);
        fs::write(&path, content)
            .unwrap_or_else(|e| panic!("TestDir::write {}: {e}", path.display()));
        path
    }

    /// Write a described model as JSON to `name`.
    pub fn write_model(&self, name: &str, model: &DescribedResource) -> PathBuf {
        self.write(name, &model.to_json_string().unwrap())
    }

    /// Read and parse a described model from `name`.
    pub fn read_model(&self, name: &str) -> DescribedResource {
        let path = self.path().join(name);
        let content = fs::read_to_string(&path)
            .unwrap_or_else(|e| panic!("TestDir::read_model {}: {e}", path.display()));
        DescribedResource::from_json_str(&content).unwrap()
    }
}
