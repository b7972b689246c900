//! Error types for model-sync

use std::path::PathBuf;

/// Result type for model-sync operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while planning, applying or persisting a sync
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A sync configuration file could not be parsed
    #[error("Invalid sync configuration {path}: {message}")]
    ConfigParse { path: PathBuf, message: String },

    /// A model file could not be parsed
    #[error("Invalid model file {path}: {message}")]
    ModelParse { path: PathBuf, message: String },

    /// Error from the operation controller
    #[error(transparent)]
    Controller(#[from] model_controller::Error),

    /// Error from the resource tree
    #[error(transparent)]
    Tree(#[from] model_tree::Error),

    /// Standard I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// TOML deserialization error
    #[error(transparent)]
    Toml(#[from] toml::de::Error),
}
