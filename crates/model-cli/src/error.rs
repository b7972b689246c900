//! Error types for model-cli

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

/// Errors that can occur in CLI operations
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Error from model-sync
    #[error(transparent)]
    Sync(#[from] model_sync::Error),

    /// Error from the operation controller
    #[error(transparent)]
    Controller(#[from] model_controller::Error),

    /// Error from the resource tree
    #[error(transparent)]
    Tree(#[from] model_tree::Error),

    /// JSON output error
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// User-facing error with a message
    #[error("{message}")]
    User { message: String },
}

impl CliError {
    /// Create a new user error with the given message
    pub fn user(message: impl Into<String>) -> Self {
        Self::User {
            message: message.into(),
        }
    }
}
