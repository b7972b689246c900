//! Error types for model-tree

use crate::path::PathAddress;

/// Result type for model-tree operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while navigating or mutating a resource tree
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An address segment did not resolve to a resource
    #[error("Resource not found: {address}")]
    ResourceNotFound { address: PathAddress },

    /// A resource is already registered at the address
    #[error("Duplicate resource: {address}")]
    DuplicateResourceAddress { address: PathAddress },

    /// Wildcard elements may only be used in query addresses
    #[error("Wildcard address cannot be stored in the tree: {address}")]
    WildcardNotAllowed { address: PathAddress },

    /// A positional insert was attempted on an unordered child type
    #[error("Child type '{child_type}' of {address} does not preserve order")]
    NotOrderedChildType {
        address: PathAddress,
        child_type: String,
    },

    /// An address string could not be parsed
    #[error("Invalid address '{input}': {reason}")]
    InvalidAddress { input: String, reason: String },

    /// JSON serialization/deserialization error
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn not_found(address: impl Into<PathAddress>) -> Self {
        Self::ResourceNotFound {
            address: address.into(),
        }
    }

    pub fn invalid_address(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidAddress {
            input: input.into(),
            reason: reason.into(),
        }
    }
}
