//! Error types for model-controller

use model_tree::{PathAddress, PathElement};
use serde::Serialize;

use crate::operation::OperationKind;

/// Result type for model-controller operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that abort an operation pass
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Error from the resource tree
    #[error(transparent)]
    Tree(#[from] model_tree::Error),

    /// Resources include each other, directly or transitively
    #[error("Cycle detected in {resource_type} includes: {}", .participants.join(" -> "))]
    CycleDetected {
        resource_type: String,
        participants: Vec<String>,
    },

    /// Included resources disagree on the definition of a child
    #[error(
        "{resource_type} '{including}' includes {} which define {child} differently",
        .sources.join(" and ")
    )]
    ConflictingIncludedChild {
        resource_type: String,
        including: String,
        sources: Vec<String>,
        child: PathElement,
    },

    /// The operation cannot be applied at its address
    #[error("Invalid {operation} at {address}: {reason}")]
    InvalidOperation {
        operation: OperationKind,
        address: PathAddress,
        reason: String,
    },

    /// An attribute value failed validation
    #[error("Invalid value for attribute '{attribute}' at {address}: {reason}")]
    InvalidAttribute {
        address: PathAddress,
        attribute: String,
        reason: String,
    },

    /// Nothing is registered to execute the operation
    #[error("No handler registered for {operation} at {address}")]
    NoHandler {
        operation: OperationKind,
        address: PathAddress,
    },

    /// A previous pass panicked while holding the controller lock
    #[error("Controller lock poisoned")]
    LockPoisoned,
}

/// Structured failure reported to callers
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailureDescription {
    /// Address the failure relates to, when one is known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<PathAddress>,
    /// Human-readable reason
    pub reason: String,
}

impl Error {
    /// The address this error relates to, if any.
    pub fn address(&self) -> Option<PathAddress> {
        match self {
            Self::Tree(model_tree::Error::ResourceNotFound { address })
            | Self::Tree(model_tree::Error::DuplicateResourceAddress { address })
            | Self::Tree(model_tree::Error::WildcardNotAllowed { address })
            | Self::Tree(model_tree::Error::NotOrderedChildType { address, .. })
            | Self::InvalidOperation { address, .. }
            | Self::InvalidAttribute { address, .. }
            | Self::NoHandler { address, .. } => Some(address.clone()),
            Self::CycleDetected {
                resource_type,
                participants,
            } => participants
                .first()
                .map(|name| PathElement::new(resource_type, name).into()),
            Self::ConflictingIncludedChild {
                resource_type,
                including,
                ..
            } => Some(PathElement::new(resource_type, including).into()),
            Self::Tree(_) | Self::LockPoisoned => None,
        }
    }

    /// Describe this error as a structured failure.
    pub fn failure_description(&self) -> FailureDescription {
        FailureDescription {
            address: self.address(),
            reason: self.to_string(),
        }
    }
}
