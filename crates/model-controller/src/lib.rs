//! Staged operation execution for the domain model
//!
//! A [`ModelController`] owns a [`model_tree::Resource`] tree and applies
//! passes of [`ModelOperation`]s to it. Each operation is dispatched to a
//! handler from a [`HandlerRegistry`]; handlers mutate the model in the
//! `Model` stage and queue checks for the `Verify` stage and effects for the
//! `Runtime` stage. A failure anywhere rolls the whole pass back.
//!
//! # Example
//!
//! ```
//! use model_controller::{HandlerRegistry, ModelController, ModelOperation};
//! use model_tree::{Resource, ResourceRegistration};
//! use serde_json::Map;
//!
//! let controller = ModelController::new(
//!     Resource::new(),
//!     ResourceRegistration::new(),
//!     HandlerRegistry::standard(),
//! );
//! let outcome = controller
//!     .execute(vec![ModelOperation::add("/profile=full".parse().unwrap(), Map::new())])
//!     .unwrap();
//! assert_eq!(outcome.applied.len(), 1);
//! ```

pub mod context;
pub mod controller;
pub mod domain;
pub mod error;
pub mod handler;
pub mod impact;
pub mod includes;
pub mod operation;
pub mod server;

pub use context::{ModelChange, OperationContext, ResultAction, ResultHandler, Stage};
pub use controller::{ModelController, OperationOutcome, StagedContext};
pub use domain::{domain_handlers, domain_handlers_with, domain_registration};
pub use error::{Error, FailureDescription, Result};
pub use handler::{
    AddMutator, HandlerRegistry, ModelMutator, ModelVerifier, OperationStepHandler,
    OperationValidator, RemoveMutator, RequiredAttributes, RuntimeEffect, StepHandler,
    UndefineAttributeMutator, WriteAttributeMutator,
};
pub use impact::ServerImpact;
pub use includes::{IncludesValidator, IncludesVerifier, includes_closure, validate_type};
pub use operation::{ModelOperation, OperationKind};
pub use server::{
    RequiredAction, ServerAction, ServerConfig, ServerIdentity, ServerInventory, ServerSignals,
};
