//! The context a step handler runs in

use std::fmt;
use std::sync::Arc;

use model_tree::{PathAddress, Resource, ResourceRegistration};
use serde::Serialize;
use serde_json::Value;

use crate::error::Result;
use crate::handler::OperationStepHandler;
use crate::operation::ModelOperation;
use crate::server::ServerIdentity;

/// Execution stages, run in declaration order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Stage {
    /// Read and mutate the model
    Model,
    /// Check the mutated model as a whole
    Verify,
    /// React to the change, e.g. by flagging servers
    Runtime,
}

impl Stage {
    pub const ALL: [Stage; 3] = [Stage::Model, Stage::Verify, Stage::Runtime];

    pub(crate) fn index(self) -> usize {
        match self {
            Self::Model => 0,
            Self::Verify => 1,
            Self::Runtime => 2,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Model => write!(f, "model"),
            Self::Verify => write!(f, "verify"),
            Self::Runtime => write!(f, "runtime"),
        }
    }
}

/// How a pass ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultAction {
    Commit,
    Rollback,
}

/// Callback run once the outcome of a pass is known
pub type ResultHandler = Box<dyn FnOnce(ResultAction) + Send>;

/// What a model mutation did
#[derive(Debug, Clone, PartialEq)]
pub enum ModelChange {
    Added {
        address: PathAddress,
    },
    Removed {
        address: PathAddress,
        /// The removed subtree
        previous: Resource,
    },
    AttributeWritten {
        address: PathAddress,
        name: String,
        previous: Option<Value>,
        current: Option<Value>,
    },
}

impl ModelChange {
    pub fn address(&self) -> &PathAddress {
        match self {
            Self::Added { address }
            | Self::Removed { address, .. }
            | Self::AttributeWritten { address, .. } => address,
        }
    }

    /// True when the mutation left the model as it was.
    pub fn is_noop(&self) -> bool {
        match self {
            Self::AttributeWritten {
                previous, current, ..
            } => previous == current,
            Self::Added { .. } | Self::Removed { .. } => false,
        }
    }
}

/// Operations available to a step while a pass runs
///
/// Addresses passed to the mutating methods are absolute.
pub trait OperationContext {
    /// Address of the step currently executing.
    fn current_address(&self) -> &PathAddress;

    /// Stage of the step currently executing.
    fn current_stage(&self) -> Stage;

    /// Queue a step. Steps of one stage run in the order they were added.
    fn add_step(
        &mut self,
        stage: Stage,
        address: PathAddress,
        operation: ModelOperation,
        handler: Arc<dyn OperationStepHandler>,
    );

    /// The whole model.
    fn root(&self) -> &Resource;

    fn registration(&self) -> &ResourceRegistration;

    /// Read a resource relative to the current address.
    fn read_resource(&self, relative: &PathAddress) -> Result<&Resource> {
        let address = self.current_address().join(relative);
        Ok(self.root().navigate(&address)?)
    }

    /// Read a resource by absolute address.
    fn read_resource_from_root(&self, address: &PathAddress) -> Result<&Resource> {
        Ok(self.root().navigate(address)?)
    }

    /// Mutable access to the resource at `address`.
    fn resource_mut(&mut self, address: &PathAddress) -> Result<&mut Resource>;

    /// Create an empty resource at `address` as its registration describes
    /// it, optionally at a position among ordered siblings.
    fn create_resource(
        &mut self,
        address: &PathAddress,
        index: Option<usize>,
    ) -> Result<&mut Resource>;

    /// Remove the resource at `address`, returning its subtree.
    fn remove_resource(&mut self, address: &PathAddress) -> Result<Resource>;

    fn reload_required(&mut self, server: ServerIdentity);

    fn restart_required(&mut self, server: ServerIdentity);

    /// Whether indexed adds into ordered collections are supported.
    fn local_indexed_add(&self) -> bool;

    /// Register a callback for the end of the pass.
    fn on_result(&mut self, handler: ResultHandler);
}
