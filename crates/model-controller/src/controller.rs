//! Executing operation passes against the owned model

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use model_tree::{PathAddress, Resource, ResourceRegistration};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::context::{OperationContext, ResultAction, ResultHandler, Stage};
use crate::error::{Error, Result};
use crate::handler::{HandlerRegistry, OperationStepHandler};
use crate::operation::ModelOperation;
use crate::server::{RequiredAction, ServerAction, ServerIdentity, ServerSignals};

/// Result of a committed pass
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OperationOutcome {
    /// Operations executed, in order
    pub applied: Vec<ModelOperation>,
    /// Required action per affected server
    pub server_actions: Vec<ServerAction>,
}

#[derive(Debug)]
struct ControllerState {
    root: Resource,
    registration: ResourceRegistration,
}

/// Owns the model and serialises operation passes against it
///
/// Each call to [`ModelController::execute`] is one pass: all operations
/// succeed together or the model is restored to its state before the pass.
#[derive(Debug)]
pub struct ModelController {
    state: Mutex<ControllerState>,
    handlers: HandlerRegistry,
    local_indexed_add: bool,
}

impl ModelController {
    /// Create a controller supporting indexed adds.
    pub fn new(
        root: Resource,
        registration: ResourceRegistration,
        handlers: HandlerRegistry,
    ) -> Self {
        Self {
            state: Mutex::new(ControllerState { root, registration }),
            handlers,
            local_indexed_add: true,
        }
    }

    pub fn with_local_indexed_add(mut self, supported: bool) -> Self {
        self.local_indexed_add = supported;
        self
    }

    pub fn local_indexed_add(&self) -> bool {
        self.local_indexed_add
    }

    /// Run `f` against the current model under the controller lock.
    pub fn read<R>(&self, f: impl FnOnce(&Resource) -> R) -> Result<R> {
        let state = self.state.lock().map_err(|_| Error::LockPoisoned)?;
        Ok(f(&state.root))
    }

    /// A deep copy of the current model.
    pub fn snapshot(&self) -> Result<Resource> {
        self.read(Resource::clone)
    }

    /// Consume the controller, returning the model.
    pub fn into_root(self) -> Result<Resource> {
        let state = self.state.into_inner().map_err(|_| Error::LockPoisoned)?;
        Ok(state.root)
    }

    /// Execute `operations` as one pass.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by any step. The model is restored,
    /// pending server signals are dropped and rollback handlers run.
    pub fn execute(&self, operations: Vec<ModelOperation>) -> Result<OperationOutcome> {
        let mut state = self.state.lock().map_err(|_| Error::LockPoisoned)?;
        self.execute_locked(&mut state, operations)
    }

    /// Compute operations from the current model and execute them as one
    /// pass, holding the controller lock from planning to commit.
    ///
    /// An empty plan commits nothing and signals no servers.
    ///
    /// # Errors
    ///
    /// As [`ModelController::execute`].
    pub fn execute_planned<F>(&self, plan: F) -> Result<OperationOutcome>
    where
        F: FnOnce(&Resource) -> Vec<ModelOperation>,
    {
        let mut state = self.state.lock().map_err(|_| Error::LockPoisoned)?;
        let operations = plan(&state.root);
        if operations.is_empty() {
            debug!("Empty plan, nothing to execute");
            return Ok(OperationOutcome::default());
        }
        self.execute_locked(&mut state, operations)
    }

    fn execute_locked(
        &self,
        state: &mut ControllerState,
        operations: Vec<ModelOperation>,
    ) -> Result<OperationOutcome> {
        let snapshot = state.root.clone();

        let ControllerState { root, registration } = state;
        let mut context = StagedContext::new(root, registration, self.local_indexed_add);
        let result = self.run(&mut context, &operations);
        let (signals, result_handlers) = context.finish();

        match result {
            Ok(()) => {
                for handler in result_handlers {
                    handler(ResultAction::Commit);
                }
                let server_actions = signals.into_actions();
                info!(
                    operations = operations.len(),
                    servers = server_actions.len(),
                    "Operation pass committed"
                );
                Ok(OperationOutcome {
                    applied: operations,
                    server_actions,
                })
            }
            Err(error) => {
                state.root = snapshot;
                for handler in result_handlers {
                    handler(ResultAction::Rollback);
                }
                warn!(%error, operations = operations.len(), "Operation pass rolled back");
                Err(error)
            }
        }
    }

    fn run(&self, context: &mut StagedContext<'_>, operations: &[ModelOperation]) -> Result<()> {
        for operation in operations {
            let handler = self.handlers.resolve(operation)?;
            context.add_step(
                Stage::Model,
                operation.address().clone(),
                operation.clone(),
                handler,
            );
        }
        context.run()
    }
}

struct Step {
    address: PathAddress,
    operation: ModelOperation,
    handler: Arc<dyn OperationStepHandler>,
}

/// [`OperationContext`] backed by a borrowed model and per-stage queues
pub struct StagedContext<'a> {
    root: &'a mut Resource,
    registration: &'a ResourceRegistration,
    local_indexed_add: bool,
    queues: [VecDeque<Step>; 3],
    stage: Stage,
    address: PathAddress,
    signals: ServerSignals,
    result_handlers: Vec<ResultHandler>,
}

impl<'a> StagedContext<'a> {
    pub fn new(
        root: &'a mut Resource,
        registration: &'a ResourceRegistration,
        local_indexed_add: bool,
    ) -> Self {
        Self {
            root,
            registration,
            local_indexed_add,
            queues: Default::default(),
            stage: Stage::Model,
            address: PathAddress::root(),
            signals: ServerSignals::new(),
            result_handlers: Vec::new(),
        }
    }

    /// Run queued steps until every queue is empty.
    ///
    /// The earliest non-empty stage always runs next, so a step queued for
    /// an earlier stage runs before later stages continue.
    pub fn run(&mut self) -> Result<()> {
        while let Some(stage) = Stage::ALL
            .into_iter()
            .find(|stage| !self.queues[stage.index()].is_empty())
        {
            let Some(step) = self.queues[stage.index()].pop_front() else {
                break;
            };
            self.stage = stage;
            self.address = step.address;
            debug!(%stage, operation = %step.operation, "Executing step");
            step.handler.execute(self, &step.operation)?;
        }
        Ok(())
    }

    /// Release the signals and result handlers collected by the pass.
    pub fn finish(self) -> (ServerSignals, Vec<ResultHandler>) {
        (self.signals, self.result_handlers)
    }
}

impl OperationContext for StagedContext<'_> {
    fn current_address(&self) -> &PathAddress {
        &self.address
    }

    fn current_stage(&self) -> Stage {
        self.stage
    }

    fn add_step(
        &mut self,
        stage: Stage,
        address: PathAddress,
        operation: ModelOperation,
        handler: Arc<dyn OperationStepHandler>,
    ) {
        self.queues[stage.index()].push_back(Step {
            address,
            operation,
            handler,
        });
    }

    fn root(&self) -> &Resource {
        &*self.root
    }

    fn registration(&self) -> &ResourceRegistration {
        self.registration
    }

    fn resource_mut(&mut self, address: &PathAddress) -> Result<&mut Resource> {
        Ok(self.root.navigate_mut(address)?)
    }

    fn create_resource(
        &mut self,
        address: &PathAddress,
        index: Option<usize>,
    ) -> Result<&mut Resource> {
        let resource = self.registration.create_resource(address);
        let index = index.map(|i| isize::try_from(i).unwrap_or(isize::MAX));
        self.root.register_child_at_address(address, resource, index)?;
        Ok(self.root.navigate_mut(address)?)
    }

    fn remove_resource(&mut self, address: &PathAddress) -> Result<Resource> {
        Ok(self.root.remove_child_at_address(address)?)
    }

    fn reload_required(&mut self, server: ServerIdentity) {
        self.signals.require(server, RequiredAction::Reload);
    }

    fn restart_required(&mut self, server: ServerIdentity) {
        self.signals.require(server, RequiredAction::Restart);
    }

    fn local_indexed_add(&self) -> bool {
        self.local_indexed_add
    }

    fn on_result(&mut self, handler: ResultHandler) {
        self.result_handlers.push(handler);
    }
}
