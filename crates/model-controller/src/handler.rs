//! Step handlers composed from validation, mutation and effect strategies
//!
//! A [`StepHandler`] runs its validators, applies its [`ModelMutator`], and
//! then queues a `Verify` step for each [`ModelVerifier`] interested in the
//! resulting [`ModelChange`] and a `Runtime` step for each [`RuntimeEffect`].
//! Mutations that leave the model unchanged queue nothing.

use std::collections::HashMap;
use std::sync::Arc;

use model_tree::PathAddress;
use tracing::debug;

use crate::context::{ModelChange, OperationContext, Stage};
use crate::error::{Error, Result};
use crate::operation::{ModelOperation, OperationKind};

/// Executes one queued step
pub trait OperationStepHandler: Send + Sync {
    fn execute(&self, context: &mut dyn OperationContext, operation: &ModelOperation)
    -> Result<()>;
}

/// Rejects operations before the model is touched
pub trait OperationValidator: Send + Sync {
    fn validate(&self, context: &dyn OperationContext, operation: &ModelOperation) -> Result<()>;
}

/// Applies an operation to the model
pub trait ModelMutator: Send + Sync {
    fn mutate(
        &self,
        context: &mut dyn OperationContext,
        operation: &ModelOperation,
    ) -> Result<ModelChange>;
}

/// Checks the model once every `Model` step of the pass has run
pub trait ModelVerifier: Send + Sync {
    /// Whether this verifier needs to run for `change`.
    fn applies_to(&self, change: &ModelChange, operation: &ModelOperation) -> bool;

    fn verify(&self, context: &mut dyn OperationContext, change: &ModelChange) -> Result<()>;
}

/// Reacts to a model change in the `Runtime` stage
pub trait RuntimeEffect: Send + Sync {
    fn apply(&self, context: &mut dyn OperationContext, change: &ModelChange) -> Result<()>;
}

/// A handler built from strategies
#[derive(Clone)]
pub struct StepHandler {
    validators: Vec<Arc<dyn OperationValidator>>,
    mutator: Arc<dyn ModelMutator>,
    verifiers: Vec<Arc<dyn ModelVerifier>>,
    effects: Vec<Arc<dyn RuntimeEffect>>,
}

impl StepHandler {
    pub fn new(mutator: Arc<dyn ModelMutator>) -> Self {
        Self {
            validators: Vec::new(),
            mutator,
            verifiers: Vec::new(),
            effects: Vec::new(),
        }
    }

    /// A handler using the built-in mutator for `kind`.
    pub fn for_kind(kind: OperationKind) -> Self {
        let mutator: Arc<dyn ModelMutator> = match kind {
            OperationKind::Add => Arc::new(AddMutator),
            OperationKind::Remove => Arc::new(RemoveMutator),
            OperationKind::WriteAttribute => Arc::new(WriteAttributeMutator),
            OperationKind::UndefineAttribute => Arc::new(UndefineAttributeMutator),
        };
        Self::new(mutator)
    }

    pub fn with_validator(mut self, validator: Arc<dyn OperationValidator>) -> Self {
        self.validators.push(validator);
        self
    }

    pub fn with_verifier(mut self, verifier: Arc<dyn ModelVerifier>) -> Self {
        self.verifiers.push(verifier);
        self
    }

    pub fn with_effect(mut self, effect: Arc<dyn RuntimeEffect>) -> Self {
        self.effects.push(effect);
        self
    }
}

impl OperationStepHandler for StepHandler {
    fn execute(
        &self,
        context: &mut dyn OperationContext,
        operation: &ModelOperation,
    ) -> Result<()> {
        for validator in &self.validators {
            validator.validate(context, operation)?;
        }

        let change = self.mutator.mutate(context, operation)?;
        if change.is_noop() {
            debug!(%operation, "Operation left the model unchanged");
            return Ok(());
        }

        for verifier in &self.verifiers {
            if verifier.applies_to(&change, operation) {
                context.add_step(
                    Stage::Verify,
                    change.address().clone(),
                    operation.clone(),
                    Arc::new(VerifyStep {
                        verifier: Arc::clone(verifier),
                        change: change.clone(),
                    }),
                );
            }
        }
        for effect in &self.effects {
            context.add_step(
                Stage::Runtime,
                change.address().clone(),
                operation.clone(),
                Arc::new(EffectStep {
                    effect: Arc::clone(effect),
                    change: change.clone(),
                }),
            );
        }
        Ok(())
    }
}

struct VerifyStep {
    verifier: Arc<dyn ModelVerifier>,
    change: ModelChange,
}

impl OperationStepHandler for VerifyStep {
    fn execute(&self, context: &mut dyn OperationContext, _: &ModelOperation) -> Result<()> {
        self.verifier.verify(context, &self.change)
    }
}

struct EffectStep {
    effect: Arc<dyn RuntimeEffect>,
    change: ModelChange,
}

impl OperationStepHandler for EffectStep {
    fn execute(&self, context: &mut dyn OperationContext, _: &ModelOperation) -> Result<()> {
        self.effect.apply(context, &self.change)
    }
}

fn mismatch(expected: OperationKind, operation: &ModelOperation) -> Error {
    Error::InvalidOperation {
        operation: operation.kind(),
        address: operation.address().clone(),
        reason: format!("handler only executes {}", expected),
    }
}

fn reject_root(operation: &ModelOperation) -> Result<()> {
    if operation.address().is_empty() {
        return Err(Error::InvalidOperation {
            operation: operation.kind(),
            address: PathAddress::root(),
            reason: "the root resource cannot be added or removed".to_string(),
        });
    }
    Ok(())
}

/// Creates a resource from its registration and sets its attributes
///
/// An add joining an ordered collection first marks the collection ordered
/// on the parent. The requested index is only honoured when the context
/// supports indexed adds; otherwise the resource is appended.
pub struct AddMutator;

impl ModelMutator for AddMutator {
    fn mutate(
        &self,
        context: &mut dyn OperationContext,
        operation: &ModelOperation,
    ) -> Result<ModelChange> {
        let ModelOperation::Add {
            address,
            attributes,
            index,
            ordered_child_types,
            ordered,
        } = operation
        else {
            return Err(mismatch(OperationKind::Add, operation));
        };
        reject_root(operation)?;

        if let Some((parent, element)) = address.split_last().filter(|_| *ordered) {
            let parent = context.resource_mut(&parent)?;
            if !parent.is_ordered_child_type(&element.key) {
                debug!(%address, child_type = %element.key, "Marking child type ordered");
                parent.add_ordered_child_type(element.key.clone());
            }
        }

        let index = match index {
            Some(index) if !context.local_indexed_add() => {
                debug!(%address, index, "Indexed add unsupported, appending");
                None
            }
            other => *other,
        };
        let resource = context.create_resource(address, index)?;
        for child_type in ordered_child_types {
            resource.add_ordered_child_type(child_type.clone());
        }
        resource.merge_attributes(attributes);
        Ok(ModelChange::Added {
            address: address.clone(),
        })
    }
}

/// Removes a resource and its subtree
pub struct RemoveMutator;

impl ModelMutator for RemoveMutator {
    fn mutate(
        &self,
        context: &mut dyn OperationContext,
        operation: &ModelOperation,
    ) -> Result<ModelChange> {
        let ModelOperation::Remove { address } = operation else {
            return Err(mismatch(OperationKind::Remove, operation));
        };
        reject_root(operation)?;
        let previous = context.remove_resource(address)?;
        Ok(ModelChange::Removed {
            address: address.clone(),
            previous,
        })
    }
}

/// Sets one attribute
pub struct WriteAttributeMutator;

impl ModelMutator for WriteAttributeMutator {
    fn mutate(
        &self,
        context: &mut dyn OperationContext,
        operation: &ModelOperation,
    ) -> Result<ModelChange> {
        let ModelOperation::WriteAttribute {
            address,
            name,
            value,
        } = operation
        else {
            return Err(mismatch(OperationKind::WriteAttribute, operation));
        };
        let previous = context
            .resource_mut(address)?
            .write_attribute(name.clone(), value.clone());
        Ok(ModelChange::AttributeWritten {
            address: address.clone(),
            name: name.clone(),
            previous,
            current: Some(value.clone()),
        })
    }
}

/// Clears one attribute
pub struct UndefineAttributeMutator;

impl ModelMutator for UndefineAttributeMutator {
    fn mutate(
        &self,
        context: &mut dyn OperationContext,
        operation: &ModelOperation,
    ) -> Result<ModelChange> {
        let ModelOperation::UndefineAttribute { address, name } = operation else {
            return Err(mismatch(OperationKind::UndefineAttribute, operation));
        };
        let previous = context.resource_mut(address)?.undefine_attribute(name);
        Ok(ModelChange::AttributeWritten {
            address: address.clone(),
            name: name.clone(),
            previous,
            current: None,
        })
    }
}

/// Requires an `add` to carry the named attributes
#[derive(Debug, Clone)]
pub struct RequiredAttributes {
    names: Vec<String>,
}

impl RequiredAttributes {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }
}

impl OperationValidator for RequiredAttributes {
    fn validate(&self, _: &dyn OperationContext, operation: &ModelOperation) -> Result<()> {
        let ModelOperation::Add {
            address,
            attributes,
            ..
        } = operation
        else {
            return Ok(());
        };
        match self
            .names
            .iter()
            .find(|name| attributes.get(name.as_str()).is_none_or(|v| v.is_null()))
        {
            Some(missing) => Err(Error::InvalidAttribute {
                address: address.clone(),
                attribute: missing.clone(),
                reason: "required attribute is not defined".to_string(),
            }),
            None => Ok(()),
        }
    }
}

/// Maps operations to the handler that executes them
///
/// Handlers registered for an address pattern take precedence over the
/// handler for the operation kind. Later pattern registrations win.
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    by_kind: HashMap<OperationKind, Arc<dyn OperationStepHandler>>,
    overrides: Vec<(PathAddress, OperationKind, Arc<dyn OperationStepHandler>)>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with the built-in mutator for every operation kind.
    pub fn standard() -> Self {
        let mut registry = Self::new();
        for kind in OperationKind::ALL {
            registry.register(kind, Arc::new(StepHandler::for_kind(kind)));
        }
        registry
    }

    pub fn register(
        &mut self,
        kind: OperationKind,
        handler: Arc<dyn OperationStepHandler>,
    ) -> &mut Self {
        self.by_kind.insert(kind, handler);
        self
    }

    /// Register a handler for `kind` at addresses matching `pattern`.
    pub fn register_override(
        &mut self,
        pattern: PathAddress,
        kind: OperationKind,
        handler: Arc<dyn OperationStepHandler>,
    ) -> &mut Self {
        self.overrides.push((pattern, kind, handler));
        self
    }

    /// Find the handler for `operation`.
    ///
    /// # Errors
    ///
    /// Returns `NoHandler` if nothing is registered for its kind.
    pub fn resolve(&self, operation: &ModelOperation) -> Result<Arc<dyn OperationStepHandler>> {
        let kind = operation.kind();
        let address = operation.address();
        self.overrides
            .iter()
            .rev()
            .find(|(pattern, k, _)| *k == kind && pattern.matches(address))
            .map(|(_, _, handler)| handler)
            .or_else(|| self.by_kind.get(&kind))
            .cloned()
            .ok_or_else(|| Error::NoHandler {
                operation: kind,
                address: address.clone(),
            })
    }
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("kinds", &self.by_kind.keys().collect::<Vec<_>>())
            .field(
                "overrides",
                &self
                    .overrides
                    .iter()
                    .map(|(pattern, kind, _)| format!("{}:{}", pattern, kind))
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}
