//! Validation of `includes` between sibling resources
//!
//! Profiles and socket binding groups may include other resources of the
//! same type by name. The include graph must be acyclic, every included name
//! must exist, and no two included sources may define the same child
//! differently.

use std::collections::{BTreeMap, BTreeSet};

use model_tree::{PathAddress, PathElement, Resource};
use serde_json::Value;
use tracing::debug;

use crate::context::{ModelChange, OperationContext};
use crate::domain::{INCLUDES, PROFILE, SOCKET_BINDING_GROUP};
use crate::error::{Error, Result};
use crate::handler::ModelVerifier;
use crate::operation::ModelOperation;

/// Checks includes for a set of top-level resource types
#[derive(Debug, Clone)]
pub struct IncludesValidator {
    types: BTreeSet<String>,
}

impl Default for IncludesValidator {
    fn default() -> Self {
        Self::new([PROFILE, SOCKET_BINDING_GROUP])
    }
}

impl IncludesValidator {
    pub fn new<I, S>(types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            types: types.into_iter().map(Into::into).collect(),
        }
    }

    pub fn types(&self) -> &BTreeSet<String> {
        &self.types
    }

    pub fn supports(&self, resource_type: &str) -> bool {
        self.types.contains(resource_type)
    }

    /// Validate every includes-capable type below `root`.
    pub fn validate_all(&self, root: &Resource) -> Result<()> {
        for resource_type in &self.types {
            validate_type(root, resource_type)?;
        }
        Ok(())
    }
}

/// The names listed in a resource's `includes` attribute.
///
/// # Errors
///
/// Returns `InvalidAttribute` if the attribute is not a list of names.
pub fn includes_of(address: &PathAddress, resource: &Resource) -> Result<Vec<String>> {
    let invalid = || Error::InvalidAttribute {
        address: address.clone(),
        attribute: INCLUDES.to_string(),
        reason: "expected a list of names".to_string(),
    };
    match resource.attribute(INCLUDES) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| item.as_str().map(str::to_string).ok_or_else(invalid))
            .collect(),
        Some(_) => Err(invalid()),
    }
}

/// `name` and every resource it includes transitively, in discovery order.
///
/// Missing names and malformed lists are skipped and cycles are cut, so this
/// is safe to call on a model that has not been validated.
pub fn includes_closure(root: &Resource, resource_type: &str, name: &str) -> Vec<String> {
    let mut seen = Vec::new();
    let mut pending = vec![name.to_string()];
    while let Some(current) = pending.pop() {
        if seen.contains(&current) {
            continue;
        }
        let element = PathElement::new(resource_type, &current);
        let Some(resource) = root.child(&element) else {
            continue;
        };
        let includes =
            includes_of(&PathAddress::from(element.clone()), resource).unwrap_or_default();
        seen.push(current);
        pending.extend(includes.into_iter().rev());
    }
    seen
}

/// Validate the include graph of one top-level resource type.
///
/// # Errors
///
/// - `InvalidAttribute` for a malformed `includes` value
/// - `ResourceNotFound` for an include naming a missing sibling
/// - `CycleDetected` naming the participants in cycle order
/// - `ConflictingIncludedChild` for two sources defining a child differently
pub fn validate_type(root: &Resource, resource_type: &str) -> Result<()> {
    let mut graph: BTreeMap<&str, Vec<String>> = BTreeMap::new();
    for (name, resource) in root.children(resource_type) {
        let address = PathAddress::from(PathElement::new(resource_type, name));
        let includes = includes_of(&address, resource)?;
        for included in &includes {
            if root.child(&PathElement::new(resource_type, included)).is_none() {
                return Err(Error::Tree(model_tree::Error::not_found(PathElement::new(
                    resource_type,
                    included,
                ))));
            }
        }
        graph.insert(name, includes);
    }

    detect_cycles(resource_type, &graph)?;

    for name in graph.keys() {
        check_conflicts(root, resource_type, name)?;
    }
    debug!(resource_type, resources = graph.len(), "Includes validated");
    Ok(())
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Visiting,
    Done,
}

fn detect_cycles(resource_type: &str, graph: &BTreeMap<&str, Vec<String>>) -> Result<()> {
    fn visit<'a>(
        resource_type: &str,
        name: &'a str,
        graph: &'a BTreeMap<&str, Vec<String>>,
        marks: &mut BTreeMap<&'a str, Mark>,
        path: &mut Vec<&'a str>,
    ) -> Result<()> {
        match marks.get(name) {
            Some(Mark::Done) => return Ok(()),
            Some(Mark::Visiting) => {
                let start = path.iter().position(|n| *n == name).unwrap_or(0);
                let mut participants: Vec<String> =
                    path[start..].iter().map(|n| n.to_string()).collect();
                participants.push(name.to_string());
                return Err(Error::CycleDetected {
                    resource_type: resource_type.to_string(),
                    participants,
                });
            }
            None => {}
        }
        marks.insert(name, Mark::Visiting);
        path.push(name);
        for included in graph.get(name).into_iter().flatten() {
            visit(resource_type, included, graph, marks, path)?;
        }
        path.pop();
        marks.insert(name, Mark::Done);
        Ok(())
    }

    let mut marks = BTreeMap::new();
    for name in graph.keys() {
        visit(resource_type, name, graph, &mut marks, &mut Vec::new())?;
    }
    Ok(())
}

fn direct_children(resource: &Resource) -> Vec<(PathElement, &Resource)> {
    resource
        .child_types()
        .flat_map(|child_type| {
            resource
                .children(child_type)
                .map(move |(name, child)| (PathElement::new(child_type, name), child))
        })
        .collect()
}

fn check_conflicts(root: &Resource, resource_type: &str, name: &str) -> Result<()> {
    let closure = includes_closure(root, resource_type, name);

    // The including resource comes first, then its sources in discovery order.
    let mut defined: BTreeMap<PathElement, (&str, &Resource)> = BTreeMap::new();
    for source in &closure {
        let Some(resource) = root.child(&PathElement::new(resource_type, source)) else {
            continue;
        };
        for (element, child) in direct_children(resource) {
            match defined.get(&element) {
                Some((first, existing)) if *existing != child => {
                    return Err(Error::ConflictingIncludedChild {
                        resource_type: resource_type.to_string(),
                        including: name.to_string(),
                        sources: vec![first.to_string(), source.clone()],
                        child: element,
                    });
                }
                Some(_) => {}
                None => {
                    defined.insert(element, (source.as_str(), child));
                }
            }
        }
    }
    Ok(())
}

/// Runs [`IncludesValidator`] after changes that can affect the include graph
///
/// Triggered by adding or removing a top-level includes-capable resource, or
/// by writing or undefining its `includes` attribute.
#[derive(Debug, Clone, Default)]
pub struct IncludesVerifier {
    validator: IncludesValidator,
}

impl IncludesVerifier {
    pub fn new(validator: IncludesValidator) -> Self {
        Self { validator }
    }
}

impl ModelVerifier for IncludesVerifier {
    fn applies_to(&self, change: &ModelChange, operation: &ModelOperation) -> bool {
        let address = change.address();
        let Some(element) = address.first() else {
            return false;
        };
        if address.len() != 1 || !self.validator.supports(&element.key) {
            return false;
        }
        match change {
            ModelChange::Added { .. } | ModelChange::Removed { .. } => true,
            ModelChange::AttributeWritten { name, .. } => {
                name == INCLUDES && operation.attribute_name() == Some(INCLUDES)
            }
        }
    }

    fn verify(&self, context: &mut dyn OperationContext, change: &ModelChange) -> Result<()> {
        let Some(element) = change.address().first() else {
            return Ok(());
        };
        debug!(address = %change.address(), "Verifying includes");
        validate_type(context.root(), &element.key)
    }
}
