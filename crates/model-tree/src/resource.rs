//! The mutable resource node
//!
//! A [`Resource`] holds an attribute document and typed, named children. The
//! tree is owned top-down: a child lives inside its parent's collection and
//! has no pointer back to it, so every lookup walks from the root by
//! [`PathAddress`].
//!
//! Child types listed as *ordered* keep their children as a sequence whose
//! positions survive description, transport and reconciliation. Other child
//! types behave as sets keyed by name; they iterate in insertion order but
//! no code relies on that order.

use std::collections::BTreeSet;

use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::path::{PathAddress, PathElement};

/// Children of a single type, keyed by name in iteration order
pub type ChildMap = IndexMap<String, Resource>;

/// A node in the domain model tree
#[derive(Debug, Clone, Default)]
pub struct Resource {
    /// Attribute document
    model: Map<String, Value>,
    /// Child collections keyed by child type; empty collections are dropped
    children: IndexMap<String, ChildMap>,
    /// Child types whose order is significant
    ordered_child_types: BTreeSet<String>,
    /// Stands in for a subtree held by another process
    proxy: bool,
}

impl Resource {
    /// Create an empty resource with no ordered child types.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty resource preserving order for the given child types.
    pub fn with_ordered_child_types<I, S>(types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            ordered_child_types: types.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Create a proxy resource marking the boundary of a remote subtree.
    pub fn proxy() -> Self {
        Self {
            proxy: true,
            ..Self::default()
        }
    }

    /// Replace the attribute document, returning `self` for chaining.
    pub fn with_model(mut self, model: Map<String, Value>) -> Self {
        self.model = model;
        self
    }

    pub fn is_proxy(&self) -> bool {
        self.proxy
    }

    // ---- attributes ----

    /// The attribute document.
    pub fn model(&self) -> &Map<String, Value> {
        &self.model
    }

    /// Mutable access to the attribute document.
    pub fn model_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.model
    }

    /// Get a single attribute value.
    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.model.get(name)
    }

    /// Set an attribute, returning the previous value if any.
    pub fn write_attribute(&mut self, name: impl Into<String>, value: Value) -> Option<Value> {
        self.model.insert(name.into(), value)
    }

    /// Remove an attribute, returning its value if it was defined.
    pub fn undefine_attribute(&mut self, name: &str) -> Option<Value> {
        self.model.shift_remove(name)
    }

    /// Overlay `attributes` onto the attribute document.
    pub fn merge_attributes(&mut self, attributes: &Map<String, Value>) {
        for (name, value) in attributes {
            self.model.insert(name.clone(), value.clone());
        }
    }

    // ---- ordering metadata ----

    /// The child types whose order is preserved.
    pub fn ordered_child_types(&self) -> &BTreeSet<String> {
        &self.ordered_child_types
    }

    pub fn is_ordered_child_type(&self, child_type: &str) -> bool {
        self.ordered_child_types.contains(child_type)
    }

    /// Mark a child type as ordered.
    pub fn add_ordered_child_type(&mut self, child_type: impl Into<String>) {
        self.ordered_child_types.insert(child_type.into());
    }

    // ---- children ----

    /// Child types that currently hold at least one child.
    pub fn child_types(&self) -> impl Iterator<Item = &str> {
        self.children.keys().map(String::as_str)
    }

    /// Whether any child of `child_type` exists.
    pub fn has_children(&self, child_type: &str) -> bool {
        self.children.contains_key(child_type)
    }

    /// Names of the children of a type, in sequence order for ordered types.
    pub fn child_names(&self, child_type: &str) -> Vec<&str> {
        self.children
            .get(child_type)
            .map(|map| map.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Iterate `(name, child)` pairs of a type.
    pub fn children(&self, child_type: &str) -> impl Iterator<Item = (&str, &Resource)> {
        self.children
            .get(child_type)
            .into_iter()
            .flat_map(|map| map.iter().map(|(name, child)| (name.as_str(), child)))
    }

    /// The raw collection for a child type.
    pub fn child_map(&self, child_type: &str) -> Option<&ChildMap> {
        self.children.get(child_type)
    }

    pub fn child(&self, element: &PathElement) -> Option<&Resource> {
        self.children.get(&element.key)?.get(&element.value)
    }

    pub fn child_mut(&mut self, element: &PathElement) -> Option<&mut Resource> {
        self.children.get_mut(&element.key)?.get_mut(&element.value)
    }

    pub fn has_child(&self, element: &PathElement) -> bool {
        self.child(element).is_some()
    }

    /// Get a child, failing with `ResourceNotFound` when absent.
    pub fn require_child(&self, element: &PathElement) -> Result<&Resource> {
        self.child(element)
            .ok_or_else(|| Error::not_found(element.clone()))
    }

    /// Position of a child within its type's collection.
    pub fn child_index(&self, element: &PathElement) -> Option<usize> {
        self.children.get(&element.key)?.get_index_of(&element.value)
    }

    /// Register a new child at the end of its type's collection.
    ///
    /// # Errors
    ///
    /// - `WildcardNotAllowed` if the element is a wildcard
    /// - `InvalidAddress` if the element has an empty part or one containing
    ///   `/` or `=`
    /// - `DuplicateResourceAddress` if a child already exists at `element`
    pub fn register_child(&mut self, element: PathElement, child: Resource) -> Result<()> {
        check_storable(&element)?;
        if self.has_child(&element) {
            return Err(Error::DuplicateResourceAddress {
                address: element.into(),
            });
        }
        tracing::trace!(%element, "Registering child");
        self.children
            .entry(element.key)
            .or_default()
            .insert(element.value, child);
        Ok(())
    }

    /// Register a child at a position within an ordered child type.
    ///
    /// A negative `index`, or one past the end of the collection, appends.
    /// If a child with the same name exists it is replaced and moved to
    /// `index`.
    ///
    /// # Errors
    ///
    /// - `WildcardNotAllowed` if the element is a wildcard
    /// - `InvalidAddress` as for [`Resource::register_child`]
    /// - `NotOrderedChildType` if `element.key` is not an ordered child type
    pub fn register_child_at(
        &mut self,
        element: PathElement,
        index: isize,
        child: Resource,
    ) -> Result<()> {
        check_storable(&element)?;
        if !self.is_ordered_child_type(&element.key) {
            return Err(Error::NotOrderedChildType {
                address: PathAddress::root(),
                child_type: element.key,
            });
        }

        let map = self.children.entry(element.key.clone()).or_default();
        map.shift_remove(&element.value);
        // Out of range indexes append rather than fail.
        let position = usize::try_from(index)
            .ok()
            .filter(|i| *i <= map.len())
            .unwrap_or(map.len());
        tracing::trace!(%element, index, position, "Registering ordered child");
        map.shift_insert(position, element.value, child);
        Ok(())
    }

    /// Remove a child, preserving the order of its remaining siblings.
    pub fn remove_child(&mut self, element: &PathElement) -> Option<Resource> {
        let map = self.children.get_mut(&element.key)?;
        let removed = map.shift_remove(&element.value)?;
        if map.is_empty() {
            self.children.shift_remove(&element.key);
        }
        tracing::trace!(%element, "Removed child");
        Some(removed)
    }

    // ---- address based navigation ----

    /// Resolve a descendant by address relative to this resource.
    pub fn navigate(&self, address: &PathAddress) -> Result<&Resource> {
        let mut current = self;
        for (depth, element) in address.iter().enumerate() {
            current = current
                .child(element)
                .ok_or_else(|| Error::not_found(prefix(address, depth + 1)))?;
        }
        Ok(current)
    }

    /// Resolve a descendant mutably by address relative to this resource.
    pub fn navigate_mut(&mut self, address: &PathAddress) -> Result<&mut Resource> {
        let mut current = self;
        for (depth, element) in address.iter().enumerate() {
            current = current
                .child_mut(element)
                .ok_or_else(|| Error::not_found(prefix(address, depth + 1)))?;
        }
        Ok(current)
    }

    /// Register `child` at `address`, optionally at a position among ordered
    /// siblings.
    ///
    /// # Errors
    ///
    /// - `InvalidAddress` if `address` is the root
    /// - `ResourceNotFound` if the parent of `address` does not resolve
    /// - any error from [`Resource::register_child`] or
    ///   [`Resource::register_child_at`], reported against the full address
    pub fn register_child_at_address(
        &mut self,
        address: &PathAddress,
        child: Resource,
        index: Option<isize>,
    ) -> Result<()> {
        let (parent_address, element) = address
            .split_last()
            .ok_or_else(|| Error::invalid_address("/", "the root cannot be registered as a child"))?;
        let parent = self.navigate_mut(&parent_address)?;
        let result = match index {
            Some(index) => parent.register_child_at(element.clone(), index, child),
            None => parent.register_child(element.clone(), child),
        };
        result.map_err(|e| relocate(e, address, &parent_address))
    }

    /// Remove and return the resource at `address`.
    pub fn remove_child_at_address(&mut self, address: &PathAddress) -> Result<Resource> {
        let (parent_address, element) = address
            .split_last()
            .ok_or_else(|| Error::not_found(PathAddress::root()))?;
        let parent = self.navigate_mut(&parent_address)?;
        parent
            .remove_child(element)
            .ok_or_else(|| Error::not_found(address))
    }

    /// Count of this resource and all of its descendants.
    pub fn size(&self) -> usize {
        1 + self
            .children
            .values()
            .flat_map(|map| map.values())
            .map(Resource::size)
            .sum::<usize>()
    }
}

fn check_storable(element: &PathElement) -> Result<()> {
    if element.is_wildcard() {
        return Err(Error::WildcardNotAllowed {
            address: element.clone().into(),
        });
    }
    if !element.is_addressable() {
        return Err(Error::invalid_address(
            element.to_string(),
            "child type and name must be non-empty and free of '/' and '='",
        ));
    }
    Ok(())
}

fn prefix(address: &PathAddress, len: usize) -> PathAddress {
    PathAddress::from_elements(address.iter().take(len).cloned())
}

/// Rewrite an error raised relative to a parent so it names the full address.
fn relocate(error: Error, address: &PathAddress, parent: &PathAddress) -> Error {
    match error {
        Error::DuplicateResourceAddress { .. } => Error::DuplicateResourceAddress {
            address: address.clone(),
        },
        Error::WildcardNotAllowed { .. } => Error::WildcardNotAllowed {
            address: address.clone(),
        },
        Error::NotOrderedChildType { child_type, .. } => Error::NotOrderedChildType {
            address: parent.clone(),
            child_type,
        },
        other => other,
    }
}

impl PartialEq for Resource {
    fn eq(&self, other: &Self) -> bool {
        if self.proxy != other.proxy
            || self.model != other.model
            || self.ordered_child_types != other.ordered_child_types
            || self.children.len() != other.children.len()
        {
            return false;
        }
        self.children.iter().all(|(child_type, mine)| {
            let Some(theirs) = other.children.get(child_type) else {
                return false;
            };
            if self.is_ordered_child_type(child_type) {
                mine.len() == theirs.len()
                    && mine
                        .iter()
                        .zip(theirs.iter())
                        .all(|((a_name, a), (b_name, b))| a_name == b_name && a == b)
            } else {
                // IndexMap equality ignores order.
                mine == theirs
            }
        })
    }
}

impl Eq for Resource {}
