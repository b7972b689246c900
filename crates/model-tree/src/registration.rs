//! Resource registration metadata
//!
//! A [`ResourceRegistration`] is the schema side of the tree: for every
//! registered address pattern it records which child types are ordered and
//! whether instances live in another process. Registrations are built
//! explicitly and handed to whatever creates resources; there is no global
//! registry.
//!
//! # Example
//!
//! ```
//! use model_tree::{PathAddress, PathElement, ResourceRegistration};
//!
//! let mut root = ResourceRegistration::new();
//! root.register_sub_model(
//!     PathElement::wildcard("stack"),
//!     ResourceRegistration::new().with_ordered_child_type("protocol"),
//! )
//! .unwrap();
//!
//! let address: PathAddress = "/stack=tcp".parse().unwrap();
//! let resource = root.create_resource(&address);
//! assert!(resource.is_ordered_child_type("protocol"));
//! ```

use std::collections::{BTreeMap, BTreeSet};

use crate::error::{Error, Result};
use crate::path::{PathAddress, PathElement};
use crate::resource::Resource;

/// Registration metadata for one address pattern and its sub-models
#[derive(Debug, Clone, Default)]
pub struct ResourceRegistration {
    /// Child types whose order must be preserved
    ordered_child_types: BTreeSet<String>,
    /// Instances are proxies for a remote process
    remote: bool,
    /// Sub-model registrations keyed by concrete or wildcard element
    children: BTreeMap<PathElement, ResourceRegistration>,
}

impl ResourceRegistration {
    /// Create an empty registration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registration whose instances are remote proxies.
    pub fn remote() -> Self {
        Self {
            remote: true,
            ..Self::default()
        }
    }

    /// Mark a child type as ordered, returning `self` for chaining.
    pub fn with_ordered_child_type(mut self, child_type: impl Into<String>) -> Self {
        self.ordered_child_types.insert(child_type.into());
        self
    }

    /// Register a sub-model under this registration.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateResourceAddress` if `element` is already registered.
    pub fn register_sub_model(
        &mut self,
        element: PathElement,
        registration: ResourceRegistration,
    ) -> Result<&mut ResourceRegistration> {
        if self.children.contains_key(&element) {
            return Err(Error::DuplicateResourceAddress {
                address: element.into(),
            });
        }
        Ok(self.children.entry(element).or_insert(registration))
    }

    /// Find the registration for a concrete or pattern address.
    ///
    /// At each step a registration for the exact name wins over a wildcard
    /// registration for the type.
    pub fn sub_model(&self, address: &PathAddress) -> Option<&ResourceRegistration> {
        let mut current = self;
        for element in address {
            let node = current;
            current = node
                .children
                .get(element)
                .or_else(move || node.children.get(&PathElement::wildcard(&element.key)))?;
        }
        Some(current)
    }

    pub fn ordered_child_types(&self) -> &BTreeSet<String> {
        &self.ordered_child_types
    }

    pub fn is_remote(&self) -> bool {
        self.remote
    }

    /// Elements registered directly below this registration.
    pub fn child_elements(&self) -> impl Iterator<Item = &PathElement> {
        self.children.keys()
    }

    /// Create an empty resource for this registration.
    pub fn new_resource(&self) -> Resource {
        if self.remote {
            return Resource::proxy();
        }
        Resource::with_ordered_child_types(self.ordered_child_types.iter().cloned())
    }

    /// Create an empty resource for `address`, falling back to a plain
    /// resource when nothing is registered there.
    pub fn create_resource(&self, address: &PathAddress) -> Resource {
        self.sub_model(address)
            .map(ResourceRegistration::new_resource)
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registration() -> ResourceRegistration {
        let mut root = ResourceRegistration::new();
        let profile = root
            .register_sub_model(PathElement::wildcard("profile"), ResourceRegistration::new())
            .unwrap();
        profile
            .register_sub_model(
                PathElement::wildcard("subsystem"),
                ResourceRegistration::new().with_ordered_child_type("handler"),
            )
            .unwrap();
        profile
            .register_sub_model(
                PathElement::new("subsystem", "special"),
                ResourceRegistration::new().with_ordered_child_type("filter"),
            )
            .unwrap();
        root.register_sub_model(PathElement::wildcard("host"), ResourceRegistration::remote())
            .unwrap();
        root
    }

    #[test]
    fn wildcard_registration_applies_to_any_name() {
        let root = registration();
        let address: PathAddress = "/profile=default/subsystem=logging".parse().unwrap();
        let resource = root.create_resource(&address);
        assert!(resource.is_ordered_child_type("handler"));
        assert!(!resource.is_ordered_child_type("filter"));
    }

    #[test]
    fn specific_registration_wins_over_wildcard() {
        let root = registration();
        let address: PathAddress = "/profile=default/subsystem=special".parse().unwrap();
        let resource = root.create_resource(&address);
        assert!(resource.is_ordered_child_type("filter"));
        assert!(!resource.is_ordered_child_type("handler"));
    }

    #[test]
    fn remote_registration_creates_proxy() {
        let root = registration();
        let address: PathAddress = "/host=primary".parse().unwrap();
        assert!(root.create_resource(&address).is_proxy());
    }

    #[test]
    fn unregistered_address_gives_plain_resource() {
        let root = registration();
        let address: PathAddress = "/interface=public".parse().unwrap();
        let resource = root.create_resource(&address);
        assert!(resource.ordered_child_types().is_empty());
        assert!(!resource.is_proxy());
    }

    #[test]
    fn duplicate_sub_model_is_rejected() {
        let mut root = registration();
        let err = root
            .register_sub_model(PathElement::wildcard("profile"), ResourceRegistration::new())
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateResourceAddress { .. }));
    }
}
