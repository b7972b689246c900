//! [`TreeBuilder`] for building resource trees in tests.

use model_tree::{PathElement, Resource};
use serde_json::Value;

/// Fluent builder for [`Resource`] trees.
///
/// Panics on invalid input; it is only meant for test setup.
///
/// # Example
///
/// ```rust
/// use model_test_utils::TreeBuilder;
/// use serde_json::json;
///
/// let stack = TreeBuilder::ordered(&["protocol"])
///     .leaf("protocol", "TCP")
///     .leaf("protocol", "MPING")
///     .attr("name", json!("tcp"))
///     .build();
/// assert_eq!(stack.child_names("protocol"), ["TCP", "MPING"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct TreeBuilder {
    resource: Resource,
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a resource whose `types` keep their children in order.
    pub fn ordered(types: &[&str]) -> Self {
        Self {
            resource: Resource::with_ordered_child_types(types.iter().copied()),
        }
    }

    pub fn attr(mut self, name: &str, value: Value) -> Self {
        self.resource.write_attribute(name, value);
        self
    }

    pub fn child(mut self, key: &str, name: &str, child: TreeBuilder) -> Self {
        self.resource
            .register_child(PathElement::new(key, name), child.build())
            .unwrap_or_else(|e| panic!("TreeBuilder::child {key}={name}: {e}"));
        self
    }

    /// Add an empty child.
    pub fn leaf(self, key: &str, name: &str) -> Self {
        self.child(key, name, TreeBuilder::new())
    }

    /// Add a proxy child standing in for a remote resource.
    pub fn proxy(mut self, key: &str, name: &str) -> Self {
        self.resource
            .register_child(PathElement::new(key, name), Resource::proxy())
            .unwrap_or_else(|e| panic!("TreeBuilder::proxy {key}={name}: {e}"));
        self
    }

    pub fn build(self) -> Resource {
        self.resource
    }
}

/// Owned child names of `child_type`, in iteration order.
pub fn names(resource: &Resource, child_type: &str) -> Vec<String> {
    resource
        .child_names(child_type)
        .into_iter()
        .map(String::from)
        .collect()
}
