//! Reads a live resource tree into its transportable description
//!
//! The reader walks a subtree depth first and records every child type with
//! its ordering tag. Proxies are boundaries: the reader emits a marker node
//! (or nothing, with [`ReadOptions::omit_proxies`]) and never looks inside.

use std::collections::BTreeSet;

use crate::describe::{DescribedChildren, DescribedResource};
use crate::error::{Error, Result};
use crate::ignored::IgnoredResources;
use crate::path::{PathAddress, PathElement};
use crate::resource::Resource;

/// Child type holding per-host configuration in a domain model
pub const HOST: &str = "host";

/// Filters applied while reading a tree
#[derive(Debug, Clone, Default)]
pub struct ReadOptions {
    /// Top-level resources the receiving side ignores
    pub ignored: IgnoredResources,
    /// Top-level child types left out entirely
    pub excluded_types: BTreeSet<String>,
    /// Leave proxy children out instead of emitting boundary markers
    pub omit_proxies: bool,
}

impl ReadOptions {
    /// Options for describing the domain model to a secondary: host
    /// resources are excluded along with whatever the secondary ignores.
    pub fn for_secondary(ignored: IgnoredResources) -> Self {
        Self {
            ignored,
            excluded_types: BTreeSet::from([HOST.to_string()]),
            omit_proxies: true,
        }
    }
}

/// Produces [`DescribedResource`]s from live trees
#[derive(Debug, Clone, Default)]
pub struct ModelReader {
    options: ReadOptions,
}

impl ModelReader {
    /// A reader that describes everything.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: ReadOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ReadOptions {
        &self.options
    }

    /// Describe `resource` and its subtree. Top-level filters apply to the
    /// direct children of `resource`.
    pub fn describe(&self, resource: &Resource) -> DescribedResource {
        let described = self.describe_node(resource, 0);
        tracing::debug!(resources = resource.size(), "Described resource tree");
        described
    }

    /// Describe the subtree at `address` below `root`.
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` if the address does not resolve or falls
    /// under an ignored or excluded resource.
    pub fn describe_at(&self, root: &Resource, address: &PathAddress) -> Result<DescribedResource> {
        if address.is_empty() {
            return Ok(self.describe(root));
        }
        if let Some(first) = address.first()
            && self.is_filtered(first)
        {
            return Err(Error::not_found(address));
        }
        let resource = root.navigate(address)?;
        Ok(self.describe_node(resource, address.len()))
    }

    /// Describe the domain model for a secondary at initial connect.
    pub fn describe_for_secondary(root: &Resource, ignored: IgnoredResources) -> DescribedResource {
        Self::with_options(ReadOptions::for_secondary(ignored)).describe(root)
    }

    fn is_filtered(&self, element: &PathElement) -> bool {
        self.options.excluded_types.contains(&element.key) || self.options.ignored.is_ignored(element)
    }

    fn describe_node(&self, resource: &Resource, depth: usize) -> DescribedResource {
        if resource.is_proxy() {
            return DescribedResource::proxy();
        }

        let mut described = DescribedResource {
            attributes: resource.model().clone(),
            ..DescribedResource::default()
        };

        // Ordered types are described even when empty so the tag survives.
        let child_types = resource
            .child_types()
            .map(str::to_string)
            .chain(
                resource
                    .ordered_child_types()
                    .iter()
                    .filter(|t| !resource.has_children(t))
                    .cloned(),
            )
            .collect::<Vec<_>>();

        for child_type in child_types {
            let mut collection = if resource.is_ordered_child_type(&child_type) {
                DescribedChildren::ordered()
            } else {
                DescribedChildren::unordered()
            };
            for (name, child) in resource.children(&child_type) {
                if depth == 0 && self.is_filtered(&PathElement::new(&child_type, name)) {
                    continue;
                }
                if child.is_proxy() && self.options.omit_proxies {
                    continue;
                }
                collection.push(name, self.describe_node(child, depth + 1));
            }
            if collection.is_empty() && !collection.is_ordered() {
                continue;
            }
            described.children.insert(child_type, collection);
        }
        described
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn el(key: &str, value: &str) -> PathElement {
        PathElement::new(key, value)
    }

    fn domain() -> Resource {
        let mut root = Resource::new();
        let mut profile = Resource::with_ordered_child_types(["handler"]);
        profile.write_attribute("name", json!("default"));
        profile.register_child(el("handler", "b"), Resource::new()).unwrap();
        profile.register_child(el("handler", "a"), Resource::new()).unwrap();
        root.register_child(el("profile", "default"), profile).unwrap();
        root.register_child(el("profile", "legacy"), Resource::new()).unwrap();
        root.register_child(el("host", "primary"), Resource::new()).unwrap();
        root.register_child(el("host", "remote"), Resource::proxy()).unwrap();
        root
    }

    #[test]
    fn describes_order_and_attributes() {
        let described = ModelReader::new().describe(&domain());
        let profile = described.child(&el("profile", "default")).unwrap();
        assert_eq!(profile.attributes["name"], json!("default"));
        assert_eq!(profile.children["handler"].names(), vec!["b", "a"]);
        assert!(profile.children["handler"].is_ordered());
    }

    #[test]
    fn proxies_are_boundaries() {
        let described = ModelReader::new().describe(&domain());
        let remote = described.child(&el("host", "remote")).unwrap();
        assert!(remote.proxy);
        assert!(remote.is_empty());
    }

    #[test]
    fn empty_ordered_types_keep_their_tag() {
        let resource = Resource::with_ordered_child_types(["chain"]);
        let described = ModelReader::new().describe(&resource);
        assert!(described.children["chain"].is_ordered());
        assert!(described.to_resource().unwrap().is_ordered_child_type("chain"));
    }

    #[test]
    fn secondary_description_drops_hosts_and_ignored() {
        let mut ignored = IgnoredResources::new();
        ignored.ignore_name("profile", "legacy");
        let described = ModelReader::describe_for_secondary(&domain(), ignored);
        assert!(!described.children.contains_key("host"));
        assert_eq!(described.children["profile"].names(), vec!["default"]);
    }

    #[test]
    fn describe_at_rejects_filtered_address() {
        let mut ignored = IgnoredResources::new();
        ignored.ignore_name("profile", "legacy");
        let reader = ModelReader::with_options(ReadOptions::for_secondary(ignored));
        let root = domain();
        assert!(reader.describe_at(&root, &"/profile=legacy".parse().unwrap()).is_err());
        assert!(reader.describe_at(&root, &"/profile=default".parse().unwrap()).is_ok());
    }
}
