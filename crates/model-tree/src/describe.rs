//! Transportable description of a resource tree
//!
//! A [`DescribedResource`] mirrors the shape of a [`Resource`] as plain data
//! that serializes to JSON. Every child type is tagged either `unordered`
//! (a map of name to subtree) or `ordered` (a list of named subtrees), so the
//! receiving side can rebuild the same sequence order.
//!
//! ```json
//! {
//!   "attributes": {"name": "primary"},
//!   "children": {
//!     "profile": {
//!       "kind": "unordered",
//!       "entries": {"default": {"attributes": {}}}
//!     },
//!     "chain": {
//!       "kind": "ordered",
//!       "entries": [
//!         {"name": "first", "resource": {}},
//!         {"name": "second", "resource": {}}
//!       ]
//!     }
//!   }
//! }
//! ```

use std::collections::{BTreeMap, BTreeSet};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

use crate::error::{Error, Result};
use crate::path::{PathAddress, PathElement};
use crate::reader::ModelReader;
use crate::resource::Resource;

fn is_false(value: &bool) -> bool {
    !*value
}

/// A described resource node
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DescribedResource {
    /// Attribute document
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub attributes: Map<String, Value>,
    /// Boundary of a remote subtree; carries no content
    #[serde(default, skip_serializing_if = "is_false")]
    pub proxy: bool,
    /// Child collections keyed by child type
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub children: IndexMap<String, DescribedChildren>,
}

/// A child in an ordered collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedResource {
    pub name: String,
    #[serde(default)]
    pub resource: DescribedResource,
}

/// The children of one type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum DescribedChildren {
    /// Set of children keyed by name
    Unordered {
        #[serde(default)]
        entries: BTreeMap<String, DescribedResource>,
    },
    /// Sequence of children whose positions are significant
    Ordered {
        #[serde(default)]
        entries: Vec<NamedResource>,
    },
}

impl DescribedChildren {
    pub fn unordered() -> Self {
        Self::Unordered {
            entries: BTreeMap::new(),
        }
    }

    pub fn ordered() -> Self {
        Self::Ordered {
            entries: Vec::new(),
        }
    }

    pub fn is_ordered(&self) -> bool {
        matches!(self, Self::Ordered { .. })
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Unordered { entries } => entries.len(),
            Self::Ordered { entries } => entries.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Child names, in sequence order for ordered collections.
    pub fn names(&self) -> Vec<&str> {
        self.iter().map(|(name, _)| name).collect()
    }

    /// Iterate `(name, subtree)` pairs.
    pub fn iter(&self) -> Box<dyn Iterator<Item = (&str, &DescribedResource)> + '_> {
        match self {
            Self::Unordered { entries } => {
                Box::new(entries.iter().map(|(name, r)| (name.as_str(), r)))
            }
            Self::Ordered { entries } => {
                Box::new(entries.iter().map(|e| (e.name.as_str(), &e.resource)))
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&DescribedResource> {
        match self {
            Self::Unordered { entries } => entries.get(name),
            Self::Ordered { entries } => entries
                .iter()
                .find(|e| e.name == name)
                .map(|e| &e.resource),
        }
    }

    /// Append or insert a child. Ordered collections append.
    pub fn push(&mut self, name: impl Into<String>, resource: DescribedResource) {
        match self {
            Self::Unordered { entries } => {
                entries.insert(name.into(), resource);
            }
            Self::Ordered { entries } => entries.push(NamedResource {
                name: name.into(),
                resource,
            }),
        }
    }
}

impl DescribedResource {
    pub fn new() -> Self {
        Self::default()
    }

    /// A boundary node for a remote subtree.
    pub fn proxy() -> Self {
        Self {
            proxy: true,
            ..Self::default()
        }
    }

    /// Describe a resource and its whole subtree.
    pub fn of(resource: &Resource) -> Self {
        ModelReader::new().describe(resource)
    }

    pub fn child(&self, element: &PathElement) -> Option<&DescribedResource> {
        self.children.get(&element.key)?.get(&element.value)
    }

    /// Resolve a descendant by address.
    pub fn navigate(&self, address: &PathAddress) -> Option<&DescribedResource> {
        let mut current = self;
        for element in address {
            current = current.child(element)?;
        }
        Some(current)
    }

    /// Child types tagged as ordered.
    pub fn ordered_child_types(&self) -> BTreeSet<String> {
        self.children
            .iter()
            .filter(|(_, children)| children.is_ordered())
            .map(|(child_type, _)| child_type.clone())
            .collect()
    }

    /// Whether the node has neither attributes nor children.
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty() && self.children.values().all(DescribedChildren::is_empty)
    }

    /// Rebuild a [`Resource`] tree from this description.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateResourceAddress` when an ordered collection names the
    /// same child twice, or `WildcardNotAllowed` for a `*` child name.
    pub fn to_resource(&self) -> Result<Resource> {
        self.build(&PathAddress::root())
    }

    fn build(&self, address: &PathAddress) -> Result<Resource> {
        if self.proxy {
            return Ok(Resource::proxy());
        }
        let mut resource = Resource::with_ordered_child_types(self.ordered_child_types())
            .with_model(self.attributes.clone());
        for (child_type, children) in &self.children {
            for (name, child) in children.iter() {
                let element = PathElement::new(child_type, name);
                let child_address = address.append(element.clone());
                let built = child.build(&child_address)?;
                resource
                    .register_child(element, built)
                    .map_err(|e| match e {
                        Error::DuplicateResourceAddress { .. } => {
                            Error::DuplicateResourceAddress {
                                address: child_address.clone(),
                            }
                        }
                        Error::WildcardNotAllowed { .. } => Error::WildcardNotAllowed {
                            address: child_address.clone(),
                        },
                        other => other,
                    })?;
            }
        }
        Ok(resource)
    }

    /// Serialize to pretty JSON.
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse from JSON.
    pub fn from_json_str(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Hex SHA-256 of the canonical JSON form.
    ///
    /// Object keys are sorted; list order (including ordered children) is
    /// kept, so two descriptions share a digest exactly when they are equal.
    pub fn digest(&self) -> Result<String> {
        let value = canonicalize(serde_json::to_value(self)?);
        let bytes = serde_json::to_vec(&value)?;
        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        Ok(format!("{:x}", hasher.finalize()))
    }
}

impl TryFrom<&DescribedResource> for Resource {
    type Error = Error;

    fn try_from(description: &DescribedResource) -> Result<Self> {
        description.to_resource()
    }
}

impl From<&Resource> for DescribedResource {
    fn from(resource: &Resource) -> Self {
        Self::of(resource)
    }
}

fn canonicalize(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            Value::Object(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, canonicalize(v)))
                    .collect(),
            )
        }
        Value::Array(items) => Value::Array(items.into_iter().map(canonicalize).collect()),
        other => other,
    }
}
