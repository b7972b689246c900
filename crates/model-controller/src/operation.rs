//! Mutation operations against the model

use std::collections::BTreeSet;
use std::fmt;

use model_tree::PathAddress;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The kind of a [`ModelOperation`], used to look up its handler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OperationKind {
    Add,
    Remove,
    WriteAttribute,
    UndefineAttribute,
}

impl OperationKind {
    pub const ALL: [OperationKind; 4] = [
        OperationKind::Add,
        OperationKind::Remove,
        OperationKind::WriteAttribute,
        OperationKind::UndefineAttribute,
    ];
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Add => write!(f, "add"),
            Self::Remove => write!(f, "remove"),
            Self::WriteAttribute => write!(f, "write-attribute"),
            Self::UndefineAttribute => write!(f, "undefine-attribute"),
        }
    }
}

/// A single mutation of the model at an address
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "operation", rename_all = "kebab-case")]
pub enum ModelOperation {
    /// Create a resource, optionally at a position among ordered siblings
    Add {
        address: PathAddress,
        #[serde(default, skip_serializing_if = "Map::is_empty")]
        attributes: Map<String, Value>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        index: Option<usize>,
        /// Ordered child types the new resource carries in addition to its
        /// registration
        #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
        ordered_child_types: BTreeSet<String>,
        /// The new resource joins an ordered collection of its parent, which
        /// becomes ordered if it was not already
        #[serde(default, skip_serializing_if = "is_false")]
        ordered: bool,
    },
    /// Remove a resource and its subtree
    Remove { address: PathAddress },
    /// Set one attribute
    WriteAttribute {
        address: PathAddress,
        name: String,
        value: Value,
    },
    /// Clear one attribute
    UndefineAttribute { address: PathAddress, name: String },
}

impl ModelOperation {
    /// An `add` appending to its collection with the given attributes.
    pub fn add(address: PathAddress, attributes: Map<String, Value>) -> Self {
        Self::Add {
            address,
            attributes,
            index: None,
            ordered_child_types: BTreeSet::new(),
            ordered: false,
        }
    }

    /// An `add` inserting at `index` among ordered siblings.
    pub fn add_at(address: PathAddress, attributes: Map<String, Value>, index: usize) -> Self {
        Self::Add {
            address,
            attributes,
            index: Some(index),
            ordered_child_types: BTreeSet::new(),
            ordered: true,
        }
    }

    /// Mark an `add` as joining an ordered collection. Other operations are
    /// returned unchanged.
    pub fn in_ordered_collection(mut self) -> Self {
        if let Self::Add { ordered, .. } = &mut self {
            *ordered = true;
        }
        self
    }

    pub fn remove(address: PathAddress) -> Self {
        Self::Remove { address }
    }

    pub fn write_attribute(address: PathAddress, name: impl Into<String>, value: Value) -> Self {
        Self::WriteAttribute {
            address,
            name: name.into(),
            value,
        }
    }

    pub fn undefine_attribute(address: PathAddress, name: impl Into<String>) -> Self {
        Self::UndefineAttribute {
            address,
            name: name.into(),
        }
    }

    pub fn kind(&self) -> OperationKind {
        match self {
            Self::Add { .. } => OperationKind::Add,
            Self::Remove { .. } => OperationKind::Remove,
            Self::WriteAttribute { .. } => OperationKind::WriteAttribute,
            Self::UndefineAttribute { .. } => OperationKind::UndefineAttribute,
        }
    }

    pub fn address(&self) -> &PathAddress {
        match self {
            Self::Add { address, .. }
            | Self::Remove { address }
            | Self::WriteAttribute { address, .. }
            | Self::UndefineAttribute { address, .. } => address,
        }
    }

    /// The attribute an attribute operation targets.
    pub fn attribute_name(&self) -> Option<&str> {
        match self {
            Self::WriteAttribute { name, .. } | Self::UndefineAttribute { name, .. } => {
                Some(name)
            }
            _ => None,
        }
    }
}

fn is_false(value: &bool) -> bool {
    !value
}

impl fmt::Display for ModelOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Add {
                address,
                attributes,
                index,
                ..
            } => {
                write!(f, "{}:add(", address)?;
                let mut first = true;
                if let Some(index) = index {
                    write!(f, "add-index={}", index)?;
                    first = false;
                }
                for (name, value) in attributes {
                    if !first {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}={}", name, value)?;
                    first = false;
                }
                write!(f, ")")
            }
            Self::Remove { address } => write!(f, "{}:remove", address),
            Self::WriteAttribute {
                address,
                name,
                value,
            } => write!(f, "{}:write-attribute({}={})", address, name, value),
            Self::UndefineAttribute { address, name } => {
                write!(f, "{}:undefine-attribute({})", address, name)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn address(s: &str) -> PathAddress {
        s.parse().unwrap()
    }

    #[test]
    fn display_matches_cli_style() {
        let attributes = json!({"value": "x"}).as_object().cloned().unwrap();
        let op = ModelOperation::add_at(address("/system-property=a"), attributes, 0);
        assert_eq!(op.to_string(), "/system-property=a:add(add-index=0, value=\"x\")");
        assert_eq!(
            ModelOperation::remove(address("/profile=p")).to_string(),
            "/profile=p:remove"
        );
        assert_eq!(
            ModelOperation::write_attribute(address("/a=b"), "c", json!(1)).to_string(),
            "/a=b:write-attribute(c=1)"
        );
    }

    #[test]
    fn serializes_with_operation_tag() {
        let op = ModelOperation::undefine_attribute(address("/a=b"), "c");
        let value = serde_json::to_value(&op).unwrap();
        assert_eq!(
            value,
            json!({"operation": "undefine-attribute", "address": "/a=b", "name": "c"})
        );
        let back: ModelOperation = serde_json::from_value(value).unwrap();
        assert_eq!(back, op);
        assert_eq!(back.kind(), OperationKind::UndefineAttribute);
        assert_eq!(back.attribute_name(), Some("c"));
    }
}
