//! Resources a secondary declines to hold
//!
//! A secondary can ignore top-level resources, either every instance of a
//! type or a list of names. Ignored resources are not sent to it and its
//! reconciler leaves them alone.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::path::{PathAddress, PathElement};

/// Ignore rule for one top-level resource type
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct IgnoredType {
    /// Ignore every instance of the type
    #[serde(default)]
    pub wildcard: bool,
    /// Ignore these names
    #[serde(default)]
    pub names: BTreeSet<String>,
}

/// Ignore rules keyed by top-level resource type
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IgnoredResources {
    types: BTreeMap<String, IgnoredType>,
}

impl IgnoredResources {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ignore every resource of `resource_type`.
    pub fn ignore_type(&mut self, resource_type: impl Into<String>) -> &mut Self {
        self.types.entry(resource_type.into()).or_default().wildcard = true;
        self
    }

    /// Ignore a single named resource.
    pub fn ignore_name(
        &mut self,
        resource_type: impl Into<String>,
        name: impl Into<String>,
    ) -> &mut Self {
        self.types
            .entry(resource_type.into())
            .or_default()
            .names
            .insert(name.into());
        self
    }

    /// Whether a top-level element is ignored.
    pub fn is_ignored(&self, element: &PathElement) -> bool {
        self.types
            .get(&element.key)
            .is_some_and(|rule| rule.wildcard || rule.names.contains(&element.value))
    }

    /// Whether an address falls under an ignored top-level element.
    pub fn is_address_ignored(&self, address: &PathAddress) -> bool {
        address.first().is_some_and(|element| self.is_ignored(element))
    }

    pub fn is_empty(&self) -> bool {
        self.types
            .values()
            .all(|rule| !rule.wildcard && rule.names.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wildcard_and_named_rules() {
        let mut ignored = IgnoredResources::new();
        ignored.ignore_type("extension").ignore_name("profile", "legacy");

        assert!(ignored.is_ignored(&PathElement::new("extension", "anything")));
        assert!(ignored.is_ignored(&PathElement::new("profile", "legacy")));
        assert!(!ignored.is_ignored(&PathElement::new("profile", "default")));
        assert!(!ignored.is_ignored(&PathElement::new("server-group", "legacy")));
    }

    #[test]
    fn only_top_level_element_is_checked() {
        let mut ignored = IgnoredResources::new();
        ignored.ignore_name("profile", "legacy");
        let nested: PathAddress = "/profile=legacy/subsystem=logging".parse().unwrap();
        let other: PathAddress = "/profile=default/profile=legacy".parse().unwrap();
        assert!(ignored.is_address_ignored(&nested));
        assert!(!ignored.is_address_ignored(&other));
        assert!(!ignored.is_address_ignored(&PathAddress::root()));
    }

    #[test]
    fn deserializes_from_toml_style_table() {
        let ignored: IgnoredResources = serde_json::from_value(serde_json::json!({
            "profile": {"names": ["legacy"]},
            "extension": {"wildcard": true}
        }))
        .unwrap();
        assert!(ignored.is_ignored(&PathElement::new("profile", "legacy")));
        assert!(ignored.is_ignored(&PathElement::new("extension", "x")));
        assert!(!ignored.is_empty());
    }
}
