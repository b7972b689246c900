//! Resource addressing
//!
//! A [`PathAddress`] identifies a node in the resource tree by the sequence of
//! `(type, name)` pairs leading to it from the root. Each pair is a
//! [`PathElement`].
//!
//! # Text form
//!
//! - Root: `/`
//! - Nested: `/profile=default/subsystem=logging`
//! - Wildcard (query and registration addresses only): `/server-group=*`
//!
//! # Examples
//!
//! ```
//! use model_tree::{PathAddress, PathElement};
//!
//! let address: PathAddress = "/profile=default/subsystem=logging".parse().unwrap();
//! assert_eq!(address.len(), 2);
//! assert_eq!(address.last(), Some(&PathElement::new("subsystem", "logging")));
//! assert_eq!(address.to_string(), "/profile=default/subsystem=logging");
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Value marking an element that matches any instance of its type
pub const WILDCARD_VALUE: &str = "*";

/// A single `(type, name)` step of an address
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PathElement {
    /// The child type, e.g. `profile`
    pub key: String,
    /// The child name, e.g. `default`, or `*` for a wildcard
    pub value: String,
}

impl PathElement {
    /// Create an element for a concrete or wildcard child.
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Create an element matching every child of the given type.
    pub fn wildcard(key: impl Into<String>) -> Self {
        Self::new(key, WILDCARD_VALUE)
    }

    /// Whether this element matches any child name.
    pub fn is_wildcard(&self) -> bool {
        self.value == WILDCARD_VALUE
    }

    /// Whether this element (possibly a wildcard) matches a concrete element.
    pub fn matches(&self, other: &PathElement) -> bool {
        self.key == other.key && (self.is_wildcard() || self.value == other.value)
    }

    /// Whether the element prints as text that parses back to itself.
    ///
    /// Neither part may be empty or contain `/` or `=`.
    pub fn is_addressable(&self) -> bool {
        let plain = |part: &str| !part.is_empty() && !part.contains(['/', '=']);
        plain(&self.key) && plain(&self.value)
    }

    fn parse_segment(input: &str, segment: &str) -> Result<Self> {
        let (key, value) = segment
            .split_once('=')
            .ok_or_else(|| Error::invalid_address(input, format!("'{}' has no '='", segment)))?;
        if key.is_empty() {
            return Err(Error::invalid_address(input, "element type is empty"));
        }
        if value.is_empty() {
            return Err(Error::invalid_address(
                input,
                format!("element '{}' has no name", key),
            ));
        }
        if value.contains('=') {
            return Err(Error::invalid_address(
                input,
                format!("'{}' contains more than one '='", segment),
            ));
        }
        Ok(Self::new(key, value))
    }
}

impl fmt::Display for PathElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.key, self.value)
    }
}

/// An ordered sequence of [`PathElement`]s from the root
///
/// Equality, ordering and hashing are structural.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PathAddress {
    elements: Vec<PathElement>,
}

impl PathAddress {
    /// The empty address, identifying the root resource.
    pub fn root() -> Self {
        Self::default()
    }

    /// Build an address from elements.
    pub fn from_elements(elements: impl IntoIterator<Item = PathElement>) -> Self {
        Self {
            elements: elements.into_iter().collect(),
        }
    }

    /// Build an address from `(type, name)` pairs.
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self::from_elements(pairs.into_iter().map(|(k, v)| PathElement::new(k, v)))
    }

    /// The elements of this address, outermost first.
    pub fn elements(&self) -> &[PathElement] {
        &self.elements
    }

    /// Iterate over the elements, outermost first.
    pub fn iter(&self) -> std::slice::Iter<'_, PathElement> {
        self.elements.iter()
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// The last element, or `None` for the root.
    pub fn last(&self) -> Option<&PathElement> {
        self.elements.last()
    }

    /// The first element, or `None` for the root.
    pub fn first(&self) -> Option<&PathElement> {
        self.elements.first()
    }

    /// Return a new address with `element` appended.
    pub fn append(&self, element: PathElement) -> Self {
        let mut elements = self.elements.clone();
        elements.push(element);
        Self { elements }
    }

    /// Return a new address with all of `other`'s elements appended.
    pub fn join(&self, other: &PathAddress) -> Self {
        let mut elements = self.elements.clone();
        elements.extend(other.elements.iter().cloned());
        Self { elements }
    }

    /// The parent address, or `None` for the root.
    pub fn parent(&self) -> Option<Self> {
        let (_, parent) = self.elements.split_last()?;
        Some(Self {
            elements: parent.to_vec(),
        })
    }

    /// Split into the parent address and the last element.
    pub fn split_last(&self) -> Option<(Self, &PathElement)> {
        let (last, parent) = self.elements.split_last()?;
        Some((
            Self {
                elements: parent.to_vec(),
            },
            last,
        ))
    }

    /// Whether any element is a wildcard.
    pub fn is_multi_target(&self) -> bool {
        self.elements.iter().any(PathElement::is_wildcard)
    }

    /// Whether this address begins with every element of `prefix`.
    pub fn starts_with(&self, prefix: &PathAddress) -> bool {
        self.elements.starts_with(&prefix.elements)
    }

    /// Whether this (possibly wildcard) address matches a concrete address
    /// of the same length.
    pub fn matches(&self, concrete: &PathAddress) -> bool {
        self.len() == concrete.len()
            && self
                .elements
                .iter()
                .zip(concrete.elements.iter())
                .all(|(pattern, element)| pattern.matches(element))
    }
}

impl fmt::Display for PathAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.elements.is_empty() {
            return write!(f, "/");
        }
        for element in &self.elements {
            write!(f, "/{}", element)?;
        }
        Ok(())
    }
}

impl FromStr for PathAddress {
    type Err = Error;

    fn from_str(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        if trimmed.is_empty() || trimmed == "/" {
            return Ok(Self::root());
        }
        let body = trimmed.strip_prefix('/').unwrap_or(trimmed);
        let elements = body
            .split('/')
            .map(|segment| {
                if segment.is_empty() {
                    Err(Error::invalid_address(input, "empty element"))
                } else {
                    PathElement::parse_segment(input, segment)
                }
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { elements })
    }
}

impl TryFrom<String> for PathAddress {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<PathAddress> for String {
    fn from(address: PathAddress) -> Self {
        address.to_string()
    }
}

impl From<PathElement> for PathAddress {
    fn from(element: PathElement) -> Self {
        Self {
            elements: vec![element],
        }
    }
}

impl From<Vec<PathElement>> for PathAddress {
    fn from(elements: Vec<PathElement>) -> Self {
        Self { elements }
    }
}

impl From<&PathAddress> for PathAddress {
    fn from(address: &PathAddress) -> Self {
        address.clone()
    }
}

impl<'a> IntoIterator for &'a PathAddress {
    type Item = &'a PathElement;
    type IntoIter = std::slice::Iter<'a, PathElement>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.iter()
    }
}
