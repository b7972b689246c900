//! Domain model resource tree
//!
//! This crate provides the data layer the rest of the workspace builds on:
//!
//! - **Addressing**: [`PathElement`] and [`PathAddress`] identify nodes by
//!   `(type, name)` pairs from the root
//! - **Resources**: [`Resource`] nodes with attribute documents and typed
//!   children, some child types preserving insertion order
//! - **Registration**: [`ResourceRegistration`] records which child types are
//!   ordered for each address pattern
//! - **Description**: [`DescribedResource`] is the transportable, JSON
//!   serializable mirror of a tree, produced by [`ModelReader`]
//!
//! # Example
//!
//! ```
//! use model_tree::{DescribedResource, PathElement, Resource};
//!
//! let mut root = Resource::with_ordered_child_types(["chain"]);
//! root.register_child(PathElement::new("chain", "apple"), Resource::new()).unwrap();
//! root.register_child_at(PathElement::new("chain", "pear"), 0, Resource::new()).unwrap();
//!
//! let described = DescribedResource::of(&root);
//! let rebuilt = described.to_resource().unwrap();
//! assert_eq!(rebuilt.child_names("chain"), vec!["pear", "apple"]);
//! assert_eq!(rebuilt, root);
//! ```

pub mod describe;
pub mod error;
pub mod ignored;
pub mod path;
pub mod reader;
pub mod registration;
pub mod resource;

pub use describe::{DescribedChildren, DescribedResource, NamedResource};
pub use error::{Error, Result};
pub use ignored::{IgnoredResources, IgnoredType};
pub use path::{PathAddress, PathElement, WILDCARD_VALUE};
pub use reader::{HOST, ModelReader, ReadOptions};
pub use registration::ResourceRegistration;
pub use resource::{ChildMap, Resource};
