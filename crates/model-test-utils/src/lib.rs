//! Shared test fixtures for the domain model workspace.
//!
//! Dev-dependency only, never published.
//!
//! # Modules
//!
//! - [`tree`]: [`TreeBuilder`] for concise resource trees
//! - [`domain`]: a small but complete domain model
//! - [`files`]: [`TestDir`] for tests that read and write model files

pub mod domain;
pub mod files;
pub mod tree;

pub use domain::{LOCAL_HOST, sample_domain};
pub use files::TestDir;
pub use tree::{TreeBuilder, names};
