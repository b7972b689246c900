//! Reconciling a secondary's domain model with the primary's
//!
//! The primary describes its model with [`model_tree::ModelReader`]; the
//! description travels as JSON. The secondary plans the operations that turn
//! its own model into the incoming one and applies them through a
//! [`model_controller::ModelController`] in a single pass:
//!
//! ```
//! use model_sync::{Reconciler, SyncOptions};
//! use model_tree::{DescribedResource, PathElement, Resource};
//!
//! let mut primary = Resource::new();
//! primary
//!     .register_child(PathElement::new("profile", "full"), Resource::new())
//!     .unwrap();
//! let incoming = DescribedResource::of(&primary);
//!
//! let reconciler = Reconciler::new(SyncOptions::default());
//! let controller = reconciler.controller(Resource::new()).unwrap();
//! let report = reconciler.apply(&controller, &incoming).unwrap();
//! assert_eq!(report.operations.len(), 1);
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod plan;
pub mod reconcile;
pub mod report;
pub mod store;

pub use config::{DEFAULT_HOST, SyncOptions};
pub use error::{Error, Result};
pub use plan::{Planner, SyncPlan};
pub use reconcile::Reconciler;
pub use report::SyncReport;
pub use store::ModelStore;
