//! Diffing two described trees into the operations that turn one into the
//! other
//!
//! The planner walks `original` and `incoming` together. Attributes are
//! compared value by value. Unordered collections are compared by name.
//! Ordered collections must also end up in the incoming sequence order:
//!
//! - With indexed adds, the longest run of surviving children that is
//!   already in incoming relative order stays in place. Every other surviving
//!   child is removed and added again at its incoming index, and new
//!   children are added at theirs. Adds are emitted in incoming order, so
//!   each index is valid when its add runs.
//! - Without indexed adds, new children can only be appended. If the
//!   surviving children are a prefix of the incoming sequence that is
//!   enough; otherwise the whole collection is removed and added again in
//!   incoming order.
//!
//! Every add into an ordered collection is flagged so the live parent marks
//! the collection ordered. A live collection that holds children but is not
//! ordered yet is rebuilt, since re-adding is the only way to tag it.
//!
//! Proxies on either side are skipped, as are local types and ignored
//! resources at the top level. Skipped children still count towards the
//! index of an indexed add.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use model_controller::ModelOperation;
use model_tree::{DescribedChildren, DescribedResource, PathAddress, PathElement};
use tracing::debug;

use crate::config::SyncOptions;

/// Operations that reconcile one tree with another, in execution order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncPlan {
    operations: Vec<ModelOperation>,
}

impl SyncPlan {
    pub fn operations(&self) -> &[ModelOperation] {
        &self.operations
    }

    pub fn into_operations(self) -> Vec<ModelOperation> {
        self.operations
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ModelOperation> {
        self.operations.iter()
    }
}

impl<'a> IntoIterator for &'a SyncPlan {
    type Item = &'a ModelOperation;
    type IntoIter = std::slice::Iter<'a, ModelOperation>;

    fn into_iter(self) -> Self::IntoIter {
        self.operations.iter()
    }
}

/// One operation per line
impl fmt::Display for SyncPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, operation) in self.operations.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", operation)?;
        }
        Ok(())
    }
}

/// Computes [`SyncPlan`]s
#[derive(Debug, Clone)]
pub struct Planner<'a> {
    options: &'a SyncOptions,
    local_indexed_add: bool,
}

impl<'a> Planner<'a> {
    pub fn new(options: &'a SyncOptions) -> Self {
        Self {
            options,
            local_indexed_add: options.local_indexed_add,
        }
    }

    /// Override whether indexed adds are available.
    pub fn with_local_indexed_add(mut self, supported: bool) -> Self {
        self.local_indexed_add = supported;
        self
    }

    /// Plan the operations turning `original` into `incoming`.
    ///
    /// Planning a tree against itself yields an empty plan.
    pub fn plan(&self, original: &DescribedResource, incoming: &DescribedResource) -> SyncPlan {
        let mut operations = Vec::new();
        self.diff_node(&PathAddress::root(), original, incoming, &mut operations);
        debug!(
            operations = operations.len(),
            local_indexed_add = self.local_indexed_add,
            "Planned reconciliation"
        );
        SyncPlan { operations }
    }

    fn diff_node(
        &self,
        address: &PathAddress,
        original: &DescribedResource,
        incoming: &DescribedResource,
        operations: &mut Vec<ModelOperation>,
    ) {
        for (name, value) in &incoming.attributes {
            if original.attributes.get(name) != Some(value) {
                operations.push(ModelOperation::write_attribute(
                    address.clone(),
                    name.clone(),
                    value.clone(),
                ));
            }
        }
        for name in original.attributes.keys() {
            if !incoming.attributes.contains_key(name) {
                operations.push(ModelOperation::undefine_attribute(address.clone(), name.clone()));
            }
        }

        let types = incoming.children.keys().chain(
            original
                .children
                .keys()
                .filter(|t| !incoming.children.contains_key(*t)),
        );
        for child_type in types {
            if address.is_empty() && self.options.local_types.contains(child_type) {
                continue;
            }
            let before = original.children.get(child_type);
            let after = incoming.children.get(child_type);
            let ordered = after.or(before).is_some_and(DescribedChildren::is_ordered);

            let collection = self.collection(address, child_type, before, after);
            if ordered {
                self.diff_ordered(address, &collection, operations);
            } else {
                self.diff_unordered(address, &collection, operations);
            }
        }
    }

    /// Both sides of one child type with proxies and, at the top level,
    /// ignored resources taken out.
    fn collection<'d>(
        &self,
        address: &PathAddress,
        child_type: &'d str,
        before: Option<&'d DescribedChildren>,
        after: Option<&'d DescribedChildren>,
    ) -> Collection<'d> {
        let entries = |children: Option<&'d DescribedChildren>| -> Entries<'d> {
            children
                .map(|c| c.iter().collect())
                .unwrap_or_default()
        };
        let all_before = entries(before);
        let all_after = entries(after);

        let skipped: BTreeSet<&str> = all_before
            .iter()
            .chain(all_after.iter())
            .filter(|(name, resource)| {
                resource.proxy
                    || (address.is_empty()
                        && self
                            .options
                            .ignored
                            .is_ignored(&PathElement::new(child_type, *name)))
            })
            .map(|(name, _)| *name)
            .collect();
        let keep = |entries: &Entries<'d>| -> Entries<'d> {
            entries
                .iter()
                .filter(|(name, _)| !skipped.contains(name))
                .copied()
                .collect()
        };

        Collection {
            child_type,
            before: keep(&all_before),
            after: keep(&all_after),
            incoming_index: all_after
                .iter()
                .enumerate()
                .map(|(i, (name, _))| (*name, i))
                .collect(),
            live_ordered: before.is_some_and(DescribedChildren::is_ordered),
        }
    }

    fn diff_unordered(
        &self,
        address: &PathAddress,
        collection: &Collection<'_>,
        operations: &mut Vec<ModelOperation>,
    ) {
        let Collection {
            child_type,
            before,
            after,
            ..
        } = collection;
        let existing: BTreeMap<&str, &DescribedResource> = before.iter().copied().collect();
        let wanted: BTreeSet<&str> = after.iter().map(|(name, _)| *name).collect();

        for (name, _) in before {
            if !wanted.contains(name) {
                operations.push(ModelOperation::remove(child_address(address, child_type, name)));
            }
        }
        for (name, resource) in after {
            let child = child_address(address, child_type, name);
            match existing.get(name) {
                Some(current) => self.diff_node(&child, current, resource, operations),
                None => add_subtree(child, resource, None, false, operations),
            }
        }
    }

    fn diff_ordered(
        &self,
        address: &PathAddress,
        collection: &Collection<'_>,
        operations: &mut Vec<ModelOperation>,
    ) {
        let Collection {
            child_type,
            before,
            after,
            incoming_index,
            live_ordered,
        } = collection;
        let existing: BTreeMap<&str, &DescribedResource> = before.iter().copied().collect();
        let positions: BTreeMap<&str, usize> = after
            .iter()
            .enumerate()
            .map(|(i, (name, _))| (*name, i))
            .collect();
        let survivors: Vec<&str> = before
            .iter()
            .map(|(name, _)| *name)
            .filter(|name| positions.contains_key(name))
            .collect();

        let kept: BTreeSet<&str> = if !live_ordered && !before.is_empty() {
            // Re-adding every child marks the live collection ordered
            debug!(
                address = %address,
                child_type,
                "Live collection is unordered, rebuilding"
            );
            BTreeSet::new()
        } else if self.local_indexed_add {
            let order: Vec<usize> = survivors.iter().map(|name| positions[name]).collect();
            longest_increasing_run(&order)
                .into_iter()
                .map(|i| survivors[i])
                .collect()
        } else if after
            .iter()
            .map(|(name, _)| *name)
            .take(survivors.len())
            .eq(survivors.iter().copied())
        {
            survivors.iter().copied().collect()
        } else {
            debug!(
                address = %address,
                child_type,
                "Positional add unsupported, rebuilding ordered collection"
            );
            BTreeSet::new()
        };

        for (name, _) in before {
            if !kept.contains(name) {
                operations.push(ModelOperation::remove(child_address(address, child_type, name)));
            }
        }
        for (name, resource) in after {
            let child = child_address(address, child_type, name);
            match existing.get(name) {
                Some(current) if kept.contains(name) => {
                    self.diff_node(&child, current, resource, operations)
                }
                _ => {
                    // Counted over the full incoming sequence so proxies and
                    // ignored siblings keep their place
                    let index = self
                        .local_indexed_add
                        .then(|| incoming_index.get(name).copied())
                        .flatten();
                    add_subtree(child, resource, index, true, operations);
                }
            }
        }
    }
}

/// One child type of a node, as both sides describe it
struct Collection<'d> {
    child_type: &'d str,
    before: Entries<'d>,
    after: Entries<'d>,
    /// Position of every incoming name, including skipped ones
    incoming_index: BTreeMap<&'d str, usize>,
    /// The live side already keeps this type in order
    live_ordered: bool,
}

type Entries<'d> = Vec<(&'d str, &'d DescribedResource)>;

fn child_address(parent: &PathAddress, child_type: &str, name: &str) -> PathAddress {
    parent.append(PathElement::new(child_type, name))
}

/// Emit the add for `resource` followed by adds for its whole subtree.
///
/// Descendants are created under parents that already carry their ordered
/// child types, so only the top add may need to mark its collection.
fn add_subtree(
    address: PathAddress,
    resource: &DescribedResource,
    index: Option<usize>,
    ordered: bool,
    operations: &mut Vec<ModelOperation>,
) {
    operations.push(ModelOperation::Add {
        address: address.clone(),
        attributes: resource.attributes.clone(),
        index,
        ordered_child_types: resource.ordered_child_types(),
        ordered,
    });
    for (child_type, children) in &resource.children {
        for (name, child) in children.iter() {
            if child.proxy {
                continue;
            }
            add_subtree(child_address(&address, child_type, name), child, None, false, operations);
        }
    }
}

/// Indexes of a longest strictly increasing subsequence of `values`.
fn longest_increasing_run(values: &[usize]) -> Vec<usize> {
    // tails[k]: index of the smallest tail of an increasing run of length k+1
    let mut tails: Vec<usize> = Vec::new();
    let mut previous: Vec<Option<usize>> = vec![None; values.len()];
    for (i, value) in values.iter().enumerate() {
        let slot = tails.partition_point(|&t| values[t] < *value);
        previous[i] = slot.checked_sub(1).map(|s| tails[s]);
        if slot == tails.len() {
            tails.push(i);
        } else {
            tails[slot] = i;
        }
    }

    let mut run = Vec::with_capacity(tails.len());
    let mut current = tails.last().copied();
    while let Some(i) = current {
        run.push(i);
        current = previous[i];
    }
    run.reverse();
    run
}
