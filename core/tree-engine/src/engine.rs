//! FILENAME: core/tree-engine/src/engine.rs
//! Tree Engine - turns flat records into a grouped node sequence.
//!
//! Takes a configuration (definition) and a flat record slice and produces
//! the flat, depth-first `Vec<TreeNode>` a tree grid consumes.
//!
//! Algorithm:
//! 1. Partition records by the level's group field, keeping first-seen order
//! 2. Synthesize one aggregate row per group through the level's aggregator
//! 3. Recurse into the next level, or attach leaves (raw or generated)
//! 4. Emit every node immediately after its parent (depth-first)

use log::{debug, trace};
use rustc_hash::{FxHashMap, FxHashSet};

use records::{FieldValue, GroupKey, Record};

use crate::definition::{
    Aggregator, ChildrenGenerator, IdStrategy, LevelConfig, ThreeLevelConfig, TreeConfig,
};
use crate::error::TreeError;
use crate::view::{NodeId, TreeNode};

// ============================================================================
// PARTITIONING
// ============================================================================

/// The records sharing one group key.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordGroup {
    /// The key as it appeared in the first record of the group (`Null` when
    /// the field was missing).
    pub key: FieldValue,

    /// Display label of the key.
    pub label: String,

    /// Members, in input order.
    pub records: Vec<Record>,
}

/// Partitions `records` by the value of `field`.
///
/// Groups come out in order of first appearance and members keep input
/// order. Non-contiguous occurrences of a key merge into one group; records
/// missing the field form the `(blank)` group.
pub fn group_records(records: &[Record], field: &str) -> Vec<RecordGroup> {
    partition(records.to_vec(), field)
}

fn partition(records: Vec<Record>, field: &str) -> Vec<RecordGroup> {
    let mut index: FxHashMap<GroupKey, usize> = FxHashMap::default();
    let mut groups: Vec<RecordGroup> = Vec::new();

    for record in records {
        let key = GroupKey::of(&record, field);
        let slot = match index.get(&key) {
            Some(&slot) => slot,
            None => {
                let slot = groups.len();
                groups.push(RecordGroup {
                    key: record.get(field).cloned().unwrap_or(FieldValue::Null),
                    label: key.label(),
                    records: Vec::new(),
                });
                index.insert(key, slot);
                slot
            }
        };
        groups[slot].records.push(record);
    }

    groups
}

// ============================================================================
// NODE ASSEMBLY
// ============================================================================

/// Accumulates the output sequence and hands out identifiers.
struct TreeBuilder<'a> {
    ids: &'a IdStrategy,

    /// Identifiers already given to aggregate rows.
    taken: FxHashSet<NodeId>,

    /// Identifiers of leaves emitted so far, plus the explicit identifiers of
    /// raw records that will become leaves.
    leaf_ids: FxHashSet<NodeId>,

    nodes: Vec<TreeNode>,
}

impl<'a> TreeBuilder<'a> {
    fn new(ids: &'a IdStrategy, capacity: usize) -> Self {
        TreeBuilder {
            ids,
            taken: FxHashSet::default(),
            leaf_ids: FxHashSet::default(),
            nodes: Vec::with_capacity(capacity),
        }
    }

    /// Claims the explicit identifiers of records that will be attached
    /// unchanged as leaves, so no aggregate row is keyed the same way.
    fn reserve_leaves(&mut self, records: &[Record]) {
        let field = self.ids.field();
        for record in records {
            if let Some(value) = record.get(field).filter(|v| !v.is_null()) {
                self.leaf_ids.insert(NodeId::from(value.to_string()));
            }
        }
    }

    fn is_claimed(&self, id: &NodeId) -> bool {
        self.taken.contains(id) || self.leaf_ids.contains(id)
    }

    /// Appends an aggregate row and returns its identifier.
    fn push_aggregate(
        &mut self,
        record: Record,
        level: u8,
        parent: Option<&NodeId>,
        label: &str,
        is_parent: bool,
    ) -> Result<NodeId, TreeError> {
        let id = self.aggregate_id(&record, parent, label)?;
        self.nodes.push(TreeNode {
            id: id.clone(),
            level,
            parent_id: parent.cloned(),
            is_parent,
            record,
        });
        Ok(id)
    }

    fn aggregate_id(
        &mut self,
        record: &Record,
        parent: Option<&NodeId>,
        label: &str,
    ) -> Result<NodeId, TreeError> {
        let field = self.ids.field();
        match record.get(field) {
            Some(value) if !value.is_null() => {
                let id = NodeId::from(value.to_string());
                if self.is_claimed(&id) {
                    return Err(TreeError::DuplicateIdentifier(id));
                }
                self.taken.insert(id.clone());
                Ok(id)
            }
            _ if self.ids.requires_field() => Err(TreeError::MissingIdentifier {
                group: label.to_string(),
                field: field.to_string(),
            }),
            _ => {
                let base = match parent {
                    Some(parent) => format!("{}/{}", parent, label),
                    None => label.to_string(),
                };
                // Distinct keys can share a label (1 and "1"), and a label can
                // match a leaf identifier
                let mut id = NodeId::from(base.clone());
                let mut suffix = 2;
                while self.is_claimed(&id) {
                    id = NodeId::from(format!("{}~{}", base, suffix));
                    suffix += 1;
                }
                self.taken.insert(id.clone());
                Ok(id)
            }
        }
    }

    /// Appends the children of `parent`: generated ones when a generator is
    /// configured, the group's own records otherwise.
    fn attach_children(
        &mut self,
        group: RecordGroup,
        generator: Option<&dyn ChildrenGenerator>,
        label: &str,
        level: u8,
        parent: &NodeId,
    ) -> Result<(), TreeError> {
        let children = match generator {
            Some(generator) => generator
                .generate(&group.key, &group.records, parent)
                .map_err(|source| TreeError::Aggregation {
                    group: label.to_string(),
                    source,
                })?,
            None => group.records,
        };

        let field = self.ids.field();
        for (position, record) in children.into_iter().enumerate() {
            let id = leaf_id(&record, field, Some(parent), position);
            if self.taken.contains(&id) {
                return Err(TreeError::DuplicateIdentifier(id));
            }
            self.leaf_ids.insert(id.clone());
            self.nodes.push(TreeNode {
                id,
                level,
                parent_id: Some(parent.clone()),
                is_parent: false,
                record,
            });
        }
        Ok(())
    }

    fn finish(self) -> Vec<TreeNode> {
        self.nodes
    }
}

fn leaf_id(record: &Record, field: &str, parent: Option<&NodeId>, position: usize) -> NodeId {
    match record.get(field) {
        Some(value) if !value.is_null() => NodeId::from(value.to_string()),
        _ => match parent {
            Some(parent) => NodeId::from(format!("{}#{}", parent, position)),
            None => NodeId::from(position.to_string()),
        },
    }
}

fn run_aggregate(
    aggregator: &dyn Aggregator,
    group: &RecordGroup,
    label: &str,
) -> Result<Record, TreeError> {
    aggregator
        .aggregate(&group.key, &group.records)
        .map_err(|source| TreeError::Aggregation {
            group: label.to_string(),
            source,
        })
}

/// The hierarchy-disabled output: every record at level 0.
fn flat_nodes(flat_data: &[Record], ids: &IdStrategy) -> Vec<TreeNode> {
    flat_data
        .iter()
        .enumerate()
        .map(|(position, record)| TreeNode {
            id: leaf_id(record, ids.field(), None, position),
            level: 0,
            parent_id: None,
            is_parent: false,
            record: record.clone(),
        })
        .collect()
}

fn require_aggregate<'c>(
    level: &'c LevelConfig,
    name: &str,
) -> Result<(&'c str, &'c dyn Aggregator), TreeError> {
    let group_by = level
        .group_by
        .as_deref()
        .ok_or_else(|| TreeError::Configuration(format!("{} requires a groupBy field", name)))?;
    let aggregator = level.aggregate.as_deref().ok_or_else(|| {
        TreeError::Configuration(format!(
            "{} groups by '{}' but has no aggregate function",
            name, group_by
        ))
    })?;
    Ok((group_by, aggregator))
}

// ============================================================================
// PUBLIC API
// ============================================================================

/// Builds a two-level tree: one aggregate row per group, followed by the
/// group's children.
///
/// Without `group_by` the records are returned flat at level 0. A `group_by`
/// without an aggregator is rejected rather than silently flattened.
pub fn build_tree(flat_data: &[Record], config: &TreeConfig) -> Result<Vec<TreeNode>, TreeError> {
    let Some(group_by) = config.group_by.as_deref() else {
        debug!("hierarchy disabled, returning {} flat rows", flat_data.len());
        return Ok(flat_nodes(flat_data, &config.ids));
    };
    let aggregator = config.aggregate.as_deref().ok_or_else(|| {
        TreeError::Configuration(format!(
            "groupBy '{}' requires an aggregate function",
            group_by
        ))
    })?;

    let groups = partition(flat_data.to_vec(), group_by);
    let group_count = groups.len();
    let mut builder = TreeBuilder::new(&config.ids, flat_data.len() + group_count);
    if config.children.is_none() {
        builder.reserve_leaves(flat_data);
    }

    for group in groups {
        trace!("group '{}': {} records", group.label, group.records.len());
        let row = run_aggregate(aggregator, &group, &group.label)?;
        let parent_id = builder.push_aggregate(row, 0, None, &group.label, true)?;
        let label = group.label.clone();
        builder.attach_children(group, config.children.as_deref(), &label, 1, &parent_id)?;
    }

    let nodes = builder.finish();
    debug!(
        "built tree by '{}': {} records, {} groups, {} nodes",
        group_by,
        flat_data.len(),
        group_count,
        nodes.len()
    );
    Ok(nodes)
}

/// Builds a three-level tree: group, subgroup, then optional leaves.
///
/// Output is depth-first: each level-0 row is followed by its level-1 rows,
/// each of those by its level-2 rows. Level-1 rows are parents exactly when
/// `level3` is configured.
pub fn build_three_level_tree(
    flat_data: &[Record],
    config: &ThreeLevelConfig,
) -> Result<Vec<TreeNode>, TreeError> {
    if config.level1.group_by.is_none() {
        debug!("hierarchy disabled, returning {} flat rows", flat_data.len());
        return Ok(flat_nodes(flat_data, &config.ids));
    }
    let (group_by1, aggregator1) = require_aggregate(&config.level1, "level1")?;
    let (group_by2, aggregator2) = require_aggregate(&config.level2, "level2")?;
    let leaves = config.level3.as_ref();

    let groups = partition(flat_data.to_vec(), group_by1);
    let group_count = groups.len();
    let mut subgroup_count = 0;
    let mut builder = TreeBuilder::new(&config.ids, flat_data.len() + group_count);
    if leaves.is_some_and(|leaves| leaves.children.is_none()) {
        builder.reserve_leaves(flat_data);
    }

    for group in groups {
        trace!("group '{}': {} records", group.label, group.records.len());
        let row = run_aggregate(aggregator1, &group, &group.label)?;
        let parent_id = builder.push_aggregate(row, 0, None, &group.label, true)?;

        for subgroup in partition(group.records, group_by2) {
            subgroup_count += 1;
            let path = format!("{}/{}", group.label, subgroup.label);
            let row = run_aggregate(aggregator2, &subgroup, &path)?;
            let child_id =
                builder.push_aggregate(row, 1, Some(&parent_id), &subgroup.label, leaves.is_some())?;

            if let Some(leaves) = leaves {
                builder.attach_children(subgroup, leaves.children.as_deref(), &path, 2, &child_id)?;
            }
        }
    }

    let nodes = builder.finish();
    debug!(
        "built three-level tree by '{}' / '{}': {} records, {} groups, {} subgroups, {} nodes",
        group_by1,
        group_by2,
        flat_data.len(),
        group_count,
        subgroup_count,
        nodes.len()
    );
    Ok(nodes)
}
