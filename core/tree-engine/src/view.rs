//! FILENAME: core/tree-engine/src/view.rs
//! Tree View - the flat node sequence handed to the tree-grid renderer.
//!
//! The renderer rebuilds indentation and expand/collapse state from `level`
//! and `parent_id` alone, scanning the sequence once with a parent stack.
//! `validate_linkage` performs that same scan and reports the first node that
//! would confuse it.

use std::fmt;

use rustc_hash::FxHashSet;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use smallvec::SmallVec;

use records::Record;

use crate::error::TreeError;

/// Field name under which the node identifier is serialized.
pub const ID_FIELD: &str = "id";

/// Keys owned by the node itself; record fields with these names are not
/// copied into the serialized row.
const LINKAGE_FIELDS: [&str; 3] = ["level", "parentId", "isParent"];

/// Identifier of a node within one output sequence.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        NodeId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(value: &str) -> Self {
        NodeId(value.to_string())
    }
}

impl From<String> for NodeId {
    fn from(value: String) -> Self {
        NodeId(value)
    }
}

/// One row of the output sequence: either a synthesized aggregate row or a
/// leaf carrying an input record.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeNode {
    /// Unique among aggregate rows of the sequence.
    pub id: NodeId,

    /// Depth in the tree (0 = root level).
    pub level: u8,

    /// Identifier of the owning aggregate row; `None` at level 0.
    pub parent_id: Option<NodeId>,

    /// Whether this row is an aggregate that owns descendants.
    pub is_parent: bool,

    /// The aggregate or original fields.
    pub record: Record,
}

impl TreeNode {
    pub fn is_root(&self) -> bool {
        self.level == 0
    }

    pub fn is_leaf(&self) -> bool {
        !self.is_parent
    }
}

impl Serialize for TreeNode {
    /// Serializes as one flat object: the record fields, then `id`, `level`,
    /// `parentId` for non-roots and `isParent` for aggregate rows.
    ///
    /// Tree rows always carry the node identifier under `id`, replacing any
    /// `id` of their own, so every `parentId` names an emitted `id`. Flat rows
    /// (level 0, no children) come back as their record plus `level`.
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let flat = self.is_root() && !self.is_parent;
        let mut map = serializer.serialize_map(None)?;
        for (field, value) in self.record.iter() {
            let field = field.as_str();
            if LINKAGE_FIELDS.contains(&field) || (!flat && field == ID_FIELD) {
                continue;
            }
            map.serialize_entry(field, value)?;
        }
        if !flat {
            map.serialize_entry(ID_FIELD, &self.id)?;
        }
        map.serialize_entry("level", &self.level)?;
        if let Some(parent_id) = &self.parent_id {
            map.serialize_entry("parentId", parent_id)?;
        }
        if self.is_parent {
            map.serialize_entry("isParent", &true)?;
        }
        map.end()
    }
}

/// Number of leaf (non-aggregate) rows in a sequence.
pub fn leaf_count(nodes: &[TreeNode]) -> usize {
    nodes.iter().filter(|n| n.is_leaf()).count()
}

/// Checks the linkage invariants of a node sequence:
/// - level-0 nodes carry no parent
/// - a node at level N > 0 names, as its parent, the closest preceding node
///   at level N - 1, and that node is an aggregate row
/// - aggregate row identifiers are unique across every node of the sequence
pub fn validate_linkage(nodes: &[TreeNode]) -> Result<(), TreeError> {
    // stack[i] is the open node at level i
    let mut stack: SmallVec<[&TreeNode; 4]> = SmallVec::new();
    let mut aggregate_ids: FxHashSet<&NodeId> = FxHashSet::default();
    let mut leaf_ids: FxHashSet<&NodeId> = FxHashSet::default();

    for (index, node) in nodes.iter().enumerate() {
        let level = node.level as usize;
        if level > stack.len() {
            return Err(TreeError::Linkage {
                index,
                reason: format!("level {} has no open ancestor at level {}", level, level - 1),
            });
        }
        stack.truncate(level);

        match (stack.last(), &node.parent_id) {
            (None, None) => {}
            (None, Some(parent_id)) => {
                return Err(TreeError::Linkage {
                    index,
                    reason: format!("root node carries parentId '{}'", parent_id),
                });
            }
            (Some(_), None) => {
                return Err(TreeError::Linkage {
                    index,
                    reason: format!("level {} node has no parentId", level),
                });
            }
            (Some(parent), Some(parent_id)) => {
                if &parent.id != parent_id {
                    return Err(TreeError::Linkage {
                        index,
                        reason: format!(
                            "parentId '{}' does not match enclosing node '{}'",
                            parent_id, parent.id
                        ),
                    });
                }
                if !parent.is_parent {
                    return Err(TreeError::Linkage {
                        index,
                        reason: format!("enclosing node '{}' is not an aggregate row", parent.id),
                    });
                }
            }
        }

        let clash = if node.is_parent {
            leaf_ids.contains(&node.id) || !aggregate_ids.insert(&node.id)
        } else {
            leaf_ids.insert(&node.id);
            aggregate_ids.contains(&node.id)
        };
        if clash {
            return Err(TreeError::DuplicateIdentifier(node.id.clone()));
        }
        stack.push(node);
    }

    Ok(())
}
