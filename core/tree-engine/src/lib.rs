//! FILENAME: core/tree-engine/src/lib.rs
//! Tree aggregation engine.
//!
//! Converts flat records into multi-level grouped node sequences with
//! computed per-group aggregates, ready for a tree-grid renderer. Every call
//! is a pure, synchronous transform; nothing is cached between calls.
//!
//! Layers:
//! - `definition`: Configuration and strategy traits (what the tree IS)
//! - `aggregate`: Reducers over a group's children (HOW rows are summarized)
//! - `engine`: Partitioning and node assembly (HOW we build)
//! - `view`: The node sequence and its linkage check (WHAT we hand out)

pub mod aggregate;
pub mod definition;
pub mod engine;
pub mod error;
pub mod view;

pub use aggregate::{aggregate_avg, aggregate_sum, count_by_value, get_unique_values};
pub use definition::*;
pub use engine::{build_three_level_tree, build_tree, group_records, RecordGroup};
pub use error::TreeError;
pub use view::{leaf_count, validate_linkage, NodeId, TreeNode, ID_FIELD};

pub use records::{FieldValue, GroupKey, Record};

/// Parses a JSON array of records and builds a two-level tree from it.
pub fn build_tree_from_json(
    json: &str,
    config: &TreeConfig,
) -> Result<Vec<TreeNode>, TreeError> {
    let records = records::records_from_str(json)?;
    build_tree(&records, config)
}

/// Parses a JSON array of records and builds a three-level tree from it.
pub fn build_three_level_tree_from_json(
    json: &str,
    config: &ThreeLevelConfig,
) -> Result<Vec<TreeNode>, TreeError> {
    let records = records::records_from_str(json)?;
    build_three_level_tree(&records, config)
}
