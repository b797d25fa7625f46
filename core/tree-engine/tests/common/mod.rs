//! FILENAME: tests/common/mod.rs
//! Fixtures shared by the tree-engine integration tests.

#![allow(dead_code)]

use tree_engine::{AggregationSpec, FieldValue, NodeId, Record, TreeNode};

/// The three-row sales sample: two East rows, one West row.
pub fn sales() -> Vec<Record> {
    vec![
        Record::new().with("id", 1).with("region", "East").with("amount", 10),
        Record::new().with("id", 2).with("region", "East").with("amount", 20),
        Record::new().with("id", 3).with("region", "West").with("amount", 5),
    ]
}

/// Inventory rows spanning warehouse -> category -> item.
pub fn inventory() -> Vec<Record> {
    let rows = [
        ("sku-1", "North", "Tools", 4, 12.5, "ok"),
        ("sku-2", "South", "Paint", 10, 3.0, "low"),
        ("sku-3", "North", "Paint", 1, 8.0, "low"),
        ("sku-4", "North", "Tools", 7, 20.0, "ok"),
        ("sku-5", "South", "Paint", 3, 4.5, "ok"),
        ("sku-6", "East", "Garden", 0, 15.0, "out"),
    ];
    rows.iter()
        .map(|(sku, warehouse, category, qty, price, status)| {
            Record::new()
                .with("sku", *sku)
                .with("warehouse", *warehouse)
                .with("category", *category)
                .with("qty", *qty)
                .with("price", *price)
                .with("status", *status)
        })
        .collect()
}

/// Sum of `amount`, labelled with the region key.
pub fn region_sum() -> AggregationSpec {
    AggregationSpec::new().key_field("region").sum(&["amount"])
}

/// A compact (id, level, parentId, isParent) view of a node sequence.
pub fn shape(nodes: &[TreeNode]) -> Vec<(String, u8, Option<String>, bool)> {
    nodes
        .iter()
        .map(|n| {
            (
                n.id.to_string(),
                n.level,
                n.parent_id.as_ref().map(NodeId::to_string),
                n.is_parent,
            )
        })
        .collect()
}

pub fn text(s: &str) -> FieldValue {
    FieldValue::from(s)
}
