//! FILENAME: tests/test_three_level.rs
//! PURPOSE: Tests for the three-level tree builder.

mod common;

use common::{inventory, shape};
use pretty_assertions::assert_eq;
use tree_engine::{
    aggregate_with, build_three_level_tree, children_with, count_by_value, leaf_count,
    validate_linkage, AggregationSpec, AggregationType, FieldValue, LeafConfig, LevelConfig,
    Measure, NodeId, Record, ThreeLevelConfig, TreeError,
};

fn warehouse_level() -> LevelConfig {
    LevelConfig::new(
        "warehouse",
        AggregationSpec::new()
            .key_field("warehouse")
            .sum(&["qty"])
            .measure(Measure::new("sku", AggregationType::Count).named("items")),
    )
}

fn category_level() -> LevelConfig {
    LevelConfig::new(
        "category",
        AggregationSpec::new()
            .key_field("category")
            .sum(&["qty"])
            .average(&["price"]),
    )
}

fn ids(nodes: &[tree_engine::TreeNode]) -> Vec<&str> {
    nodes.iter().map(|n| n.id.as_str()).collect()
}

#[test]
fn test_depth_first_with_raw_leaves() {
    let config = ThreeLevelConfig::new(warehouse_level(), category_level())
        .with_level3(LeafConfig::rows());
    let nodes = build_three_level_tree(&inventory(), &config).unwrap();

    let expected: Vec<(String, u8, Option<String>, bool)> = vec![
        ("North".into(), 0, None, true),
        ("North/Tools".into(), 1, Some("North".into()), true),
        ("North/Tools#0".into(), 2, Some("North/Tools".into()), false),
        ("North/Tools#1".into(), 2, Some("North/Tools".into()), false),
        ("North/Paint".into(), 1, Some("North".into()), true),
        ("North/Paint#0".into(), 2, Some("North/Paint".into()), false),
        ("South".into(), 0, None, true),
        ("South/Paint".into(), 1, Some("South".into()), true),
        ("South/Paint#0".into(), 2, Some("South/Paint".into()), false),
        ("South/Paint#1".into(), 2, Some("South/Paint".into()), false),
        ("East".into(), 0, None, true),
        ("East/Garden".into(), 1, Some("East".into()), true),
        ("East/Garden#0".into(), 2, Some("East/Garden".into()), false),
    ];
    assert_eq!(shape(&nodes), expected);
    assert_eq!(leaf_count(&nodes), inventory().len());
    validate_linkage(&nodes).unwrap();
}

#[test]
fn test_aggregates_at_both_levels() {
    let config = ThreeLevelConfig::new(warehouse_level(), category_level())
        .with_level3(LeafConfig::rows());
    let nodes = build_three_level_tree(&inventory(), &config).unwrap();

    assert_eq!(
        nodes[0].record,
        Record::new()
            .with("warehouse", "North")
            .with("qty", 12)
            .with("items", 3)
    );
    // Tools in North: qty 4 + 7, price (12.5 + 20) / 2 = 16.25 -> 16
    assert_eq!(
        nodes[1].record,
        Record::new()
            .with("category", "Tools")
            .with("qty", 11)
            .with("price", 16)
    );
    // Leaves are the input rows, untouched
    assert_eq!(nodes[2].record, inventory()[0]);
    assert_eq!(nodes[3].record, inventory()[3]);
}

#[test]
fn test_without_level3_subgroups_are_leaves() {
    let config = ThreeLevelConfig::new(warehouse_level(), category_level());
    let nodes = build_three_level_tree(&inventory(), &config).unwrap();

    assert_eq!(
        ids(&nodes),
        vec![
            "North", "North/Tools", "North/Paint", "South", "South/Paint", "East",
            "East/Garden",
        ]
    );
    for node in nodes.iter().filter(|n| n.level == 1) {
        assert!(!node.is_parent);
    }
    validate_linkage(&nodes).unwrap();
}

#[test]
fn test_level3_generator_receives_child_id() {
    let config = ThreeLevelConfig::new(warehouse_level(), category_level()).with_level3(
        LeafConfig::generated(children_with(|key, rows, parent_id| {
            Ok(vec![Record::new()
                .with("id", format!("{}:low", parent_id))
                .with("category", key.clone())
                .with("low", count_by_value(rows, "status", &FieldValue::from("low")))])
        })),
    );
    let nodes = build_three_level_tree(&inventory(), &config).unwrap();

    let leaves: Vec<(&str, Option<&str>, Option<f64>)> = nodes
        .iter()
        .filter(|n| n.level == 2)
        .map(|n| {
            (
                n.id.as_str(),
                n.parent_id.as_ref().map(NodeId::as_str),
                n.record.number("low"),
            )
        })
        .collect();
    assert_eq!(
        leaves,
        vec![
            ("North/Tools:low", Some("North/Tools"), Some(0.0)),
            ("North/Paint:low", Some("North/Paint"), Some(1.0)),
            ("South/Paint:low", Some("South/Paint"), Some(1.0)),
            ("East/Garden:low", Some("East/Garden"), Some(0.0)),
        ]
    );
    validate_linkage(&nodes).unwrap();
}

#[test]
fn test_same_subgroup_label_under_different_parents() {
    // "Paint" appears under North and South; ids stay unique via the path
    let config = ThreeLevelConfig::new(warehouse_level(), category_level());
    let nodes = build_three_level_tree(&inventory(), &config).unwrap();
    let paint: Vec<&str> = nodes
        .iter()
        .filter(|n| n.record.get("category") == Some(&FieldValue::from("Paint")))
        .map(|n| n.id.as_str())
        .collect();
    assert_eq!(paint, vec!["North/Paint", "South/Paint"]);
}

#[test]
fn test_no_level1_grouping_is_flat() {
    let config = ThreeLevelConfig::default();
    let nodes = build_three_level_tree(&inventory(), &config).unwrap();
    assert_eq!(nodes.len(), inventory().len());
    assert!(nodes.iter().all(|n| n.level == 0 && !n.is_parent));
}

#[test]
fn test_level1_without_aggregate_is_rejected() {
    let config = ThreeLevelConfig::new(
        LevelConfig {
            group_by: Some("warehouse".to_string()),
            aggregate: None,
        },
        category_level(),
    );
    let err = build_three_level_tree(&inventory(), &config).unwrap_err();
    assert!(matches!(err, TreeError::Configuration(ref msg) if msg.contains("level1")));
}

#[test]
fn test_level2_failure_names_the_path() {
    let config = ThreeLevelConfig::new(
        warehouse_level(),
        LevelConfig::new(
            "category",
            aggregate_with(|key, _| {
                if key.as_text() == Some("Garden") {
                    Err("no garden pricing".into())
                } else {
                    Ok(Record::new())
                }
            }),
        ),
    );
    let err = build_three_level_tree(&inventory(), &config).unwrap_err();
    assert!(matches!(err, TreeError::Aggregation { ref group, .. } if group == "East/Garden"));
}

#[test]
fn test_empty_input() {
    let config = ThreeLevelConfig::new(warehouse_level(), category_level())
        .with_level3(LeafConfig::rows());
    assert!(build_three_level_tree(&[], &config).unwrap().is_empty());
}
