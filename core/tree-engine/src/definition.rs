//! FILENAME: core/tree-engine/src/definition.rs
//! Tree Definition - what the caller asks the builders to do.
//!
//! This module contains the types needed to DESCRIBE a hierarchy:
//! - which field each level groups by
//! - how a group's parent row is synthesized (`Aggregator`)
//! - how a group's children are produced (`ChildrenGenerator`)
//! - how node identifiers are assigned (`IdStrategy`)
//!
//! Strategies are trait objects so closures and declarative
//! `AggregationSpec`s plug into the same slot.

use std::fmt;

use serde::{Deserialize, Serialize};

use records::{FieldValue, Record};

use crate::view::NodeId;

/// Error type returned by caller-supplied strategies.
pub type AggregateError = Box<dyn std::error::Error + Send + Sync>;

// ============================================================================
// STRATEGIES
// ============================================================================

/// Synthesizes the parent row of one group.
pub trait Aggregator: Send + Sync {
    fn aggregate(&self, key: &FieldValue, children: &[Record]) -> Result<Record, AggregateError>;
}

impl<F> Aggregator for F
where
    F: Fn(&FieldValue, &[Record]) -> Result<Record, AggregateError> + Send + Sync,
{
    fn aggregate(&self, key: &FieldValue, children: &[Record]) -> Result<Record, AggregateError> {
        self(key, children)
    }
}

/// Produces the child rows of one group in place of the raw records.
pub trait ChildrenGenerator: Send + Sync {
    fn generate(
        &self,
        key: &FieldValue,
        children: &[Record],
        parent_id: &NodeId,
    ) -> Result<Vec<Record>, AggregateError>;
}

impl<F> ChildrenGenerator for F
where
    F: Fn(&FieldValue, &[Record], &NodeId) -> Result<Vec<Record>, AggregateError> + Send + Sync,
{
    fn generate(
        &self,
        key: &FieldValue,
        children: &[Record],
        parent_id: &NodeId,
    ) -> Result<Vec<Record>, AggregateError> {
        self(key, children, parent_id)
    }
}

/// Pins a closure to the `Aggregator` signature so its argument types are
/// inferred.
pub fn aggregate_with<F>(f: F) -> F
where
    F: Fn(&FieldValue, &[Record]) -> Result<Record, AggregateError> + Send + Sync,
{
    f
}

/// Pins a closure to the `ChildrenGenerator` signature.
pub fn children_with<F>(f: F) -> F
where
    F: Fn(&FieldValue, &[Record], &NodeId) -> Result<Vec<Record>, AggregateError> + Send + Sync,
{
    f
}

// ============================================================================
// IDENTIFIERS
// ============================================================================

/// How node identifiers are assigned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum IdStrategy {
    /// Aggregate rows use their own `id` field when the aggregator set one,
    /// otherwise the group label path (`East`, `East/Apples`). Leaves use
    /// their `id` field or their position (`East#0`).
    GroupPath,
    /// Aggregate rows must carry the named field; a row without it is an
    /// error. Leaves use the field when present, else their position.
    Field(String),
}

impl IdStrategy {
    /// Record field consulted for explicit identifiers.
    pub fn field(&self) -> &str {
        match self {
            IdStrategy::GroupPath => crate::view::ID_FIELD,
            IdStrategy::Field(name) => name,
        }
    }

    /// Whether aggregate rows must supply their own identifier.
    pub fn requires_field(&self) -> bool {
        matches!(self, IdStrategy::Field(_))
    }
}

impl Default for IdStrategy {
    fn default() -> Self {
        IdStrategy::GroupPath
    }
}

// ============================================================================
// TWO-LEVEL CONFIGURATION
// ============================================================================

/// Configuration for [`build_tree`](crate::engine::build_tree).
///
/// Leaving `group_by` unset disables the hierarchy: records come back flat.
/// Setting `group_by` without `aggregate` is a configuration error.
#[derive(Default)]
pub struct TreeConfig {
    pub group_by: Option<String>,
    pub aggregate: Option<Box<dyn Aggregator>>,
    pub children: Option<Box<dyn ChildrenGenerator>>,
    pub ids: IdStrategy,
}

impl TreeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn group_by(mut self, field: impl Into<String>) -> Self {
        self.group_by = Some(field.into());
        self
    }

    pub fn aggregate(mut self, aggregator: impl Aggregator + 'static) -> Self {
        self.aggregate = Some(Box::new(aggregator));
        self
    }

    pub fn children(mut self, generator: impl ChildrenGenerator + 'static) -> Self {
        self.children = Some(Box::new(generator));
        self
    }

    pub fn ids(mut self, ids: IdStrategy) -> Self {
        self.ids = ids;
        self
    }
}

impl fmt::Debug for TreeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TreeConfig")
            .field("group_by", &self.group_by)
            .field("aggregate", &self.aggregate.is_some())
            .field("children", &self.children.is_some())
            .field("ids", &self.ids)
            .finish()
    }
}

// ============================================================================
// THREE-LEVEL CONFIGURATION
// ============================================================================

/// One grouping level of a three-level tree.
#[derive(Default)]
pub struct LevelConfig {
    pub group_by: Option<String>,
    pub aggregate: Option<Box<dyn Aggregator>>,
}

impl LevelConfig {
    pub fn new(group_by: impl Into<String>, aggregator: impl Aggregator + 'static) -> Self {
        LevelConfig {
            group_by: Some(group_by.into()),
            aggregate: Some(Box::new(aggregator)),
        }
    }
}

impl fmt::Debug for LevelConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LevelConfig")
            .field("group_by", &self.group_by)
            .field("aggregate", &self.aggregate.is_some())
            .finish()
    }
}

/// The optional leaf level of a three-level tree.
#[derive(Default)]
pub struct LeafConfig {
    pub children: Option<Box<dyn ChildrenGenerator>>,
}

impl LeafConfig {
    /// Leaves are the original records.
    pub fn rows() -> Self {
        LeafConfig { children: None }
    }

    /// Leaves are produced by `generator`.
    pub fn generated(generator: impl ChildrenGenerator + 'static) -> Self {
        LeafConfig {
            children: Some(Box::new(generator)),
        }
    }
}

impl fmt::Debug for LeafConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LeafConfig")
            .field("children", &self.children.is_some())
            .finish()
    }
}

/// Configuration for
/// [`build_three_level_tree`](crate::engine::build_three_level_tree).
#[derive(Debug, Default)]
pub struct ThreeLevelConfig {
    pub level1: LevelConfig,
    pub level2: LevelConfig,
    pub level3: Option<LeafConfig>,
    pub ids: IdStrategy,
}

impl ThreeLevelConfig {
    pub fn new(level1: LevelConfig, level2: LevelConfig) -> Self {
        ThreeLevelConfig {
            level1,
            level2,
            level3: None,
            ids: IdStrategy::default(),
        }
    }

    pub fn with_level3(mut self, level3: LeafConfig) -> Self {
        self.level3 = Some(level3);
        self
    }

    pub fn ids(mut self, ids: IdStrategy) -> Self {
        self.ids = ids;
        self
    }
}

// ============================================================================
// DECLARATIVE AGGREGATION
// ============================================================================

/// Supported aggregation functions for a measure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AggregationType {
    Sum,
    Average,
    /// Number of child records.
    Count,
    /// Number of child records whose field equals the given value.
    CountValue(FieldValue),
    /// Distinct values of the field, as a list.
    Unique,
    Min,
    Max,
}

impl Default for AggregationType {
    fn default() -> Self {
        AggregationType::Sum
    }
}

/// One computed column of an aggregate row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Measure {
    /// Source field read from the children.
    pub field: String,

    /// Output field name (defaults to `field`).
    #[serde(default)]
    pub output: Option<String>,

    #[serde(default)]
    pub aggregation: AggregationType,
}

impl Measure {
    pub fn new(field: impl Into<String>, aggregation: AggregationType) -> Self {
        Measure {
            field: field.into(),
            output: None,
            aggregation,
        }
    }

    pub fn named(mut self, output: impl Into<String>) -> Self {
        self.output = Some(output.into());
        self
    }

    pub fn output_name(&self) -> &str {
        self.output.as_deref().unwrap_or(&self.field)
    }
}

/// A serializable aggregation: usable wherever an `Aggregator` is expected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregationSpec {
    /// When set, the group key is written into the row under this name.
    #[serde(default)]
    pub key_field: Option<String>,

    #[serde(default)]
    pub measures: Vec<Measure>,
}

impl AggregationSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn key_field(mut self, field: impl Into<String>) -> Self {
        self.key_field = Some(field.into());
        self
    }

    pub fn measure(mut self, measure: Measure) -> Self {
        self.measures.push(measure);
        self
    }

    /// Shorthand for a `Sum` measure on each of `fields`.
    pub fn sum(mut self, fields: &[&str]) -> Self {
        self.measures
            .extend(fields.iter().map(|f| Measure::new(*f, AggregationType::Sum)));
        self
    }

    /// Shorthand for an `Average` measure on each of `fields`.
    pub fn average(mut self, fields: &[&str]) -> Self {
        self.measures
            .extend(fields.iter().map(|f| Measure::new(*f, AggregationType::Average)));
        self
    }

    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}
