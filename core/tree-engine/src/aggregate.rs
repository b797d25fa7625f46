//! FILENAME: core/tree-engine/src/aggregate.rs
//! Aggregator functions - stateless reducers over a group's child records.
//!
//! These are the building blocks callers use inside their own aggregators,
//! and what `AggregationSpec` dispatches to.

use rustc_hash::FxHashSet;

use records::{FieldValue, GroupKey, Record};

use crate::definition::{AggregateError, AggregationSpec, AggregationType, Aggregator, Measure};

/// Sums each of `fields` across `children`.
///
/// Missing and non-numeric values count as 0, so a field absent from every
/// child sums to 0. The result holds exactly the requested fields.
pub fn aggregate_sum(children: &[Record], fields: &[&str]) -> Record {
    fields
        .iter()
        .map(|field| (*field, FieldValue::Number(sum_field(children, field))))
        .collect()
}

/// Averages each of `fields` across `children`, rounded half-up to an integer.
///
/// The divisor is the number of children, not the number of children holding
/// the field. With no children every field averages to 0.
pub fn aggregate_avg(children: &[Record], fields: &[&str]) -> Record {
    fields
        .iter()
        .map(|field| (*field, FieldValue::Number(average_field(children, field))))
        .collect()
}

/// Counts children whose `field` strictly equals `value`. A child without the
/// field never matches.
pub fn count_by_value(children: &[Record], field: &str, value: &FieldValue) -> usize {
    children
        .iter()
        .filter(|child| child.get(field) == Some(value))
        .count()
}

/// Distinct values of `field` across `children`, in first-occurrence order.
/// Children without the field contribute `Null`.
pub fn get_unique_values(children: &[Record], field: &str) -> Vec<FieldValue> {
    let mut seen: FxHashSet<GroupKey> = FxHashSet::default();
    let mut unique = Vec::new();

    for child in children {
        let value = child.get(field).cloned().unwrap_or(FieldValue::Null);
        if seen.insert(GroupKey::from(&value)) {
            unique.push(value);
        }
    }

    unique
}

fn sum_field(children: &[Record], field: &str) -> f64 {
    children
        .iter()
        .map(|child| child.number(field).unwrap_or(0.0))
        .sum()
}

fn average_field(children: &[Record], field: &str) -> f64 {
    if children.is_empty() {
        return 0.0;
    }
    round_half_up(sum_field(children, field) / children.len() as f64)
}

/// Rounds to the nearest integer, ties toward positive infinity.
fn round_half_up(value: f64) -> f64 {
    (value + 0.5).floor()
}

fn extreme_field(children: &[Record], field: &str, pick: fn(f64, f64) -> f64) -> FieldValue {
    children
        .iter()
        .filter_map(|child| child.number(field))
        .reduce(pick)
        .map(FieldValue::Number)
        .unwrap_or(FieldValue::Null)
}

fn compute_measure(children: &[Record], measure: &Measure) -> FieldValue {
    let field = measure.field.as_str();
    match &measure.aggregation {
        AggregationType::Sum => FieldValue::Number(sum_field(children, field)),
        AggregationType::Average => FieldValue::Number(average_field(children, field)),
        AggregationType::Count => FieldValue::from(children.len()),
        AggregationType::CountValue(value) => {
            FieldValue::from(count_by_value(children, field, value))
        }
        AggregationType::Unique => FieldValue::List(get_unique_values(children, field)),
        AggregationType::Min => extreme_field(children, field, f64::min),
        AggregationType::Max => extreme_field(children, field, f64::max),
    }
}

impl AggregationSpec {
    /// Computes the aggregate row for one group.
    pub fn apply(&self, key: &FieldValue, children: &[Record]) -> Record {
        let mut row: Record = self
            .measures
            .iter()
            .map(|m| (m.output_name().to_string(), compute_measure(children, m)))
            .collect();
        if let Some(key_field) = &self.key_field {
            row.insert(key_field.clone(), key.clone());
        }
        row
    }
}

impl Aggregator for AggregationSpec {
    fn aggregate(&self, key: &FieldValue, children: &[Record]) -> Result<Record, AggregateError> {
        Ok(self.apply(key, children))
    }
}
