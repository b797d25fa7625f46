//! FILENAME: core/records/src/key.rs
//! Group keys - hashable normalization of field values.
//!
//! `FieldValue` cannot be a map key (f64 is neither `Eq` nor `Hash`), so
//! partitioning and de-duplication go through `GroupKey` instead.
//!
//! Normalization rules:
//! - A missing field and an explicit `Null` are the same key
//! - `-0.0` and `0.0` are the same key; all NaNs are the same key
//! - Lists and nested records are keyed by their canonical JSON text

use std::fmt;

use crate::record::Record;
use crate::value::FieldValue;

/// Wrapper around f64 that implements Eq and Hash for use as HashMap keys.
/// NaN values are treated as equal to each other.
#[derive(Debug, Clone, Copy)]
pub struct OrderedFloat(pub f64);

impl PartialEq for OrderedFloat {
    fn eq(&self, other: &Self) -> bool {
        if self.0.is_nan() && other.0.is_nan() {
            true
        } else {
            self.0 == other.0
        }
    }
}

impl Eq for OrderedFloat {}

impl std::hash::Hash for OrderedFloat {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        if self.0.is_nan() {
            // All NaN values hash to the same thing
            u64::MAX.hash(state);
        } else {
            // -0.0 + 0.0 == +0.0, so both zeros share a bit pattern
            (self.0 + 0.0).to_bits().hash(state);
        }
    }
}

impl OrderedFloat {
    pub fn as_f64(&self) -> f64 {
        self.0
    }
}

/// A partition key derived from one field of a record.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GroupKey {
    Null,
    Boolean(bool),
    Number(OrderedFloat),
    Text(String),
    /// Lists and nested records, keyed by canonical JSON.
    Composite(String),
}

impl GroupKey {
    /// Key of `field` in `record`; a missing field yields `GroupKey::Null`.
    pub fn of(record: &Record, field: &str) -> Self {
        record.get(field).map(GroupKey::from).unwrap_or(GroupKey::Null)
    }

    /// Display label, as shown in a row header.
    pub fn label(&self) -> String {
        self.to_string()
    }
}

impl From<&FieldValue> for GroupKey {
    fn from(value: &FieldValue) -> Self {
        match value {
            FieldValue::Null => GroupKey::Null,
            FieldValue::Boolean(b) => GroupKey::Boolean(*b),
            FieldValue::Number(n) => GroupKey::Number(OrderedFloat(*n)),
            FieldValue::Text(s) => GroupKey::Text(s.clone()),
            FieldValue::List(_) | FieldValue::Nested(_) => {
                GroupKey::Composite(value.to_json().to_string())
            }
        }
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupKey::Null => f.write_str("(blank)"),
            GroupKey::Boolean(b) => f.write_str(if *b { "true" } else { "false" }),
            GroupKey::Number(n) => write!(f, "{}", FieldValue::Number(n.as_f64())),
            GroupKey::Text(s) => f.write_str(s),
            GroupKey::Composite(json) => f.write_str(json),
        }
    }
}
