//! FILENAME: core/records/src/value.rs
//! PURPOSE: Defines the value a single record field can hold.
//! CONTEXT: Records arrive from an analytics API with no fixed schema, so a
//! field may be a scalar or a nested structure. `FieldValue` is the closed set
//! of shapes the engine understands.

use std::fmt;

use serde::{Deserialize, Serialize, Serializer};

use crate::record::Record;

/// The content of one record field.
///
/// Equality is strict: `Number(NaN)` is not equal to itself, and a `Number`
/// never equals a `Text` even when they print the same.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Null,
    Boolean(bool),
    Number(f64),
    Text(String),
    List(Vec<FieldValue>),
    Nested(Record),
}

impl FieldValue {
    pub fn text(s: impl Into<String>) -> Self {
        FieldValue::Text(s.into())
    }

    /// Returns the numeric payload, if this is a `Number`.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// Converts into a `serde_json::Value`. Integral numbers become JSON
    /// integers; non-finite numbers become `null`.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            FieldValue::Null => serde_json::Value::Null,
            FieldValue::Boolean(b) => serde_json::Value::Bool(*b),
            FieldValue::Number(n) => number_to_json(*n),
            FieldValue::Text(s) => serde_json::Value::String(s.clone()),
            FieldValue::List(items) => {
                serde_json::Value::Array(items.iter().map(FieldValue::to_json).collect())
            }
            FieldValue::Nested(record) => record.to_json(),
        }
    }
}

fn number_to_json(n: f64) -> serde_json::Value {
    // i64 range check keeps the cast exact
    if n.fract() == 0.0 && n.abs() < 9.0e15 {
        serde_json::Value::from(n as i64)
    } else {
        serde_json::Number::from_f64(n)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null)
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FieldValue::Null => serializer.serialize_unit(),
            FieldValue::Boolean(b) => serializer.serialize_bool(*b),
            FieldValue::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 9.0e15 {
                    serializer.serialize_i64(*n as i64)
                } else {
                    serializer.serialize_f64(*n)
                }
            }
            FieldValue::Text(s) => serializer.serialize_str(s),
            FieldValue::List(items) => items.serialize(serializer),
            FieldValue::Nested(record) => record.serialize(serializer),
        }
    }
}

impl fmt::Display for FieldValue {
    /// Display text used for labels and identifiers.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Null => Ok(()),
            FieldValue::Boolean(b) => f.write_str(if *b { "true" } else { "false" }),
            FieldValue::Number(n) => {
                // Format without unnecessary decimal places
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    write!(f, "{:.0}", n)
                } else {
                    write!(f, "{}", n)
                }
            }
            FieldValue::Text(s) => f.write_str(s),
            FieldValue::List(_) | FieldValue::Nested(_) => write!(f, "{}", self.to_json()),
        }
    }
}

impl Default for FieldValue {
    fn default() -> Self {
        FieldValue::Null
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Number(value)
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        FieldValue::Number(value as f64)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Number(value as f64)
    }
}

impl From<u32> for FieldValue {
    fn from(value: u32) -> Self {
        FieldValue::Number(value as f64)
    }
}

impl From<usize> for FieldValue {
    fn from(value: usize) -> Self {
        FieldValue::Number(value as f64)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Boolean(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<Vec<FieldValue>> for FieldValue {
    fn from(value: Vec<FieldValue>) -> Self {
        FieldValue::List(value)
    }
}

impl From<Record> for FieldValue {
    fn from(value: Record) -> Self {
        FieldValue::Nested(value)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(FieldValue::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strict_equality_keeps_types_apart() {
        assert_ne!(FieldValue::from(1), FieldValue::from("1"));
        assert_ne!(FieldValue::Number(f64::NAN), FieldValue::Number(f64::NAN));
        assert_eq!(FieldValue::from(2.0), FieldValue::from(2));
    }

    #[test]
    fn display_drops_trailing_zero_fraction() {
        assert_eq!(FieldValue::from(30.0).to_string(), "30");
        assert_eq!(FieldValue::from(2.5).to_string(), "2.5");
        assert_eq!(FieldValue::Null.to_string(), "");
        assert_eq!(FieldValue::from(true).to_string(), "true");
    }

    #[test]
    fn serializes_integral_numbers_as_integers() {
        let json = serde_json::to_string(&FieldValue::from(30.0)).unwrap();
        assert_eq!(json, "30");
        let json = serde_json::to_string(&FieldValue::from(0.25)).unwrap();
        assert_eq!(json, "0.25");
    }

    #[test]
    fn deserializes_untagged_json() {
        let value: FieldValue = serde_json::from_str("[1, \"a\", null, true]").unwrap();
        assert_eq!(
            value,
            FieldValue::List(vec![
                FieldValue::from(1),
                FieldValue::from("a"),
                FieldValue::Null,
                FieldValue::from(true),
            ])
        );
    }

    #[test]
    fn option_none_becomes_null() {
        let missing: Option<f64> = None;
        assert!(FieldValue::from(missing).is_null());
    }
}
