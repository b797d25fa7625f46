//! FILENAME: core/records/src/json.rs
//! PURPOSE: Input boundary for records fetched from an analytics API.
//! CONTEXT: Responses arrive as JSON. Anything other than an array of objects
//! is rejected here with a descriptive error, before the tree builders run.

use crate::error::RecordError;
use crate::record::Record;
use crate::value::FieldValue;

/// Converts a parsed JSON document into records.
///
/// The document must be an array whose every element is an object.
pub fn records_from_json(value: serde_json::Value) -> Result<Vec<Record>, RecordError> {
    let items = match value {
        serde_json::Value::Array(items) => items,
        other => {
            return Err(RecordError::NotASequence {
                found: json_kind(&other),
            })
        }
    };

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| match item {
            serde_json::Value::Object(map) => Ok(record_from_map(map)),
            other => Err(RecordError::NotAnObject {
                index,
                found: json_kind(&other),
            }),
        })
        .collect()
}

/// Parses JSON text and delegates to [`records_from_json`].
pub fn records_from_str(text: &str) -> Result<Vec<Record>, RecordError> {
    let value: serde_json::Value = serde_json::from_str(text)?;
    records_from_json(value)
}

fn record_from_map(map: serde_json::Map<String, serde_json::Value>) -> Record {
    map.into_iter()
        .map(|(k, v)| (k, FieldValue::from(v)))
        .collect()
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

impl From<serde_json::Value> for FieldValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => FieldValue::Null,
            serde_json::Value::Bool(b) => FieldValue::Boolean(b),
            serde_json::Value::Number(n) => n
                .as_f64()
                .map(FieldValue::Number)
                .unwrap_or(FieldValue::Null),
            serde_json::Value::String(s) => FieldValue::Text(s),
            serde_json::Value::Array(items) => {
                FieldValue::List(items.into_iter().map(FieldValue::from).collect())
            }
            serde_json::Value::Object(map) => FieldValue::Nested(record_from_map(map)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn reads_array_of_objects() {
        let records = records_from_json(json!([
            {"id": 1, "region": "East", "amount": 10},
            {"id": 2, "region": "West", "tags": ["a", "b"], "meta": {"x": 1.5}},
        ]))
        .unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].number("amount"), Some(10.0));
        assert_eq!(
            records[1].get("tags"),
            Some(&FieldValue::List(vec![FieldValue::from("a"), FieldValue::from("b")]))
        );
        assert_eq!(
            records[1].get("meta"),
            Some(&FieldValue::Nested(Record::new().with("x", 1.5)))
        );
    }

    #[test]
    fn rejects_null_document() {
        let err = records_from_json(serde_json::Value::Null).unwrap_err();
        assert!(matches!(err, RecordError::NotASequence { found: "null" }));
        assert_eq!(err.to_string(), "expected an array of records, found null");
    }

    #[test]
    fn rejects_non_object_element() {
        let err = records_from_json(json!([{"a": 1}, 7])).unwrap_err();
        assert!(matches!(
            err,
            RecordError::NotAnObject {
                index: 1,
                found: "number"
            }
        ));
    }

    #[test]
    fn reports_syntax_errors() {
        let err = records_from_str("[{").unwrap_err();
        assert!(matches!(err, RecordError::Json(_)));
    }

    #[test]
    fn empty_array_is_empty_input() {
        assert!(records_from_str("[]").unwrap().is_empty());
    }

    #[test]
    fn round_trips_to_json() {
        let source = json!({"amount": 30, "region": "East"});
        let records = records_from_json(json!([source.clone()])).unwrap();
        assert_eq!(records[0].to_json(), source);
    }
}
