//! FILENAME: core/records/src/lib.rs
//! PURPOSE: Record model for the tree aggregation engine.
//! CONTEXT: Holds the types every other crate shares: field values, records,
//! hashable group keys and the JSON ingestion boundary.

pub mod error;
pub mod json;
pub mod key;
pub mod record;
pub mod value;

// Re-export commonly used types at the crate root
pub use error::RecordError;
pub use json::{records_from_json, records_from_str};
pub use key::{GroupKey, OrderedFloat};
pub use record::Record;
pub use value::FieldValue;
