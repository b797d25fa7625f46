//! FILENAME: core/records/src/error.rs

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RecordError {
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("expected an array of records, found {found}")]
    NotASequence { found: &'static str },

    #[error("record {index} is not an object (found {found})")]
    NotAnObject { index: usize, found: &'static str },
}
