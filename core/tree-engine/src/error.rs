//! FILENAME: core/tree-engine/src/error.rs

use thiserror::Error;

use records::RecordError;

use crate::definition::AggregateError;
use crate::view::NodeId;

#[derive(Error, Debug)]
pub enum TreeError {
    #[error("invalid tree configuration: {0}")]
    Configuration(String),

    #[error("invalid input: {0}")]
    Input(#[from] RecordError),

    #[error("aggregation failed for group '{group}': {source}")]
    Aggregation {
        group: String,
        #[source]
        source: AggregateError,
    },

    #[error("aggregate row for group '{group}' has no '{field}' identifier")]
    MissingIdentifier { group: String, field: String },

    #[error("duplicate aggregate row identifier '{0}'")]
    DuplicateIdentifier(NodeId),

    #[error("broken linkage at node {index}: {reason}")]
    Linkage { index: usize, reason: String },
}

impl TreeError {
    /// The error raised by a caller-supplied aggregator or child generator,
    /// if that is what failed.
    pub fn strategy_error(&self) -> Option<&(dyn std::error::Error + Send + Sync + 'static)> {
        match self {
            TreeError::Aggregation { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}
