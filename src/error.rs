use std::path::PathBuf;
use thiserror::Error;

use crate::validation::ValidationReport;

/// The main error type for labelstate operations.
#[derive(Debug, Error)]
pub enum LabelstateError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse results JSON from {path}: {source}")]
    ResultsParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to serialize results JSON: {0}")]
    ResultsWrite(#[source] serde_json::Error),

    /// A wire entry addressed a target node that does not exist in the
    /// current tag tree. The whole load must be treated as failed.
    #[error("No node named '{name}' to apply result to")]
    NoTargetNode { name: String },

    /// A wire entry named a source (control) node that does not exist in
    /// the current tag tree.
    #[error("No source node named '{name}' for result")]
    NoSourceNode { name: String },

    /// A wire entry referenced a persisted region id that was not
    /// reconstructed from the same payload.
    #[error("Region reference '{id}' does not resolve to a region")]
    UnknownRegionRef { id: String },

    /// A region-bearing entry carried a value payload that does not match
    /// its declared type tag.
    #[error("Malformed '{result_type}' value: {source}")]
    MalformedValue {
        result_type: String,
        #[source]
        source: serde_json::Error,
    },

    /// A region-bearing entry carried a type tag the engine does not know.
    #[error("Unsupported result type: {0}")]
    UnsupportedResultType(String),

    #[error("No annotation with id {0}")]
    UnknownAnnotation(u64),

    #[error("Validation failed with {error_count} error(s) and {warning_count} warning(s)")]
    ValidationFailed {
        error_count: usize,
        warning_count: usize,
        report: ValidationReport,
    },
}
