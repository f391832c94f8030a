//! Pipeline error types.

use thiserror::Error;

/// Per-group aggregation failures.
///
/// These are attached to the group they occurred in; the other groups of the
/// same aggregation are still computed.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AggregateError {
    /// A ratio or average was requested over a group with no rows.
    #[error("empty group: '{metric}' is undefined over zero rows")]
    EmptyGroup { metric: String },

    /// A row satisfied more than one bucket of a set meant to be exclusive.
    #[error("bucket set '{set}' overlaps: row matched {buckets:?}")]
    BucketOverlap { set: String, buckets: Vec<String> },

    /// A row satisfied no bucket of a set meant to be exhaustive.
    #[error("bucket set '{set}' has a gap: row {row} matched no bucket")]
    BucketGap { set: String, row: usize },
}

/// Errors surfaced by the report catalog.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Unknown report: {name}. Available reports: {available}")]
    UnknownReport { name: String, available: String },

    #[error("Failed to build Arrow batch for report '{report}': {source}")]
    Arrow {
        report: String,
        #[source]
        source: arrow::error::ArrowError,
    },
}
