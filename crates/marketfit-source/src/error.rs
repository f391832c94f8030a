//! Source error types.

use crate::relation::Relation;
use thiserror::Error;

/// Errors that can occur while loading source relations.
#[derive(Error, Debug)]
pub enum SourceError {
    /// A required relation is missing or unreadable. Aborts the run.
    #[error("Data unavailable for '{relation}': {message}")]
    DataUnavailable { relation: Relation, message: String },

    /// Failed to open the underlying store.
    #[error("Connection failed: {message}")]
    ConnectionFailed { message: String },

    /// A value could not be decoded into the entity's field type.
    #[error("Invalid value in {relation}.{column}: {message}")]
    InvalidValue {
        relation: Relation,
        column: String,
        message: String,
    },

    /// Generic source error.
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl SourceError {
    /// Create a data unavailable error.
    pub fn data_unavailable(relation: Relation, message: impl Into<String>) -> Self {
        Self::DataUnavailable {
            relation,
            message: message.into(),
        }
    }

    /// Create a connection failed error.
    pub fn connection_failed(message: impl Into<String>) -> Self {
        Self::ConnectionFailed {
            message: message.into(),
        }
    }

    /// Create an invalid value error.
    pub fn invalid_value(
        relation: Relation,
        column: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::InvalidValue {
            relation,
            column: column.into(),
            message: message.into(),
        }
    }

    /// Whether this error means a relation could not be read at all.
    pub fn is_data_unavailable(&self) -> bool {
        matches!(self, Self::DataUnavailable { .. })
    }
}
