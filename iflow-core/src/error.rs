//! Error types for artifact model operations

use thiserror::Error;

/// Errors raised while building, parsing, or updating an artifact.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ArtifactError {
    #[error("Malformed artifact: {reason}")]
    MalformedArtifact { reason: String },

    #[error("Invalid timestamp for {field}: {value:?} ({reason})")]
    DateParse {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Unknown artifact field: {field}")]
    UnknownField { field: String },

    #[error("Field {field} cannot be changed after creation")]
    ImmutableField { field: String },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Invalid artifact id {value:?}: {reason}")]
    InvalidId { value: String, reason: String },

    #[error("Serialization failed: {reason}")]
    Serialization { reason: String },
}

impl ArtifactError {
    pub(crate) fn missing(field: &str) -> Self {
        ArtifactError::MalformedArtifact {
            reason: format!("required field `{}` is missing", field),
        }
    }

    pub(crate) fn empty(field: &str) -> Self {
        ArtifactError::MalformedArtifact {
            reason: format!("required field `{}` is empty", field),
        }
    }
}

/// Result type alias for artifact model operations.
pub type ArtifactResult<T> = Result<T, ArtifactError>;

// =============================================================================
// TESTS
// =============================================================================
