//! Error types for the versioned store.

use crate::config::ConfigError;
use iflow_core::{ArtifactError, ArtifactId};
use std::path::PathBuf;
use thiserror::Error;

/// Why a single artifact file could not be turned into an `Artifact`.
#[derive(Debug, Error)]
pub enum ReadFailure {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Parse(#[from] ArtifactError),
}

/// Versioned store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Repository at {} is corrupt: {reason}", .path.display())]
    RepositoryCorrupt { path: PathBuf, reason: String },

    #[error("Failed to open repository at {}: {source}", .path.display())]
    Repository {
        path: PathBuf,
        #[source]
        source: git2::Error,
    },

    #[error("Failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Commit failed ({message}): {source}")]
    Commit {
        message: String,
        #[source]
        source: git2::Error,
    },

    #[error("Artifact not found: {id}")]
    NotFound { id: ArtifactId },

    #[error("Failed to read artifact {id}: {source}")]
    Read {
        id: ArtifactId,
        #[source]
        source: ReadFailure,
    },

    #[error("No artifact ids left (maximum {max})")]
    IdSpaceExhausted { max: u32 },

    #[error("Git error: {0}")]
    Git(#[from] git2::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Artifact error: {0}")]
    Model(#[from] ArtifactError),
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_display() {
        let err = StoreError::NotFound {
            id: ArtifactId::from_number(7).unwrap(),
        };
        assert_eq!(err.to_string(), "Artifact not found: 00007");
    }

    #[test]
    fn test_read_failure_keeps_source() {
        let err = StoreError::Read {
            id: ArtifactId::from_number(3).unwrap(),
            source: ReadFailure::Parse(ArtifactError::MalformedArtifact {
                reason: "missing field 'summary'".to_string(),
            }),
        };
        let source = std::error::Error::source(&err).map(|s| s.to_string());
        assert!(err.to_string().starts_with("Failed to read artifact 00003"));
        assert!(source.unwrap_or_default().contains("summary"));
    }

    #[test]
    fn test_model_error_converts() {
        let err: StoreError = ArtifactError::InvalidId {
            value: "x".to_string(),
            reason: "not a number".to_string(),
        }
        .into();
        assert!(matches!(err, StoreError::Model(_)));
    }
}
