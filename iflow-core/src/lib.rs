//! iflow Core - Artifact Model
//!
//! The record type stored by the versioned artifact store, plus its
//! document/text codec. Pure data transformation: no I/O, no git.

pub mod artifact;
pub mod artifact_type;
pub mod document;
pub mod error;
pub mod identity;
pub mod payload;
pub mod update;

pub use artifact::{Artifact, DEFAULT_STATUS};
pub use artifact_type::ArtifactType;
pub use document::{ArtifactBody, ArtifactDocument};
pub use error::{ArtifactError, ArtifactResult};
pub use identity::{
    format_timestamp, now_timestamp, parse_timestamp, ArtifactId, Timestamp, ID_WIDTH,
    MAX_ARTIFACT_NUMBER,
};
pub use payload::{ArtifactResponse, CreateArtifactRequest};
pub use update::ArtifactUpdate;

/// Open extension fields: string keys to loosely-typed values.
pub type Metadata = serde_json::Map<String, serde_json::Value>;

// ============================================================================
// PROPERTY-BASED TESTS
// ============================================================================
