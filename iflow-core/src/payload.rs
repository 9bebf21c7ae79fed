//! Request and response shapes for callers outside the store.
//!
//! These carry plain data only: ids and types as strings, timestamps as
//! ISO-8601 strings.

use crate::{format_timestamp, Artifact, ArtifactError, ArtifactId, ArtifactResult, ArtifactType, Metadata};
use serde::{Deserialize, Serialize};

/// Untyped creation payload: `{type, summary, description?, id?}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateArtifactRequest {
    #[serde(rename = "type")]
    pub artifact_type: String,
    pub summary: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, alias = "artifact_id")]
    pub id: Option<String>,
}

impl CreateArtifactRequest {
    /// Decode a request from a JSON value.
    pub fn from_value(value: serde_json::Value) -> ArtifactResult<Self> {
        serde_json::from_value(value).map_err(|e| ArtifactError::MalformedArtifact {
            reason: e.to_string(),
        })
    }

    /// Validate and build the in-memory artifact. Without an id the result
    /// carries the placeholder and the store allocates one on save.
    pub fn into_artifact(self) -> ArtifactResult<Artifact> {
        let artifact_type = ArtifactType::new(self.artifact_type)?;
        let mut artifact = Artifact::new(artifact_type, self.summary)?;
        if let Some(description) = self.description {
            artifact = artifact.with_description(description);
        }
        if let Some(id) = self.id.filter(|id| !id.trim().is_empty()) {
            artifact = artifact.with_id(ArtifactId::parse(&id)?);
        }
        Ok(artifact)
    }
}

/// Outward representation of an artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactResponse {
    pub artifact_id: String,
    #[serde(rename = "type")]
    pub artifact_type: String,
    pub summary: String,
    pub description: String,
    pub category: String,
    pub status: String,
    pub flagged: bool,
    pub created_at: String,
    pub updated_at: String,
    pub metadata: Metadata,
}

impl From<&Artifact> for ArtifactResponse {
    fn from(artifact: &Artifact) -> Self {
        Self {
            artifact_id: artifact.id().to_string(),
            artifact_type: artifact.artifact_type().to_string(),
            summary: artifact.summary().to_string(),
            description: artifact.description().to_string(),
            category: artifact.category().to_string(),
            status: artifact.status().to_string(),
            flagged: artifact.flagged(),
            created_at: format_timestamp(&artifact.created_at()),
            updated_at: format_timestamp(&artifact.updated_at()),
            metadata: artifact.metadata().clone(),
        }
    }
}

impl From<Artifact> for ArtifactResponse {
    fn from(artifact: Artifact) -> Self {
        Self::from(&artifact)
    }
}
