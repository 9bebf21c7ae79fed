//! The artifact record

use crate::{
    now_timestamp, ArtifactError, ArtifactId, ArtifactResult, ArtifactType, ArtifactUpdate,
    Metadata, Timestamp,
};
use std::fmt;

/// Status given to artifacts that do not specify one.
pub const DEFAULT_STATUS: &str = "open";

/// A single versioned project record.
///
/// Fields are private so the invariants hold for every value in
/// circulation: the id never changes once allocated, and `updated_at` is
/// never earlier than `created_at`.
#[derive(Debug, Clone, PartialEq)]
pub struct Artifact {
    id: ArtifactId,
    artifact_type: ArtifactType,
    summary: String,
    description: String,
    category: String,
    status: String,
    created_at: Timestamp,
    updated_at: Timestamp,
    metadata: Metadata,
    flagged: bool,
}

impl Artifact {
    /// Create an unsaved artifact carrying the placeholder id.
    pub fn new(artifact_type: ArtifactType, summary: impl Into<String>) -> ArtifactResult<Self> {
        let summary = summary.into();
        validate_summary(&summary)?;
        let now = now_timestamp();
        Ok(Self {
            id: ArtifactId::placeholder(),
            artifact_type,
            summary,
            description: String::new(),
            category: String::new(),
            status: DEFAULT_STATUS.to_string(),
            created_at: now,
            updated_at: now,
            metadata: Metadata::new(),
            flagged: false,
        })
    }

    pub fn with_id(mut self, id: ArtifactId) -> Self {
        self.id = id;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = status.into();
        self
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn with_flagged(mut self, flagged: bool) -> Self {
        self.flagged = flagged;
        self
    }

    /// Replace both timestamps, e.g. when importing records.
    pub fn with_timestamps(
        mut self,
        created_at: Timestamp,
        updated_at: Timestamp,
    ) -> ArtifactResult<Self> {
        if updated_at < created_at {
            return Err(ArtifactError::InvalidValue {
                field: "updated_at".to_string(),
                reason: "must not precede created_at".to_string(),
            });
        }
        self.created_at = created_at;
        self.updated_at = updated_at;
        Ok(self)
    }

    /// Give a placeholder artifact its permanent id.
    ///
    /// Fails with `ImmutableField` when the artifact already has a real id.
    pub fn assign_id(&mut self, id: ArtifactId) -> ArtifactResult<()> {
        if !self.id.is_placeholder() && self.id != id {
            return Err(ArtifactError::ImmutableField {
                field: "id".to_string(),
            });
        }
        self.id = id;
        Ok(())
    }

    /// Apply the given overrides and refresh `updated_at`.
    ///
    /// All values are validated before anything is changed, so a rejected
    /// update leaves the artifact untouched.
    pub fn update(&mut self, changes: ArtifactUpdate) -> ArtifactResult<()> {
        if let Some(summary) = &changes.summary {
            validate_summary(summary)?;
        }

        if let Some(artifact_type) = changes.artifact_type {
            self.artifact_type = artifact_type;
        }
        if let Some(summary) = changes.summary {
            self.summary = summary;
        }
        if let Some(description) = changes.description {
            self.description = description;
        }
        if let Some(category) = changes.category {
            self.category = category;
        }
        if let Some(status) = changes.status {
            self.status = status;
        }
        if let Some(metadata) = changes.metadata {
            self.metadata = metadata;
        }
        if let Some(flagged) = changes.flagged {
            self.flagged = flagged;
        }

        self.touch();
        Ok(())
    }

    /// Apply overrides given as an untyped field map.
    pub fn update_fields(&mut self, fields: &serde_json::Map<String, serde_json::Value>) -> ArtifactResult<()> {
        let changes = ArtifactUpdate::from_fields(fields)?;
        self.update(changes)
    }

    /// Refresh `updated_at`, never moving it before `created_at`.
    pub fn touch(&mut self) {
        self.updated_at = now_timestamp().max(self.created_at);
    }

    pub fn id(&self) -> &ArtifactId {
        &self.id
    }

    pub fn artifact_type(&self) -> &ArtifactType {
        &self.artifact_type
    }

    pub fn summary(&self) -> &str {
        &self.summary
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    pub fn updated_at(&self) -> Timestamp {
        self.updated_at
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn flagged(&self) -> bool {
        self.flagged
    }

    /// Case-insensitive substring match against summary or description.
    pub fn matches_text(&self, query: &str) -> bool {
        let needle = query.to_lowercase();
        self.summary.to_lowercase().contains(&needle)
            || self.description.to_lowercase().contains(&needle)
    }
}

impl fmt::Display for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} (ID: {})", self.artifact_type, self.summary, self.id)
    }
}

pub(crate) fn validate_summary(summary: &str) -> ArtifactResult<()> {
    if summary.trim().is_empty() {
        return Err(ArtifactError::InvalidValue {
            field: "summary".to_string(),
            reason: "must not be empty".to_string(),
        });
    }
    Ok(())
}

// ============================================================================
// TESTS
// ============================================================================
