//! Field overrides for artifact updates

use crate::{ArtifactError, ArtifactResult, ArtifactType, Metadata};
use serde_json::{Map, Value};

/// Update payload for artifacts. `None` leaves a field as it is.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArtifactUpdate {
    pub artifact_type: Option<ArtifactType>,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub status: Option<String>,
    pub metadata: Option<Metadata>,
    pub flagged: Option<bool>,
}

impl ArtifactUpdate {
    /// Build an update from an untyped field map.
    ///
    /// Unknown names fail with `UnknownField`; `id` and `created_at` fail
    /// with `ImmutableField`. A `null` value counts as "not given".
    pub fn from_fields(fields: &Map<String, Value>) -> ArtifactResult<Self> {
        let mut update = Self::default();

        for (name, value) in fields {
            if value.is_null() {
                continue;
            }
            match name.as_str() {
                "type" => {
                    update.artifact_type = Some(ArtifactType::new(expect_string(name, value)?)?)
                }
                "summary" => update.summary = Some(expect_string(name, value)?),
                "description" => update.description = Some(expect_string(name, value)?),
                "category" => update.category = Some(expect_string(name, value)?),
                "status" => update.status = Some(expect_string(name, value)?),
                "flagged" => {
                    update.flagged = Some(value.as_bool().ok_or_else(|| {
                        ArtifactError::InvalidValue {
                            field: name.clone(),
                            reason: "expected a boolean".to_string(),
                        }
                    })?)
                }
                "metadata" => {
                    let map = value.as_object().ok_or_else(|| ArtifactError::InvalidValue {
                        field: name.clone(),
                        reason: "expected a mapping".to_string(),
                    })?;
                    update.metadata = Some(map.clone());
                }
                "id" | "artifact_id" | "created_at" => {
                    return Err(ArtifactError::ImmutableField {
                        field: name.clone(),
                    })
                }
                _ => {
                    return Err(ArtifactError::UnknownField {
                        field: name.clone(),
                    })
                }
            }
        }

        Ok(update)
    }

    /// True when no field would change.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

fn expect_string(field: &str, value: &Value) -> ArtifactResult<String> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| ArtifactError::InvalidValue {
            field: field.to_string(),
            reason: "expected a string".to_string(),
        })
}
