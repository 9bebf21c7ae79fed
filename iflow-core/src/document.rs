//! Structured document and text codec for artifacts.
//!
//! The text form is block-style YAML with keys in declaration order. It is
//! exactly what gets committed, so a change to one field shows up as a
//! one-line diff.

use crate::artifact::validate_summary;
use crate::{
    format_timestamp, parse_timestamp, Artifact, ArtifactError, ArtifactId, ArtifactResult,
    ArtifactType, Metadata, DEFAULT_STATUS,
};
use serde::{Deserialize, Serialize};

/// Top-level document: `{ artifact: { ... } }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactDocument {
    pub artifact: ArtifactBody,
}

/// Field block of an artifact document.
///
/// Every field is optional on the way in so that missing values surface
/// as `MalformedArtifact` naming the field rather than as a bare serde
/// message. On the way out every field is written.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ArtifactBody {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(rename = "type", default)]
    pub artifact_type: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub metadata: Option<Metadata>,
    #[serde(default)]
    pub flagged: Option<bool>,
}

impl Artifact {
    /// Structured representation with full field coverage.
    pub fn to_document(&self) -> ArtifactDocument {
        ArtifactDocument {
            artifact: ArtifactBody {
                id: Some(self.id().to_string()),
                artifact_type: Some(self.artifact_type().to_string()),
                summary: Some(self.summary().to_string()),
                description: Some(self.description().to_string()),
                category: Some(self.category().to_string()),
                status: Some(self.status().to_string()),
                created_at: Some(format_timestamp(&self.created_at())),
                updated_at: Some(format_timestamp(&self.updated_at())),
                metadata: Some(self.metadata().clone()),
                flagged: Some(self.flagged()),
            },
        }
    }

    /// Render the committed text form.
    pub fn to_text(&self) -> ArtifactResult<String> {
        serde_yaml::to_string(&self.to_document()).map_err(|e| ArtifactError::Serialization {
            reason: e.to_string(),
        })
    }

    /// Rebuild an artifact from its structured representation.
    pub fn from_document(doc: ArtifactDocument) -> ArtifactResult<Self> {
        let body = doc.artifact;

        let id = body.id.ok_or_else(|| ArtifactError::missing("id"))?;
        let id = ArtifactId::parse(&id).map_err(|e| ArtifactError::MalformedArtifact {
            reason: e.to_string(),
        })?;

        let artifact_type = body
            .artifact_type
            .ok_or_else(|| ArtifactError::missing("type"))?;
        let artifact_type =
            ArtifactType::new(artifact_type).map_err(|_| ArtifactError::empty("type"))?;

        let summary = body.summary.ok_or_else(|| ArtifactError::missing("summary"))?;
        validate_summary(&summary).map_err(|_| ArtifactError::empty("summary"))?;

        let created_at = body
            .created_at
            .ok_or_else(|| ArtifactError::missing("created_at"))?;
        let created_at = parse_timestamp("created_at", &created_at)?;
        let updated_at = body
            .updated_at
            .ok_or_else(|| ArtifactError::missing("updated_at"))?;
        let updated_at = parse_timestamp("updated_at", &updated_at)?;
        // Hand-edited files may carry an earlier updated_at; clamp rather than reject.
        let updated_at = updated_at.max(created_at);

        Artifact::new(artifact_type, summary)?
            .with_id(id)
            .with_description(body.description.unwrap_or_default())
            .with_category(body.category.unwrap_or_default())
            .with_status(body.status.unwrap_or_else(|| DEFAULT_STATUS.to_string()))
            .with_metadata(body.metadata.unwrap_or_default())
            .with_flagged(body.flagged.unwrap_or(false))
            .with_timestamps(created_at, updated_at)
    }

    /// Parse the committed text form.
    pub fn from_text(text: &str) -> ArtifactResult<Self> {
        let doc: ArtifactDocument =
            serde_yaml::from_str(text).map_err(|e| ArtifactError::MalformedArtifact {
                reason: e.to_string(),
            })?;
        Self::from_document(doc)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Artifact {
        let mut metadata = Metadata::new();
        metadata.insert("points".to_string(), json!(5));
        metadata.insert("labels".to_string(), json!(["auth", "ui"]));
        Artifact::new(ArtifactType::requirement(), "User Login")
            .unwrap()
            .with_id(ArtifactId::from_number(1).unwrap())
            .with_description("Users sign in\nwith email and password")
            .with_category("security")
            .with_metadata(metadata)
            .with_flagged(true)
    }

    #[test]
    fn test_text_round_trip() {
        let a = sample();
        let text = a.to_text().unwrap();
        assert_eq!(Artifact::from_text(&text).unwrap(), a);
    }

    #[test]
    fn test_text_is_block_style_in_field_order() {
        let text = sample().to_text().unwrap();
        let keys: Vec<&str> = text
            .lines()
            .filter(|l| l.starts_with("  ") && !l.starts_with("   "))
            .filter_map(|l| l.trim().split(':').next())
            .collect();
        assert_eq!(
            keys,
            vec![
                "id",
                "type",
                "summary",
                "description",
                "category",
                "status",
                "created_at",
                "updated_at",
                "metadata",
                "flagged"
            ]
        );
        assert!(text.starts_with("artifact:\n"));
        assert!(!text.contains('['), "collections must be block style: {text}");
    }

    #[test]
    fn test_single_field_change_is_single_line_diff() {
        let a = sample();
        let mut b = a.clone();
        b.update(crate::ArtifactUpdate {
            status: Some("done".to_string()),
            ..Default::default()
        })
        .unwrap();
        let b = b.with_timestamps(a.created_at(), a.updated_at()).unwrap();

        let ta = a.to_text().unwrap();
        let tb = b.to_text().unwrap();
        let changed = ta.lines().zip(tb.lines()).filter(|(x, y)| x != y).count();
        assert_eq!(changed, 1);
        assert_eq!(ta.lines().count(), tb.lines().count());
    }

    #[test]
    fn test_missing_required_fields() {
        for field in ["id", "type", "summary"] {
            let mut doc = sample().to_document();
            match field {
                "id" => doc.artifact.id = None,
                "type" => doc.artifact.artifact_type = None,
                _ => doc.artifact.summary = None,
            }
            match Artifact::from_document(doc) {
                Err(ArtifactError::MalformedArtifact { reason }) => {
                    assert!(reason.contains(field), "{reason}")
                }
                other => panic!("expected MalformedArtifact for {field}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_bad_timestamp_is_date_parse_error() {
        let mut doc = sample().to_document();
        doc.artifact.created_at = Some("last tuesday".to_string());
        assert!(matches!(
            Artifact::from_document(doc),
            Err(ArtifactError::DateParse { .. })
        ));
    }

    #[test]
    fn test_optional_fields_default() {
        let text = "artifact:\n  id: '00009'\n  type: bug\n  summary: Crash on save\n  created_at: '2024-01-02T03:04:05'\n  updated_at: '2024-01-02T03:04:05'\n";
        let a = Artifact::from_text(text).unwrap();
        assert_eq!(a.id(), "00009");
        assert_eq!(a.artifact_type(), "bug");
        assert_eq!(a.status(), DEFAULT_STATUS);
        assert_eq!(a.description(), "");
        assert!(!a.flagged());
        assert!(a.metadata().is_empty());
    }

    #[test]
    fn test_reads_files_written_without_flag() {
        // Older records predate the `flagged` field and have no fractional seconds.
        let text = "artifact:\n  id: '00002'\n  type: task\n  summary: Write docs\n  description: ''\n  category: ''\n  status: open\n  created_at: '2024-05-01T10:00:00.250000'\n  updated_at: '2024-05-01T11:00:00'\n  metadata: {}\n";
        let a = Artifact::from_text(text).unwrap();
        assert!(!a.flagged());
        assert!(a.updated_at() > a.created_at());
    }

    #[test]
    fn test_invalid_syntax_is_malformed() {
        assert!(matches!(
            Artifact::from_text("artifact: [unclosed"),
            Err(ArtifactError::MalformedArtifact { .. })
        ));
        assert!(matches!(
            Artifact::from_text("just a string"),
            Err(ArtifactError::MalformedArtifact { .. })
        ));
    }

    const YAML_SPECIAL: &[&str] = &[
        "null", "Null", "~", "yes", "no", "on", "off", "true", "False", "y", "- x", "key: v",
        "? q", "# not a comment", "&anchor", "*alias", "!tag", "|", ">", "'single'",
        "\"double\"", "{a: 1}", "[1, 2]", "00042", "0x1F", "1e3", ".inf", "-.5", "2024-01-01",
        "---", "...", "  leading", "trailing  ", "tab\there", "ends with newline\n",
        "crlf\r\nlines", "line\u{2028}separator", "\n", "%YAML",
    ];

    #[test]
    fn test_yaml_special_strings_round_trip() {
        for &text in YAML_SPECIAL {
            let a = Artifact::new(ArtifactType::task(), format!("{text} x"))
                .unwrap()
                .with_id(ArtifactId::from_number(3).unwrap())
                .with_description(text)
                .with_category(text)
                .with_status(text);
            let parsed = Artifact::from_text(&a.to_text().unwrap()).unwrap();
            assert_eq!(parsed, a, "{text:?}");
        }
    }

    #[test]
    fn test_metadata_shapes_round_trip() {
        let shapes = [
            json!(null),
            json!(1.5),
            json!(-0.25),
            json!(3.0),
            json!(i64::MIN),
            json!(u64::MAX),
            json!([]),
            json!({}),
            json!([1, "two", null, [true]]),
            json!({"nested": {"deeper": ["x", {"k": "null"}]}}),
            json!("~"),
            json!("multi\nline\n"),
        ];
        for value in shapes {
            let mut metadata = Metadata::new();
            metadata.insert("value".to_string(), value.clone());
            metadata.insert("- key: odd".to_string(), json!(true));
            let a = sample().with_metadata(metadata);
            let parsed = Artifact::from_text(&a.to_text().unwrap()).unwrap();
            assert_eq!(parsed, a, "{value}");
        }
    }
}
