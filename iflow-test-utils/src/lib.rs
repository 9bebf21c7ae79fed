//! iflow Test Utilities
//!
//! Shared test infrastructure for the iflow workspace:
//! - Proptest generators for artifacts and their parts
//! - Fixtures for common scenarios
//! - Assertions for artifact-specific invariants

pub use iflow_core::{
    Artifact, ArtifactError, ArtifactId, ArtifactResult, ArtifactType, Metadata, Timestamp,
    MAX_ARTIFACT_NUMBER,
};

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for generating artifact values.

    use super::*;
    use proptest::prelude::*;

    /// Generate a persisted (non-placeholder) ArtifactId.
    pub fn arb_artifact_id() -> impl Strategy<Value = ArtifactId> {
        (1u32..=MAX_ARTIFACT_NUMBER).prop_map(|n| {
            ArtifactId::from_number(n).unwrap_or_else(|_| ArtifactId::placeholder())
        })
    }

    /// Generate a Timestamp between 2020 and 2030 with microsecond precision.
    pub fn arb_timestamp() -> impl Strategy<Value = Timestamp> {
        (1_577_836_800i64..1_893_456_000i64, 0u32..1_000_000u32).prop_map(|(secs, micros)| {
            chrono::DateTime::from_timestamp(secs, micros * 1_000)
                .map(|dt| dt.naive_utc())
                .unwrap_or_default()
        })
    }

    /// Generate one of the well-known artifact types.
    pub fn arb_artifact_type() -> impl Strategy<Value = ArtifactType> {
        prop_oneof![
            Just(ArtifactType::requirement()),
            Just(ArtifactType::task()),
            Just(ArtifactType::test_case()),
            Just(ArtifactType::issue()),
            Just(ArtifactType::bug()),
            Just(ArtifactType::feature()),
            Just(ArtifactType::story()),
            Just(ArtifactType::aspect()),
        ]
    }

    /// Generate a summary with at least one letter, so it is never blank.
    pub fn arb_summary() -> impl Strategy<Value = String> {
        prop_oneof![
            "\\PC{0,20}[A-Za-z]\\PC{0,20}",
            yaml_special_text().prop_map(|s| format!("{s} x")),
        ]
    }

    /// Strings that mean something other than text to a YAML parser.
    pub fn yaml_special_text() -> impl Strategy<Value = String> {
        prop::sample::select(vec![
            "null", "Null", "~", "yes", "no", "on", "off", "true", "False", "y", "n",
            "- x", "key: v", "? q", "# not a comment", "&anchor", "*alias", "!tag", "|", ">",
            "'single'", "\"double\"", "{a: 1}", "[1, 2]", "00042", "0x1F", "1e3", ".inf",
            "-.5", "2024-01-01", "---", "...", "  leading", "trailing  ", "tab\there",
            "line\u{2028}separator", "%YAML",
        ])
        .prop_map(str::to_string)
    }

    /// Generate free text: empty, arbitrary printable, YAML-special, or
    /// several lines (possibly with a trailing newline or CRLF breaks).
    pub fn arb_text() -> impl Strategy<Value = String> {
        prop_oneof![
            Just(String::new()),
            "\\PC*",
            yaml_special_text(),
            (prop::collection::vec("\\PC{0,12}", 1..4), prop_oneof![Just("\n"), Just("\r\n")])
                .prop_map(|(lines, sep)| lines.join(sep)),
            "\\PC{0,12}".prop_map(|s| format!("{s}\n")),
        ]
    }

    /// Generate a description.
    pub fn arb_description() -> impl Strategy<Value = String> {
        arb_text()
    }

    /// Generate a status value: a common one or arbitrary text.
    pub fn arb_status() -> impl Strategy<Value = String> {
        prop_oneof![
            Just("open".to_string()),
            Just("in_progress".to_string()),
            Just("done".to_string()),
            arb_text(),
        ]
    }

    /// Generate a metadata value: scalars of every JSON kind, plus arrays
    /// and nested maps up to a few levels deep.
    pub fn arb_metadata_value() -> impl Strategy<Value = serde_json::Value> {
        let leaf = prop_oneof![
            Just(serde_json::Value::Null),
            any::<bool>().prop_map(serde_json::Value::from),
            any::<i64>().prop_map(serde_json::Value::from),
            (-1.0e9f64..1.0e9f64).prop_map(serde_json::Value::from),
            arb_text().prop_map(serde_json::Value::from),
        ];
        leaf.prop_recursive(3, 16, 4, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..4).prop_map(serde_json::Value::Array),
                prop::collection::btree_map(arb_metadata_key(), inner, 0..4).prop_map(|entries| {
                    serde_json::Value::Object(entries.into_iter().collect())
                }),
            ]
        })
    }

    fn arb_metadata_key() -> impl Strategy<Value = String> {
        prop_oneof!["[a-z_]{1,8}", yaml_special_text()]
    }

    /// Generate a metadata map.
    pub fn arb_metadata() -> impl Strategy<Value = Metadata> {
        prop::collection::btree_map(arb_metadata_key(), arb_metadata_value(), 0..4)
            .prop_map(|entries| entries.into_iter().collect())
    }

    /// Generate an artifact with a real id and consistent timestamps.
    pub fn arb_artifact() -> impl Strategy<Value = Artifact> {
        (arb_artifact_id(), arb_new_artifact()).prop_map(|(id, artifact)| artifact.with_id(id))
    }

    /// Generate an unsaved artifact (placeholder id).
    pub fn arb_new_artifact() -> impl Strategy<Value = Artifact> {
        (
            arb_artifact_type(),
            arb_summary(),
            arb_description(),
            arb_text(),
            arb_status(),
            arb_timestamp(),
            0i64..10_000_000,
            any::<bool>(),
            arb_metadata(),
        )
            .prop_map(
                |(kind, summary, description, category, status, created, delta, flagged, metadata)| {
                    let updated = created + chrono::Duration::microseconds(delta);
                    let artifact = match Artifact::new(kind, summary) {
                        Ok(artifact) => artifact,
                        Err(_) => fixtures::requirement("fallback"),
                    };
                    let artifact = artifact
                        .with_description(description)
                        .with_category(category)
                        .with_status(status)
                        .with_metadata(metadata)
                        .with_flagged(flagged);
                    artifact.clone().with_timestamps(created, updated).unwrap_or(artifact)
                },
            )
    }
}

// ============================================================================
// TEST FIXTURES
// ============================================================================

pub mod fixtures {
    //! Pre-built artifacts for common testing scenarios.

    use super::*;

    fn build(artifact_type: ArtifactType, summary: &str) -> Artifact {
        Artifact::new(artifact_type, summary).unwrap_or_else(|e| panic!("invalid fixture: {e}"))
    }

    /// An unsaved requirement.
    pub fn requirement(summary: &str) -> Artifact {
        build(ArtifactType::requirement(), summary)
    }

    /// An unsaved task.
    pub fn task(summary: &str) -> Artifact {
        build(ArtifactType::task(), summary)
    }

    /// An unsaved bug.
    pub fn bug(summary: &str) -> Artifact {
        build(ArtifactType::bug(), summary)
    }

    /// The "User Login" requirement with a fixed id.
    pub fn user_login() -> Artifact {
        requirement("User Login")
            .with_id(id(1))
            .with_description("Users must be able to log in")
    }

    /// Id from a number, panicking on out-of-range input.
    pub fn id(number: u32) -> ArtifactId {
        ArtifactId::from_number(number).unwrap_or_else(|e| panic!("invalid fixture id: {e}"))
    }

    /// Parse an ISO-8601 timestamp literal.
    pub fn timestamp(value: &str) -> Timestamp {
        iflow_core::parse_timestamp("fixture", value)
            .unwrap_or_else(|e| panic!("invalid fixture timestamp: {e}"))
    }

    /// Set both timestamps to `created`.
    pub fn created_at(artifact: Artifact, created: &str) -> Artifact {
        let ts = timestamp(created);
        artifact
            .with_timestamps(ts, ts)
            .unwrap_or_else(|e| panic!("invalid fixture timestamps: {e}"))
    }

    /// A well-formed artifact file body.
    pub const VALID_DOCUMENT: &str = "\
artifact:
  id: '00007'
  type: task
  summary: Write the release notes
  description: ''
  category: docs
  status: open
  created_at: 2024-03-01T09:30:00
  updated_at: 2024-03-02T10:00:00.250000
  metadata: {}
  flagged: false
";

    /// A file body that is not valid YAML.
    pub const INVALID_SYNTAX: &str = "artifact: [unclosed\n  id: '00009'\n";
}

// ============================================================================
// CUSTOM ASSERTIONS
// ============================================================================

pub mod assertions {
    //! Assertion helpers for artifact-specific invariants.

    use super::*;

    /// Assert that an ArtifactResult is Ok.
    #[track_caller]
    pub fn assert_ok<T: std::fmt::Debug>(result: &ArtifactResult<T>) {
        assert!(result.is_ok(), "Expected Ok, got Err: {:?}", result);
    }

    /// Assert that an ArtifactResult is a MalformedArtifact error.
    #[track_caller]
    pub fn assert_malformed<T: std::fmt::Debug>(result: &ArtifactResult<T>) {
        match result {
            Err(ArtifactError::MalformedArtifact { .. }) => {}
            other => panic!("Expected MalformedArtifact, got: {:?}", other),
        }
    }

    /// Assert that an ArtifactResult is a DateParse error.
    #[track_caller]
    pub fn assert_date_parse<T: std::fmt::Debug>(result: &ArtifactResult<T>) {
        match result {
            Err(ArtifactError::DateParse { .. }) => {}
            other => panic!("Expected DateParse, got: {:?}", other),
        }
    }

    /// Assert that `updated_at` is not before `created_at`.
    #[track_caller]
    pub fn assert_timestamps_ordered(artifact: &Artifact) {
        assert!(
            artifact.updated_at() >= artifact.created_at(),
            "updated_at {} precedes created_at {} for {}",
            artifact.updated_at(),
            artifact.created_at(),
            artifact
        );
    }

    /// Assert that artifacts are sorted by `created_at`, newest first.
    #[track_caller]
    pub fn assert_newest_first(artifacts: &[Artifact]) {
        for pair in artifacts.windows(2) {
            assert!(
                pair[0].created_at() >= pair[1].created_at(),
                "{} (created {}) listed before newer {} (created {})",
                pair[0],
                pair[0].created_at(),
                pair[1],
                pair[1].created_at()
            );
        }
    }

    /// Assert that two artifacts are equal in every field but `updated_at`.
    #[track_caller]
    pub fn assert_same_artifact(actual: &Artifact, expected: &Artifact) {
        assert_eq!(actual.id(), expected.id(), "id");
        assert_eq!(actual.artifact_type(), expected.artifact_type(), "type");
        assert_eq!(actual.summary(), expected.summary(), "summary");
        assert_eq!(actual.description(), expected.description(), "description");
        assert_eq!(actual.category(), expected.category(), "category");
        assert_eq!(actual.status(), expected.status(), "status");
        assert_eq!(actual.created_at(), expected.created_at(), "created_at");
        assert_eq!(actual.metadata(), expected.metadata(), "metadata");
        assert_eq!(actual.flagged(), expected.flagged(), "flagged");
    }

    /// Assert that the ids of `artifacts` are exactly `expected`, in order.
    #[track_caller]
    pub fn assert_ids(artifacts: &[Artifact], expected: &[&str]) {
        let ids: Vec<&str> = artifacts.iter().map(|a| a.id().as_str()).collect();
        assert_eq!(ids, expected);
    }
}

// ============================================================================
// TESTS
// ============================================================================
