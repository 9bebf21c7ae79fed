//! Fuzz test for untyped field updates
//!
//! Interprets the input as a JSON object of field overrides and applies it
//! to a fixed artifact. A rejected update must leave the artifact
//! untouched; an accepted one must keep the id and `created_at`.
//!
//! Run with: cargo +nightly fuzz run update_fuzz -- -max_total_time=60

#![no_main]

use iflow_core::{Artifact, ArtifactType};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(serde_json::Value::Object(fields)) = serde_json::from_slice(data) else {
        return;
    };

    let original = Artifact::new(ArtifactType::task(), "fuzz target").expect("valid artifact");
    let mut artifact = original.clone();

    match artifact.update_fields(&fields) {
        Ok(()) => {
            assert_eq!(artifact.id(), original.id());
            assert_eq!(artifact.created_at(), original.created_at());
            assert!(artifact.updated_at() >= artifact.created_at());
        }
        Err(_) => assert_eq!(artifact, original),
    }
});
