//! Fuzz test for the artifact text codec
//!
//! Feeds arbitrary bytes to `Artifact::from_text`. Parsing must never
//! panic, and anything it accepts must serialize and parse again with the
//! timestamp ordering intact.
//!
//! Run with: cargo +nightly fuzz run document_fuzz -- -max_total_time=60

#![no_main]

use iflow_core::Artifact;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        if let Ok(artifact) = Artifact::from_text(input) {
            assert!(
                artifact.updated_at() >= artifact.created_at(),
                "parsed artifact has updated_at before created_at"
            );
            assert!(!artifact.summary().trim().is_empty(), "parsed artifact has empty summary");

            let text = artifact.to_text().expect("accepted artifact must serialize");
            let reparsed = Artifact::from_text(&text).expect("serialized artifact must parse");
            assert_eq!(reparsed.id(), artifact.id());
            assert_eq!(reparsed.created_at(), artifact.created_at());
        }
    }
});
