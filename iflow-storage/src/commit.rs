//! Read-only views over repository history.

use chrono::{DateTime, FixedOffset, Offset, Utc};
use iflow_core::Artifact;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::error::ReadFailure;

/// One commit in the store's history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitInfo {
    pub hash: String,
    pub author: String,
    pub timestamp: DateTime<FixedOffset>,
    pub message: String,
}

impl CommitInfo {
    pub(crate) fn from_commit(commit: &git2::Commit<'_>) -> Self {
        let time = commit.time();
        let offset = FixedOffset::east_opt(time.offset_minutes() * 60).unwrap_or_else(|| Utc.fix());
        let timestamp = DateTime::from_timestamp(time.seconds(), 0)
            .unwrap_or_default()
            .with_timezone(&offset);

        Self {
            hash: commit.id().to_string(),
            author: commit.author().name().unwrap_or("unknown").to_string(),
            timestamp,
            message: commit.message().unwrap_or("").trim().to_string(),
        }
    }

    /// Abbreviated hash for display.
    pub fn short_hash(&self) -> &str {
        &self.hash[..7.min(self.hash.len())]
    }
}

/// Summary counts for the whole store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreStats {
    pub total_artifacts: usize,
    pub by_type: BTreeMap<String, usize>,
    pub total_commits: usize,
    pub last_commit: Option<CommitInfo>,
}

/// An artifact file that could not be loaded during enumeration.
#[derive(Debug)]
pub struct ScanFailure {
    pub path: PathBuf,
    pub error: ReadFailure,
}

/// Result of enumerating the artifacts directory: everything that loaded,
/// plus a record of everything that did not.
#[derive(Debug, Default)]
pub struct ArtifactScan {
    pub artifacts: Vec<Artifact>,
    pub failures: Vec<ScanFailure>,
}

impl ArtifactScan {
    /// Log each failure and keep only the loaded artifacts.
    pub fn into_artifacts(self) -> Vec<Artifact> {
        for failure in &self.failures {
            tracing::warn!(
                path = %failure.path.display(),
                error = %failure.error,
                "Skipping unreadable artifact file"
            );
        }
        self.artifacts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_hash() {
        let info = CommitInfo {
            hash: "0123456789abcdef".to_string(),
            author: "Ada".to_string(),
            timestamp: DateTime::from_timestamp(0, 0)
                .unwrap_or_default()
                .fixed_offset(),
            message: "Add task: x".to_string(),
        };
        assert_eq!(info.short_hash(), "0123456");
    }

    #[test]
    fn test_stats_serialize_by_type_sorted() {
        let mut by_type = BTreeMap::new();
        by_type.insert("task".to_string(), 2);
        by_type.insert("bug".to_string(), 1);
        let stats = StoreStats {
            total_artifacts: 3,
            by_type,
            total_commits: 3,
            last_commit: None,
        };
        let json = serde_json::to_string(&stats).unwrap();
        assert!(json.find("\"bug\"").unwrap() < json.find("\"task\"").unwrap());
        assert!(json.contains("\"last_commit\":null"));
    }

    #[test]
    fn test_commit_info_timestamp_is_rfc3339() {
        let offset = FixedOffset::east_opt(2 * 3600).unwrap();
        let info = CommitInfo {
            hash: "abc".to_string(),
            author: "Ada".to_string(),
            timestamp: DateTime::from_timestamp(1_700_000_000, 0)
                .unwrap()
                .with_timezone(&offset),
            message: "m".to_string(),
        };
        let value = serde_json::to_value(&info).unwrap();
        assert_eq!(value["timestamp"], "2023-11-15T00:13:20+02:00");
    }
}
