//! iflow Storage - Git-Backed Versioned Artifact Store
//!
//! Persists `iflow_core::Artifact` values as one YAML file each inside a
//! git working tree and commits every mutation, so the repository log is
//! the full history of every artifact.

pub mod commit;
pub mod config;
pub mod error;
mod repo;
pub mod store;

pub use commit::{ArtifactScan, CommitInfo, ScanFailure, StoreStats};
pub use config::{CommitAuthor, ConfigError, StoreConfig};
pub use error::{ReadFailure, StoreError, StoreResult};
pub use store::{ArtifactStore, VersionedStore};

// ============================================================================
// PROPERTY-BASED TESTS
// ============================================================================
