//! Store Configuration Module
//!
//! Explicit configuration handed to `VersionedStore::open`. Values can be
//! built in code or loaded from environment variables with defaults
//! suitable for a project-local `.iflow` repository.

use iflow_core::MAX_ARTIFACT_NUMBER;
use std::ffi::OsStr;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

/// Identity recorded on every commit the store makes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitAuthor {
    pub name: String,
    pub email: String,
}

impl CommitAuthor {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }
}

/// Configuration for a versioned artifact store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Root of the working tree; the git repository lives here.
    pub root: PathBuf,

    /// Directory, relative to `root`, holding one file per artifact.
    pub artifacts_dir: String,

    /// File extension for artifact files (without the dot).
    pub extension: String,

    /// Commit identity. `None` falls back to the repository's own
    /// `user.name` / `user.email`.
    pub author: Option<CommitAuthor>,

    /// Highest id number the allocator may hand out.
    pub max_artifacts: u32,

    /// Wipe and reinitialise a root that exists but is not a repository.
    /// Destroys data; off unless explicitly enabled.
    pub reinit_on_corruption: bool,
}

pub const DEFAULT_ROOT: &str = ".iflow";
pub const DEFAULT_ARTIFACTS_DIR: &str = "artifacts";
pub const DEFAULT_EXTENSION: &str = "yaml";

impl Default for StoreConfig {
    fn default() -> Self {
        Self::new(DEFAULT_ROOT)
    }
}

impl StoreConfig {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            artifacts_dir: DEFAULT_ARTIFACTS_DIR.to_string(),
            extension: DEFAULT_EXTENSION.to_string(),
            author: None,
            max_artifacts: MAX_ARTIFACT_NUMBER,
            reinit_on_corruption: false,
        }
    }

    /// Create a StoreConfig from environment variables.
    ///
    /// Environment variables:
    /// - `IFLOW_DATABASE`: Repository root (default: `.iflow`)
    /// - `IFLOW_GIT_AUTHOR_NAME` / `IFLOW_GIT_AUTHOR_EMAIL`: Commit identity
    ///   (default: repository git config). The email defaults to empty when
    ///   only the name is set.
    /// - `IFLOW_MAX_ARTIFACTS`: Id allocation ceiling (default: 99999)
    /// - `IFLOW_REINIT_ON_CORRUPTION`: "true" or "false" (default: false)
    pub fn from_env() -> Self {
        let root = std::env::var("IFLOW_DATABASE")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_ROOT.to_string());

        let author = std::env::var("IFLOW_GIT_AUTHOR_NAME")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .map(|name| {
                let email = std::env::var("IFLOW_GIT_AUTHOR_EMAIL").unwrap_or_default();
                CommitAuthor::new(name, email)
            });

        let max_artifacts = std::env::var("IFLOW_MAX_ARTIFACTS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(MAX_ARTIFACT_NUMBER);

        let reinit_on_corruption = std::env::var("IFLOW_REINIT_ON_CORRUPTION")
            .ok()
            .map(|s| s.to_lowercase() == "true" || s == "1")
            .unwrap_or(false);

        Self {
            author,
            max_artifacts,
            reinit_on_corruption,
            ..Self::new(root)
        }
    }

    pub fn with_author(mut self, name: impl Into<String>, email: impl Into<String>) -> Self {
        self.author = Some(CommitAuthor::new(name, email));
        self
    }

    pub fn with_artifacts_dir(mut self, dir: impl Into<String>) -> Self {
        self.artifacts_dir = dir.into();
        self
    }

    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    pub fn with_max_artifacts(mut self, max: u32) -> Self {
        self.max_artifacts = max;
        self
    }

    pub fn with_reinit_on_corruption(mut self, enabled: bool) -> Self {
        self.reinit_on_corruption = enabled;
        self
    }

    /// Absolute-or-relative path of the artifacts directory.
    pub fn artifacts_path(&self) -> PathBuf {
        self.root.join(&self.artifacts_dir)
    }

    /// Check every field; called by `VersionedStore::open`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |field: &str, value: &str, reason: &str| ConfigError::InvalidValue {
            field: field.to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        };

        if self.root.as_os_str().is_empty() {
            return Err(invalid("root", "", "must not be empty"));
        }

        let dir = Path::new(&self.artifacts_dir);
        if self.artifacts_dir.trim().is_empty() {
            return Err(invalid("artifacts_dir", &self.artifacts_dir, "must not be empty"));
        }
        if !dir
            .components()
            .all(|c| matches!(c, Component::Normal(_)))
        {
            return Err(invalid(
                "artifacts_dir",
                &self.artifacts_dir,
                "must be a relative path inside the repository",
            ));
        }
        if dir.components().next().map(|c| c.as_os_str()) == Some(OsStr::new(".git")) {
            return Err(invalid("artifacts_dir", &self.artifacts_dir, "must not be inside .git"));
        }

        if self.extension.is_empty()
            || !self.extension.chars().all(|c| c.is_ascii_alphanumeric())
        {
            return Err(invalid("extension", &self.extension, "must be alphanumeric"));
        }

        if self.max_artifacts == 0 || self.max_artifacts > MAX_ARTIFACT_NUMBER {
            return Err(invalid(
                "max_artifacts",
                &self.max_artifacts.to_string(),
                "must be between 1 and 99999",
            ));
        }

        if let Some(author) = &self.author {
            if author.name.trim().is_empty() {
                return Err(invalid("author.name", &author.name, "must not be empty"));
            }
        }

        Ok(())
    }
}
