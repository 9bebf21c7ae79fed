//! Versioned artifact store.
//!
//! One YAML file per artifact under `<root>/<artifacts_dir>/`, tracked in a
//! git repository rooted at `<root>`. Every successful `save` or `delete`
//! produces exactly one commit; the commit log is the artifact history.

use git2::{Index, Oid, Repository, Signature};
use iflow_core::{Artifact, ArtifactError, ArtifactId};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::commit::{ArtifactScan, CommitInfo, ScanFailure, StoreStats};
use crate::config::StoreConfig;
use crate::error::{ReadFailure, StoreError, StoreResult};
use crate::repo;

// ============================================================================
// STORE TRAIT
// ============================================================================

/// Operations exposed to collaborators (API handlers, tools).
///
/// Ids are accepted as strings so callers can pass padded, unpadded, or
/// legacy `"<type>/<number>"` forms.
pub trait ArtifactStore {
    /// Persist `artifact`, allocating an id first if it carries the
    /// placeholder. Creates or overwrites the file and commits it.
    fn save(&self, artifact: &mut Artifact) -> StoreResult<()>;

    /// Load one artifact. `Ok(None)` when no file exists for `id`.
    fn get(&self, id: &str) -> StoreResult<Option<Artifact>>;

    /// Every readable artifact, newest `created_at` first.
    fn list(&self, type_filter: Option<&str>) -> StoreResult<Vec<Artifact>>;

    /// Like `save`, but the artifact must already exist.
    fn update(&self, artifact: &mut Artifact) -> StoreResult<()>;

    /// Remove the artifact file and commit the removal.
    fn delete(&self, id: &str) -> StoreResult<()>;

    /// Case-insensitive substring search over summary and description.
    fn search(&self, query: &str) -> StoreResult<Vec<Artifact>>;

    /// Commits that touched the artifact's file, most recent first.
    fn history(&self, id: &str) -> StoreResult<Vec<CommitInfo>>;

    fn stats(&self) -> StoreResult<StoreStats>;
}

// ============================================================================
// GIT-BACKED IMPLEMENTATION
// ============================================================================

/// Artifact store backed by a git working tree.
///
/// Single writer: nothing coordinates two stores (or two processes) on the
/// same root.
pub struct VersionedStore {
    config: StoreConfig,
    repo: Repository,
}

impl std::fmt::Debug for VersionedStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VersionedStore")
            .field("root", &self.config.root)
            .finish_non_exhaustive()
    }
}

impl VersionedStore {
    /// Open (or create) the store described by `config`.
    pub fn open(config: StoreConfig) -> StoreResult<Self> {
        config.validate()?;
        let repo = repo::open_or_init(&config)?;
        fs::create_dir_all(config.artifacts_path())?;
        Ok(Self { config, repo })
    }

    /// Open a store at `root` with default settings.
    pub fn open_at(root: impl Into<PathBuf>) -> StoreResult<Self> {
        Self::open(StoreConfig::new(root))
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn root(&self) -> &Path {
        &self.config.root
    }

    /// Whether a file exists for `id`.
    pub fn exists(&self, id: &ArtifactId) -> bool {
        !id.is_placeholder() && self.artifact_path(id).is_file()
    }

    /// On-disk path of the file for `id`.
    pub fn artifact_path(&self, id: &ArtifactId) -> PathBuf {
        self.config
            .artifacts_path()
            .join(format!("{}.{}", id, self.config.extension))
    }

    /// Path relative to the repository root, with forward slashes, as git
    /// index entries expect.
    fn relative_path(&self, id: &ArtifactId) -> PathBuf {
        PathBuf::from(format!(
            "{}/{}.{}",
            self.config.artifacts_dir.trim_end_matches('/'),
            id,
            self.config.extension
        ))
    }

    /// Load every artifact file, keeping per-file failures separate.
    pub fn scan(&self) -> StoreResult<ArtifactScan> {
        let mut scan = ArtifactScan::default();
        let dir = self.config.artifacts_path();
        if !dir.is_dir() {
            return Ok(scan);
        }

        for entry in fs::read_dir(&dir)? {
            let path = entry?.path();
            if !self.is_artifact_file(&path) {
                continue;
            }
            match read_artifact(&path) {
                Ok(artifact) => scan.artifacts.push(artifact),
                Err(error) => scan.failures.push(ScanFailure { path, error }),
            }
        }

        sort_newest_first(&mut scan.artifacts);
        Ok(scan)
    }

    /// Next free id: highest numeric file stem plus one.
    pub fn next_id(&self) -> StoreResult<ArtifactId> {
        let mut highest = 0u32;
        let dir = self.config.artifacts_path();
        if dir.is_dir() {
            for entry in fs::read_dir(&dir)? {
                let path = entry?.path();
                if !self.is_artifact_file(&path) {
                    continue;
                }
                if let Some(number) = path
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .filter(|s| !s.is_empty() && s.len() <= iflow_core::ID_WIDTH)
                    .filter(|s| s.bytes().all(|b| b.is_ascii_digit()))
                    .and_then(|s| s.parse::<u32>().ok())
                {
                    highest = highest.max(number);
                }
            }
        }

        let next = highest + 1;
        if next > self.config.max_artifacts {
            return Err(StoreError::IdSpaceExhausted {
                max: self.config.max_artifacts,
            });
        }
        Ok(ArtifactId::from_number(next)?)
    }

    fn is_artifact_file(&self, path: &Path) -> bool {
        path.is_file()
            && path.extension().and_then(|e| e.to_str()) == Some(self.config.extension.as_str())
    }

    fn signature(&self) -> StoreResult<Signature<'static>> {
        repo::signature(&self.repo, self.config.author.as_ref()).map_err(|source| {
            StoreError::Commit {
                message: "no commit identity configured".to_string(),
                source,
            }
        })
    }

    /// Apply `stage` to the index and commit the result on top of HEAD.
    fn commit_change(
        &self,
        sig: &Signature<'_>,
        message: &str,
        stage: impl FnOnce(&mut Index) -> Result<(), git2::Error>,
    ) -> StoreResult<Oid> {
        self.repo
            .index()
            .and_then(|mut index| {
                stage(&mut index)?;
                repo::commit_index(&self.repo, &mut index, sig, message)
            })
            .map_err(|source| StoreError::Commit {
                message: message.to_string(),
                source,
            })
    }

    fn write_and_commit(&self, artifact: &Artifact) -> StoreResult<()> {
        let id = artifact.id();
        let path = self.artifact_path(id);
        let existed = path.exists();
        let text = artifact.to_text()?;

        let sig = self.signature()?;

        fs::create_dir_all(self.config.artifacts_path())?;
        write_synced(&path, &text).map_err(|source| StoreError::Write {
            path: path.clone(),
            source,
        })?;
        if !path.exists() {
            return Err(StoreError::Write {
                path,
                source: std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "file missing after write",
                ),
            });
        }

        let verb = if existed { "Update" } else { "Add" };
        let message = format!("{} {}: {}", verb, artifact.artifact_type(), artifact.summary());
        let rel_path = self.relative_path(id);

        let commit = self.commit_change(&sig, &message, |index| index.add_path(&rel_path))?;

        tracing::debug!(
            artifact_id = %id,
            commit = %commit,
            commit_message = %message,
            "Committed artifact"
        );
        Ok(())
    }
}

impl ArtifactStore for VersionedStore {
    fn save(&self, artifact: &mut Artifact) -> StoreResult<()> {
        if artifact.id().is_placeholder() {
            let id = self.next_id()?;
            artifact.assign_id(id)?;
        }
        self.write_and_commit(artifact)
    }

    fn get(&self, id: &str) -> StoreResult<Option<Artifact>> {
        let id = ArtifactId::parse(id)?;
        if !self.exists(&id) {
            return Ok(None);
        }
        read_artifact(&self.artifact_path(&id))
            .map(Some)
            .map_err(|source| StoreError::Read { id, source })
    }

    fn list(&self, type_filter: Option<&str>) -> StoreResult<Vec<Artifact>> {
        let mut artifacts = self.scan()?.into_artifacts();
        if let Some(wanted) = type_filter {
            artifacts.retain(|a| a.artifact_type() == wanted);
        }
        Ok(artifacts)
    }

    fn update(&self, artifact: &mut Artifact) -> StoreResult<()> {
        if !self.exists(artifact.id()) {
            return Err(StoreError::NotFound {
                id: artifact.id().clone(),
            });
        }
        self.write_and_commit(artifact)
    }

    fn delete(&self, id: &str) -> StoreResult<()> {
        let id = ArtifactId::parse(id)?;
        if !self.exists(&id) {
            return Err(StoreError::NotFound { id });
        }

        let sig = self.signature()?;

        let path = self.artifact_path(&id);
        let rel_path = self.relative_path(&id);
        let committed = repo::tracked_at_head(&self.repo, &rel_path)?;

        fs::remove_file(&path).map_err(|source| StoreError::Write {
            path: path.clone(),
            source,
        })?;

        // Left behind by a crash between write and commit: history has
        // nothing to record, so drop any staged entry without committing.
        if !committed {
            let mut index = self.repo.index()?;
            index.remove_path(&rel_path)?;
            index.write()?;
            tracing::warn!(artifact_id = %id, "Removed artifact file that was never committed");
            return Ok(());
        }

        let message = format!("Delete artifact: {}", id);
        let commit = self.commit_change(&sig, &message, |index| index.remove_path(&rel_path))?;

        tracing::debug!(artifact_id = %id, commit = %commit, "Committed artifact deletion");
        Ok(())
    }

    fn search(&self, query: &str) -> StoreResult<Vec<Artifact>> {
        let mut artifacts = self.list(None)?;
        artifacts.retain(|a| a.matches_text(query));
        Ok(artifacts)
    }

    fn history(&self, id: &str) -> StoreResult<Vec<CommitInfo>> {
        let id = ArtifactId::parse(id)?;
        Ok(repo::history_for_path(&self.repo, &self.relative_path(&id))?)
    }

    fn stats(&self) -> StoreResult<StoreStats> {
        let artifacts = self.list(None)?;
        let mut by_type = BTreeMap::new();
        for artifact in &artifacts {
            *by_type.entry(artifact.artifact_type().to_string()).or_insert(0) += 1;
        }

        Ok(StoreStats {
            total_artifacts: artifacts.len(),
            by_type,
            total_commits: repo::count_commits(&self.repo)?,
            last_commit: repo::head_commit(&self.repo)?.map(|c| CommitInfo::from_commit(&c)),
        })
    }
}

// ============================================================================
// FILE HELPERS
// ============================================================================

/// Parse one artifact file. The id inside must match the file name.
fn read_artifact(path: &Path) -> Result<Artifact, ReadFailure> {
    let text = fs::read_to_string(path)?;
    let artifact = Artifact::from_text(&text)?;

    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
    if artifact.id().as_str() != stem {
        return Err(ArtifactError::MalformedArtifact {
            reason: format!("id {} does not match file name {}", artifact.id(), stem),
        }
        .into());
    }
    Ok(artifact)
}

/// Write, flush, and fsync before returning.
fn write_synced(path: &Path, text: &str) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(text.as_bytes())?;
    file.flush()?;
    file.sync_all()
}

/// Newest `created_at` first; ties by id ascending.
fn sort_newest_first(artifacts: &mut [Artifact]) {
    artifacts.sort_by(|a, b| {
        b.created_at()
            .cmp(&a.created_at())
            .then_with(|| a.id().cmp(b.id()))
    });
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use iflow_core::ArtifactType;
    use tempfile::TempDir;

    fn open_store(dir: &TempDir) -> VersionedStore {
        let config = StoreConfig::new(dir.path().join("db")).with_author("Test", "test@example.com");
        VersionedStore::open(config).unwrap()
    }

    fn task(summary: &str) -> Artifact {
        Artifact::new(ArtifactType::task(), summary).unwrap()
    }

    fn commits(store: &VersionedStore) -> usize {
        store.stats().unwrap().total_commits
    }

    #[test]
    fn test_open_creates_artifacts_dir() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);
        assert!(store.config().artifacts_path().is_dir());
        assert_eq!(commits(&store), 0);
        assert!(store.stats().unwrap().last_commit.is_none());
    }

    #[test]
    fn test_open_rejects_invalid_config() {
        let dir = TempDir::new().unwrap();
        let config = StoreConfig::new(dir.path()).with_max_artifacts(0);
        assert!(matches!(VersionedStore::open(config), Err(StoreError::Config(_))));
    }

    #[test]
    fn test_save_allocates_sequential_ids() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);

        let mut first = task("first");
        let mut second = task("second");
        store.save(&mut first).unwrap();
        store.save(&mut second).unwrap();

        assert_eq!(first.id().as_str(), "00001");
        assert_eq!(second.id().as_str(), "00002");
        assert!(store.artifact_path(first.id()).is_file());
    }

    #[test]
    fn test_next_id_skips_past_highest_existing() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);
        let mut a = task("a").with_id(ArtifactId::from_number(41).unwrap());
        store.save(&mut a).unwrap();
        fs::write(store.config().artifacts_path().join("notes.yaml"), "x").unwrap();

        assert_eq!(store.next_id().unwrap().as_str(), "00042");
    }

    #[test]
    fn test_id_space_exhausted_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let config = StoreConfig::new(dir.path().join("db"))
            .with_author("Test", "test@example.com")
            .with_max_artifacts(1);
        let store = VersionedStore::open(config).unwrap();

        let mut a = task("a");
        store.save(&mut a).unwrap();
        let mut b = task("b");
        let err = store.save(&mut b).unwrap_err();

        assert!(matches!(err, StoreError::IdSpaceExhausted { max: 1 }));
        assert!(b.id().is_placeholder());
        assert_eq!(commits(&store), 1);
    }

    #[test]
    fn test_commit_messages() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);

        let mut a = task("Write docs");
        store.save(&mut a).unwrap();
        let fields = serde_json::json!({"status": "done"});
        a.update_fields(fields.as_object().unwrap()).unwrap();
        store.update(&mut a).unwrap();
        store.delete(a.id().as_str()).unwrap();

        let messages: Vec<_> = store
            .history(a.id().as_str())
            .unwrap()
            .into_iter()
            .map(|c| c.message)
            .collect();
        assert_eq!(
            messages,
            vec![
                "Delete artifact: 00001".to_string(),
                "Update task: Write docs".to_string(),
                "Add task: Write docs".to_string(),
            ]
        );
    }

    #[test]
    fn test_update_missing_is_not_found() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);

        let mut ghost = task("ghost").with_id(ArtifactId::from_number(9).unwrap());
        assert!(matches!(store.update(&mut ghost), Err(StoreError::NotFound { .. })));

        let mut fresh = task("fresh");
        assert!(matches!(store.update(&mut fresh), Err(StoreError::NotFound { .. })));
        assert_eq!(commits(&store), 0);
    }

    #[test]
    fn test_get_accepts_legacy_id() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);
        let mut a = task("legacy");
        store.save(&mut a).unwrap();

        let loaded = store.get("task/00001").unwrap().unwrap();
        assert_eq!(loaded.summary(), "legacy");
        assert!(store.get("1").unwrap().is_some());
        assert!(store.get("00002").unwrap().is_none());
        assert!(matches!(store.get("../etc"), Err(StoreError::Model(_))));
    }

    #[test]
    fn test_list_filters_by_type() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);
        let mut a = task("a");
        let mut b = Artifact::new(ArtifactType::bug(), "b").unwrap();
        store.save(&mut a).unwrap();
        store.save(&mut b).unwrap();

        let bugs = store.list(Some("bug")).unwrap();
        assert_eq!(bugs.len(), 1);
        assert_eq!(bugs[0].summary(), "b");
        assert!(store.list(Some("story")).unwrap().is_empty());
        assert_eq!(store.list(None).unwrap().len(), 2);
    }

    #[test]
    fn test_scan_reports_failures() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);
        let mut a = task("fine");
        store.save(&mut a).unwrap();
        let broken = store.config().artifacts_path().join("00002.yaml");
        fs::write(&broken, "artifact: [unclosed").unwrap();

        let scan = store.scan().unwrap();
        assert_eq!(scan.artifacts.len(), 1);
        assert_eq!(scan.failures.len(), 1);
        assert_eq!(scan.failures[0].path, broken);
    }

    #[test]
    fn test_file_name_must_match_id() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);
        let mut a = task("misplaced").with_id(ArtifactId::from_number(2).unwrap());
        let text = a.to_text().unwrap();
        fs::write(store.config().artifacts_path().join("00001.yaml"), text).unwrap();

        match store.get("00001") {
            Err(StoreError::Read {
                source: ReadFailure::Parse(ArtifactError::MalformedArtifact { .. }),
                ..
            }) => {}
            other => panic!("Expected Read error, got: {:?}", other),
        }
        let scan = store.scan().unwrap();
        assert!(scan.artifacts.is_empty());
        assert_eq!(scan.failures.len(), 1);

        // Saving under its own id still works and lands in its own file.
        store.save(&mut a).unwrap();
        assert_eq!(store.get("00002").unwrap().unwrap().summary(), "misplaced");
    }

    #[test]
    fn test_delete_uncommitted_file_makes_no_commit() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);
        let mut kept = task("kept");
        store.save(&mut kept).unwrap();

        let orphan = task("orphan").with_id(ArtifactId::from_number(5).unwrap());
        fs::write(store.artifact_path(orphan.id()), orphan.to_text().unwrap()).unwrap();
        assert!(store.get("00005").unwrap().is_some());

        store.delete("00005").unwrap();
        assert!(store.get("00005").unwrap().is_none());
        assert_eq!(commits(&store), 1);
        assert!(store.history("00005").unwrap().is_empty());

        store.delete(kept.id().as_str()).unwrap();
        assert_eq!(commits(&store), 2);
        assert_eq!(store.history(kept.id().as_str()).unwrap().len(), 2);
    }

    #[test]
    fn test_missing_identity_is_commit_error() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("db");
        let store = VersionedStore::open_at(&root).unwrap();
        // Repository-local config shadows any global identity.
        let mut config = store.repo.config().unwrap();
        config.set_str("user.name", "").unwrap();
        config.set_str("user.email", "").unwrap();

        let mut a = task("anonymous");
        let err = store.save(&mut a).unwrap_err();
        assert!(matches!(err, StoreError::Commit { .. }));
    }

    #[test]
    fn test_repository_identity_is_used_without_author() {
        let dir = TempDir::new().unwrap();
        let store = VersionedStore::open_at(dir.path().join("db")).unwrap();
        let mut config = store.repo.config().unwrap();
        config.set_str("user.name", "Repo User").unwrap();
        config.set_str("user.email", "repo@example.com").unwrap();

        let mut a = task("signed");
        store.save(&mut a).unwrap();
        let last = store.stats().unwrap().last_commit.unwrap();
        assert_eq!(last.author, "Repo User");
    }

    #[test]
    fn test_sort_ties_by_id() {
        let ts = iflow_core::parse_timestamp("created_at", "2024-01-01T00:00:00").unwrap();
        let mut artifacts: Vec<Artifact> = [3, 1, 2]
            .into_iter()
            .map(|n| {
                task("t")
                    .with_id(ArtifactId::from_number(n).unwrap())
                    .with_timestamps(ts, ts)
                    .unwrap()
            })
            .collect();
        sort_newest_first(&mut artifacts);
        let ids: Vec<_> = artifacts.iter().map(|a| a.id().as_str().to_string()).collect();
        assert_eq!(ids, vec!["00001", "00002", "00003"]);
    }
}
