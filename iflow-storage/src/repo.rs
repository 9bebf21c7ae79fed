//! Git plumbing: opening the repository, committing index changes, and
//! walking history. Everything here is synchronous and assumes a single
//! writer per repository.

use git2::{Commit, ErrorCode, Index, Oid, Repository, Signature, Sort};
use std::fs;
use std::path::Path;

use crate::commit::CommitInfo;
use crate::config::{CommitAuthor, StoreConfig};
use crate::error::{StoreError, StoreResult};

/// Open the repository at `config.root`, creating it when the root is
/// missing or empty.
pub(crate) fn open_or_init(config: &StoreConfig) -> StoreResult<Repository> {
    let root = &config.root;

    if !root.exists() || is_empty_dir(root)? {
        return init(root);
    }

    let reason = match Repository::open(root) {
        Ok(repo) if repo.workdir().is_some() => {
            tracing::debug!(path = %root.display(), "Opened artifact repository");
            return Ok(repo);
        }
        Ok(_) => "bare repository has no working tree".to_string(),
        Err(err) => err.message().to_string(),
    };

    if !config.reinit_on_corruption {
        return Err(StoreError::RepositoryCorrupt {
            path: root.clone(),
            reason,
        });
    }

    tracing::error!(
        path = %root.display(),
        reason = %reason,
        "Repository is corrupt, deleting it and reinitialising"
    );
    if root.is_dir() {
        fs::remove_dir_all(root)?;
    } else {
        fs::remove_file(root)?;
    }
    init(root)
}

fn init(root: &Path) -> StoreResult<Repository> {
    fs::create_dir_all(root)?;
    let repo = Repository::init(root).map_err(|source| StoreError::Repository {
        path: root.to_path_buf(),
        source,
    })?;
    tracing::info!(path = %root.display(), "Initialised artifact repository");
    Ok(repo)
}

fn is_empty_dir(path: &Path) -> std::io::Result<bool> {
    if !path.is_dir() {
        return Ok(false);
    }
    Ok(fs::read_dir(path)?.next().is_none())
}

/// Commit identity: the configured author, else the repository's own
/// `user.name` / `user.email`.
pub(crate) fn signature(
    repo: &Repository,
    author: Option<&CommitAuthor>,
) -> Result<Signature<'static>, git2::Error> {
    match author {
        Some(author) => Signature::now(&author.name, &author.email),
        None => repo.signature(),
    }
}

/// Write `index` and commit its tree on top of HEAD.
pub(crate) fn commit_index(
    repo: &Repository,
    index: &mut Index,
    sig: &Signature<'_>,
    message: &str,
) -> Result<Oid, git2::Error> {
    index.write()?;
    let tree_oid = index.write_tree()?;
    let tree = repo.find_tree(tree_oid)?;

    match head_commit(repo)? {
        Some(parent) => repo.commit(Some("HEAD"), sig, sig, message, &tree, &[&parent]),
        None => repo.commit(Some("HEAD"), sig, sig, message, &tree, &[]),
    }
}

/// The commit HEAD points at, or `None` before the first commit.
pub(crate) fn head_commit(repo: &Repository) -> Result<Option<Commit<'_>>, git2::Error> {
    match repo.head() {
        Ok(head) => head.peel_to_commit().map(Some),
        Err(err) if matches!(err.code(), ErrorCode::UnbornBranch | ErrorCode::NotFound) => Ok(None),
        Err(err) => Err(err),
    }
}

/// Whether HEAD's tree has an entry at `rel_path`.
pub(crate) fn tracked_at_head(repo: &Repository, rel_path: &Path) -> Result<bool, git2::Error> {
    match head_commit(repo)? {
        Some(head) => Ok(blob_at(&head, rel_path)?.is_some()),
        None => Ok(false),
    }
}

fn revwalk_from_head(repo: &Repository) -> Result<Option<git2::Revwalk<'_>>, git2::Error> {
    if head_commit(repo)?.is_none() {
        return Ok(None);
    }
    let mut revwalk = repo.revwalk()?;
    revwalk.push_head()?;
    revwalk.set_sorting(Sort::TOPOLOGICAL | Sort::TIME)?;
    Ok(Some(revwalk))
}

/// Number of commits reachable from HEAD.
pub(crate) fn count_commits(repo: &Repository) -> Result<usize, git2::Error> {
    let Some(revwalk) = revwalk_from_head(repo)? else {
        return Ok(0);
    };
    let mut count = 0;
    for oid in revwalk {
        oid?;
        count += 1;
    }
    Ok(count)
}

/// Commits that added, modified, or removed `rel_path`, most recent first.
pub(crate) fn history_for_path(
    repo: &Repository,
    rel_path: &Path,
) -> Result<Vec<CommitInfo>, git2::Error> {
    let Some(revwalk) = revwalk_from_head(repo)? else {
        return Ok(Vec::new());
    };

    let mut commits = Vec::new();
    for oid in revwalk {
        let commit = repo.find_commit(oid?)?;
        if commit_touches_path(&commit, rel_path)? {
            commits.push(CommitInfo::from_commit(&commit));
        }
    }
    Ok(commits)
}

fn commit_touches_path(commit: &Commit<'_>, rel_path: &Path) -> Result<bool, git2::Error> {
    let current = blob_at(commit, rel_path)?;
    let previous = if commit.parent_count() == 0 {
        None
    } else {
        blob_at(&commit.parent(0)?, rel_path)?
    };
    Ok(current != previous)
}

fn blob_at(commit: &Commit<'_>, rel_path: &Path) -> Result<Option<Oid>, git2::Error> {
    match commit.tree()?.get_path(rel_path) {
        Ok(entry) => Ok(Some(entry.id())),
        Err(err) if err.code() == ErrorCode::NotFound => Ok(None),
        Err(err) => Err(err),
    }
}
