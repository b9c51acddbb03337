use git2::{BranchType, Oid, Repository};
use std::fmt;
use std::path::{Path, PathBuf};
use log::{debug, info};
use crate::error::{StatsError, StatsResult};

/// Branches tried in order when no main line branch is configured
pub const FALLBACK_BRANCHES: &[&str] = &["master", "main", "trunk"];

/// A git2 repository together with its canonical location
pub struct RepositoryHandle {
    repository: Repository,
    path: PathBuf,
}

impl RepositoryHandle {
    /// Open a repository from a path
    pub fn open<P: AsRef<Path>>(path: P) -> StatsResult<Self> {
        let path = path.as_ref();
        let repository = Repository::open(path)
            .map_err(|e| StatsError::git(format!("open {}", path.display()), e))?;
        let path = path.canonicalize().map_err(|e| StatsError::io(path, e))?;
        debug!("Opened repository at: {}", path.display());

        Ok(Self { repository, path })
    }

    /// Canonical path the repository was opened from
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Working directory, `None` for bare repositories
    pub fn workdir(&self) -> Option<&Path> {
        self.repository.workdir()
    }

    pub fn is_bare(&self) -> bool {
        self.repository.is_bare()
    }

    pub fn repository(&self) -> &Repository {
        &self.repository
    }
}

/// Where the main line branch choice came from
#[derive(Debug, Clone, PartialEq)]
pub enum BranchSelectionSource {
    /// Explicitly configured (CLI or config file)
    Explicit,
    /// From the fallback list
    Fallback,
    /// Whatever HEAD pointed at
    Head,
}

impl fmt::Display for BranchSelectionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BranchSelectionSource::Explicit => write!(f, "configured"),
            BranchSelectionSource::Fallback => write!(f, "default branch"),
            BranchSelectionSource::Head => write!(f, "current HEAD"),
        }
    }
}

/// The main line of history, pinned to its tip at detection time
#[derive(Debug, Clone, PartialEq)]
pub struct MainLine {
    pub branch: String,
    pub source: BranchSelectionSource,
    pub tip: Oid,
}

/// Detect the main line of history
///
/// Priority order:
/// 1. Explicit branch or revision (if provided)
/// 2. Fallback list of local branches in order
/// 3. Current HEAD
///
/// The tip is recorded once so later in-place checkouts, which detach HEAD,
/// do not move the main line.
pub fn detect_main_line(repo: &Repository, explicit: Option<&str>) -> StatsResult<MainLine> {
    if let Some(branch) = explicit {
        let tip = repo.revparse_single(branch)
            .and_then(|object| object.peel_to_commit())
            .map_err(|_| StatsError::BranchNotFound { branch: branch.to_string() })?
            .id();
        info!("Using main line '{}' at {}", branch, tip);
        return Ok(MainLine { branch: branch.to_string(), source: BranchSelectionSource::Explicit, tip });
    }

    for candidate in FALLBACK_BRANCHES {
        if let Ok(branch) = repo.find_branch(candidate, BranchType::Local) {
            if let Ok(commit) = branch.get().peel_to_commit() {
                debug!("Main line resolved from fallback list: {}", candidate);
                return Ok(MainLine {
                    branch: candidate.to_string(),
                    source: BranchSelectionSource::Fallback,
                    tip: commit.id(),
                });
            }
        }
    }

    let head = repo.head()
        .map_err(|_| StatsError::BranchNotFound { branch: "HEAD".to_string() })?;
    let branch = head.shorthand().unwrap_or("HEAD").to_string();
    let tip = head.peel_to_commit()
        .map_err(|e| StatsError::git("resolve HEAD", e))?
        .id();
    debug!("Main line resolved from HEAD: {}", branch);
    Ok(MainLine { branch, source: BranchSelectionSource::Head, tip })
}

#[cfg(test)]
mod tests {
    use super::*;
    use git2::{RepositoryInitOptions, Signature, Time};
    use tempfile::TempDir;

    fn init_repo(initial_head: &str) -> (TempDir, Repository) {
        let temp_dir = TempDir::new().unwrap();
        let mut opts = RepositoryInitOptions::new();
        opts.initial_head(initial_head);
        let repo = Repository::init_opts(temp_dir.path(), &opts).unwrap();
        (temp_dir, repo)
    }

    fn commit_empty(repo: &Repository) -> Oid {
        let sig = Signature::new("Test", "test@example.com", &Time::new(1_600_000_000, 0)).unwrap();
        let tree_id = repo.index().unwrap().write_tree().unwrap();
        let tree = repo.find_tree(tree_id).unwrap();
        repo.commit(Some("HEAD"), &sig, &sig, "initial", &tree, &[]).unwrap()
    }

    #[test]
    fn test_repository_handle_open() {
        let (temp_dir, _repo) = init_repo("master");
        let handle = RepositoryHandle::open(temp_dir.path()).unwrap();
        assert!(!handle.is_bare());
        assert!(handle.workdir().is_some());
        assert_eq!(handle.path(), temp_dir.path().canonicalize().unwrap());
    }

    #[test]
    fn test_repository_handle_open_not_a_repo() {
        let plain = TempDir::new().unwrap();
        let result = RepositoryHandle::open(plain.path());
        assert!(matches!(result, Err(StatsError::Git { .. })));
    }

    #[test]
    fn test_detect_main_line_fallback() {
        let (_temp_dir, repo) = init_repo("main");
        let tip = commit_empty(&repo);

        let main_line = detect_main_line(&repo, None).unwrap();
        assert_eq!(main_line.branch, "main");
        assert_eq!(main_line.source, BranchSelectionSource::Fallback);
        assert_eq!(main_line.tip, tip);
    }

    #[test]
    fn test_detect_main_line_explicit() {
        let (_temp_dir, repo) = init_repo("publish");
        let tip = commit_empty(&repo);

        let main_line = detect_main_line(&repo, Some("publish")).unwrap();
        assert_eq!(main_line.source, BranchSelectionSource::Explicit);
        assert_eq!(main_line.tip, tip);

        let missing = detect_main_line(&repo, Some("nope"));
        assert!(matches!(missing, Err(StatsError::BranchNotFound { .. })));
    }

    #[test]
    fn test_detect_main_line_head_when_no_fallback_matches() {
        let (_temp_dir, repo) = init_repo("publish");
        commit_empty(&repo);

        let main_line = detect_main_line(&repo, None).unwrap();
        assert_eq!(main_line.branch, "publish");
        assert_eq!(main_line.source, BranchSelectionSource::Head);
    }

    #[test]
    fn test_branch_selection_source_display() {
        assert_eq!(BranchSelectionSource::Explicit.to_string(), "configured");
        assert_eq!(BranchSelectionSource::Head.to_string(), "current HEAD");
    }

    #[test]
    fn test_detect_main_line_empty_repository() {
        let (_temp_dir, repo) = init_repo("master");
        let result = detect_main_line(&repo, None);
        assert!(matches!(result, Err(StatsError::BranchNotFound { .. })));
    }
}
