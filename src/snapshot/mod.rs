//! Year-end snapshot resolution
//!
//! Resolves the last commit on the main line before a year boundary and
//! materialises that commit's state as a [`Snapshot`]: either by exporting the
//! content roots into an isolated directory (the working tree is untouched), or
//! by checking the commit out in place, which mutates the working tree and
//! detaches HEAD for the rest of the process.

pub mod checkout_manager;
pub mod guard;

use std::fmt;
use std::path::{Path, PathBuf};
use chrono::{TimeZone, Utc};
use git2::{build::CheckoutBuilder, ObjectType, Oid, Repository, Sort, TreeWalkMode, TreeWalkResult};
use log::{debug, info, warn};
use crate::error::{StatsError, StatsResult};
use crate::git::{detect_main_line, MainLine, RepositoryHandle};

pub use checkout_manager::CheckoutManager;
pub use guard::WorkingTreeGuard;

const SYMLINK_FILEMODE: i32 = 0o120000;

/// Identifier of a resolved commit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CommitId(Oid);

impl CommitId {
    pub fn oid(&self) -> Oid {
        self.0
    }

    /// First eight hex digits
    pub fn short(&self) -> String {
        self.0.to_string()[..8].to_string()
    }
}

impl From<Oid> for CommitId {
    fn from(oid: Oid) -> Self {
        Self(oid)
    }
}

impl fmt::Display for CommitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How a snapshot is materialised on disk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SnapshotMode {
    /// Write the commit's content roots into a per-commit directory
    #[default]
    Export,
    /// Check the commit out in the repository working tree
    InPlace,
}

impl std::str::FromStr for SnapshotMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "export" => Ok(SnapshotMode::Export),
            "in-place" | "inplace" | "checkout" => Ok(SnapshotMode::InPlace),
            _ => Err(format!("Invalid snapshot mode: {}. Valid options: export, in-place", s)),
        }
    }
}

/// The state of all tracked files as of a year-end commit
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub year: i32,
    pub commit: CommitId,
    /// Directory that mirrors the repository root for this commit
    pub root: PathBuf,
    pub mode: SnapshotMode,
}

impl Snapshot {
    /// Content roots (relative to the repository) mapped into this snapshot
    pub fn content_roots(&self, roots: &[PathBuf]) -> Vec<PathBuf> {
        roots.iter().map(|root| self.root.join(root)).collect()
    }
}

/// Start of the year following `year`, as a unix timestamp in UTC
fn next_year_boundary(year: i32) -> i64 {
    year.checked_add(1)
        .and_then(|next| Utc.with_ymd_and_hms(next, 1, 1, 0, 0, 0).single())
        .map(|boundary| boundary.timestamp())
        .unwrap_or(i64::MAX)
}

/// Resolves year-end commits on the main line and materialises their snapshots
pub struct SnapshotResolver {
    repo: RepositoryHandle,
    main_line: MainLine,
}

impl SnapshotResolver {
    /// Open a resolver over `repo`, pinning the main line tip now
    pub fn new(repo: RepositoryHandle, branch: Option<&str>) -> StatsResult<Self> {
        let main_line = detect_main_line(repo.repository(), branch)?;
        info!("Main line of history: {} at {} ({})", main_line.branch, main_line.tip, main_line.source);
        Ok(Self { repo, main_line })
    }

    pub fn main_line(&self) -> &MainLine {
        &self.main_line
    }

    pub fn repository(&self) -> &RepositoryHandle {
        &self.repo
    }

    fn git(&self) -> &Repository {
        self.repo.repository()
    }

    /// Newest main line commit with a commit time strictly before January 1 of `year + 1` (UTC)
    pub fn resolve_last_commit_before(&self, year: i32) -> StatsResult<CommitId> {
        let boundary = next_year_boundary(year);
        let repo = self.git();

        let mut revwalk = repo.revwalk()
            .map_err(|e| StatsError::git_for_year("revwalk", year, e))?;
        revwalk.push(self.main_line.tip)
            .map_err(|e| StatsError::git_for_year("revwalk push", year, e))?;
        revwalk.set_sorting(Sort::TIME)
            .map_err(|e| StatsError::git_for_year("revwalk sort", year, e))?;

        for oid in revwalk {
            let oid = oid.map_err(|e| StatsError::git_for_year("revwalk", year, e))?;
            let commit = repo.find_commit(oid)
                .map_err(|e| StatsError::git_for_year("find commit", year, e))?;
            if commit.time().seconds() < boundary {
                debug!("Last commit before end of {}: {}", year, oid);
                return Ok(CommitId(oid));
            }
        }

        Err(StatsError::NoCommitFound { year, branch: self.main_line.branch.clone() })
    }

    /// Number of commits reachable from `commit`, the commit itself included
    pub fn count_commits(&self, year: i32, commit: &CommitId) -> StatsResult<u64> {
        let mut revwalk = self.git().revwalk()
            .map_err(|e| StatsError::git_for_year("revwalk", year, e))?;
        revwalk.push(commit.oid())
            .map_err(|e| StatsError::git_for_year("revwalk push", year, e))?;

        let mut count = 0;
        for oid in revwalk {
            oid.map_err(|e| StatsError::git_for_year("revwalk", year, e))?;
            count += 1;
        }
        Ok(count)
    }

    /// Check `commit` out in the working tree and detach HEAD at it
    ///
    /// The working tree stays at this commit after the call returns. Local
    /// modifications that would be overwritten make the checkout fail.
    pub fn checkout(&self, year: i32, commit: &CommitId) -> StatsResult<Snapshot> {
        let repo = self.git();
        let workdir = repo.workdir()
            .ok_or_else(|| StatsError::git_for_year(
                "checkout",
                year,
                git2::Error::from_str("bare repository has no working tree; use export mode"),
            ))?
            .to_path_buf();

        let object = repo.find_object(commit.oid(), Some(ObjectType::Commit))
            .map_err(|e| StatsError::git_for_year("find commit", year, e))?;

        let mut opts = CheckoutBuilder::new();
        opts.safe();
        repo.checkout_tree(&object, Some(&mut opts))
            .map_err(|e| StatsError::git_for_year(format!("checkout {}", commit.short()), year, e))?;
        repo.set_head_detached(commit.oid())
            .map_err(|e| StatsError::git_for_year(format!("detach HEAD at {}", commit.short()), year, e))?;

        info!("Checked out commit {} (last commit of year {})", commit, year);
        Ok(Snapshot { year, commit: *commit, root: workdir, mode: SnapshotMode::InPlace })
    }

    /// Export the blobs under `roots` at `commit` into an isolated directory
    ///
    /// An empty `roots` slice exports the whole tree. Symlinks and submodules
    /// are not exported.
    pub fn export(
        &self,
        year: i32,
        commit: &CommitId,
        roots: &[PathBuf],
        checkouts: &mut CheckoutManager,
    ) -> StatsResult<Snapshot> {
        let repo = self.git();
        let tree = repo.find_commit(commit.oid())
            .and_then(|c| c.tree())
            .map_err(|e| StatsError::git_for_year("read commit tree", year, e))?;

        let mut blobs: Vec<(PathBuf, Oid)> = Vec::new();
        tree.walk(TreeWalkMode::PreOrder, |dir, entry| {
            let Some(name) = entry.name() else {
                warn!("Skipping tree entry with non UTF-8 name under '{}'", dir);
                return TreeWalkResult::Skip;
            };
            let path = Path::new(dir).join(name);
            match entry.kind() {
                Some(ObjectType::Tree) => {
                    if is_on_root_path(&path, roots) {
                        TreeWalkResult::Ok
                    } else {
                        TreeWalkResult::Skip
                    }
                }
                Some(ObjectType::Blob) if entry.filemode() != SYMLINK_FILEMODE => {
                    if is_under_root(&path, roots) {
                        blobs.push((path, entry.id()));
                    }
                    TreeWalkResult::Ok
                }
                _ => TreeWalkResult::Ok,
            }
        })
        .map_err(|e| StatsError::git_for_year("walk tree", year, e))?;

        let key = commit.to_string();
        let dir = checkouts.prepare_commit_checkout(&key)?;
        for (path, oid) in &blobs {
            let blob = repo.find_blob(*oid)
                .map_err(|e| StatsError::git_for_year(format!("read blob {}", path.display()), year, e))?;
            checkouts.checkout_file(&key, path, blob.content())?;
        }

        info!("Exported {} files of commit {} (last commit of year {})", blobs.len(), commit, year);
        Ok(Snapshot { year, commit: *commit, root: dir, mode: SnapshotMode::Export })
    }
}

/// A directory is worth descending into if it lies under a root or leads to one
fn is_on_root_path(dir: &Path, roots: &[PathBuf]) -> bool {
    roots.is_empty() || roots.iter().any(|root| dir.starts_with(root) || root.starts_with(dir))
}

fn is_under_root(path: &Path, roots: &[PathBuf]) -> bool {
    roots.is_empty() || roots.iter().any(|root| path.starts_with(root))
}
