//! Restoring the working tree after in-place checkouts
//!
//! In-place snapshots leave HEAD detached at the last processed commit. A
//! [`WorkingTreeGuard`] records where HEAD pointed before any checkout and puts
//! it back on [`WorkingTreeGuard::restore`]. If the guard is dropped without an
//! explicit restore (an error unwound the run), the restore is attempted on drop
//! unless the guard was disarmed.

use std::path::Path;
use git2::{build::CheckoutBuilder, ObjectType, Oid, Repository};
use log::{info, warn};
use crate::error::{StatsError, StatsResult};

/// Where HEAD pointed when the guard was created
#[derive(Debug, Clone, PartialEq)]
enum OriginalHead {
    /// Symbolic HEAD at a branch, holding the full reference name
    Branch(String),
    Detached(Oid),
}

pub struct WorkingTreeGuard {
    repo: Repository,
    original: OriginalHead,
    armed: bool,
}

impl WorkingTreeGuard {
    /// Record the current HEAD of the repository at `repo_path`
    pub fn capture<P: AsRef<Path>>(repo_path: P) -> StatsResult<Self> {
        let repo_path = repo_path.as_ref();
        let repo = Repository::open(repo_path)
            .map_err(|e| StatsError::git(format!("open {}", repo_path.display()), e))?;

        let original = {
            let head = repo.head().map_err(|e| StatsError::git("read HEAD", e))?;
            match (repo.head_detached(), head.name()) {
                (Ok(false), Some(name)) => OriginalHead::Branch(name.to_string()),
                _ => OriginalHead::Detached(
                    head.peel_to_commit().map_err(|e| StatsError::git("resolve HEAD", e))?.id(),
                ),
            }
        };
        info!("Recorded original HEAD: {:?}", original);

        Ok(Self { repo, original, armed: true })
    }

    /// Leave the working tree wherever the last checkout put it
    pub fn disarm(&mut self) {
        self.armed = false;
    }

    /// Check the original HEAD back out
    pub fn restore(&mut self) -> StatsResult<()> {
        self.armed = false;
        self.restore_inner()
    }

    fn restore_inner(&self) -> StatsResult<()> {
        let target = match &self.original {
            OriginalHead::Branch(name) => self.repo.find_reference(name)
                .and_then(|r| r.peel_to_commit())
                .map_err(|e| StatsError::git(format!("resolve {name}"), e))?
                .id(),
            OriginalHead::Detached(oid) => *oid,
        };

        let object = self.repo.find_object(target, Some(ObjectType::Commit))
            .map_err(|e| StatsError::git("find original commit", e))?;
        let mut opts = CheckoutBuilder::new();
        opts.safe();
        self.repo.checkout_tree(&object, Some(&mut opts))
            .map_err(|e| StatsError::git("restore working tree", e))?;

        match &self.original {
            OriginalHead::Branch(name) => self.repo.set_head(name),
            OriginalHead::Detached(oid) => self.repo.set_head_detached(*oid),
        }
        .map_err(|e| StatsError::git("restore HEAD", e))?;

        info!("Restored working tree to {:?}", self.original);
        Ok(())
    }
}

impl Drop for WorkingTreeGuard {
    fn drop(&mut self) {
        if self.armed {
            if let Err(e) = self.restore_inner() {
                warn!("Failed to restore working tree: {e}");
            }
        }
    }
}
