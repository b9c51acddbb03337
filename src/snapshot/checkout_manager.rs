//! Checkout Manager for exported snapshots
//!
//! Writes the content of a commit's tree into an isolated, commit-scoped
//! directory so the walker can read a historical snapshot without touching the
//! repository working tree or HEAD.
//!
//! ```text
//! CheckoutManager
//! ├── base_checkout_dir/
//! │   ├── commit_abc123de/         (8-char commit prefix)
//! │   │   ├── content/posts/first.md
//! │   │   └── static/images/logo.png
//! │   └── commit_def456ab/
//! └── checkout_dirs (HashMap)      (Tracks active checkouts)
//! ```
//!
//! Directories are removed by [`CheckoutManager::cleanup_commit`], by
//! [`CheckoutManager::cleanup_all`], or on drop.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use log::{debug, warn};
use crate::error::{StatsError, StatsResult};

/// Manages per-commit export directories
pub struct CheckoutManager {
    /// Base directory for all checkouts
    base_checkout_dir: PathBuf,
    /// Map of commit hash to checkout directory
    checkout_dirs: HashMap<String, PathBuf>,
}

impl CheckoutManager {
    /// Create a new CheckoutManager rooted at `base_dir`
    pub fn new<P: AsRef<Path>>(base_dir: P) -> StatsResult<Self> {
        let base_checkout_dir = base_dir.as_ref().to_path_buf();
        fs::create_dir_all(&base_checkout_dir)
            .map_err(|e| StatsError::io(&base_checkout_dir, e))?;

        Ok(Self {
            base_checkout_dir,
            checkout_dirs: HashMap::new(),
        })
    }

    /// Prepare an empty checkout directory for a commit
    ///
    /// Any leftover content from an earlier export of the same commit is removed
    /// first so the directory mirrors exactly one tree.
    pub fn prepare_commit_checkout(&mut self, commit_hash: &str) -> StatsResult<PathBuf> {
        let commit_short = if commit_hash.len() >= 8 { &commit_hash[..8] } else { commit_hash };
        let commit_dir = self.base_checkout_dir.join(format!("commit_{commit_short}"));

        if commit_dir.exists() {
            fs::remove_dir_all(&commit_dir).map_err(|e| StatsError::io(&commit_dir, e))?;
        }
        fs::create_dir_all(&commit_dir).map_err(|e| StatsError::io(&commit_dir, e))?;

        debug!("Prepared checkout directory {} for commit {}", commit_dir.display(), commit_hash);
        self.checkout_dirs.insert(commit_hash.to_string(), commit_dir.clone());
        Ok(commit_dir)
    }

    /// Write one file of a commit into its checkout directory
    ///
    /// `file_path` is relative to the repository root.
    pub fn checkout_file(&mut self, commit_hash: &str, file_path: &Path, content: &[u8]) -> StatsResult<PathBuf> {
        let commit_dir = self.checkout_dirs.get(commit_hash)
            .ok_or_else(|| StatsError::io(
                file_path,
                std::io::Error::new(std::io::ErrorKind::NotFound, format!("no checkout directory prepared for commit {commit_hash}")),
            ))?;

        let file_checkout_path = commit_dir.join(file_path);

        if let Some(parent_dir) = file_checkout_path.parent() {
            fs::create_dir_all(parent_dir).map_err(|e| StatsError::io(parent_dir, e))?;
        }

        let mut file = File::create(&file_checkout_path)
            .map_err(|e| StatsError::io(&file_checkout_path, e))?;
        file.write_all(content)
            .map_err(|e| StatsError::io(&file_checkout_path, e))?;

        Ok(file_checkout_path)
    }

    /// Remove the checkout directory of one commit
    pub fn cleanup_commit(&mut self, commit_hash: &str) -> StatsResult<()> {
        if let Some(commit_dir) = self.checkout_dirs.remove(commit_hash) {
            if commit_dir.exists() {
                fs::remove_dir_all(&commit_dir).map_err(|e| StatsError::io(&commit_dir, e))?;
            }
        }
        Ok(())
    }

    /// Remove every checkout directory, and the base directory if it is left empty
    pub fn cleanup_all(&mut self) -> StatsResult<()> {
        let commit_hashes: Vec<String> = self.checkout_dirs.keys().cloned().collect();
        for commit_hash in commit_hashes {
            self.cleanup_commit(&commit_hash)?;
        }

        if self.base_checkout_dir.exists() {
            if let Ok(entries) = fs::read_dir(&self.base_checkout_dir) {
                if entries.count() == 0 {
                    fs::remove_dir(&self.base_checkout_dir)
                        .map_err(|e| StatsError::io(&self.base_checkout_dir, e))?;
                }
            }
        }

        Ok(())
    }
}

impl Drop for CheckoutManager {
    fn drop(&mut self) {
        if let Err(e) = self.cleanup_all() {
            warn!("Failed to clean up snapshot checkouts: {e}");
        }
    }
}
