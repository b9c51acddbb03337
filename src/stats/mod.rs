//! Yearly statistics gathering
//!
//! Provides the per-year record, the gatherer that produces one record per
//! year from an end-of-year snapshot, and the persisted year-keyed cache.

pub mod cache;

use std::collections::BTreeSet;
use std::path::{Component, Path, PathBuf};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use tempfile::TempDir;
use crate::content::{ContentStats, ContentWalker, WalkerConfig};
use crate::error::{StatsError, StatsResult};
use crate::git::RepositoryHandle;
use crate::snapshot::{CheckoutManager, CommitId, SnapshotMode, SnapshotResolver};

pub use cache::StatsCache;

/// Content roots walked when none are configured
pub const DEFAULT_CONTENT_ROOTS: &[&str] = &["content", "static/images"];

/// Statistics for one calendar year, measured at the year-end snapshot
///
/// Counts are cumulative as of that snapshot, not deltas against the previous
/// year. Missing fields in older caches load as zero or empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct YearRecord {
    pub year: i32,
    pub num_commits: u64,
    pub num_markdown_files: u64,
    pub num_asciidoc_files: u64,
    pub num_content_files: u64,
    pub num_images: u64,
    pub num_diagrams: u64,
    pub other_files: Vec<String>,
    pub num_chars: u64,
    pub num_words: u64,
    pub num_lines: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commit: Option<String>,
}

impl YearRecord {
    /// Assemble a record from a walk of the snapshot of `commit`
    pub fn from_parts(year: i32, commit: &CommitId, num_commits: u64, content: ContentStats) -> Self {
        Self {
            year,
            num_commits,
            num_markdown_files: content.num_markdown_files,
            num_asciidoc_files: content.num_asciidoc_files,
            num_content_files: content.num_content_files(),
            num_images: content.num_images,
            num_diagrams: content.num_diagrams,
            other_files: content.other_files,
            num_chars: content.text.num_chars,
            num_words: content.text.num_words,
            num_lines: content.text.num_lines,
            commit: Some(commit.to_string()),
        }
    }

    /// Re-derive `num_content_files` for records loaded from older caches
    pub(crate) fn normalize(mut self) -> Self {
        self.num_content_files = self.num_markdown_files + self.num_asciidoc_files;
        self
    }
}

/// Rewrite content roots into the plain relative form git tree paths use
///
/// `./content/` becomes `content`. Absolute roots, roots climbing out with
/// `..`, and roots naming the repository itself are rejected.
pub fn normalize_roots<P: AsRef<Path>>(roots: &[P]) -> StatsResult<Vec<PathBuf>> {
    let mut normalized = Vec::with_capacity(roots.len());
    for root in roots {
        let root = root.as_ref();
        let mut clean = PathBuf::new();
        for component in root.components() {
            match component {
                Component::Normal(part) => clean.push(part),
                Component::CurDir => {}
                Component::ParentDir => {
                    return Err(StatsError::invalid_root(root, "must not contain '..'"));
                }
                Component::RootDir | Component::Prefix(_) => {
                    return Err(StatsError::invalid_root(root, "must be relative to the repository root"));
                }
            }
        }
        if clean.as_os_str().is_empty() {
            return Err(StatsError::invalid_root(root, "must name a directory inside the repository"));
        }
        if clean != root {
            debug!("Content root '{}' normalized to '{}'", root.display(), clean.display());
        }
        if !normalized.contains(&clean) {
            normalized.push(clean);
        }
    }
    Ok(normalized)
}

/// Which cached years get gathered again
#[derive(Debug, Clone, Default)]
pub struct RecomputePolicy {
    /// Recompute every requested year
    pub all: bool,
    /// Recompute these years even when cached
    pub years: BTreeSet<i32>,
}

/// Requested years that need gathering: not yet cached, or forced
///
/// Output is ascending and free of duplicates.
pub fn select_years(requested: &[i32], cache: &StatsCache, policy: &RecomputePolicy) -> Vec<i32> {
    requested.iter()
        .copied()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .filter(|year| policy.all || policy.years.contains(year) || !cache.contains_year(*year))
        .collect()
}

/// Gatherer configuration
#[derive(Debug, Clone)]
pub struct GatherConfig {
    /// Content roots relative to the repository root
    pub roots: Vec<PathBuf>,
    pub mode: SnapshotMode,
    pub walker: WalkerConfig,
    /// Base directory for exported snapshots; a temporary directory when unset
    pub checkout_dir: Option<PathBuf>,
}

impl Default for GatherConfig {
    fn default() -> Self {
        Self {
            roots: DEFAULT_CONTENT_ROOTS.iter().map(PathBuf::from).collect(),
            mode: SnapshotMode::Export,
            walker: WalkerConfig::default(),
            checkout_dir: None,
        }
    }
}

/// Produces one [`YearRecord`] per requested year
///
/// In [`SnapshotMode::InPlace`] every call checks a commit out in the working
/// tree, so years must be gathered one at a time and the caller decides when to
/// restore HEAD.
pub struct YearlyStatsGatherer {
    resolver: SnapshotResolver,
    walker: ContentWalker,
    roots: Vec<PathBuf>,
    mode: SnapshotMode,
    checkouts: Option<CheckoutManager>,
    // Dropped after `checkouts`, which cleans up inside it
    _export_base: Option<TempDir>,
}

impl YearlyStatsGatherer {
    pub fn new(repo: RepositoryHandle, branch: Option<&str>, config: GatherConfig) -> StatsResult<Self> {
        let roots = normalize_roots(&config.roots)?;
        let resolver = SnapshotResolver::new(repo, branch)?;

        let (checkouts, export_base) = match config.mode {
            SnapshotMode::InPlace => (None, None),
            SnapshotMode::Export => match &config.checkout_dir {
                Some(dir) => (Some(CheckoutManager::new(dir)?), None),
                None => {
                    let temp = tempfile::Builder::new()
                        .prefix("blogstats-snapshots-")
                        .tempdir()
                        .map_err(|e| StatsError::io(std::env::temp_dir(), e))?;
                    (Some(CheckoutManager::new(temp.path())?), Some(temp))
                }
            },
        };
        debug!("Gatherer ready: mode {:?}, roots {:?}", config.mode, roots);

        Ok(Self {
            resolver,
            walker: ContentWalker::with_config(config.walker),
            roots,
            mode: config.mode,
            checkouts,
            _export_base: export_base,
        })
    }

    pub fn resolver(&self) -> &SnapshotResolver {
        &self.resolver
    }

    pub fn mode(&self) -> SnapshotMode {
        self.mode
    }

    /// Repository root path, used to guard in-place checkouts
    pub fn repository_path(&self) -> &Path {
        self.resolver.repository().path()
    }

    /// Gather the record for `year`
    ///
    /// Fails with [`StatsError::NoCommitFound`] when the year predates the main line history.
    pub fn gather(&mut self, year: i32) -> StatsResult<YearRecord> {
        let commit = self.resolver.resolve_last_commit_before(year)?;
        info!("Gathering stats for {} at commit {}", year, commit.short());

        let snapshot = match (&mut self.checkouts, self.mode) {
            (Some(checkouts), SnapshotMode::Export) => self.resolver.export(year, &commit, &self.roots, checkouts)?,
            _ => self.resolver.checkout(year, &commit)?,
        };

        let num_commits = self.resolver.count_commits(year, &commit)?;
        let content = self.walker.walk(&snapshot.content_roots(&self.roots))?;

        if let Some(checkouts) = &mut self.checkouts {
            checkouts.cleanup_commit(&commit.to_string())?;
        }

        let record = YearRecord::from_parts(year, &commit, num_commits, content);
        info!(
            "{}: {} commits, {} content files, {} words, {} images",
            year, record.num_commits, record.num_content_files, record.num_words, record.num_images
        );
        Ok(record)
    }

    /// Gather several years in ascending order, stopping at the first error
    pub fn gather_all(&mut self, years: &[i32]) -> StatsResult<Vec<YearRecord>> {
        let mut sorted = years.to_vec();
        sorted.sort_unstable();
        sorted.dedup();
        sorted.into_iter().map(|year| self.gather(year)).collect()
    }
}
