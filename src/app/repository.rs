//! Repository path resolution and validation

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use git2::Repository;
use log::{debug, info};

fn expand_tilde(path: &Path) -> PathBuf {
    match (path.strip_prefix("~"), dirs::home_dir()) {
        (Ok(rest), Some(home)) => home.join(rest),
        _ => path.to_path_buf(),
    }
}

/// Resolve the repository to analyse
///
/// Without an argument the current directory is used. Either way the path
/// must sit inside a git repository with a working tree, and the returned path
/// is that working tree's root.
pub fn resolve_repository_path(repository_arg: Option<&Path>) -> Result<PathBuf> {
    let start = match repository_arg {
        Some(path) => {
            let path = expand_tilde(path);
            debug!("Repository path provided: {}", path.display());
            if !path.exists() {
                anyhow::bail!(
                    "Directory does not exist: {}\n\nPlease check the path and try again.",
                    path.display()
                );
            }
            path
        }
        None => std::env::current_dir().context("Failed to get current directory")?,
    };

    let repo = Repository::discover(&start).with_context(|| format!(
        "Not a git repository: {}\n\nRun blogstats inside the blog repository or pass its path as the first argument.",
        start.display()
    ))?;

    let workdir = repo.workdir()
        .with_context(|| format!("Repository at {} is bare; a working tree is required", start.display()))?;

    let root = workdir.canonicalize()
        .with_context(|| format!("Failed to resolve canonical path for: {}", workdir.display()))?;
    info!("Using repository: {}", root.display());
    Ok(root)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_resolve_from_subdirectory() {
        let temp_dir = TempDir::new().unwrap();
        Repository::init(temp_dir.path()).unwrap();
        let nested = temp_dir.path().join("content").join("posts");
        std::fs::create_dir_all(&nested).unwrap();

        let resolved = resolve_repository_path(Some(&nested)).unwrap();
        assert_eq!(resolved, temp_dir.path().canonicalize().unwrap());
    }

    #[test]
    fn test_missing_directory() {
        let temp_dir = TempDir::new().unwrap();
        let err = resolve_repository_path(Some(&temp_dir.path().join("nope"))).unwrap_err();
        assert!(err.to_string().contains("Directory does not exist"));
    }

    #[test]
    fn test_bare_repository_rejected() {
        let temp_dir = TempDir::new().unwrap();
        Repository::init_bare(temp_dir.path()).unwrap();
        assert!(resolve_repository_path(Some(temp_dir.path())).is_err());
    }
}
