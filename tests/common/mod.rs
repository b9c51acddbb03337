//! Shared fixture: a small blog repository with commits at fixed times

#![allow(dead_code)]

use git2::{IndexAddOption, Oid, Repository, RepositoryInitOptions, Signature, Time};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// 2019-06-01T00:00:00Z
pub const JUNE_2019: i64 = 1_559_347_200;
/// 2021-03-01T00:00:00Z
pub const MARCH_2021: i64 = 1_614_556_800;

pub struct BlogRepo {
    pub dir: TempDir,
    pub repo: Repository,
}

impl BlogRepo {
    pub fn init() -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let mut opts = RepositoryInitOptions::new();
        opts.initial_head("master");
        let repo = Repository::init_opts(dir.path(), &opts).expect("Failed to init test repository");
        Self { dir, repo }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn write(&self, relative: &str, content: &[u8]) {
        let path = self.dir.path().join(relative);
        fs::create_dir_all(path.parent().expect("file has a parent")).expect("Failed to create dirs");
        fs::write(path, content).expect("Failed to write file");
    }

    /// Commit everything in the working tree with author and committer time `seconds`
    pub fn commit_all(&self, message: &str, seconds: i64) -> Oid {
        let mut index = self.repo.index().expect("Failed to open index");
        index.add_all(["*"].iter(), IndexAddOption::DEFAULT, None).expect("Failed to add files");
        index.write().expect("Failed to write index");
        let tree_id = index.write_tree().expect("Failed to write tree");
        let tree = self.repo.find_tree(tree_id).expect("Failed to find tree");

        let signature = Signature::new("Blog Author", "author@example.com", &Time::new(seconds, 0))
            .expect("Failed to create signature");
        let parent = self.repo.head().ok().and_then(|h| h.peel_to_commit().ok());
        let parents: Vec<&git2::Commit> = parent.iter().collect();

        self.repo
            .commit(Some("HEAD"), &signature, &signature, message, &tree, &parents)
            .expect("Failed to commit")
    }
}

/// A blog with one commit in 2019 and one in 2021
///
/// 2019: `content/posts/first.md` ("hello world\nfoo\n") and one image.
/// 2021: adds an AsciiDoc post, a diagram and a file outside the content roots.
pub fn two_year_blog() -> (BlogRepo, Oid, Oid) {
    let blog = BlogRepo::init();
    blog.write("content/posts/first.md", b"hello world\nfoo\n");
    blog.write("static/images/logo.PNG", &[0x89, 0x50, 0x4e, 0x47]);
    blog.write("README.md", b"not part of the blog content\n");
    let first = blog.commit_all("First post", JUNE_2019);

    blog.write("content/posts/second.adoc", b"= Second\n\nfour more words here\n");
    blog.write("content/diagrams/flow.odg", b"diagram");
    blog.write("themes/site.css", b"body {}\n");
    let second = blog.commit_all("Second post", MARCH_2021);

    (blog, first, second)
}

pub fn default_roots() -> Vec<PathBuf> {
    vec![PathBuf::from("content"), PathBuf::from("static/images")]
}
