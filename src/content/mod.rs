//! Content tree walking and classification
//!
//! Walks a set of root directories, classifies every file by name into
//! markdown, asciidoc, image, diagram or other, and aggregates counts plus text
//! metrics for the content files. Nothing is ever written.

pub mod measure;

use std::path::{Path, PathBuf};
use log::{debug, trace, warn};
use walkdir::WalkDir;
use crate::error::{StatsError, StatsResult};

pub use measure::{measure, measure_text, FileStats};

/// Image extensions, matched against the lowercased file name
pub const IMAGE_EXTENSIONS: &[&str] = &[".png", ".jpg", ".jpeg", ".tiff", ".bmp", ".gif", ".svg"];

/// Default diagram extensions, matched case-sensitively
pub const DEFAULT_DIAGRAM_EXTENSIONS: &[&str] = &[".odg"];

/// File category assigned by name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Markdown,
    Asciidoc,
    Image,
    Diagram,
    Other,
}

impl Category {
    /// Whether files of this category are measured for text statistics
    pub fn is_content(self) -> bool {
        matches!(self, Category::Markdown | Category::Asciidoc)
    }
}

/// What to do with a content file that is not valid UTF-8
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DecodePolicy {
    /// Fail the whole walk
    #[default]
    Abort,
    /// Log a warning and leave the file out of every count
    Skip,
}

impl std::str::FromStr for DecodePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "abort" => Ok(DecodePolicy::Abort),
            "skip" => Ok(DecodePolicy::Skip),
            _ => Err(format!("Invalid decode policy: {}. Valid options: abort, skip", s)),
        }
    }
}

/// Walker configuration
#[derive(Debug, Clone)]
pub struct WalkerConfig {
    /// Record names of files that match no category
    pub collect_other_files: bool,
    /// Diagram extensions including the leading dot
    pub diagram_extensions: Vec<String>,
    pub decode_policy: DecodePolicy,
}

impl Default for WalkerConfig {
    fn default() -> Self {
        Self {
            collect_other_files: false,
            diagram_extensions: DEFAULT_DIAGRAM_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            decode_policy: DecodePolicy::Abort,
        }
    }
}

/// Aggregated counts for one walk
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentStats {
    pub num_markdown_files: u64,
    pub num_asciidoc_files: u64,
    pub num_images: u64,
    pub num_diagrams: u64,
    pub text: FileStats,
    /// Sorted names of unmatched files, empty unless collection is enabled
    pub other_files: Vec<String>,
}

impl ContentStats {
    pub fn num_content_files(&self) -> u64 {
        self.num_markdown_files + self.num_asciidoc_files
    }
}

/// Walks content roots and aggregates per-category counts
#[derive(Debug, Clone, Default)]
pub struct ContentWalker {
    config: WalkerConfig,
}

impl ContentWalker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: WalkerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &WalkerConfig {
        &self.config
    }

    /// Classify a file name
    ///
    /// Priority: `.md`, `.adoc`, image extensions (case-insensitive), diagram
    /// extensions, then other.
    pub fn classify(&self, file_name: &str) -> Category {
        if file_name.ends_with(".md") {
            Category::Markdown
        } else if file_name.ends_with(".adoc") {
            Category::Asciidoc
        } else if is_image(file_name) {
            Category::Image
        } else if self.config.diagram_extensions.iter().any(|ext| file_name.ends_with(ext.as_str())) {
            Category::Diagram
        } else {
            Category::Other
        }
    }

    /// Walk every root and return the aggregated counts
    ///
    /// Roots that do not exist are skipped.
    pub fn walk<P: AsRef<Path>>(&self, roots: &[P]) -> StatsResult<ContentStats> {
        let mut stats = ContentStats::default();

        for root in roots {
            let root = root.as_ref();
            if !root.is_dir() {
                debug!("Content root does not exist, skipping: {}", root.display());
                continue;
            }
            debug!("Walking content root: {}", root.display());

            for entry in WalkDir::new(root).follow_links(false) {
                let entry = entry.map_err(|e| walk_error(root, e))?;
                if !entry.file_type().is_file() {
                    continue;
                }
                let file_name = entry.file_name().to_string_lossy();
                self.visit(entry.path(), &file_name, &mut stats)?;
            }
        }

        stats.other_files.sort();
        Ok(stats)
    }

    fn visit(&self, path: &Path, file_name: &str, stats: &mut ContentStats) -> StatsResult<()> {
        let category = self.classify(file_name);
        trace!("{} -> {:?}", path.display(), category);

        match category {
            Category::Markdown | Category::Asciidoc => {
                let text = match measure(path) {
                    Ok(text) => text,
                    Err(StatsError::Decode { path, source }) if self.config.decode_policy == DecodePolicy::Skip => {
                        warn!("Skipping content file that is not valid UTF-8: {} ({})", path.display(), source);
                        return Ok(());
                    }
                    Err(e) => return Err(e),
                };
                if category == Category::Markdown {
                    stats.num_markdown_files += 1;
                } else {
                    stats.num_asciidoc_files += 1;
                }
                stats.text += text;
            }
            Category::Image => stats.num_images += 1,
            Category::Diagram => stats.num_diagrams += 1,
            Category::Other => {
                if self.config.collect_other_files {
                    stats.other_files.push(file_name.to_string());
                }
            }
        }
        Ok(())
    }
}

fn is_image(file_name: &str) -> bool {
    let lower = file_name.to_lowercase();
    IMAGE_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}

fn walk_error(root: &Path, error: walkdir::Error) -> StatsError {
    let path = error.path().map(PathBuf::from).unwrap_or_else(|| root.to_path_buf());
    let source = error.into_io_error()
        .unwrap_or_else(|| std::io::Error::new(std::io::ErrorKind::Other, "filesystem loop detected"));
    StatsError::io(path, source)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &Path, rel: &str, content: &[u8]) {
        let path = dir.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_classify_priority() {
        let walker = ContentWalker::new();
        assert_eq!(walker.classify("post.md"), Category::Markdown);
        assert_eq!(walker.classify("guide.adoc"), Category::Asciidoc);
        assert_eq!(walker.classify("photo.JPG"), Category::Image);
        assert_eq!(walker.classify("logo.Svg"), Category::Image);
        assert_eq!(walker.classify("flow.odg"), Category::Diagram);
        assert_eq!(walker.classify("notes.txt"), Category::Other);
    }

    #[test]
    fn test_classify_is_case_sensitive_for_text_and_diagrams() {
        let walker = ContentWalker::new();
        assert_eq!(walker.classify("README.MD"), Category::Other);
        assert_eq!(walker.classify("guide.ADOC"), Category::Other);
        assert_eq!(walker.classify("flow.ODG"), Category::Other);
    }

    #[test]
    fn test_classify_extra_diagram_extension() {
        let walker = ContentWalker::with_config(WalkerConfig {
            diagram_extensions: vec![".odg".to_string(), ".drawio".to_string()],
            ..WalkerConfig::default()
        });
        assert_eq!(walker.classify("arch.drawio"), Category::Diagram);
        assert_eq!(walker.classify("flow.odg"), Category::Diagram);
    }

    #[test]
    fn test_walk_mixed_directory() {
        let temp_dir = TempDir::new().unwrap();
        write(temp_dir.path(), "logo.svg", b"<svg/>");
        write(temp_dir.path(), "flow.odg", b"\x00\x01binary");
        write(temp_dir.path(), "post.md", b"hello world\nfoo\n");
        write(temp_dir.path(), "notes.txt", b"not counted at all\n");

        let stats = ContentWalker::new().walk(&[temp_dir.path()]).unwrap();
        assert_eq!(stats.num_images, 1);
        assert_eq!(stats.num_diagrams, 1);
        assert_eq!(stats.num_markdown_files, 1);
        assert_eq!(stats.num_asciidoc_files, 0);
        assert_eq!(stats.num_content_files(), 1);
        assert_eq!(stats.text, FileStats { num_chars: 16, num_words: 3, num_lines: 2 });
        assert!(stats.other_files.is_empty());
    }

    #[test]
    fn test_walk_collects_other_files_when_enabled() {
        let temp_dir = TempDir::new().unwrap();
        write(temp_dir.path(), "b/zeta.txt", b"z");
        write(temp_dir.path(), "a/alpha.toml", b"a");
        write(temp_dir.path(), "post.md", b"x\n");

        let walker = ContentWalker::with_config(WalkerConfig {
            collect_other_files: true,
            ..WalkerConfig::default()
        });
        let stats = walker.walk(&[temp_dir.path()]).unwrap();
        assert_eq!(stats.other_files, vec!["alpha.toml".to_string(), "zeta.txt".to_string()]);
    }

    #[test]
    fn test_walk_multiple_roots_and_missing_root() {
        let temp_dir = TempDir::new().unwrap();
        write(temp_dir.path(), "content/posts/one.md", b"one\n");
        write(temp_dir.path(), "content/docs/two.adoc", b"two words\n");
        write(temp_dir.path(), "static/images/pic.png", b"\x89PNG");

        let roots = vec![
            temp_dir.path().join("content"),
            temp_dir.path().join("static/images"),
            temp_dir.path().join("does-not-exist"),
        ];
        let stats = ContentWalker::new().walk(&roots).unwrap();
        assert_eq!(stats.num_markdown_files, 1);
        assert_eq!(stats.num_asciidoc_files, 1);
        assert_eq!(stats.num_content_files(), 2);
        assert_eq!(stats.num_images, 1);
        assert_eq!(stats.text.num_words, 3);
        assert_eq!(stats.text.num_lines, 2);
    }

    #[test]
    fn test_walk_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        for i in 0..12 {
            write(temp_dir.path(), &format!("d{}/post{}.md", i % 3, i), format!("word {i}\n").as_bytes());
            write(temp_dir.path(), &format!("d{}/img{}.gif", i % 4, i), b"GIF89a");
        }
        let walker = ContentWalker::with_config(WalkerConfig {
            collect_other_files: true,
            ..WalkerConfig::default()
        });

        let first = walker.walk(&[temp_dir.path()]).unwrap();
        let second = walker.walk(&[temp_dir.path()]).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.num_markdown_files, 12);
        assert_eq!(first.num_images, 12);
    }

    #[test]
    fn test_walk_decode_error_aborts_by_default() {
        let temp_dir = TempDir::new().unwrap();
        write(temp_dir.path(), "bad.md", &[0xff, 0xfe, 0x00]);

        let result = ContentWalker::new().walk(&[temp_dir.path()]);
        assert!(matches!(result, Err(StatsError::Decode { .. })));
    }

    #[test]
    fn test_walk_decode_error_skipped_when_configured() {
        let temp_dir = TempDir::new().unwrap();
        write(temp_dir.path(), "bad.md", &[0xff, 0xfe, 0x00]);
        write(temp_dir.path(), "good.md", b"fine text\n");

        let walker = ContentWalker::with_config(WalkerConfig {
            decode_policy: DecodePolicy::Skip,
            ..WalkerConfig::default()
        });
        let stats = walker.walk(&[temp_dir.path()]).unwrap();
        assert_eq!(stats.num_markdown_files, 1);
        assert_eq!(stats.text.num_words, 2);
    }

    #[test]
    fn test_decode_policy_parsing() {
        assert_eq!("abort".parse::<DecodePolicy>().unwrap(), DecodePolicy::Abort);
        assert_eq!("SKIP".parse::<DecodePolicy>().unwrap(), DecodePolicy::Skip);
        assert!("ignore".parse::<DecodePolicy>().is_err());
    }
}
