//! Text measurement for content files
//!
//! Counts lines, whitespace-delimited words and characters. Content is decoded
//! as UTF-8; `\r\n` and lone `\r` terminators are normalised to a single `\n`
//! before counting, so a terminator always contributes one character.

use std::fs;
use std::ops::AddAssign;
use std::path::Path;
use serde::{Deserialize, Serialize};
use crate::error::{StatsError, StatsResult};

/// Character, word and line counts for a piece of text
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileStats {
    pub num_chars: u64,
    pub num_words: u64,
    pub num_lines: u64,
}

impl AddAssign for FileStats {
    fn add_assign(&mut self, other: Self) {
        self.num_chars += other.num_chars;
        self.num_words += other.num_words;
        self.num_lines += other.num_lines;
    }
}

/// Read a file and measure it
///
/// Fails with [`StatsError::Decode`] if the file is not valid UTF-8.
pub fn measure(path: &Path) -> StatsResult<FileStats> {
    let bytes = fs::read(path).map_err(|e| StatsError::io(path, e))?;
    let text = std::str::from_utf8(&bytes)
        .map_err(|source| StatsError::Decode { path: path.to_path_buf(), source })?;
    Ok(measure_text(text))
}

/// Measure text that is already in memory
pub fn measure_text(text: &str) -> FileStats {
    let mut stats = FileStats::default();
    for line in lines_with_terminators(text) {
        stats.num_lines += 1;
        stats.num_words += line.split_whitespace().count() as u64;
        stats.num_chars += line_length(line);
    }
    stats
}

/// Character count of a line with its terminator counted once
fn line_length(line: &str) -> u64 {
    let body = line.strip_suffix("\r\n")
        .or_else(|| line.strip_suffix('\n'))
        .or_else(|| line.strip_suffix('\r'));
    match body {
        Some(body) => body.chars().count() as u64 + 1,
        None => line.chars().count() as u64,
    }
}

/// Split text into lines, each keeping its own terminator
fn lines_with_terminators(text: &str) -> impl Iterator<Item = &str> {
    let bytes = text.as_bytes();
    let mut start = 0;
    let mut pos = 0;
    std::iter::from_fn(move || {
        while pos < bytes.len() {
            let end = match bytes[pos] {
                b'\n' => pos + 1,
                b'\r' if bytes.get(pos + 1) == Some(&b'\n') => pos + 2,
                b'\r' => pos + 1,
                _ => {
                    pos += 1;
                    continue;
                }
            };
            let line = &text[start..end];
            start = end;
            pos = end;
            return Some(line);
        }
        if start < bytes.len() {
            let line = &text[start..];
            start = bytes.len();
            return Some(line);
        }
        None
    })
}
