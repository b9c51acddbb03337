//! Logging for blogstats
//!
//! A `log` backend writing text or JSON lines to stderr, a log file, or both,
//! with separate levels for each destination.
//!
//! ```no_run
//! use blogstats::logging::{init_logger, LogConfig, LogDestination, LogFormat};
//! use log::LevelFilter;
//! use std::path::PathBuf;
//!
//! init_logger(LogConfig {
//!     console_level: LevelFilter::Info,
//!     file_level: Some(LevelFilter::Debug),
//!     format: LogFormat::Json,
//!     destination: LogDestination::Both(PathBuf::from("blogstats.log")),
//! })?;
//! # Ok::<(), anyhow::Error>(())
//! ```

use log::{Level, LevelFilter};
use serde::{Deserialize, Serialize};
use chrono::{DateTime, Local};
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use anyhow::{Context, Result};

/// Log output format options
#[derive(Debug, Clone, PartialEq)]
pub enum LogFormat {
    Text,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            _ => Err(format!("Invalid log format: {}. Valid options: text, json", s)),
        }
    }
}

/// Log destination options
#[derive(Debug, Clone, PartialEq)]
pub enum LogDestination {
    Console,
    File(PathBuf),
    Both(PathBuf),
}

impl LogDestination {
    fn file_path(&self) -> Option<&Path> {
        match self {
            LogDestination::Console => None,
            LogDestination::File(path) | LogDestination::Both(path) => Some(path),
        }
    }
}

/// One JSON log line
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonLogEntry {
    pub timestamp: String,
    pub level: String,
    pub target: String,
    pub message: String,
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LogConfig {
    pub console_level: LevelFilter,
    pub file_level: Option<LevelFilter>,
    pub format: LogFormat,
    pub destination: LogDestination,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            console_level: LevelFilter::Info,
            file_level: None,
            format: LogFormat::Text,
            destination: LogDestination::Console,
        }
    }
}

impl LogConfig {
    /// Most verbose level any destination accepts
    pub fn max_level(&self) -> LevelFilter {
        match self.file_level {
            Some(file_level) if file_level > self.console_level => file_level,
            _ => self.console_level,
        }
    }
}

pub struct BlogstatsLogger {
    config: LogConfig,
    file: Option<Mutex<File>>,
}

impl BlogstatsLogger {
    /// Create the logger, opening the log file for append if one is configured
    pub fn new(config: LogConfig) -> Result<Self> {
        let file = match config.destination.file_path() {
            Some(path) => {
                let file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .with_context(|| format!("Failed to open log file: {}", path.display()))?;
                Some(Mutex::new(file))
            }
            None => None,
        };
        Ok(Self { config, file })
    }

    fn format_timestamp() -> String {
        let now: DateTime<Local> = Local::now();
        now.format("%Y-%m-%d %H:%M:%S").to_string()
    }

    fn format_text_message(&self, level: Level, target: &str, message: &str) -> String {
        format!("{} [{}] {}: {}", Self::format_timestamp(), level.to_string().to_uppercase(), target, message)
    }

    fn format_json_message(&self, level: Level, target: &str, message: &str) -> Result<String> {
        let entry = JsonLogEntry {
            timestamp: Self::format_timestamp(),
            level: level.to_string().to_uppercase(),
            target: target.to_string(),
            message: message.to_string(),
        };
        serde_json::to_string(&entry).context("Failed to serialize log entry to JSON")
    }

    fn format(&self, level: Level, target: &str, message: &str) -> String {
        match self.config.format {
            LogFormat::Text => self.format_text_message(level, target, message),
            LogFormat::Json => self.format_json_message(level, target, message)
                .unwrap_or_else(|_| self.format_text_message(level, target, message)),
        }
    }

    fn should_log_to_console(&self, level: Level) -> bool {
        !matches!(self.config.destination, LogDestination::File(_)) && level <= self.config.console_level
    }

    fn should_log_to_file(&self, level: Level) -> bool {
        self.file.is_some() && self.config.file_level.map_or(false, |file_level| level <= file_level)
    }

    fn write_to_file(&self, line: &str) -> io::Result<()> {
        if let Some(file) = &self.file {
            let mut file = file.lock().map_err(|_| io::Error::new(io::ErrorKind::Other, "log file lock poisoned"))?;
            writeln!(file, "{}", line)?;
        }
        Ok(())
    }
}

impl log::Log for BlogstatsLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        self.should_log_to_console(metadata.level()) || self.should_log_to_file(metadata.level())
    }

    fn log(&self, record: &log::Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let line = self.format(record.level(), record.target(), &record.args().to_string());

        if self.should_log_to_console(record.level()) {
            let _ = writeln!(io::stderr(), "{}", line);
        }
        if self.should_log_to_file(record.level()) {
            if let Err(e) = self.write_to_file(&line) {
                let _ = writeln!(io::stderr(), "File logging error: {}", e);
            }
        }
    }

    fn flush(&self) {
        let _ = io::stderr().flush();
        if let Some(file) = &self.file {
            if let Ok(mut file) = file.lock() {
                let _ = file.flush();
            }
        }
    }
}

/// Install the global logger
pub fn init_logger(config: LogConfig) -> Result<()> {
    let max_level = config.max_level();
    let logger = BlogstatsLogger::new(config)?;

    log::set_boxed_logger(Box::new(logger)).context("Failed to set global logger")?;
    log::set_max_level(max_level);
    Ok(())
}

/// Convert string to LevelFilter
pub fn parse_log_level(level_str: &str) -> Result<LevelFilter> {
    match level_str.to_lowercase().as_str() {
        "error" => Ok(LevelFilter::Error),
        "warn" | "warning" => Ok(LevelFilter::Warn),
        "info" => Ok(LevelFilter::Info),
        "debug" => Ok(LevelFilter::Debug),
        "trace" => Ok(LevelFilter::Trace),
        "off" => Ok(LevelFilter::Off),
        _ => Err(anyhow::anyhow!("Invalid log level: {}. Valid levels: error, warn, info, debug, trace, off", level_str)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use log::Log;
    use tempfile::TempDir;

    #[test]
    fn test_log_format_parsing() {
        assert_eq!("text".parse::<LogFormat>().unwrap(), LogFormat::Text);
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert!("xml".parse::<LogFormat>().is_err());
    }

    #[test]
    fn test_log_level_parsing() {
        assert_eq!(parse_log_level("error").unwrap(), LevelFilter::Error);
        assert_eq!(parse_log_level("Warning").unwrap(), LevelFilter::Warn);
        assert_eq!(parse_log_level("debug").unwrap(), LevelFilter::Debug);
        assert_eq!(parse_log_level("off").unwrap(), LevelFilter::Off);
        assert!(parse_log_level("loud").is_err());
    }

    #[test]
    fn test_max_level_prefers_verbose_file() {
        let config = LogConfig {
            console_level: LevelFilter::Warn,
            file_level: Some(LevelFilter::Debug),
            ..LogConfig::default()
        };
        assert_eq!(config.max_level(), LevelFilter::Debug);
        assert_eq!(LogConfig::default().max_level(), LevelFilter::Info);
    }

    #[test]
    fn test_timestamp_format() {
        let timestamp = BlogstatsLogger::format_timestamp();
        assert_eq!(timestamp.len(), 19);
        assert_eq!(timestamp.chars().nth(4), Some('-'));
        assert_eq!(timestamp.chars().nth(10), Some(' '));
        assert_eq!(timestamp.chars().nth(13), Some(':'));
    }

    #[test]
    fn test_json_message_formatting() {
        let logger = BlogstatsLogger::new(LogConfig::default()).unwrap();
        let formatted = logger.format_json_message(Level::Info, "blogstats::stats", "Gathering 2019").unwrap();

        let entry: JsonLogEntry = serde_json::from_str(&formatted).unwrap();
        assert_eq!(entry.level, "INFO");
        assert_eq!(entry.target, "blogstats::stats");
        assert_eq!(entry.message, "Gathering 2019");
    }

    #[test]
    fn test_file_destination_writes_lines() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("blogstats.log");
        let logger = BlogstatsLogger::new(LogConfig {
            console_level: LevelFilter::Off,
            file_level: Some(LevelFilter::Info),
            format: LogFormat::Text,
            destination: LogDestination::File(path.clone()),
        })
        .unwrap();

        logger.log(&log::Record::builder()
            .level(Level::Info)
            .target("blogstats")
            .args(format_args!("saved cache"))
            .build());
        logger.log(&log::Record::builder()
            .level(Level::Debug)
            .target("blogstats")
            .args(format_args!("too verbose"))
            .build());
        logger.flush();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("[INFO] blogstats: saved cache"));
        assert!(!content.contains("too verbose"));
    }
}
