use clap::{Parser, ArgAction};
use anyhow::Result;
use std::path::PathBuf;
use log::debug;

use crate::content::DecodePolicy;
use crate::snapshot::SnapshotMode;
use super::year_parser::parse_years;

/// Yearly content growth statistics for a git-hosted blog
#[derive(Parser, Debug, Default)]
#[command(name = "blogstats")]
#[command(about = "Measure how a blog's content grew year by year from its git history, cache the results and chart them")]
#[command(version)]
pub struct Args {
    /// Path to the blog repository (defaults to the current directory)
    #[arg(value_name = "REPOSITORY")]
    pub repository: Option<PathBuf>,

    /// Years to report, e.g. "2018-2021,2023"
    #[arg(short = 'y', long, value_name = "YEARS")]
    pub years: Option<String>,

    /// Recompute every requested year even when cached
    #[arg(short = 'f', long)]
    pub force: bool,

    /// Recompute these years even when cached (comma separated or repeated)
    #[arg(long = "force-year", value_name = "YEAR", value_delimiter = ',', action = ArgAction::Append)]
    pub force_year: Vec<i32>,

    /// Stats cache file
    #[arg(short = 'c', long, value_name = "FILE")]
    pub cache_file: Option<PathBuf>,

    /// Main line branch or revision (defaults to master, main or trunk, then HEAD)
    #[arg(short = 'b', long, value_name = "BRANCH")]
    pub branch: Option<String>,

    /// Content root relative to the repository (repeatable)
    #[arg(long = "root", value_name = "PATH", action = ArgAction::Append)]
    pub roots: Vec<PathBuf>,

    /// How snapshots are materialized: export or in-place
    #[arg(long, value_name = "MODE")]
    pub snapshot_mode: Option<String>,

    /// Leave the last checked out commit in place instead of restoring HEAD
    #[arg(long = "no-restore")]
    pub no_restore: bool,

    /// Directory for exported snapshots (defaults to a temporary directory)
    #[arg(long, value_name = "DIR")]
    pub checkout_dir: Option<PathBuf>,

    /// Record paths of files that are neither content, images nor diagrams
    #[arg(long)]
    pub collect_other_files: bool,

    /// What to do with content files that are not valid UTF-8: abort or skip
    #[arg(long, value_name = "POLICY")]
    pub on_decode_error: Option<String>,

    /// Year-keyed analytics YAML file with page views
    #[arg(short = 'a', long, value_name = "FILE")]
    pub analytics: Option<PathBuf>,

    /// Render SVG charts into this directory
    #[arg(long = "charts-dir", value_name = "DIR")]
    pub charts_dir: Option<PathBuf>,

    /// Verbose output (debug level logging)
    #[arg(short, long)]
    pub verbose: bool,

    /// Quiet output (error level logging only)
    #[arg(short, long)]
    pub quiet: bool,

    /// Debug output (trace level logging)
    #[arg(long)]
    pub debug: bool,

    /// Log format: text or json
    #[arg(long, value_name = "FORMAT")]
    pub log_format: Option<String>,

    /// Log file path for file output
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Log level for file output (independent of console level)
    #[arg(long, value_name = "LEVEL")]
    pub log_file_level: Option<String>,

    /// Configuration file path
    #[arg(long, value_name = "FILE")]
    pub config_file: Option<PathBuf>,

    /// Configuration section name
    #[arg(long, value_name = "SECTION")]
    pub config_name: Option<String>,

    /// Disable coloured output
    #[arg(long = "no-color")]
    pub no_color: bool,

    /// Force coloured output even when not a terminal
    #[arg(long)]
    pub color: bool,
}

/// Parse command line arguments
pub fn parse_args() -> Args {
    let args = Args::parse();
    debug!("Parsed CLI arguments: {:?}", args);
    args
}

/// Validate CLI argument combinations
pub fn validate_args(args: &Args) -> Result<()> {
    let log_flags_count = [args.verbose, args.quiet, args.debug]
        .iter()
        .filter(|&&flag| flag)
        .count();

    if log_flags_count > 1 {
        return Err(anyhow::anyhow!(
            "Conflicting log level flags: only one of --verbose, --quiet, or --debug may be specified"
        ));
    }

    if let Some(format) = &args.log_format {
        format.parse::<crate::logging::LogFormat>().map_err(|e| anyhow::anyhow!(e))?;
    }

    if let Some(level) = &args.log_file_level {
        crate::logging::parse_log_level(level)?;
        if args.log_file.is_none() {
            return Err(anyhow::anyhow!("--log-file-level requires --log-file to be specified"));
        }
    }

    if args.no_color && args.color {
        return Err(anyhow::anyhow!("--color and --no-color cannot be used together"));
    }

    if let Some(years) = &args.years {
        parse_years(years).map_err(|e| anyhow::anyhow!("Invalid --years '{}': {}", years, e))?;
    }

    if let Some(mode) = &args.snapshot_mode {
        mode.parse::<SnapshotMode>().map_err(|e| anyhow::anyhow!(e))?;
    }

    if let Some(policy) = &args.on_decode_error {
        policy.parse::<DecodePolicy>().map_err(|e| anyhow::anyhow!(e))?;
    }

    debug!("CLI arguments validated");
    Ok(())
}
