//! Application initialization and configuration
//!
//! Every setting resolves as CLI flag, then config file, then built-in default.

use anyhow::{Context, Result};
use std::path::PathBuf;
use log::{debug, LevelFilter};
use crate::{cli, config, display, logging};
use crate::content::{DecodePolicy, WalkerConfig};
use crate::snapshot::SnapshotMode;
use crate::stats::{normalize_roots, GatherConfig, RecomputePolicy};

/// Config section holding the gathering settings
pub const STATS_SECTION: &str = "stats";
/// Config section holding the chart settings
pub const CHARTS_SECTION: &str = "charts";

/// Years reported when neither the CLI nor the config names any
pub const DEFAULT_YEARS: &str = "2018-2021";
pub const DEFAULT_CACHE_FILE: &str = "stats-cache.yaml";

/// Fully resolved run settings
#[derive(Debug, Clone)]
pub struct Settings {
    pub repository: PathBuf,
    pub years: Vec<i32>,
    pub recompute: RecomputePolicy,
    pub cache_file: PathBuf,
    pub branch: Option<String>,
    pub gather: GatherConfig,
    /// Put HEAD back after in-place snapshots
    pub restore_head: bool,
    pub analytics_file: Option<PathBuf>,
    pub charts_dir: Option<PathBuf>,
}

pub fn load_configuration(args: &cli::Args) -> Result<config::ConfigManager> {
    let mut manager = if let Some(config_file) = &args.config_file {
        debug!("Loading configuration from explicit file: {}", config_file.display());
        config::ConfigManager::load_from_file(config_file.clone())?
    } else {
        config::ConfigManager::load()?
    };

    if let Some(section_name) = &args.config_name {
        manager.select_section(section_name.clone());
    }

    Ok(manager)
}

pub fn configure_logging(args: &cli::Args, config: &config::ConfigManager) -> Result<logging::LogConfig> {
    let console_level = if args.debug {
        LevelFilter::Trace
    } else if args.verbose {
        LevelFilter::Debug
    } else if args.quiet {
        LevelFilter::Error
    } else {
        config.get_log_level("base", "console-level")?.unwrap_or(LevelFilter::Info)
    };

    let format = match args.log_format.as_deref().or_else(|| config.get_value("base", "log-format").map(String::as_str)) {
        Some(format) => format.parse::<logging::LogFormat>().map_err(|e| anyhow::anyhow!(e))?,
        None => logging::LogFormat::Text,
    };

    let log_file = args.log_file.clone().or_else(|| config.get_path("base", "log-file"));

    let file_level = match &args.log_file_level {
        Some(level) => Some(logging::parse_log_level(level)?),
        None => config.get_log_level("base", "file-log-level")?,
    };

    let (destination, file_level) = match (log_file, file_level) {
        (Some(path), level) => (logging::LogDestination::Both(path), Some(level.unwrap_or(console_level))),
        (None, Some(_)) => anyhow::bail!("A file log level was given without a log file"),
        (None, None) => (logging::LogDestination::Console, None),
    };

    Ok(logging::LogConfig {
        console_level,
        file_level,
        format,
        destination,
    })
}

/// Create a ColourManager from CLI arguments and configuration file
///
/// Precedence: --no-color, --color, then `[base] color`.
pub fn create_colour_manager(args: &cli::Args, config: &config::ConfigManager) -> display::ColourManager {
    if args.no_color || args.color {
        return display::ColourManager::from_color_args(args.no_color, args.color);
    }
    match config.get_bool("base", "color") {
        Ok(Some(enabled)) => display::ColourManager::from_color_args(!enabled, enabled),
        _ => display::ColourManager::new(),
    }
}

fn parse_setting<T>(value: Option<&String>, key: &str) -> Result<Option<T>>
where
    T: std::str::FromStr<Err = String>,
{
    value
        .map(|v| v.parse::<T>().map_err(|e| anyhow::anyhow!("Invalid {}: {}", key, e)))
        .transpose()
}

/// Resolve the run settings for `repository`
pub fn build_settings(
    args: &cli::Args,
    config: &config::ConfigManager,
    repository: PathBuf,
) -> Result<Settings> {
    let years_arg = args.years.clone()
        .or_else(|| config.get_value(STATS_SECTION, "years").cloned())
        .unwrap_or_else(|| DEFAULT_YEARS.to_string());
    let years = cli::parse_years(&years_arg)
        .with_context(|| format!("Invalid years '{}'", years_arg))?;

    let recompute = RecomputePolicy {
        all: args.force || config.get_bool(STATS_SECTION, "force")?.unwrap_or(false),
        years: args.force_year.iter().copied().collect(),
    };

    let cache_file = args.cache_file.clone()
        .or_else(|| config.get_path(STATS_SECTION, "cache-file"))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CACHE_FILE));

    let branch = args.branch.clone()
        .or_else(|| config.get_value(STATS_SECTION, "branch").cloned());

    let mut gather = GatherConfig::default();
    if !args.roots.is_empty() {
        gather.roots = args.roots.clone();
    } else if let Some(roots) = config.get_list(STATS_SECTION, "roots") {
        gather.roots = roots.into_iter().map(PathBuf::from).collect();
    }
    gather.roots = normalize_roots(&gather.roots)?;

    let mode = args.snapshot_mode.as_ref().or_else(|| config.get_value(STATS_SECTION, "snapshot-mode"));
    if let Some(mode) = parse_setting::<SnapshotMode>(mode, "snapshot mode")? {
        gather.mode = mode;
    }
    gather.checkout_dir = args.checkout_dir.clone()
        .or_else(|| config.get_path(STATS_SECTION, "checkout-dir"));

    let mut walker = WalkerConfig::default();
    walker.collect_other_files = args.collect_other_files
        || config.get_bool(STATS_SECTION, "collect-other-files")?.unwrap_or(false);
    if let Some(extensions) = config.get_list(STATS_SECTION, "diagram-extensions") {
        walker.diagram_extensions = extensions.into_iter()
            .map(|ext| if ext.starts_with('.') { ext } else { format!(".{}", ext) })
            .collect();
    }
    let policy = args.on_decode_error.as_ref().or_else(|| config.get_value(STATS_SECTION, "on-decode-error"));
    if let Some(policy) = parse_setting::<DecodePolicy>(policy, "decode error policy")? {
        walker.decode_policy = policy;
    }
    gather.walker = walker;

    let restore_head = !args.no_restore && config.get_bool(STATS_SECTION, "restore-head")?.unwrap_or(true);

    let analytics_file = args.analytics.clone()
        .or_else(|| config.get_path(CHARTS_SECTION, "analytics-file"));
    let charts_dir = args.charts_dir.clone()
        .or_else(|| config.get_path(CHARTS_SECTION, "output-dir"));

    let settings = Settings {
        repository,
        years,
        recompute,
        cache_file,
        branch,
        gather,
        restore_head,
        analytics_file,
        charts_dir,
    };
    debug!("Resolved settings: {:?}", settings);
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::collections::HashMap;
    use crate::config::{ConfigManager, Configuration};

    fn config(sections: &[(&str, &[(&str, &str)])]) -> ConfigManager {
        let mut config = Configuration::new();
        for (name, values) in sections {
            let section: HashMap<String, String> = values.iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect();
            config.insert(name.to_string(), section);
        }
        ConfigManager::from_config(config)
    }

    fn args(argv: &[&str]) -> cli::Args {
        let mut full = vec!["blogstats"];
        full.extend_from_slice(argv);
        cli::Args::try_parse_from(full).unwrap()
    }

    #[test]
    fn test_defaults() {
        let settings = build_settings(&args(&[]), &config(&[]), PathBuf::from("/blog")).unwrap();

        assert_eq!(settings.years, vec![2018, 2019, 2020, 2021]);
        assert_eq!(settings.cache_file, PathBuf::from(DEFAULT_CACHE_FILE));
        assert_eq!(settings.gather.mode, SnapshotMode::Export);
        assert_eq!(settings.gather.roots, vec![PathBuf::from("content"), PathBuf::from("static/images")]);
        assert!(settings.restore_head);
        assert!(!settings.recompute.all);
        assert!(!settings.gather.walker.collect_other_files);
        assert!(settings.charts_dir.is_none());
    }

    #[test]
    fn test_config_values_apply() {
        let config = config(&[
            ("stats", &[
                ("years", "2019,2020"),
                ("cache-file", "cache/blog.yaml"),
                ("branch", "publish"),
                ("roots", "posts,assets"),
                ("snapshot-mode", "in-place"),
                ("restore-head", "false"),
                ("diagram-extensions", "odg,.svgz"),
                ("on-decode-error", "skip"),
            ]),
            ("charts", &[("output-dir", "charts")]),
        ]);
        let settings = build_settings(&args(&[]), &config, PathBuf::from("/blog")).unwrap();

        assert_eq!(settings.years, vec![2019, 2020]);
        assert_eq!(settings.cache_file, PathBuf::from("cache/blog.yaml"));
        assert_eq!(settings.branch.as_deref(), Some("publish"));
        assert_eq!(settings.gather.roots, vec![PathBuf::from("posts"), PathBuf::from("assets")]);
        assert_eq!(settings.gather.mode, SnapshotMode::InPlace);
        assert!(!settings.restore_head);
        assert_eq!(settings.gather.walker.diagram_extensions, vec![".odg".to_string(), ".svgz".to_string()]);
        assert_eq!(settings.gather.walker.decode_policy, DecodePolicy::Skip);
        assert_eq!(settings.charts_dir, Some(PathBuf::from("charts")));
    }

    #[test]
    fn test_cli_overrides_config() {
        let config = config(&[("stats", &[("years", "2015"), ("branch", "publish"), ("snapshot-mode", "in-place")])]);
        let settings = build_settings(
            &args(&["--years", "2020-2021", "--branch", "main", "--snapshot-mode", "export", "--force-year", "2020"]),
            &config,
            PathBuf::from("/blog"),
        )
        .unwrap();

        assert_eq!(settings.years, vec![2020, 2021]);
        assert_eq!(settings.branch.as_deref(), Some("main"));
        assert_eq!(settings.gather.mode, SnapshotMode::Export);
        assert!(settings.recompute.years.contains(&2020));
    }

    #[test]
    fn test_invalid_config_value_is_error() {
        let config = config(&[("stats", &[("snapshot-mode", "clone")])]);
        assert!(build_settings(&args(&[]), &config, PathBuf::from("/blog")).is_err());
    }

    #[test]
    fn test_roots_are_normalized() {
        let settings = build_settings(
            &args(&["--root", "./content/", "--root", "static/images"]),
            &config(&[]),
            PathBuf::from("/blog"),
        )
        .unwrap();
        assert_eq!(settings.gather.roots, vec![PathBuf::from("content"), PathBuf::from("static/images")]);

        let absolute = config(&[("stats", &[("roots", "/srv/blog/content")])]);
        assert!(build_settings(&args(&[]), &absolute, PathBuf::from("/blog")).is_err());
        assert!(build_settings(&args(&["--root", "../drafts"]), &config(&[]), PathBuf::from("/blog")).is_err());
    }

    #[test]
    fn test_configure_logging_levels() {
        let config = config(&[("base", &[("console-level", "warn")])]);

        let log_config = configure_logging(&args(&[]), &config).unwrap();
        assert_eq!(log_config.console_level, LevelFilter::Warn);
        assert_eq!(log_config.destination, logging::LogDestination::Console);

        let log_config = configure_logging(&args(&["-v", "--log-file", "run.log"]), &config).unwrap();
        assert_eq!(log_config.console_level, LevelFilter::Debug);
        assert_eq!(log_config.file_level, Some(LevelFilter::Debug));
        assert_eq!(log_config.destination, logging::LogDestination::Both(PathBuf::from("run.log")));
    }
}
