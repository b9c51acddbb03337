//! The gather, cache and chart pipeline

use anyhow::{Context, Result};
use std::path::PathBuf;
use log::{debug, info, warn};
use crate::analytics::load_analytics;
use crate::chart::{render_charts, ChartDataset};
use crate::git::RepositoryHandle;
use crate::snapshot::{SnapshotMode, WorkingTreeGuard};
use crate::stats::{select_years, StatsCache, YearRecord, YearlyStatsGatherer};
use super::initialization::Settings;

/// What a pipeline run did
#[derive(Debug)]
pub struct PipelineOutcome {
    /// Years gathered in this run, ascending
    pub gathered: Vec<i32>,
    /// The cache as saved
    pub cache: StatsCache,
    /// Chart files written
    pub charts: Vec<PathBuf>,
}

/// Run one full pass: load the cache, gather missing or forced years, save, chart
///
/// Any gathering error aborts the run before the cache is written.
pub fn run_pipeline(settings: &Settings) -> Result<PipelineOutcome> {
    let mut cache = StatsCache::load_or_empty(&settings.cache_file)?;
    debug!("Cache holds years {:?}", cache.years());

    let years = select_years(&settings.years, &cache, &settings.recompute);
    let records = if years.is_empty() {
        info!("All requested years are cached, nothing to gather");
        Vec::new()
    } else {
        info!("Gathering years {:?}", years);
        gather_years(settings, &years)?
    };

    let gathered: Vec<i32> = records.iter().map(|r| r.year).collect();
    cache.merge(records);
    cache.save(&settings.cache_file)?;

    let charts = match &settings.charts_dir {
        Some(dir) => render_year_charts(settings, &cache, dir)?,
        None => Vec::new(),
    };

    Ok(PipelineOutcome { gathered, cache, charts })
}

fn gather_years(settings: &Settings, years: &[i32]) -> Result<Vec<YearRecord>> {
    let repo = RepositoryHandle::open(&settings.repository)?;
    let mut gatherer = YearlyStatsGatherer::new(repo, settings.branch.as_deref(), settings.gather.clone())?;

    if gatherer.mode() == SnapshotMode::Export {
        return Ok(gatherer.gather_all(years)?);
    }

    let mut guard = WorkingTreeGuard::capture(gatherer.repository_path())?;
    let gathered = gatherer.gather_all(years);
    let restored = if settings.restore_head {
        guard.restore()
    } else {
        warn!("Leaving HEAD detached at the last gathered commit");
        guard.disarm();
        Ok(())
    };

    let records = gathered?;
    restored.context("Failed to restore the original HEAD")?;
    Ok(records)
}

fn render_year_charts(settings: &Settings, cache: &StatsCache, dir: &std::path::Path) -> Result<Vec<PathBuf>> {
    let analytics = settings.analytics_file.as_ref()
        .map(load_analytics)
        .transpose()?;
    if analytics.is_none() {
        debug!("No analytics file configured");
    }

    let dataset = ChartDataset::join(cache, analytics.as_ref());
    Ok(render_charts(&dataset, dir)?)
}
