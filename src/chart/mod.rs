//! Yearly charts
//!
//! Joins the stats cache with external analytics by year and renders one SVG
//! bar chart per metric into an output directory.

pub mod styles;

use std::fs;
use std::path::{Path, PathBuf};
use log::{debug, info, warn};
use plotters::prelude::*;
use crate::analytics::Analytics;
use crate::error::{StatsError, StatsResult};
use crate::stats::StatsCache;

pub use styles::{ChartStyle, ChartTheme};

/// One year of chart data
#[derive(Debug, Clone, PartialEq)]
pub struct ChartRow {
    pub year: i32,
    pub num_pageviews: Option<u64>,
    pub num_content_files: u64,
    pub num_words: u64,
    pub num_images: u64,
}

/// Stats joined with analytics, ascending by year
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChartDataset {
    rows: Vec<ChartRow>,
}

impl ChartDataset {
    /// Build rows for every cached year
    ///
    /// Analytics years with no cached stats are ignored.
    pub fn join(cache: &StatsCache, analytics: Option<&Analytics>) -> Self {
        let rows = cache.iter()
            .map(|record| ChartRow {
                year: record.year,
                num_pageviews: analytics.and_then(|a| a.pageviews(record.year)),
                num_content_files: record.num_content_files,
                num_words: record.num_words,
                num_images: record.num_images,
            })
            .collect();
        Self { rows }
    }

    pub fn rows(&self) -> &[ChartRow] {
        &self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn has_pageviews(&self) -> bool {
        self.rows.iter().any(|row| row.num_pageviews.is_some())
    }
}

/// A metric that gets its own chart
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartMetric {
    PageViews,
    ContentFiles,
    Words,
    Images,
}

impl ChartMetric {
    pub const ALL: [ChartMetric; 4] = [
        ChartMetric::PageViews,
        ChartMetric::ContentFiles,
        ChartMetric::Words,
        ChartMetric::Images,
    ];

    pub fn file_name(self) -> &'static str {
        match self {
            ChartMetric::PageViews => "pageviews.svg",
            ChartMetric::ContentFiles => "content-files.svg",
            ChartMetric::Words => "words.svg",
            ChartMetric::Images => "images.svg",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            ChartMetric::PageViews => "Page Views per Year",
            ChartMetric::ContentFiles => "Content Files",
            ChartMetric::Words => "Words Written",
            ChartMetric::Images => "Images",
        }
    }

    fn y_label(self) -> &'static str {
        match self {
            ChartMetric::PageViews => "Page views",
            ChartMetric::ContentFiles => "Markdown + AsciiDoc files",
            ChartMetric::Words => "Words",
            ChartMetric::Images => "Images",
        }
    }

    /// Missing page views plot as zero
    pub fn value(self, row: &ChartRow) -> u64 {
        match self {
            ChartMetric::PageViews => row.num_pageviews.unwrap_or(0),
            ChartMetric::ContentFiles => row.num_content_files,
            ChartMetric::Words => row.num_words,
            ChartMetric::Images => row.num_images,
        }
    }
}

fn chart_err<E: std::fmt::Display>(e: E) -> StatsError {
    StatsError::chart(e.to_string())
}

/// Render every chart into `out_dir`, creating it if needed
///
/// The page view chart is only drawn when some year has analytics. Returns the
/// paths written.
pub fn render_charts(dataset: &ChartDataset, out_dir: &Path) -> StatsResult<Vec<PathBuf>> {
    render_charts_with(dataset, out_dir, &ChartTheme::default(), &ChartStyle::default())
}

pub fn render_charts_with(
    dataset: &ChartDataset,
    out_dir: &Path,
    theme: &ChartTheme,
    style: &ChartStyle,
) -> StatsResult<Vec<PathBuf>> {
    if dataset.is_empty() {
        warn!("No cached years to chart");
        return Ok(Vec::new());
    }
    fs::create_dir_all(out_dir).map_err(|e| StatsError::io(out_dir, e))?;

    let mut written = Vec::new();
    for metric in ChartMetric::ALL {
        if metric == ChartMetric::PageViews && !dataset.has_pageviews() {
            debug!("No analytics supplied, skipping {}", metric.file_name());
            continue;
        }
        let path = out_dir.join(metric.file_name());
        render_bar_chart(&path, dataset, metric, theme, style)?;
        written.push(path);
    }

    info!("Rendered {} charts into {}", written.len(), out_dir.display());
    Ok(written)
}

fn render_bar_chart(
    path: &Path,
    dataset: &ChartDataset,
    metric: ChartMetric,
    theme: &ChartTheme,
    style: &ChartStyle,
) -> StatsResult<()> {
    let points: Vec<(i32, u64)> = dataset.rows()
        .iter()
        .map(|row| (row.year, metric.value(row)))
        .collect();
    let first_year = points.first().map(|p| p.0).unwrap_or(0);
    let last_year = points.last().map(|p| p.0).unwrap_or(first_year);
    let max_value = points.iter().map(|p| p.1).max().unwrap_or(0);
    let y_top = max_value + max_value / 10 + 1;

    let root = SVGBackend::new(path, (style.width, style.height)).into_drawing_area();
    root.fill(&theme.background_color).map_err(chart_err)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(
            metric.title(),
            ("sans-serif", style.font_size * 2).into_font().color(&theme.text_color),
        )
        .margin(style.margin)
        .x_label_area_size(style.label_area_size)
        .y_label_area_size(style.label_area_size + 20)
        .build_cartesian_2d((first_year..last_year + 1).into_segmented(), 0u64..y_top)
        .map_err(chart_err)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .bold_line_style(&theme.grid_color)
        .axis_style(&theme.axis_color)
        .label_style(("sans-serif", style.font_size).into_font().color(&theme.text_color))
        .x_desc("Year")
        .y_desc(metric.y_label())
        .x_label_formatter(&|value: &SegmentValue<i32>| match value {
            SegmentValue::Exact(year) | SegmentValue::CenterOf(year) => year.to_string(),
            SegmentValue::Last => String::new(),
        })
        .draw()
        .map_err(chart_err)?;

    chart
        .draw_series(
            Histogram::vertical(&chart)
                .style(theme.bar_color.filled())
                .margin(style.bar_margin)
                .data(points.iter().copied()),
        )
        .map_err(chart_err)?;

    root.present().map_err(chart_err)?;
    debug!("Wrote chart {}", path.display());
    Ok(())
}
