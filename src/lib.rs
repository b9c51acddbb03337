//! Yearly content growth statistics for a git-hosted blog
//!
//! For each requested year the last main line commit before January 1 of the
//! next year is materialised, its content roots are walked and measured, and
//! the resulting [`stats::YearRecord`] lands in a year-keyed YAML cache that
//! charts are rendered from.

pub mod analytics;
pub mod app;
pub mod chart;
pub mod cli;
pub mod config;
pub mod content;
pub mod display;
pub mod error;
pub mod git;
pub mod logging;
pub mod snapshot;
pub mod stats;

pub use error::{StatsError, StatsResult};
