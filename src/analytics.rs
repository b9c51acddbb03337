//! External analytics input
//!
//! A read-only, year-keyed YAML file supplying page views and any other named
//! numeric metrics per year:
//!
//! ```yaml
//! 2019:
//!   num_pageviews: 41000
//!   num_visitors: 12000
//! 2020:
//!   num_pageviews: 87000
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use log::{debug, info};
use serde::Deserialize;
use serde_yaml::Value;
use crate::error::{StatsError, StatsResult};
use crate::stats::cache::YearKey;

/// Metrics supplied for one year
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnalyticsRecord {
    pub num_pageviews: u64,
    /// Any other named numeric metrics
    pub metrics: BTreeMap<String, f64>,
}

#[derive(Deserialize)]
struct RawAnalyticsRecord {
    num_pageviews: u64,
    #[serde(flatten)]
    extra: BTreeMap<String, Value>,
}

impl AnalyticsRecord {
    fn from_raw(year: i32, raw: RawAnalyticsRecord) -> Self {
        let mut metrics = BTreeMap::new();
        for (name, value) in raw.extra {
            match value.as_f64() {
                Some(number) => {
                    metrics.insert(name, number);
                }
                None => debug!("Ignoring non-numeric analytics metric '{}' for {}", name, year),
            }
        }
        Self { num_pageviews: raw.num_pageviews, metrics }
    }
}

/// Year-keyed analytics records
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Analytics {
    records: BTreeMap<i32, AnalyticsRecord>,
}

impl Analytics {
    pub fn from_yaml(content: &str) -> StatsResult<Self> {
        let raw: BTreeMap<YearKey, RawAnalyticsRecord> = serde_yaml::from_str(content)
            .map_err(|e| StatsError::analytics(e.to_string()))?;

        let mut records = BTreeMap::new();
        for (key, record) in raw {
            let year = key.to_year().map_err(StatsError::analytics)?;
            records.insert(year, AnalyticsRecord::from_raw(year, record));
        }
        Ok(Self { records })
    }

    pub fn get(&self, year: i32) -> Option<&AnalyticsRecord> {
        self.records.get(&year)
    }

    pub fn pageviews(&self, year: i32) -> Option<u64> {
        self.get(year).map(|r| r.num_pageviews)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Load the analytics file at `path`
pub fn load_analytics<P: AsRef<Path>>(path: P) -> StatsResult<Analytics> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|e| StatsError::io(path, e))?;
    let analytics = Analytics::from_yaml(&content)
        .map_err(|e| StatsError::analytics(format!("{}: {}", path.display(), e)))?;
    info!("Loaded analytics for {} years from {}", analytics.len(), path.display());
    Ok(analytics)
}
