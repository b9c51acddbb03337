use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::Path;
use log::{debug, info};
use serde::Deserialize;
use serde_yaml::Value;
use tempfile::NamedTempFile;
use crate::error::{StatsError, StatsResult};
use super::YearRecord;

/// Year key as written in YAML: a bare integer or a quoted year string
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Deserialize)]
#[serde(untagged)]
pub(crate) enum YearKey {
    Int(i64),
    Text(String),
}

impl YearKey {
    pub(crate) fn to_year(&self) -> Result<i32, String> {
        match self {
            YearKey::Int(year) => i32::try_from(*year).map_err(|_| format!("year out of range: {year}")),
            YearKey::Text(text) => text.trim().parse::<i32>().map_err(|_| format!("invalid year key: '{text}'")),
        }
    }
}

fn yaml_error(msg: impl std::fmt::Display) -> serde_yaml::Error {
    <serde_yaml::Error as serde::de::Error>::custom(msg)
}

/// Year-keyed store of [`YearRecord`]s, persisted as YAML
///
/// Iteration is always in ascending year order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatsCache {
    records: BTreeMap<i32, YearRecord>,
}

impl StatsCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the cache at `path`, or an empty cache if the file does not exist
    ///
    /// A file that exists but does not parse is an error, never an empty cache.
    /// Both the year-keyed mapping and a plain list of records are accepted.
    pub fn load_or_empty<P: AsRef<Path>>(path: P) -> StatsResult<Self> {
        let path = path.as_ref();
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("No stats cache at {}, starting empty", path.display());
                return Ok(Self::new());
            }
            Err(e) => return Err(StatsError::io(path, e)),
        };

        let cache = Self::from_yaml(&content)
            .map_err(|source| StatsError::CorruptCache { path: path.to_path_buf(), source })?;
        info!("Loaded stats cache from {} ({} years)", path.display(), cache.len());
        Ok(cache)
    }

    fn from_yaml(content: &str) -> Result<Self, serde_yaml::Error> {
        if content.trim().is_empty() {
            return Ok(Self::new());
        }

        let mut cache = Self::new();
        match serde_yaml::from_str::<Value>(content)? {
            Value::Null => {}
            value @ Value::Mapping(_) => {
                let by_year: BTreeMap<YearKey, YearRecord> = serde_yaml::from_value(value)?;
                for (key, mut record) in by_year {
                    record.year = key.to_year().map_err(yaml_error)?;
                    cache.insert_new(record)?;
                }
            }
            value @ Value::Sequence(_) => {
                debug!("Reading list-layout stats cache");
                let list: Vec<YearRecord> = serde_yaml::from_value(value)?;
                for (index, record) in list.into_iter().enumerate() {
                    if record.year == 0 {
                        return Err(yaml_error(format!("list entry {} has no year", index + 1)));
                    }
                    cache.insert_new(record)?;
                }
            }
            other => {
                return Err(yaml_error(format!(
                    "expected a mapping of year to stats, found {}",
                    yaml_kind(&other)
                )));
            }
        }
        Ok(cache)
    }

    /// Insert a loaded record, refusing a second entry for the same year
    fn insert_new(&mut self, record: YearRecord) -> Result<(), serde_yaml::Error> {
        if self.contains_year(record.year) {
            return Err(yaml_error(format!("year {} appears more than once", record.year)));
        }
        self.insert(record);
        Ok(())
    }

    fn insert(&mut self, record: YearRecord) {
        let record = record.normalize();
        self.records.insert(record.year, record);
    }

    /// Set or overwrite the entry for each record's year
    ///
    /// Years not present in `records` are left as they are.
    pub fn merge<I>(&mut self, records: I)
    where
        I: IntoIterator<Item = YearRecord>,
    {
        for record in records {
            debug!("Merging stats for {}", record.year);
            self.insert(record);
        }
    }

    /// Write the whole cache to `path` atomically
    ///
    /// The YAML goes to a temporary file in the target directory which is then
    /// renamed over `path`, so readers see either the old or the new content.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> StatsResult<()> {
        let path = path.as_ref();
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir).map_err(|e| StatsError::io(dir, e))?;

        let yaml = serde_yaml::to_string(&self.records)
            .map_err(|e| StatsError::io(path, std::io::Error::new(std::io::ErrorKind::InvalidData, e)))?;

        let mut temp = NamedTempFile::new_in(dir).map_err(|e| StatsError::io(dir, e))?;
        temp.write_all(yaml.as_bytes()).map_err(|e| StatsError::io(temp.path(), e))?;
        temp.as_file().sync_all().map_err(|e| StatsError::io(temp.path(), e))?;
        temp.persist(path).map_err(|e| StatsError::io(path, e.error))?;

        info!("Saved stats cache to {} ({} years)", path.display(), self.len());
        Ok(())
    }

    pub fn get(&self, year: i32) -> Option<&YearRecord> {
        self.records.get(&year)
    }

    pub fn contains_year(&self, year: i32) -> bool {
        self.records.contains_key(&year)
    }

    /// Records in ascending year order
    pub fn iter(&self) -> impl Iterator<Item = &YearRecord> {
        self.records.values()
    }

    pub fn years(&self) -> Vec<i32> {
        self.records.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

fn yaml_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a list",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}
