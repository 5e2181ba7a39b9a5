//! Configuration structures for the market-microstructure toolkit.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::types::{WorkItem, NANOS_PER_SECOND};

/// Main configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Task runner configuration.
    pub runner: RunnerConfig,
    /// Trading session configuration.
    pub session: SessionConfig,
    /// Measure estimator parameters.
    pub measures: MeasureConfig,
    /// Data directory layout.
    pub data: DataConfig,
    /// Work item selection.
    pub selection: SelectionConfig,
    /// Results ledger.
    pub ledger: LedgerConfig,
}

impl Config {
    /// Load a configuration from a JSON file. Missing sections take defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field constraints.
    pub fn validate(&self) -> Result<()> {
        if self.session.open_time()? >= self.session.close_time()? {
            return Err(Error::config("session open must be before close"));
        }
        if self.measures.horizon_secs <= 0 {
            return Err(Error::config("measures.horizon_secs must be positive"));
        }
        if self.measures.pin_interval_mins == 0 || self.measures.kyle_interval_mins == 0 {
            return Err(Error::config("resampling intervals must be positive"));
        }
        if self.measures.variance_ratio_lags.iter().any(|&k| k < 2) {
            return Err(Error::config("variance ratio lags must be at least 2"));
        }
        if let (Some(begin), Some(end)) = (self.selection.begin, self.selection.end) {
            if begin > end {
                return Err(Error::config("selection.begin is after selection.end"));
            }
        }
        Ok(())
    }
}

/// Task runner configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Number of parallel workers (0 = auto, 1 = sequential).
    pub workers: usize,
    /// Report progress per completed item.
    pub progress: bool,
    /// Bounded input queue capacity per worker.
    pub queue_capacity: usize,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            workers: 0,
            progress: true,
            queue_capacity: 2,
        }
    }
}

/// Regular trading session, in local exchange time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Apply the session filter.
    pub enabled: bool,
    /// Session open (HH:MM), inclusive.
    pub open: String,
    /// Session close (HH:MM), inclusive.
    pub close: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            open: "09:30".to_string(),
            close: "16:00".to_string(),
        }
    }
}

impl SessionConfig {
    pub fn open_time(&self) -> Result<NaiveTime> {
        parse_hhmm(&self.open)
    }

    pub fn close_time(&self) -> Result<NaiveTime> {
        parse_hhmm(&self.close)
    }
}

fn parse_hhmm(s: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(s, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S"))
        .map_err(|e| Error::config(format!("invalid session time '{s}': {e}")))
}

/// Measure estimator parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MeasureConfig {
    /// Look-ahead horizon for realized spread and price impact (seconds).
    pub horizon_secs: i64,
    /// Lags for the variance ratio test.
    pub variance_ratio_lags: Vec<usize>,
    /// PIN bucket width (minutes).
    pub pin_interval_mins: u32,
    /// Kyle's lambda bucket width (minutes).
    pub kyle_interval_mins: u32,
}

impl Default for MeasureConfig {
    fn default() -> Self {
        Self {
            horizon_secs: 300,
            variance_ratio_lags: vec![2, 4, 6, 8, 10, 15, 20],
            pin_interval_mins: 15,
            kyle_interval_mins: 5,
        }
    }
}

impl MeasureConfig {
    /// Horizon in nanoseconds.
    pub fn horizon_ns(&self) -> i64 {
        self.horizon_secs * NANOS_PER_SECOND
    }
}

/// Data directory layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Root directory holding one subdirectory per security.
    pub data_dir: PathBuf,
    /// Overwrite raw files when cleaning instead of writing `*.sorted.csv.gz`.
    pub replace: bool,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            replace: false,
        }
    }
}

/// Which work items to process.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    /// Process every discovered item.
    pub all: bool,
    /// Securities to keep when not `all`.
    pub securities: Vec<String>,
    /// First date (inclusive).
    pub begin: Option<NaiveDate>,
    /// Last date (inclusive).
    pub end: Option<NaiveDate>,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            all: true,
            securities: Vec::new(),
            begin: None,
            end: None,
        }
    }
}

impl SelectionConfig {
    /// Whether a work item passes the selection.
    pub fn accepts(&self, item: &WorkItem) -> bool {
        if self.all {
            return true;
        }
        self.securities.iter().any(|s| *s == item.security)
            && self.begin.map_or(true, |b| item.date >= b)
            && self.end.map_or(true, |e| item.date <= e)
    }
}

/// Results ledger configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Output file.
    pub out: PathBuf,
    /// Append to an existing file instead of truncating it.
    pub append: bool,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            out: PathBuf::from("results.csv"),
            append: false,
        }
    }
}
