//! Progress store: per-url attempt and success timestamps.
//!
//! Drives oldest-attempt-first prioritisation and incremental runs. The
//! orchestrator records an attempt *before* the probe resolves and saves
//! after every update, so a crash mid-probe leaves the url looking recently
//! attempted. That can delay (never starve) a target that did not actually
//! complete: once every other target has a newer attempt it sorts first
//! again.

mod persist;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::model::Strategy;

/// Attempt/success timestamps for one url. Stored as one JSON object value
/// keyed by url: `{ "last_attempt": ..., "last_success_mobile": ... }`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_attempt: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_success_mobile: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_success_desktop: Option<DateTime<Utc>>,
}

impl ProgressRecord {
    pub fn last_success(&self, strategy: Strategy) -> Option<DateTime<Utc>> {
        match strategy {
            Strategy::Mobile => self.last_success_mobile,
            Strategy::Desktop => self.last_success_desktop,
        }
    }

    fn last_success_mut(&mut self, strategy: Strategy) -> &mut Option<DateTime<Utc>> {
        match strategy {
            Strategy::Mobile => &mut self.last_success_mobile,
            Strategy::Desktop => &mut self.last_success_desktop,
        }
    }
}

/// File name of the progress store inside the state directory.
pub const PROGRESS_FILE: &str = "progress.json";

/// Map of url to progress record, in the on-disk order.
pub type ProgressMap = BTreeMap<String, ProgressRecord>;

/// Durable progress map backed by a JSON file written atomically.
#[derive(Debug)]
pub struct ProgressStore {
    path: PathBuf,
    records: ProgressMap,
}

impl ProgressStore {
    /// Open the store at `path`, loading existing records (empty if the file is missing).
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let records = Self::load(&path)?;
        Ok(Self { path, records })
    }

    /// Open `progress.json` inside the state directory.
    pub fn open_in(state_dir: &Path) -> Result<Self> {
        Self::open(state_dir.join(PROGRESS_FILE))
    }

    /// Read the progress file. A missing file is an empty map.
    pub fn load(path: &Path) -> Result<ProgressMap> {
        persist::read_map(path)
    }

    /// Persist the whole map. Readers never observe a partial file.
    pub fn save(&self) -> Result<()> {
        persist::write_map(&self.path, &self.records)
    }

    /// `save` for async callers: the map is encoded here, the write and
    /// fsync run on the blocking pool. Done once the file is replaced.
    pub async fn save_async(&self) -> Result<()> {
        let json = persist::encode(&self.records)?;
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || persist::write_bytes(&path, &json))
            .await
            .context("progress writer task")?
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn records(&self) -> &ProgressMap {
        &self.records
    }

    pub fn get(&self, url: &str) -> Option<&ProgressRecord> {
        self.records.get(url)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Mark `url` as attempted at `at`. Creates the record on first attempt.
    /// Out-of-order calls never move the timestamp backwards.
    pub fn record_attempt(&mut self, url: &str, at: DateTime<Utc>) {
        let rec = self.records.entry(url.to_string()).or_default();
        if rec.last_attempt.map_or(true, |prev| at > prev) {
            rec.last_attempt = Some(at);
        }
    }

    /// Mark a successful probe of `url` under `strategy` at `at`.
    pub fn record_success(&mut self, url: &str, strategy: Strategy, at: DateTime<Utc>) {
        let rec = self.records.entry(url.to_string()).or_default();
        if rec.last_attempt.map_or(true, |prev| at > prev) {
            rec.last_attempt = Some(at);
        }
        let slot = rec.last_success_mut(strategy);
        if slot.map_or(true, |prev| at > prev) {
            *slot = Some(at);
        }
    }
}

#[cfg(test)]
mod tests;
