//! Run summary: what a batch did, for the CLI and the log.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::model::ErrorCategory;

/// Counters for one batch run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunSummary {
    /// Targets in the input list.
    pub candidates: usize,
    /// Targets selected after filtering.
    pub planned_targets: usize,
    /// Probes handed to the executor.
    pub attempted: usize,
    /// Probes that produced scores.
    pub succeeded: usize,
    /// Distinct urls with at least one scored probe.
    pub succeeded_targets: usize,
    /// Failed probes per category.
    pub failed: BTreeMap<ErrorCategory, usize>,
    pub skipped_recent: usize,
    pub skipped_quarantined: usize,
    /// Probes left unscheduled when the run stopped early.
    pub not_scheduled: usize,
    pub deadline_reached: bool,
    /// Urls that entered quarantine at the end of this run.
    pub newly_quarantined: Vec<String>,
    pub elapsed_secs: f64,
}

impl RunSummary {
    pub fn failed_total(&self) -> usize {
        self.failed.values().sum()
    }

    pub fn record_failure(&mut self, category: ErrorCategory) {
        *self.failed.entry(category).or_default() += 1;
    }

    /// Completed probes per second (0 if elapsed is 0).
    pub fn probes_per_sec(&self) -> f64 {
        if self.elapsed_secs <= 0.0 {
            return 0.0;
        }
        (self.succeeded + self.failed_total()) as f64 / self.elapsed_secs
    }

    /// Fraction of completed probes that succeeded, in [0.0, 1.0].
    pub fn success_rate(&self) -> f64 {
        let done = self.succeeded + self.failed_total();
        if done == 0 {
            return 0.0;
        }
        self.succeeded as f64 / done as f64
    }
}
