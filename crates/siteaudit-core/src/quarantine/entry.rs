//! Per-url quarantine bookkeeping.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::status::QuarantineStatus;

/// Failure streak and status for one url.
///
/// Rows without a status only track a streak that has not reached the
/// threshold yet; they are never listed or skipped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuarantineEntry {
    pub url: String,
    pub consecutive_failure_days: u32,
    /// UTC day of the last failure that incremented the streak.
    pub last_failure_day: Option<NaiveDate>,
    pub status: Option<QuarantineStatus>,
    pub note: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl QuarantineEntry {
    pub fn tracking(url: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            url: url.into(),
            consecutive_failure_days: 0,
            last_failure_day: None,
            status: None,
            note: None,
            updated_at: now,
        }
    }

    /// True if this url must not be selected for a run.
    pub fn is_skipped(&self) -> bool {
        self.status.is_some_and(QuarantineStatus::excludes_from_runs)
    }
}
