//! Row types returned by the audit database queries.

use chrono::{DateTime, NaiveDate, Utc};
use std::collections::BTreeMap;

use crate::model::{Scores, Strategy};
use crate::quarantine::QuarantineStatus;

/// Newest scores for one `(url, strategy)`.
#[derive(Debug, Clone, PartialEq)]
pub struct LatestScore {
    pub url: String,
    pub strategy: Strategy,
    pub timestamp: DateTime<Utc>,
    pub scores: Scores,
}

/// Mean of the latest scores per strategy.
#[derive(Debug, Clone, PartialEq)]
pub struct StrategyAverage {
    pub strategy: Strategy,
    pub sites: i64,
    pub scores: Scores,
}

/// Per-day aggregate over every stored audit.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyPoint {
    pub day: NaiveDate,
    pub audits: i64,
    pub performance: f64,
    pub accessibility: f64,
}

/// Aggregate view of the listed quarantine entries.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuarantineStats {
    pub total: i64,
    pub by_status: BTreeMap<QuarantineStatus, i64>,
    pub mean_failure_days: f64,
    pub max_failure_days: i64,
}
