//! Per-run outcome signals collected for end-of-run re-evaluation.

use chrono::{DateTime, NaiveDate, Utc};
use std::collections::BTreeMap;

/// What one url did on its most recent observed day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayVerdict {
    pub day: NaiveDate,
    /// At least one probe succeeded on `day`.
    pub any_success: bool,
}

/// Success/failure signals per url, in arrival order (completion order is free).
#[derive(Debug, Default, Clone)]
pub struct Observations {
    by_url: BTreeMap<String, Vec<(DateTime<Utc>, bool)>>,
}

impl Observations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, url: &str, at: DateTime<Utc>, success: bool) {
        self.by_url.entry(url.to_string()).or_default().push((at, success));
    }

    pub fn len(&self) -> usize {
        self.by_url.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_url.is_empty()
    }

    /// Verdict per url for the latest UTC day it was observed on.
    pub fn verdicts(&self) -> impl Iterator<Item = (&str, DayVerdict)> + '_ {
        self.by_url.iter().filter_map(|(url, obs)| {
            let day = obs.iter().map(|(at, _)| at.date_naive()).max()?;
            let any_success = obs
                .iter()
                .any(|(at, ok)| *ok && at.date_naive() == day);
            Some((url.as_str(), DayVerdict { day, any_success }))
        })
    }
}
