//! Target loader: turns the candidate list into this run's ordered work.
//!
//! Quarantined urls are dropped, targets whose every strategy succeeded
//! recently are dropped in incremental mode, and the rest are ordered by
//! last attempt ascending (never-attempted first) so each run advances
//! across the whole population.

mod parse;

pub use parse::{load_targets, normalize_url, parse_targets};

use chrono::{DateTime, Duration, Utc};
use std::collections::HashSet;

use crate::model::{Strategy, Target};
use crate::progress::ProgressMap;

/// One target scheduled for this run with the strategies it still needs.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedTarget {
    pub target: Target,
    pub strategies: Vec<Strategy>,
}

/// Output of target selection.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    pub planned: Vec<PlannedTarget>,
    pub skipped_quarantined: usize,
    pub skipped_recent: usize,
}

impl Selection {
    /// Number of (target, strategy) probes planned.
    pub fn probe_count(&self) -> usize {
        self.planned.iter().map(|p| p.strategies.len()).sum()
    }
}

/// Parameters for [`select_targets`].
#[derive(Debug, Clone, Copy)]
pub struct SelectOptions<'a> {
    pub strategies: &'a [Strategy],
    pub skip_recent_hours: u64,
    pub now: DateTime<Utc>,
}

/// Order and filter candidates for a run. Pure: reads progress and the skip-set only.
pub fn select_targets(
    candidates: &[Target],
    progress: &ProgressMap,
    skip: &HashSet<String>,
    opts: SelectOptions<'_>,
) -> Selection {
    // Clamped to a century so the duration cannot overflow.
    let recent_cutoff = (opts.skip_recent_hours > 0)
        .then(|| opts.now - Duration::hours(opts.skip_recent_hours.min(876_000) as i64));

    let mut selection = Selection::default();
    for target in candidates {
        if skip.contains(&target.url) {
            selection.skipped_quarantined += 1;
            continue;
        }
        let record = progress.get(&target.url);
        let strategies: Vec<Strategy> = opts
            .strategies
            .iter()
            .copied()
            .filter(|s| {
                let Some(cutoff) = recent_cutoff else {
                    return true;
                };
                !record
                    .and_then(|r| r.last_success(*s))
                    .is_some_and(|at| at >= cutoff)
            })
            .collect();
        if strategies.is_empty() {
            selection.skipped_recent += 1;
            continue;
        }
        selection.planned.push(PlannedTarget {
            target: target.clone(),
            strategies,
        });
    }

    // Stable: ties keep input order. Never-attempted sorts at the epoch sentinel.
    selection.planned.sort_by_key(|p| {
        progress
            .get(&p.target.url)
            .and_then(|r| r.last_attempt)
            .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
    });
    selection
}
