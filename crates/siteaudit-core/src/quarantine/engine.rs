//! In-memory quarantine engine: streak accounting and the skip-set.

use chrono::{DateTime, Utc};
use std::collections::{BTreeSet, HashMap, HashSet};

use super::entry::QuarantineEntry;
use super::observe::Observations;
use super::status::{transition, Next, QuarantineStatus, TransitionError, Trigger};

/// Changes to persist after a re-evaluation or manual override.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct QuarantineChanges {
    pub upserts: Vec<QuarantineEntry>,
    pub removals: Vec<String>,
}

impl QuarantineChanges {
    pub fn is_empty(&self) -> bool {
        self.upserts.is_empty() && self.removals.is_empty()
    }
}

/// Summary of one re-evaluation pass.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Reevaluation {
    pub newly_quarantined: Vec<String>,
    pub streaks_incremented: usize,
    pub streaks_reset: usize,
}

/// Owns every entry; mutated only from the orchestrator's control flow.
#[derive(Debug)]
pub struct QuarantineEngine {
    entries: HashMap<String, QuarantineEntry>,
    min_days: u32,
    dirty: BTreeSet<String>,
    removed: BTreeSet<String>,
}

impl QuarantineEngine {
    pub fn new(min_days: u32) -> Self {
        Self::from_entries(Vec::new(), min_days)
    }

    pub fn from_entries(entries: Vec<QuarantineEntry>, min_days: u32) -> Self {
        Self {
            entries: entries.into_iter().map(|e| (e.url.clone(), e)).collect(),
            min_days: min_days.max(1),
            dirty: BTreeSet::new(),
            removed: BTreeSet::new(),
        }
    }

    pub fn get(&self, url: &str) -> Option<&QuarantineEntry> {
        self.entries.get(url)
    }

    /// Entries that carry a status (tracking-only rows excluded), sorted by url.
    pub fn listed(&self) -> Vec<&QuarantineEntry> {
        let mut v: Vec<_> = self.entries.values().filter(|e| e.status.is_some()).collect();
        v.sort_by(|a, b| a.url.cmp(&b.url));
        v
    }

    /// Urls the target loader must not select.
    pub fn skip_set(&self) -> HashSet<String> {
        self.entries
            .values()
            .filter(|e| e.is_skipped())
            .map(|e| e.url.clone())
            .collect()
    }

    /// End-of-run streak accounting.
    ///
    /// For each observed url: a success on its latest day resets the streak to
    /// zero; otherwise the streak grows by one only if that day is strictly
    /// after the day of the last counted failure. Reaching `min_days` moves a
    /// status-less entry to `Quarantined`.
    pub fn reevaluate(&mut self, observations: &Observations, now: DateTime<Utc>) -> Reevaluation {
        let mut report = Reevaluation::default();

        for (url, verdict) in observations.verdicts() {
            if verdict.any_success {
                let Some(entry) = self.entries.get_mut(url) else {
                    continue;
                };
                if entry.consecutive_failure_days > 0 || entry.last_failure_day.is_some() {
                    report.streaks_reset += 1;
                }
                entry.consecutive_failure_days = 0;
                entry.last_failure_day = None;
                entry.updated_at = now;
                if let Ok(Next::Status(status)) = transition(entry.status, Trigger::Success) {
                    entry.status = status;
                }
                if entry.status.is_none() {
                    // Nothing left to track.
                    self.entries.remove(url);
                    self.removed.insert(url.to_string());
                    self.dirty.remove(url);
                } else {
                    self.dirty.insert(url.to_string());
                }
                continue;
            }

            let entry = self
                .entries
                .entry(url.to_string())
                .or_insert_with(|| QuarantineEntry::tracking(url, now));
            self.removed.remove(url);
            if entry.last_failure_day.map_or(true, |last| verdict.day > last) {
                entry.consecutive_failure_days += 1;
                entry.last_failure_day = Some(verdict.day);
                entry.updated_at = now;
                report.streaks_incremented += 1;
                self.dirty.insert(url.to_string());
            }

            if entry.consecutive_failure_days >= self.min_days {
                let before = entry.status;
                if let Ok(Next::Status(after)) = transition(before, Trigger::StreakReached) {
                    if before != after {
                        entry.status = after;
                        entry.updated_at = now;
                        self.dirty.insert(url.to_string());
                        tracing::warn!(
                            url,
                            days = entry.consecutive_failure_days,
                            "endpoint quarantined"
                        );
                        report.newly_quarantined.push(url.to_string());
                    }
                }
            }
        }

        report
    }

    /// Operator action on one url. Returns the resulting state.
    pub fn apply_manual(
        &mut self,
        url: &str,
        trigger: Trigger,
        now: DateTime<Utc>,
    ) -> Result<Next, TransitionError> {
        let entry = self
            .entries
            .get_mut(url)
            .filter(|e| e.status.is_some())
            .ok_or_else(|| TransitionError::NotFound(url.to_string()))?;
        let next = transition(entry.status, trigger)?;
        match next {
            Next::Status(status) => {
                entry.status = status;
                entry.updated_at = now;
                self.dirty.insert(url.to_string());
            }
            Next::Removed => {
                self.entries.remove(url);
                self.dirty.remove(url);
                self.removed.insert(url.to_string());
            }
        }
        Ok(next)
    }

    /// Move an entry to `target` through the legal manual trigger for it.
    pub fn set_status(
        &mut self,
        url: &str,
        target: QuarantineStatus,
        now: DateTime<Utc>,
    ) -> Result<Next, TransitionError> {
        if self.entries.get(url).and_then(|e| e.status).is_none() {
            return Err(TransitionError::NotFound(url.to_string()));
        }
        let trigger = match target {
            QuarantineStatus::Investigating => Trigger::Investigate,
            QuarantineStatus::Resolved => Trigger::Resolve,
            QuarantineStatus::WrongUrl => Trigger::MarkWrongUrl,
            // Only re-evaluation may quarantine.
            QuarantineStatus::Quarantined => {
                return Err(TransitionError::ManualQuarantine(url.to_string()))
            }
        };
        self.apply_manual(url, trigger, now)
    }

    /// Replace the operator note; allowed in any listed status.
    pub fn set_note(
        &mut self,
        url: &str,
        note: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<(), TransitionError> {
        let entry = self
            .entries
            .get_mut(url)
            .filter(|e| e.status.is_some())
            .ok_or_else(|| TransitionError::NotFound(url.to_string()))?;
        entry.note = note.filter(|n| !n.trim().is_empty());
        entry.updated_at = now;
        self.dirty.insert(url.to_string());
        Ok(())
    }

    /// Drain pending changes for persistence.
    pub fn take_changes(&mut self) -> QuarantineChanges {
        let upserts = std::mem::take(&mut self.dirty)
            .into_iter()
            .filter_map(|url| self.entries.get(&url).cloned())
            .collect();
        let removals = std::mem::take(&mut self.removed).into_iter().collect();
        QuarantineChanges { upserts, removals }
    }
}
