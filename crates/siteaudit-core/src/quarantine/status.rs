//! Quarantine statuses and the transition table.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Status of a quarantined endpoint. `None` (no status) is represented as
/// `Option::<QuarantineStatus>::None` by callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuarantineStatus {
    Quarantined,
    Investigating,
    Resolved,
    WrongUrl,
}

impl QuarantineStatus {
    pub const ALL: [QuarantineStatus; 4] = [
        QuarantineStatus::Quarantined,
        QuarantineStatus::Investigating,
        QuarantineStatus::Resolved,
        QuarantineStatus::WrongUrl,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            QuarantineStatus::Quarantined => "quarantined",
            QuarantineStatus::Investigating => "investigating",
            QuarantineStatus::Resolved => "resolved",
            QuarantineStatus::WrongUrl => "wrong_url",
        }
    }

    /// Active statuses keep the url out of target selection.
    /// `Investigating` is still probed so self-healing can be observed.
    pub fn excludes_from_runs(self) -> bool {
        matches!(self, QuarantineStatus::Quarantined | QuarantineStatus::WrongUrl)
    }
}

impl fmt::Display for QuarantineStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for QuarantineStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "quarantined" => Ok(QuarantineStatus::Quarantined),
            "investigating" => Ok(QuarantineStatus::Investigating),
            "resolved" => Ok(QuarantineStatus::Resolved),
            "wrong_url" | "wrong-url" => Ok(QuarantineStatus::WrongUrl),
            other => Err(format!("unknown quarantine status '{other}'")),
        }
    }
}

/// What happened to an endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// Re-evaluation found the failure streak at or above the threshold.
    StreakReached,
    /// A probe succeeded (streak reset; status untouched).
    Success,
    /// Operator starts looking at a quarantined endpoint.
    Investigate,
    /// Operator confirms the endpoint works again.
    Resolve,
    /// Operator confirms the listed url itself is wrong.
    MarkWrongUrl,
    /// Operator drops the entry and its history.
    Remove,
}

impl Trigger {
    pub fn is_manual(self) -> bool {
        !matches!(self, Trigger::StreakReached | Trigger::Success)
    }
}

/// Result of a legal transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Next {
    Status(Option<QuarantineStatus>),
    /// Entry is deleted; the url rejoins the pool with no failure history.
    Removed,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("cannot apply {trigger:?} to an endpoint with status {}", describe(.current))]
    Illegal {
        current: Option<QuarantineStatus>,
        trigger: Trigger,
    },
    #[error("{0} is not in quarantine")]
    NotFound(String),
    #[error("{0} cannot be set to quarantined by hand; only a failure streak quarantines an endpoint")]
    ManualQuarantine(String),
}

fn describe(status: &Option<QuarantineStatus>) -> &'static str {
    status.map_or("none", QuarantineStatus::as_str)
}

/// The only place quarantine statuses change.
pub fn transition(
    current: Option<QuarantineStatus>,
    trigger: Trigger,
) -> Result<Next, TransitionError> {
    use QuarantineStatus::*;

    let next = match (current, trigger) {
        (None, Trigger::StreakReached) => Next::Status(Some(Quarantined)),
        // Already carries a status: automatic promotion never overrides a human decision.
        (Some(s), Trigger::StreakReached) => Next::Status(Some(s)),
        (s, Trigger::Success) => Next::Status(s),
        (Some(Quarantined), Trigger::Investigate) => Next::Status(Some(Investigating)),
        (Some(Investigating), Trigger::Resolve) => Next::Status(Some(Resolved)),
        (Some(Investigating), Trigger::MarkWrongUrl) => Next::Status(Some(WrongUrl)),
        (Some(Resolved | WrongUrl), Trigger::Remove) => Next::Removed,
        (current, trigger) => return Err(TransitionError::Illegal { current, trigger }),
    };
    Ok(next)
}
