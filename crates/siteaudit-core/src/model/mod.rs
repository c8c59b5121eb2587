//! Domain types shared by every stage of a batch run.
//!
//! A [`Target`] is one endpoint from the input list; probing it under one
//! [`Strategy`] yields exactly one [`AuditOutcome`], which is either scored
//! or carries an [`ErrorInfo`].

mod outcome;

pub use outcome::{AuditOutcome, ErrorCategory, ErrorInfo, Scores, WebVitals};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A probe variant. Each target is scored independently per strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Primary variant (mobile client simulation).
    Mobile,
    /// Secondary variant (desktop client simulation).
    Desktop,
}

impl Strategy {
    pub const ALL: [Strategy; 2] = [Strategy::Mobile, Strategy::Desktop];

    pub fn as_str(self) -> &'static str {
        match self {
            Strategy::Mobile => "mobile",
            Strategy::Desktop => "desktop",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mobile" => Ok(Strategy::Mobile),
            "desktop" => Ok(Strategy::Desktop),
            other => Err(format!("unknown strategy '{other}' (expected mobile or desktop)")),
        }
    }
}

/// One endpoint to audit. Identity is the url.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    pub url: String,
    /// Auxiliary identifier from the input list (e.g. a municipality code).
    pub auxiliary_id: Option<String>,
    pub region_label: Option<String>,
}

impl Target {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            auxiliary_id: None,
            region_label: None,
        }
    }
}
