//! Append-only error log: one JSON line per failed outcome, for offline triage.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use crate::model::{AuditOutcome, ErrorCategory, Strategy};

/// File name of the error log inside the state directory.
pub const ERROR_LOG_FILE: &str = "errors.log";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorLogLine {
    pub timestamp: DateTime<Utc>,
    pub url: String,
    pub strategy: Strategy,
    pub category: ErrorCategory,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_status: Option<u16>,
    pub message: String,
    pub attempts: u32,
}

impl ErrorLogLine {
    /// `None` for scored outcomes.
    pub fn from_outcome(outcome: &AuditOutcome) -> Option<Self> {
        let err = outcome.error.as_ref()?;
        Some(Self {
            timestamp: outcome.timestamp,
            url: outcome.url.clone(),
            strategy: outcome.strategy,
            category: err.category,
            http_status: err.http_status,
            message: err.message.clone(),
            attempts: err.attempts,
        })
    }
}

#[derive(Debug, Clone)]
pub struct ErrorLog {
    path: PathBuf,
}

impl ErrorLog {
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `errors.log` inside the state directory.
    pub fn in_dir(state_dir: &Path) -> Self {
        Self::at(state_dir.join(ERROR_LOG_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one line for a failed outcome; scored outcomes are ignored.
    pub fn append(&self, outcome: &AuditOutcome) -> Result<()> {
        let Some(line) = ErrorLogLine::from_outcome(outcome) else {
            return Ok(());
        };
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut json = serde_json::to_string(&line)?;
        json.push('\n');
        let mut f = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("open {}", self.path.display()))?;
        f.write_all(json.as_bytes())
            .with_context(|| format!("write {}", self.path.display()))?;
        Ok(())
    }

    /// Read every parseable line; unparseable lines are skipped.
    pub fn read_all(&self) -> Result<Vec<ErrorLogLine>> {
        let f = match fs::File::open(&self.path) {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e).with_context(|| format!("open {}", self.path.display())),
        };
        let mut out = Vec::new();
        for line in BufReader::new(f).lines() {
            let line = line?;
            if let Ok(entry) = serde_json::from_str(&line) {
                out.push(entry);
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ErrorInfo, Scores, WebVitals};

    #[test]
    fn appends_failures_only() {
        let dir = tempfile::tempdir().unwrap();
        let log = ErrorLog::in_dir(dir.path());
        let now = Utc::now();
        let failed = AuditOutcome::failure(
            "https://a.example",
            Strategy::Mobile,
            now,
            ErrorInfo {
                category: ErrorCategory::InvalidTarget,
                http_status: Some(500),
                message: "Lighthouse returned error: DNS_FAILURE".into(),
                attempts: 1,
            },
        );
        let ok = AuditOutcome::success(
            "https://b.example",
            Strategy::Mobile,
            now,
            Scores {
                performance: 1.0,
                accessibility: 1.0,
                seo: 1.0,
                best_practices: 1.0,
            },
            WebVitals::default(),
            None,
        );
        log.append(&failed).unwrap();
        log.append(&ok).unwrap();
        log.append(&failed).unwrap();

        let text = fs::read_to_string(log.path()).unwrap();
        assert_eq!(text.lines().count(), 2);
        assert!(text.contains("\"category\":\"invalid_target\""));
        let lines = log.read_all().unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].url, "https://a.example");
        assert_eq!(lines[0].http_status, Some(500));
    }

    #[test]
    fn missing_log_reads_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(ErrorLog::in_dir(dir.path()).read_all().unwrap().is_empty());
    }
}
