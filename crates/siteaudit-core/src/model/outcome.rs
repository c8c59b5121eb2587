//! Probe outcome types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::Strategy;

/// The four category scores, each in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Scores {
    pub performance: f64,
    pub accessibility: f64,
    pub seo: f64,
    pub best_practices: f64,
}

/// Lab metrics pulled from the audit details. All optional: the API omits
/// audits it could not compute.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct WebVitals {
    pub first_contentful_paint_ms: Option<f64>,
    pub largest_contentful_paint_ms: Option<f64>,
    pub cumulative_layout_shift: Option<f64>,
    pub max_potential_fid_ms: Option<f64>,
}

/// Reporting category attached to every failed outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    Network,
    RateLimited,
    ServerError,
    InvalidTarget,
    Auth,
    MalformedResponse,
    ApiError,
}

impl ErrorCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCategory::Network => "network",
            ErrorCategory::RateLimited => "rate_limited",
            ErrorCategory::ServerError => "server_error",
            ErrorCategory::InvalidTarget => "invalid_target",
            ErrorCategory::Auth => "auth",
            ErrorCategory::MalformedResponse => "malformed_response",
            ErrorCategory::ApiError => "api_error",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Failure detail carried by an unscored outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub category: ErrorCategory,
    /// HTTP status of the last attempt, when the API answered at all.
    pub http_status: Option<u16>,
    pub message: String,
    /// Number of attempts made (first try plus retries).
    pub attempts: u32,
}

/// Result of one probe. Natural key: `(url, strategy, timestamp)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditOutcome {
    pub url: String,
    pub strategy: Strategy,
    pub timestamp: DateTime<Utc>,
    pub scores: Option<Scores>,
    #[serde(default)]
    pub vitals: Option<WebVitals>,
    /// Raw API payload, kept for the result store.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw: Option<String>,
    pub error: Option<ErrorInfo>,
}

impl AuditOutcome {
    pub fn success(
        url: impl Into<String>,
        strategy: Strategy,
        timestamp: DateTime<Utc>,
        scores: Scores,
        vitals: WebVitals,
        raw: Option<String>,
    ) -> Self {
        Self {
            url: url.into(),
            strategy,
            timestamp,
            scores: Some(scores),
            vitals: Some(vitals),
            raw,
            error: None,
        }
    }

    pub fn failure(
        url: impl Into<String>,
        strategy: Strategy,
        timestamp: DateTime<Utc>,
        error: ErrorInfo,
    ) -> Self {
        Self {
            url: url.into(),
            strategy,
            timestamp,
            scores: None,
            vitals: None,
            raw: None,
            error: Some(error),
        }
    }

    pub fn is_success(&self) -> bool {
        self.scores.is_some()
    }

    pub fn error_category(&self) -> Option<ErrorCategory> {
        self.error.as_ref().map(|e| e.category)
    }
}
