//! Probe error taxonomy.

use thiserror::Error;

use crate::model::ErrorCategory;

/// Error from a single attempt against the scoring API.
/// Classified before conversion to an outcome so the retry loop can decide.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProbeError {
    /// Connection, DNS, TLS or timeout failure before a response arrived.
    #[error("network: {message}")]
    Network { message: String, timed_out: bool },
    /// HTTP 429 that is not a daily quota exhaustion.
    #[error("rate limited (HTTP 429): {message}")]
    RateLimited { message: String },
    /// HTTP 5xx without a diagnostic about the probed site.
    #[error("server error (HTTP {status}): {message}")]
    ServerError { status: u16, message: String },
    /// The API reports the probed site itself is unreachable or invalid.
    #[error("invalid target: {message}")]
    InvalidTarget { status: Option<u16>, message: String },
    /// Credential rejected or quota exhausted. Aborts the whole run.
    #[error("auth (HTTP {status}): {message}")]
    Auth { status: u16, message: String },
    /// Response arrived but could not be parsed into scores.
    #[error("malformed response: {0}")]
    MalformedResponse(String),
    /// Any other non-retryable API error.
    #[error("api error (HTTP {status}): {message}")]
    Api { status: u16, message: String },
}

impl ProbeError {
    /// Reporting category carried into `ErrorInfo`.
    pub fn category(&self) -> ErrorCategory {
        match self {
            ProbeError::Network { .. } => ErrorCategory::Network,
            ProbeError::RateLimited { .. } => ErrorCategory::RateLimited,
            ProbeError::ServerError { .. } => ErrorCategory::ServerError,
            ProbeError::InvalidTarget { .. } => ErrorCategory::InvalidTarget,
            ProbeError::Auth { .. } => ErrorCategory::Auth,
            ProbeError::MalformedResponse(_) => ErrorCategory::MalformedResponse,
            ProbeError::Api { .. } => ErrorCategory::ApiError,
        }
    }

    pub fn http_status(&self) -> Option<u16> {
        match self {
            ProbeError::Network { .. } | ProbeError::MalformedResponse(_) => None,
            ProbeError::RateLimited { .. } => Some(429),
            ProbeError::InvalidTarget { status, .. } => *status,
            ProbeError::ServerError { status, .. }
            | ProbeError::Auth { status, .. }
            | ProbeError::Api { status, .. } => Some(*status),
        }
    }

    /// Message without the category prefix (for the error log).
    pub fn message(&self) -> &str {
        match self {
            ProbeError::Network { message, .. }
            | ProbeError::RateLimited { message }
            | ProbeError::ServerError { message, .. }
            | ProbeError::InvalidTarget { message, .. }
            | ProbeError::Auth { message, .. }
            | ProbeError::Api { message, .. } => message,
            ProbeError::MalformedResponse(message) => message,
        }
    }
}
