//! Classify HTTP statuses, API diagnostics and curl errors into probe errors.

use super::error::ProbeError;
use super::policy::ErrorKind;

/// Lighthouse runtime error codes that mean the probed site is broken, not the API.
const TARGET_ERROR_CODES: &[&str] = &[
    "FAILED_DOCUMENT_REQUEST",
    "ERRORED_DOCUMENT_REQUEST",
    "DNS_FAILURE",
    "NO_FCP",
    "NOT_HTML",
    "INVALID_URL",
    "NO_DOCUMENT_REQUEST",
    "INSECURE_DOCUMENT_REQUEST",
    "CHROME_INTERSTITIAL_ERROR",
    "PAGE_HUNG",
    "PROTOCOL_TIMEOUT",
];

/// True if the API message is a diagnostic about the probed site itself.
pub fn is_target_diagnostic(message: &str) -> bool {
    if message.contains("Lighthouse returned error") {
        return true;
    }
    if message.to_ascii_lowercase().contains("invalid url") {
        return true;
    }
    TARGET_ERROR_CODES.iter().any(|code| message.contains(code))
}

/// True if a 429 reports a daily quota rather than a per-minute rate limit.
fn is_quota_exhausted(message: &str) -> bool {
    let lower = message.to_ascii_lowercase();
    lower.contains("per day") || lower.contains("daily limit") || lower.contains("quota exhausted")
}

/// Classify a non-2xx API response.
pub fn classify_http_status(status: u16, message: &str) -> ProbeError {
    let message = message.to_string();
    match status {
        401 | 403 => ProbeError::Auth { status, message },
        429 if is_quota_exhausted(&message) => ProbeError::Auth { status, message },
        429 => ProbeError::RateLimited { message },
        400 | 500 if is_target_diagnostic(&message) => ProbeError::InvalidTarget {
            status: Some(status),
            message,
        },
        500..=599 => ProbeError::ServerError { status, message },
        _ => ProbeError::Api { status, message },
    }
}

/// Classify a curl error (no HTTP response).
pub fn classify_curl_error(e: &curl::Error) -> ProbeError {
    ProbeError::Network {
        message: e.to_string(),
        timed_out: e.is_operation_timedout(),
    }
}

impl From<curl::Error> for ProbeError {
    fn from(e: curl::Error) -> Self {
        classify_curl_error(&e)
    }
}

/// Retry kind for a probe error.
pub fn classify(e: &ProbeError) -> ErrorKind {
    match e {
        ProbeError::Network { timed_out: true, .. } => ErrorKind::Timeout,
        ProbeError::Network { .. } => ErrorKind::Connection,
        ProbeError::RateLimited { .. } => ErrorKind::Throttled,
        ProbeError::ServerError { status, .. } => ErrorKind::Http5xx(*status),
        ProbeError::InvalidTarget { .. }
        | ProbeError::Auth { .. }
        | ProbeError::MalformedResponse(_)
        | ProbeError::Api { .. } => ErrorKind::Terminal,
    }
}
