//! Retry and backoff policy.
//!
//! This module encapsulates error classification (throttling, server
//! errors, connection failures versus terminal diagnostics) and exponential
//! backoff decisions so the fetch executor applies one consistent policy.

mod classify;
mod error;
mod policy;
mod run;

pub use classify::{classify, classify_curl_error, classify_http_status, is_target_diagnostic};
pub use error::ProbeError;
pub use policy::{ErrorKind, RetryDecision, RetryPolicy};
pub use run::{run_with_retry, Retried};
