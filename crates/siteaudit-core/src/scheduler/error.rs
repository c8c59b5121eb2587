//! Run-aborting errors. Per-target failures never surface here.

use thiserror::Error;

use super::summary::RunSummary;
use crate::model::Strategy;

#[derive(Debug, Error)]
pub enum BatchError {
    /// The API rejected the credential or the daily quota is gone.
    /// Scheduling stopped; `summary` covers the work done before that.
    #[error("scoring API refused credentials while probing {url} ({strategy}): {message}")]
    Auth {
        url: String,
        strategy: Strategy,
        message: String,
        summary: Box<RunSummary>,
    },
    #[error("result store: {0:#}")]
    Storage(anyhow::Error),
    #[error("progress store: {0:#}")]
    Progress(anyhow::Error),
}
