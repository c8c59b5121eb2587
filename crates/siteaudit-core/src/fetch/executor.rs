//! Bounded, throttled, retrying probe of one `(target, strategy)`.

use chrono::Utc;
use std::sync::Arc;

use super::client::ScoringApi;
use super::parse::{parse_response, ParsedAudit};
use crate::config::BatchConfig;
use crate::model::{AuditOutcome, ErrorInfo, Strategy, Target};
use crate::retry::{run_with_retry, ProbeError, RetryPolicy};
use crate::scheduler::{ConcurrencyBudget, RateThrottle};

/// Composes the concurrency budget, rate throttle and retry policy around
/// a [`ScoringApi`]. Cheap to share behind an `Arc`.
pub struct FetchExecutor {
    api: Arc<dyn ScoringApi>,
    budget: Arc<ConcurrencyBudget>,
    throttle: Arc<RateThrottle>,
    policy: RetryPolicy,
}

impl FetchExecutor {
    pub fn new(
        api: Arc<dyn ScoringApi>,
        budget: Arc<ConcurrencyBudget>,
        throttle: Arc<RateThrottle>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            api,
            budget,
            throttle,
            policy,
        }
    }

    /// Executor with a fresh budget and throttle sized from `cfg`.
    pub fn from_config(api: Arc<dyn ScoringApi>, cfg: &BatchConfig) -> Self {
        Self::new(
            api,
            Arc::new(ConcurrencyBudget::new(cfg.max_concurrent_requests)),
            Arc::new(RateThrottle::new(cfg.requests_per_second)),
            cfg.retry_policy(),
        )
    }

    pub fn budget(&self) -> &ConcurrencyBudget {
        &self.budget
    }

    /// Probe one target. Never fails: every error becomes an unscored outcome.
    pub async fn probe(&self, target: &Target, strategy: Strategy) -> AuditOutcome {
        let url = target.url.as_str();
        let retried = run_with_retry(&self.policy, move |attempt| {
            self.attempt(url, strategy, attempt)
        })
        .await;
        let timestamp = Utc::now();
        match retried.result {
            Ok(parsed) => {
                tracing::debug!(
                    url,
                    strategy = %strategy,
                    attempts = retried.attempts,
                    performance = parsed.scores.performance,
                    "probe succeeded"
                );
                AuditOutcome::success(
                    url,
                    strategy,
                    timestamp,
                    parsed.scores,
                    parsed.vitals,
                    Some(parsed.raw),
                )
            }
            Err(e) => {
                tracing::warn!(
                    url,
                    strategy = %strategy,
                    attempts = retried.attempts,
                    category = %e.category(),
                    "probe failed: {}",
                    e
                );
                AuditOutcome::failure(
                    url,
                    strategy,
                    timestamp,
                    ErrorInfo {
                        category: e.category(),
                        http_status: e.http_status(),
                        message: e.message().to_string(),
                        attempts: retried.attempts,
                    },
                )
            }
        }
    }

    /// One API call: slot first, then the throttle, so the recorded start
    /// matches the moment the request actually goes out.
    async fn attempt(
        &self,
        url: &str,
        strategy: Strategy,
        attempt: u32,
    ) -> Result<ParsedAudit, ProbeError> {
        let _slot = self.budget.acquire().await;
        self.throttle.acquire().await;
        tracing::debug!(url, strategy = %strategy, attempt, "calling scoring api");

        let api = Arc::clone(&self.api);
        let owned = url.to_string();
        let body = tokio::task::spawn_blocking(move || api.run_audit(&owned, strategy))
            .await
            .map_err(|e| ProbeError::Network {
                message: format!("probe task failed: {e}"),
                timed_out: false,
            })??;
        parse_response(&body)
    }
}
