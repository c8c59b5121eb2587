//! Retry loop: run an async attempt until success or the policy says stop.

use std::future::Future;

use super::classify;
use super::error::ProbeError;
use super::policy::{RetryDecision, RetryPolicy};

/// Final result of a retried operation plus the number of attempts made.
#[derive(Debug)]
pub struct Retried<T> {
    pub result: Result<T, ProbeError>,
    pub attempts: u32,
}

/// Runs `f(attempt)` until it succeeds or the retry policy says to stop.
/// On retryable failure, sleeps for the backoff duration then tries again.
/// `attempt` passed to `f` is 1-based.
pub async fn run_with_retry<T, F, Fut>(policy: &RetryPolicy, mut f: F) -> Retried<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, ProbeError>>,
{
    let mut attempt = 1u32;
    loop {
        match f(attempt).await {
            Ok(v) => {
                return Retried {
                    result: Ok(v),
                    attempts: attempt,
                }
            }
            Err(e) => match policy.decide(attempt, classify::classify(&e)) {
                RetryDecision::NoRetry => {
                    return Retried {
                        result: Err(e),
                        attempts: attempt,
                    }
                }
                RetryDecision::RetryAfter(d) => {
                    tracing::debug!(attempt, delay_ms = d.as_millis() as u64, "retrying: {}", e);
                    tokio::time::sleep(d).await;
                    attempt += 1;
                }
            },
        }
    }
}
