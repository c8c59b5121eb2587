//! One batch run: select, schedule, collect, persist, re-evaluate.
//!
//! At most `max_concurrent_requests` probe tasks are scheduled at once; when
//! one finishes the next planned probe is started, the same refill loop the
//! budget bounds per attempt. All outcomes come back to this function's
//! single control flow before touching the progress store, the result store
//! or the quarantine engine, so none of them need locking.

use chrono::Utc;
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use tokio::task::JoinSet;
use tokio::time::Instant;

use super::error::BatchError;
use super::summary::RunSummary;
use crate::audit_db::AuditDb;
use crate::config::BatchConfig;
use crate::fetch::FetchExecutor;
use crate::model::{AuditOutcome, ErrorCategory, Strategy, Target};
use crate::progress::ProgressStore;
use crate::quarantine::{Observations, QuarantineEngine};
use crate::report::ErrorLog;
use crate::targets::{select_targets, SelectOptions};

/// Mutable state a run reads and updates.
pub struct BatchStores<'a> {
    pub progress: &'a mut ProgressStore,
    pub quarantine: &'a mut QuarantineEngine,
    pub db: &'a AuditDb,
    pub error_log: &'a ErrorLog,
}

/// Why scheduling stopped before the queue drained.
enum Abort {
    Auth {
        url: String,
        strategy: Strategy,
        message: String,
    },
    Storage(anyhow::Error),
    Progress(anyhow::Error),
}

/// Run one batch over `candidates`.
///
/// Per-target failures are recorded, never returned. Errors are reserved for
/// rejected credentials and broken local stores; in both cases in-flight
/// probes are awaited and no quarantine re-evaluation happens.
pub async fn run_batch(
    candidates: &[Target],
    cfg: &BatchConfig,
    executor: Arc<FetchExecutor>,
    stores: BatchStores<'_>,
) -> Result<RunSummary, BatchError> {
    let BatchStores {
        progress,
        quarantine,
        db,
        error_log,
    } = stores;
    let started = Instant::now();
    let deadline = cfg.soft_deadline();
    let max_in_flight = cfg.max_concurrent_requests.max(1);

    let skip = quarantine.skip_set();
    let selection = select_targets(
        candidates,
        progress.records(),
        &skip,
        SelectOptions {
            strategies: &cfg.strategies,
            skip_recent_hours: cfg.skip_recent_hours,
            now: Utc::now(),
        },
    );

    let mut summary = RunSummary {
        candidates: candidates.len(),
        planned_targets: selection.planned.len(),
        skipped_recent: selection.skipped_recent,
        skipped_quarantined: selection.skipped_quarantined,
        ..RunSummary::default()
    };
    tracing::info!(
        candidates = summary.candidates,
        targets = summary.planned_targets,
        probes = selection.probe_count(),
        skipped_recent = summary.skipped_recent,
        skipped_quarantined = summary.skipped_quarantined,
        "batch starting"
    );

    let mut queue: VecDeque<(Target, Strategy)> = selection
        .planned
        .into_iter()
        .flat_map(|p| {
            let target = p.target;
            p.strategies
                .into_iter()
                .map(move |s| (target.clone(), s))
        })
        .collect();

    let mut observations = Observations::new();
    let mut scored_urls: HashSet<String> = HashSet::new();
    let mut join_set: JoinSet<AuditOutcome> = JoinSet::new();
    let mut abort: Option<Abort> = None;

    loop {
        while abort.is_none() && join_set.len() < max_in_flight && !queue.is_empty() {
            if deadline.is_some_and(|d| started.elapsed() >= d) {
                if !summary.deadline_reached {
                    tracing::info!(remaining = queue.len(), "soft deadline reached, draining");
                }
                summary.deadline_reached = true;
                break;
            }
            let Some((target, strategy)) = queue.pop_front() else {
                break;
            };

            progress.record_attempt(&target.url, Utc::now());
            if let Err(e) = progress.save_async().await {
                abort = Some(Abort::Progress(e));
                queue.push_front((target, strategy));
                break;
            }
            summary.attempted += 1;

            let executor = Arc::clone(&executor);
            join_set.spawn(async move { executor.probe(&target, strategy).await });
        }

        let Some(res) = join_set.join_next().await else {
            break;
        };
        let outcome = match res {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!("probe task join: {}", e);
                continue;
            }
        };

        if outcome.is_success() {
            if let Err(e) = db.insert_outcome(&outcome).await {
                tracing::error!(url = %outcome.url, "storing result failed: {:#}", e);
                abort.get_or_insert(Abort::Storage(e));
                continue;
            }
            progress.record_success(&outcome.url, outcome.strategy, outcome.timestamp);
            if let Err(e) = progress.save_async().await {
                abort.get_or_insert(Abort::Progress(e));
            }
            observations.record(&outcome.url, outcome.timestamp, true);
            scored_urls.insert(outcome.url.clone());
            summary.succeeded += 1;
            continue;
        }

        let Some(err) = outcome.error.as_ref() else {
            continue;
        };
        summary.record_failure(err.category);
        if let Err(e) = error_log.append(&outcome) {
            tracing::warn!("error log append failed: {:#}", e);
        }
        if err.category == ErrorCategory::Auth {
            if abort.is_none() {
                tracing::error!(
                    url = %outcome.url,
                    strategy = %outcome.strategy,
                    "credential rejected by scoring API, stopping run"
                );
                abort = Some(Abort::Auth {
                    url: outcome.url.clone(),
                    strategy: outcome.strategy,
                    message: err.message.clone(),
                });
            }
        } else {
            observations.record(&outcome.url, outcome.timestamp, false);
        }
    }

    summary.not_scheduled = queue.len();
    summary.succeeded_targets = scored_urls.len();
    summary.elapsed_secs = started.elapsed().as_secs_f64();

    match abort {
        Some(Abort::Auth {
            url,
            strategy,
            message,
        }) => {
            return Err(BatchError::Auth {
                url,
                strategy,
                message,
                summary: Box::new(summary),
            })
        }
        Some(Abort::Storage(e)) => return Err(BatchError::Storage(e)),
        Some(Abort::Progress(e)) => return Err(BatchError::Progress(e)),
        None => {}
    }

    let report = quarantine.reevaluate(&observations, Utc::now());
    db.apply_quarantine_changes(&quarantine.take_changes())
        .await
        .map_err(BatchError::Storage)?;
    summary.newly_quarantined = report.newly_quarantined;

    tracing::info!(
        attempted = summary.attempted,
        succeeded = summary.succeeded,
        failed = summary.failed_total(),
        newly_quarantined = summary.newly_quarantined.len(),
        deadline_reached = summary.deadline_reached,
        elapsed_secs = summary.elapsed_secs,
        "batch finished"
    );
    Ok(summary)
}
