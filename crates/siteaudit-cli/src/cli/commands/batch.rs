//! `siteaudit batch` – audit every target of an input list.

use anyhow::Result;
use siteaudit_core::audit_db::AuditDb;
use siteaudit_core::config::AuditConfig;
use siteaudit_core::fetch::{CurlScoringApi, FetchExecutor};
use siteaudit_core::progress::ProgressStore;
use siteaudit_core::quarantine::QuarantineEngine;
use siteaudit_core::report::{render_summary, ErrorLog};
use siteaudit_core::scheduler::{run_batch, BatchError, BatchStores};
use siteaudit_core::targets::load_targets;
use std::path::Path;
use std::sync::Arc;

use crate::cli::BatchArgs;

pub async fn run_batch_command(
    mut cfg: AuditConfig,
    state_dir: &Path,
    api_key: &str,
    input: &Path,
    args: &BatchArgs,
) -> Result<()> {
    args.apply(&mut cfg);
    cfg.batch.validate()?;

    let targets = load_targets(input)?;
    let db = AuditDb::open_default(state_dir).await?;
    let mut progress = ProgressStore::open_in(state_dir)?;
    let mut quarantine =
        QuarantineEngine::from_entries(db.load_quarantine().await?, cfg.batch.quarantine_min_days);
    let error_log = ErrorLog::in_dir(state_dir);

    let api = Arc::new(CurlScoringApi::new(&cfg.api, api_key)?);
    let executor = Arc::new(FetchExecutor::from_config(api, &cfg.batch));

    println!(
        "Auditing {} target(s): max {} in flight, {} req/s, {} retries",
        targets.len(),
        cfg.batch.max_concurrent_requests,
        cfg.batch.requests_per_second,
        cfg.batch.max_retries
    );

    let result = run_batch(
        &targets,
        &cfg.batch,
        executor,
        BatchStores {
            progress: &mut progress,
            quarantine: &mut quarantine,
            db: &db,
            error_log: &error_log,
        },
    )
    .await;

    match result {
        Ok(summary) => {
            print!("{}", render_summary(&summary));
            if summary.failed_total() > 0 {
                println!("failure details: {}", error_log.path().display());
            }
            Ok(())
        }
        Err(BatchError::Auth {
            url,
            strategy,
            message,
            summary,
        }) => {
            print!("{}", render_summary(&summary));
            anyhow::bail!(
                "run aborted: scoring API refused the credential on {} ({}): {}",
                url,
                strategy,
                message
            )
        }
        Err(e) => Err(e.into()),
    }
}
