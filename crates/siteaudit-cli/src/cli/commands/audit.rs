//! `siteaudit audit <url>` – probe one url with each strategy.

use anyhow::{bail, Result};
use siteaudit_core::audit_db::AuditDb;
use siteaudit_core::config::AuditConfig;
use siteaudit_core::fetch::{CurlScoringApi, FetchExecutor};
use siteaudit_core::model::{ErrorCategory, Strategy, Target};
use siteaudit_core::targets::normalize_url;
use std::path::Path;
use std::sync::Arc;

use super::pct;

pub async fn run_audit(
    cfg: AuditConfig,
    state_dir: &Path,
    api_key: &str,
    url: &str,
    strategies: &[Strategy],
    save: bool,
) -> Result<()> {
    let Some(url) = normalize_url(url.trim()) else {
        bail!("not an absolute http(s) url: {}", url);
    };
    let strategies = if strategies.is_empty() {
        cfg.batch.strategies.clone()
    } else {
        strategies.to_vec()
    };

    let api = Arc::new(CurlScoringApi::new(&cfg.api, api_key)?);
    let executor = FetchExecutor::from_config(api, &cfg.batch);
    let db = if save {
        Some(AuditDb::open_default(state_dir).await?)
    } else {
        None
    };

    let target = Target::new(url);
    for strategy in strategies {
        let outcome = executor.probe(&target, strategy).await;
        match (&outcome.scores, &outcome.error) {
            (Some(s), _) => {
                println!(
                    "{:<8} performance {:>3}  accessibility {:>3}  seo {:>3}  best-practices {:>3}",
                    strategy,
                    pct(s.performance),
                    pct(s.accessibility),
                    pct(s.seo),
                    pct(s.best_practices)
                );
                if let Some(v) = &outcome.vitals {
                    if let (Some(fcp), Some(lcp)) =
                        (v.first_contentful_paint_ms, v.largest_contentful_paint_ms)
                    {
                        println!("         fcp {:.0} ms  lcp {:.0} ms", fcp, lcp);
                    }
                }
                if let Some(db) = &db {
                    db.insert_outcome(&outcome).await?;
                }
            }
            (None, Some(e)) => {
                println!("{:<8} failed ({}): {}", strategy, e.category, e.message);
                if e.category == ErrorCategory::Auth {
                    bail!("scoring API refused the credential: {}", e.message);
                }
            }
            (None, None) => {}
        }
    }
    Ok(())
}
