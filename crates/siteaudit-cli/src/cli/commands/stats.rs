//! `siteaudit stats` – counts, averages and recent scores from the database.

use anyhow::Result;
use chrono::Utc;
use siteaudit_core::audit_db::AuditDb;
use std::path::Path;

use super::pct;

pub async fn run_stats(state_dir: &Path, days: u32, limit: u32) -> Result<()> {
    let db = AuditDb::open_default(state_dir).await?;
    let audits = db.count_audits().await?;
    if audits == 0 {
        println!("No audits in database.");
        return Ok(());
    }
    println!("{} audit(s) over {} site(s)", audits, db.count_sites().await?);

    println!();
    println!("{:<8} {:>6} {:>6} {:>6} {:>6} {:>6}", "STRATEGY", "SITES", "PERF", "A11Y", "SEO", "BP");
    for a in db.strategy_averages().await? {
        println!(
            "{:<8} {:>6} {:>6} {:>6} {:>6} {:>6}",
            a.strategy,
            a.sites,
            pct(a.scores.performance),
            pct(a.scores.accessibility),
            pct(a.scores.seo),
            pct(a.scores.best_practices)
        );
    }

    let points = db.daily_evolution(days, Utc::now()).await?;
    if !points.is_empty() {
        println!();
        println!("{:<10} {:>7} {:>6} {:>6}", "DAY", "AUDITS", "PERF", "A11Y");
        for p in points {
            println!(
                "{:<10} {:>7} {:>6} {:>6}",
                p.day.format("%Y-%m-%d").to_string(),
                p.audits,
                pct(p.performance),
                pct(p.accessibility)
            );
        }
    }

    println!();
    println!("{:<20} {:<8} {:>5}  {}", "LATEST", "STRATEGY", "PERF", "URL");
    for l in db.latest_scores(limit).await? {
        println!(
            "{:<20} {:<8} {:>5}  {}",
            l.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
            l.strategy,
            pct(l.scores.performance),
            l.url
        );
    }

    let q = db.quarantine_stats().await?;
    if q.total > 0 {
        println!();
        println!("{} endpoint(s) in quarantine (see `siteaudit quarantine stats`)", q.total);
    }
    Ok(())
}
