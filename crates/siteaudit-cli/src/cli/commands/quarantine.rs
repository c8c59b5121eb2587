//! `siteaudit quarantine …` – list and manage quarantined endpoints.

use anyhow::Result;
use chrono::Utc;
use siteaudit_core::audit_db::AuditDb;
use siteaudit_core::config::AuditConfig;
use siteaudit_core::quarantine::{QuarantineEngine, QuarantineStatus, Trigger};
use std::path::Path;

use crate::cli::QuarantineCommand;

pub async fn run_quarantine(cfg: &AuditConfig, state_dir: &Path, action: QuarantineCommand) -> Result<()> {
    let db = AuditDb::open_default(state_dir).await?;
    match action {
        QuarantineCommand::List { status } => list(&db, status).await,
        QuarantineCommand::Stats => stats(&db).await,
        QuarantineCommand::Set { url, status, note } => {
            let mut engine = load_engine(&db, cfg).await?;
            let now = Utc::now();
            engine.set_status(&url, status, now)?;
            if let Some(note) = note {
                engine.set_note(&url, Some(note), now)?;
            }
            db.apply_quarantine_changes(&engine.take_changes()).await?;
            println!("{} is now {}", url, status);
            Ok(())
        }
        QuarantineCommand::Note { url, note } => {
            let mut engine = load_engine(&db, cfg).await?;
            engine.set_note(&url, Some(note), Utc::now())?;
            db.apply_quarantine_changes(&engine.take_changes()).await?;
            println!("Note updated for {}", url);
            Ok(())
        }
        QuarantineCommand::Remove { url } => {
            let mut engine = load_engine(&db, cfg).await?;
            engine.apply_manual(&url, Trigger::Remove, Utc::now())?;
            db.apply_quarantine_changes(&engine.take_changes()).await?;
            println!("Removed {} from quarantine", url);
            Ok(())
        }
    }
}

async fn load_engine(db: &AuditDb, cfg: &AuditConfig) -> Result<QuarantineEngine> {
    Ok(QuarantineEngine::from_entries(
        db.load_quarantine().await?,
        cfg.batch.quarantine_min_days,
    ))
}

async fn list(db: &AuditDb, status: Option<QuarantineStatus>) -> Result<()> {
    let entries = db.list_quarantined(status).await?;
    if entries.is_empty() {
        println!("No quarantine entries.");
        return Ok(());
    }
    println!("{:<14} {:>5} {:<20} {:<40} {}", "STATUS", "DAYS", "UPDATED", "URL", "NOTE");
    for e in entries {
        println!(
            "{:<14} {:>5} {:<20} {:<40} {}",
            e.status.map_or("-", QuarantineStatus::as_str),
            e.consecutive_failure_days,
            e.updated_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            e.url,
            e.note.as_deref().unwrap_or("")
        );
    }
    Ok(())
}

async fn stats(db: &AuditDb) -> Result<()> {
    let s = db.quarantine_stats().await?;
    println!("total: {}", s.total);
    for status in QuarantineStatus::ALL {
        println!("  {:<14} {}", status.as_str(), s.by_status.get(&status).copied().unwrap_or(0));
    }
    println!("failure streak: mean {:.1} days, max {} days", s.mean_failure_days, s.max_failure_days);
    Ok(())
}
