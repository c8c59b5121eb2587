//! Quarantine table: load/save engine state and operator queries.

use anyhow::{Context, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use std::collections::HashSet;

use super::db::{day_from_text, day_to_text, ts_from_text, ts_to_text, AuditDb};
use super::types::QuarantineStats;
use crate::quarantine::{QuarantineChanges, QuarantineEntry, QuarantineStatus};

fn status_from_text(s: &str) -> Result<QuarantineStatus> {
    s.parse::<QuarantineStatus>()
        .map_err(anyhow::Error::msg)
        .context("bad quarantine status in database")
}

fn entry_from_row(row: &SqliteRow) -> Result<QuarantineEntry> {
    let days: i64 = row.get("consecutive_failure_days");
    let last_failure_day: Option<String> = row.get("last_failure_day");
    let status: Option<String> = row.get("status");
    let updated_at: String = row.get("updated_at");
    Ok(QuarantineEntry {
        url: row.get("url"),
        consecutive_failure_days: u32::try_from(days).unwrap_or(0),
        last_failure_day: last_failure_day.as_deref().map(day_from_text).transpose()?,
        status: status.as_deref().map(status_from_text).transpose()?,
        note: row.get("note"),
        updated_at: ts_from_text(&updated_at)?,
    })
}

impl AuditDb {
    /// Every row, tracking-only ones included. Feeds `QuarantineEngine::from_entries`.
    pub async fn load_quarantine(&self) -> Result<Vec<QuarantineEntry>> {
        let rows = sqlx::query(
            r#"
            SELECT url, consecutive_failure_days, last_failure_day, status, note, updated_at
            FROM quarantine
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(entry_from_row).collect()
    }

    /// Persist engine changes in one transaction.
    pub async fn apply_quarantine_changes(&self, changes: &QuarantineChanges) -> Result<()> {
        if changes.is_empty() {
            return Ok(());
        }
        let mut tx = self.pool.begin().await?;
        for e in &changes.upserts {
            sqlx::query(
                r#"
                INSERT INTO quarantine (
                    url, consecutive_failure_days, last_failure_day, status, note, updated_at
                )
                VALUES (?, ?, ?, ?, ?, ?)
                ON CONFLICT (url) DO UPDATE SET
                    consecutive_failure_days = excluded.consecutive_failure_days,
                    last_failure_day = excluded.last_failure_day,
                    status = excluded.status,
                    note = excluded.note,
                    updated_at = excluded.updated_at
                "#,
            )
            .bind(&e.url)
            .bind(i64::from(e.consecutive_failure_days))
            .bind(e.last_failure_day.map(day_to_text))
            .bind(e.status.map(QuarantineStatus::as_str))
            .bind(e.note.as_deref())
            .bind(ts_to_text(&e.updated_at))
            .execute(&mut *tx)
            .await?;
        }
        for url in &changes.removals {
            sqlx::query(r#"DELETE FROM quarantine WHERE url = ?"#)
                .bind(url)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    /// Listed entries (status not NULL), optionally filtered, most recently updated first.
    pub async fn list_quarantined(
        &self,
        status: Option<QuarantineStatus>,
    ) -> Result<Vec<QuarantineEntry>> {
        let rows = sqlx::query(
            r#"
            SELECT url, consecutive_failure_days, last_failure_day, status, note, updated_at
            FROM quarantine
            WHERE status IS NOT NULL AND (?1 IS NULL OR status = ?1)
            ORDER BY updated_at DESC, url ASC
            "#,
        )
        .bind(status.map(QuarantineStatus::as_str))
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(entry_from_row).collect()
    }

    pub async fn quarantine_stats(&self) -> Result<QuarantineStats> {
        let rows = sqlx::query(
            r#"
            SELECT status, COUNT(*) AS n
            FROM quarantine
            WHERE status IS NOT NULL
            GROUP BY status
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut stats = QuarantineStats::default();
        for row in rows {
            let status: String = row.get("status");
            let n: i64 = row.get("n");
            stats.by_status.insert(status_from_text(&status)?, n);
            stats.total += n;
        }

        let row = sqlx::query(
            r#"
            SELECT COALESCE(AVG(consecutive_failure_days), 0.0) AS mean_days,
                   COALESCE(MAX(consecutive_failure_days), 0) AS max_days
            FROM quarantine
            WHERE status IS NOT NULL
            "#,
        )
        .fetch_one(&self.pool)
        .await?;
        stats.mean_failure_days = row.get("mean_days");
        stats.max_failure_days = row.get("max_days");
        Ok(stats)
    }

    /// Urls in an active quarantine status.
    pub async fn skip_urls(&self) -> Result<HashSet<String>> {
        let rows = sqlx::query(
            r#"SELECT url FROM quarantine WHERE status IN ('quarantined', 'wrong_url')"#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(|r| r.get::<String, _>("url")).collect())
    }
}
