//! SQLite-backed store implementation.
//!
//! Handles connection, migrations, and timestamp helpers. Queries live in
//! `results` and `quarantine`.

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Pool, Sqlite};
use std::path::Path;

/// File name of the database inside the state directory.
pub const DB_FILE: &str = "audits.db";

/// Percent-encode a path for use in a sqlite:// URI so spaces and special chars don't break parsing.
fn path_to_sqlite_uri(path: &Path) -> String {
    let s = path.to_string_lossy();
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '%' => out.push_str("%25"),
            ' ' => out.push_str("%20"),
            '#' => out.push_str("%23"),
            '?' => out.push_str("%3F"),
            '&' => out.push_str("%26"),
            c => out.push(c),
        }
    }
    format!("sqlite://{}", out)
}

/// Handle to the audit database.
///
/// Lives in the state directory: `~/.local/state/siteaudit/audits.db` by default.
#[derive(Clone)]
pub struct AuditDb {
    pub(crate) pool: Pool<Sqlite>,
}

impl AuditDb {
    /// Open (or create) the database inside `state_dir` and run migrations.
    pub async fn open_default(state_dir: &Path) -> Result<Self> {
        Self::open_at(state_dir.join(DB_FILE)).await
    }

    /// Open (or create) the database at a specific path. Creates parent dirs if needed.
    pub async fn open_at(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("create {}", parent.display()))?;
        }
        let uri = path_to_sqlite_uri(path) + "?mode=rwc";
        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect(&uri)
            .await
            .with_context(|| format!("open database {}", path.display()))?;
        let db = AuditDb { pool };
        db.migrate().await?;
        Ok(db)
    }

    async fn migrate(&self) -> Result<()> {
        // `audits` is append-only; the unique key makes replays no-ops.
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS audits (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                url TEXT NOT NULL,
                strategy TEXT NOT NULL,
                timestamp TEXT NOT NULL,
                day TEXT NOT NULL,
                performance REAL NOT NULL,
                accessibility REAL NOT NULL,
                seo REAL NOT NULL,
                best_practices REAL NOT NULL,
                fcp_ms REAL,
                lcp_ms REAL,
                cls REAL,
                max_fid_ms REAL,
                raw_json TEXT,
                UNIQUE (url, strategy, timestamp)
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(r#"CREATE INDEX IF NOT EXISTS audits_day ON audits (day);"#)
            .execute(&self.pool)
            .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS latest_scores (
                url TEXT NOT NULL,
                strategy TEXT NOT NULL,
                timestamp TEXT NOT NULL,
                performance REAL NOT NULL,
                accessibility REAL NOT NULL,
                seo REAL NOT NULL,
                best_practices REAL NOT NULL,
                PRIMARY KEY (url, strategy)
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        // Rows with NULL status only track a streak below the threshold.
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS quarantine (
                url TEXT PRIMARY KEY,
                consecutive_failure_days INTEGER NOT NULL DEFAULT 0,
                last_failure_day TEXT,
                status TEXT,
                note TEXT,
                updated_at TEXT NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

/// Fixed-width UTC timestamp so text comparison matches time order.
pub(crate) fn ts_to_text(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn ts_from_text(s: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(s)
        .with_context(|| format!("bad timestamp in database: {s}"))?
        .with_timezone(&Utc))
}

pub(crate) fn day_to_text(day: NaiveDate) -> String {
    day.format("%Y-%m-%d").to_string()
}

pub(crate) fn day_from_text(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").with_context(|| format!("bad day in database: {s}"))
}

#[cfg(test)]
/// Open an in-memory database for tests (no disk I/O).
pub(crate) async fn open_memory() -> Result<AuditDb> {
    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await?;
    let db = AuditDb { pool };
    db.migrate().await?;
    Ok(db)
}
