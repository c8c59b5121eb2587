//! Result insertion.

use anyhow::{bail, Result};

use super::super::db::{day_to_text, ts_to_text, AuditDb};
use crate::model::AuditOutcome;

impl AuditDb {
    /// Store a scored outcome and refresh `latest_scores`.
    ///
    /// Idempotent under `(url, strategy, timestamp)`: returns `false` when the
    /// row already existed, leaving both tables untouched.
    pub async fn insert_outcome(&self, outcome: &AuditOutcome) -> Result<bool> {
        let Some(scores) = outcome.scores else {
            bail!("outcome for {} has no scores", outcome.url);
        };
        let vitals = outcome.vitals.unwrap_or_default();
        let ts = ts_to_text(&outcome.timestamp);
        let day = day_to_text(outcome.timestamp.date_naive());

        let mut tx = self.pool.begin().await?;
        let inserted = sqlx::query(
            r#"
            INSERT OR IGNORE INTO audits (
                url, strategy, timestamp, day,
                performance, accessibility, seo, best_practices,
                fcp_ms, lcp_ms, cls, max_fid_ms, raw_json
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&outcome.url)
        .bind(outcome.strategy.as_str())
        .bind(&ts)
        .bind(&day)
        .bind(scores.performance)
        .bind(scores.accessibility)
        .bind(scores.seo)
        .bind(scores.best_practices)
        .bind(vitals.first_contentful_paint_ms)
        .bind(vitals.largest_contentful_paint_ms)
        .bind(vitals.cumulative_layout_shift)
        .bind(vitals.max_potential_fid_ms)
        .bind(outcome.raw.as_deref())
        .execute(&mut *tx)
        .await?
        .rows_affected()
            == 1;

        if inserted {
            // Out-of-order completions must not overwrite a newer row.
            sqlx::query(
                r#"
                INSERT INTO latest_scores (
                    url, strategy, timestamp, performance, accessibility, seo, best_practices
                )
                VALUES (?, ?, ?, ?, ?, ?, ?)
                ON CONFLICT (url, strategy) DO UPDATE SET
                    timestamp = excluded.timestamp,
                    performance = excluded.performance,
                    accessibility = excluded.accessibility,
                    seo = excluded.seo,
                    best_practices = excluded.best_practices
                WHERE excluded.timestamp > latest_scores.timestamp
                "#,
            )
            .bind(&outcome.url)
            .bind(outcome.strategy.as_str())
            .bind(&ts)
            .bind(scores.performance)
            .bind(scores.accessibility)
            .bind(scores.seo)
            .bind(scores.best_practices)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(inserted)
    }
}
