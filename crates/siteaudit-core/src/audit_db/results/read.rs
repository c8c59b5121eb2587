//! Aggregate queries consumed by `stats` and dashboard export.

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use super::super::db::{day_from_text, day_to_text, ts_from_text, AuditDb};
use super::super::types::{DailyPoint, LatestScore, StrategyAverage};
use crate::model::{Scores, Strategy};

fn scores_from_row(row: &SqliteRow) -> Scores {
    Scores {
        performance: row.get("performance"),
        accessibility: row.get("accessibility"),
        seo: row.get("seo"),
        best_practices: row.get("best_practices"),
    }
}

fn strategy_from_row(row: &SqliteRow) -> Result<Strategy> {
    let s: String = row.get("strategy");
    s.parse::<Strategy>()
        .map_err(anyhow::Error::msg)
        .context("bad strategy in database")
}

impl AuditDb {
    /// Total number of stored audits.
    pub async fn count_audits(&self) -> Result<i64> {
        let row = sqlx::query(r#"SELECT COUNT(*) AS n FROM audits"#)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get("n"))
    }

    /// Number of distinct urls with at least one stored audit.
    pub async fn count_sites(&self) -> Result<i64> {
        let row = sqlx::query(r#"SELECT COUNT(DISTINCT url) AS n FROM audits"#)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get("n"))
    }

    /// Newest-first latest scores, at most `limit` rows.
    pub async fn latest_scores(&self, limit: u32) -> Result<Vec<LatestScore>> {
        let rows = sqlx::query(
            r#"
            SELECT url, strategy, timestamp, performance, accessibility, seo, best_practices
            FROM latest_scores
            ORDER BY timestamp DESC, url ASC
            LIMIT ?
            "#,
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let ts: String = row.get("timestamp");
            out.push(LatestScore {
                url: row.get("url"),
                strategy: strategy_from_row(&row)?,
                timestamp: ts_from_text(&ts)?,
                scores: scores_from_row(&row),
            });
        }
        Ok(out)
    }

    /// Site count and mean scores per strategy, over `latest_scores`.
    pub async fn strategy_averages(&self) -> Result<Vec<StrategyAverage>> {
        let rows = sqlx::query(
            r#"
            SELECT strategy,
                   COUNT(*) AS sites,
                   AVG(performance) AS performance,
                   AVG(accessibility) AS accessibility,
                   AVG(seo) AS seo,
                   AVG(best_practices) AS best_practices
            FROM latest_scores
            GROUP BY strategy
            ORDER BY strategy
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(StrategyAverage {
                strategy: strategy_from_row(&row)?,
                sites: row.get("sites"),
                scores: scores_from_row(&row),
            });
        }
        Ok(out)
    }

    /// Per-day mean performance and accessibility for the last `days` days
    /// (including today), oldest first.
    pub async fn daily_evolution(&self, days: u32, now: DateTime<Utc>) -> Result<Vec<DailyPoint>> {
        let cutoff = now.date_naive() - Duration::days(i64::from(days.saturating_sub(1)));
        let rows = sqlx::query(
            r#"
            SELECT day,
                   COUNT(*) AS audits,
                   AVG(performance) AS performance,
                   AVG(accessibility) AS accessibility
            FROM audits
            WHERE day >= ?
            GROUP BY day
            ORDER BY day
            "#,
        )
        .bind(day_to_text(cutoff))
        .fetch_all(&self.pool)
        .await?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let day: String = row.get("day");
            out.push(DailyPoint {
                day: day_from_text(&day)?,
                audits: row.get("audits"),
                performance: row.get("performance"),
                accessibility: row.get("accessibility"),
            });
        }
        Ok(out)
    }
}
