//! Tests for audit_db (use in-memory DB helper from db).

use chrono::{DateTime, TimeZone, Utc};

use crate::audit_db::db::open_memory;
use crate::model::{AuditOutcome, ErrorCategory, ErrorInfo, Scores, Strategy, WebVitals};
use crate::quarantine::{Observations, QuarantineEngine, QuarantineStatus, Trigger};

fn at(day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 4, day, hour, 0, 0).unwrap()
}

fn scored(url: &str, strategy: Strategy, ts: DateTime<Utc>, perf: f64) -> AuditOutcome {
    AuditOutcome::success(
        url,
        strategy,
        ts,
        Scores {
            performance: perf,
            accessibility: 0.9,
            seo: 0.8,
            best_practices: 0.7,
        },
        WebVitals {
            first_contentful_paint_ms: Some(1200.0),
            ..WebVitals::default()
        },
        Some(r#"{"lighthouseResult":{}}"#.to_string()),
    )
}

#[tokio::test]
async fn duplicate_insert_is_a_noop() {
    let db = open_memory().await.unwrap();
    let o = scored("https://a.example", Strategy::Mobile, at(1, 10), 0.5);
    assert!(db.insert_outcome(&o).await.unwrap());
    let before = db.latest_scores(10).await.unwrap();
    assert!(!db.insert_outcome(&o).await.unwrap());
    assert_eq!(db.count_audits().await.unwrap(), 1);
    assert_eq!(db.latest_scores(10).await.unwrap(), before);
}

#[tokio::test]
async fn same_url_different_key_is_kept() {
    let db = open_memory().await.unwrap();
    db.insert_outcome(&scored("https://a.example", Strategy::Mobile, at(1, 10), 0.5))
        .await
        .unwrap();
    db.insert_outcome(&scored("https://a.example", Strategy::Desktop, at(1, 10), 0.6))
        .await
        .unwrap();
    db.insert_outcome(&scored("https://a.example", Strategy::Mobile, at(2, 10), 0.7))
        .await
        .unwrap();
    assert_eq!(db.count_audits().await.unwrap(), 3);
    assert_eq!(db.count_sites().await.unwrap(), 1);
    assert_eq!(db.latest_scores(10).await.unwrap().len(), 2);
}

#[tokio::test]
async fn older_outcome_does_not_replace_latest() {
    let db = open_memory().await.unwrap();
    db.insert_outcome(&scored("https://a.example", Strategy::Mobile, at(2, 10), 0.9))
        .await
        .unwrap();
    db.insert_outcome(&scored("https://a.example", Strategy::Mobile, at(1, 10), 0.1))
        .await
        .unwrap();
    let latest = db.latest_scores(10).await.unwrap();
    assert_eq!(latest.len(), 1);
    assert_eq!(latest[0].timestamp, at(2, 10));
    assert_eq!(latest[0].scores.performance, 0.9);
}

#[tokio::test]
async fn failed_outcome_is_rejected() {
    let db = open_memory().await.unwrap();
    let o = AuditOutcome::failure(
        "https://a.example",
        Strategy::Mobile,
        at(1, 10),
        ErrorInfo {
            category: ErrorCategory::Network,
            http_status: None,
            message: "connection refused".into(),
            attempts: 3,
        },
    );
    assert!(db.insert_outcome(&o).await.is_err());
    assert_eq!(db.count_audits().await.unwrap(), 0);
}

#[tokio::test]
async fn strategy_averages_use_latest_rows() {
    let db = open_memory().await.unwrap();
    db.insert_outcome(&scored("https://a.example", Strategy::Mobile, at(1, 10), 0.2))
        .await
        .unwrap();
    db.insert_outcome(&scored("https://a.example", Strategy::Mobile, at(2, 10), 0.4))
        .await
        .unwrap();
    db.insert_outcome(&scored("https://b.example", Strategy::Mobile, at(2, 11), 0.6))
        .await
        .unwrap();
    let avgs = db.strategy_averages().await.unwrap();
    assert_eq!(avgs.len(), 1);
    assert_eq!(avgs[0].strategy, Strategy::Mobile);
    assert_eq!(avgs[0].sites, 2);
    assert!((avgs[0].scores.performance - 0.5).abs() < 1e-9);
}

#[tokio::test]
async fn daily_evolution_windows_by_day() {
    let db = open_memory().await.unwrap();
    db.insert_outcome(&scored("https://a.example", Strategy::Mobile, at(1, 10), 0.2))
        .await
        .unwrap();
    db.insert_outcome(&scored("https://a.example", Strategy::Mobile, at(3, 10), 0.4))
        .await
        .unwrap();
    db.insert_outcome(&scored("https://b.example", Strategy::Mobile, at(3, 11), 0.6))
        .await
        .unwrap();
    let points = db.daily_evolution(2, at(4, 0)).await.unwrap();
    assert_eq!(points.len(), 1);
    assert_eq!(points[0].day, at(3, 0).date_naive());
    assert_eq!(points[0].audits, 2);
    assert!((points[0].performance - 0.5).abs() < 1e-9);
}

#[tokio::test]
async fn quarantine_changes_roundtrip() {
    let db = open_memory().await.unwrap();
    let mut engine = QuarantineEngine::new(2);
    let mut obs = Observations::new();
    obs.record("https://x.example", at(1, 10), false);
    obs.record("https://y.example", at(1, 10), false);
    engine.reevaluate(&obs, at(1, 12));
    let mut obs = Observations::new();
    obs.record("https://x.example", at(2, 10), false);
    engine.reevaluate(&obs, at(2, 12));
    db.apply_quarantine_changes(&engine.take_changes()).await.unwrap();

    let rows = db.load_quarantine().await.unwrap();
    assert_eq!(rows.len(), 2);
    let listed = db.list_quarantined(None).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].url, "https://x.example");
    assert_eq!(listed[0].status, Some(QuarantineStatus::Quarantined));
    assert_eq!(listed[0].consecutive_failure_days, 2);
    assert_eq!(listed[0].last_failure_day, Some(at(2, 0).date_naive()));
    assert!(db.skip_urls().await.unwrap().contains("https://x.example"));

    // Reload, move through the manual workflow, persist again.
    let mut engine = QuarantineEngine::from_entries(rows, 2);
    engine.apply_manual("https://x.example", Trigger::Investigate, at(3, 9)).unwrap();
    engine
        .set_note("https://x.example", Some("checking dns".into()), at(3, 9))
        .unwrap();
    db.apply_quarantine_changes(&engine.take_changes()).await.unwrap();
    assert!(db.skip_urls().await.unwrap().is_empty());
    let investigating = db
        .list_quarantined(Some(QuarantineStatus::Investigating))
        .await
        .unwrap();
    assert_eq!(investigating.len(), 1);
    assert_eq!(investigating[0].note.as_deref(), Some("checking dns"));
    assert!(db
        .list_quarantined(Some(QuarantineStatus::Quarantined))
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn removal_deletes_row() {
    let db = open_memory().await.unwrap();
    let mut engine = QuarantineEngine::new(1);
    let mut obs = Observations::new();
    obs.record("https://x.example", at(1, 10), false);
    engine.reevaluate(&obs, at(1, 12));
    engine.set_status("https://x.example", QuarantineStatus::Investigating, at(1, 13)).unwrap();
    engine.set_status("https://x.example", QuarantineStatus::Resolved, at(1, 14)).unwrap();
    db.apply_quarantine_changes(&engine.take_changes()).await.unwrap();
    assert_eq!(db.load_quarantine().await.unwrap().len(), 1);

    engine.apply_manual("https://x.example", Trigger::Remove, at(1, 15)).unwrap();
    db.apply_quarantine_changes(&engine.take_changes()).await.unwrap();
    assert!(db.load_quarantine().await.unwrap().is_empty());
}

#[tokio::test]
async fn stats_ignore_tracking_rows() {
    let db = open_memory().await.unwrap();
    let mut engine = QuarantineEngine::new(2);
    let mut obs = Observations::new();
    for url in ["https://a.example", "https://b.example", "https://c.example"] {
        obs.record(url, at(1, 10), false);
    }
    engine.reevaluate(&obs, at(1, 12));
    let mut obs = Observations::new();
    obs.record("https://a.example", at(2, 10), false);
    obs.record("https://b.example", at(2, 10), false);
    engine.reevaluate(&obs, at(2, 12));
    let mut obs = Observations::new();
    obs.record("https://a.example", at(3, 10), false);
    engine.reevaluate(&obs, at(3, 12));
    engine.apply_manual("https://b.example", Trigger::Investigate, at(3, 13)).unwrap();
    db.apply_quarantine_changes(&engine.take_changes()).await.unwrap();

    let stats = db.quarantine_stats().await.unwrap();
    assert_eq!(stats.total, 2);
    assert_eq!(stats.by_status.get(&QuarantineStatus::Quarantined), Some(&1));
    assert_eq!(stats.by_status.get(&QuarantineStatus::Investigating), Some(&1));
    assert_eq!(stats.max_failure_days, 3);
    assert!((stats.mean_failure_days - 2.5).abs() < 1e-9);
}

#[tokio::test]
async fn unknown_status_is_an_error() {
    let db = open_memory().await.unwrap();
    sqlx::query(
        r#"INSERT INTO quarantine (url, consecutive_failure_days, status, updated_at)
           VALUES ('https://x.example', 4, 'quarantinde', '2025-04-01T10:00:00.000000Z')"#,
    )
    .execute(&db.pool)
    .await
    .unwrap();

    let err = db.load_quarantine().await.unwrap_err();
    assert!(format!("{:#}", err).contains("bad quarantine status"));
    assert!(db.quarantine_stats().await.is_err());
}

#[tokio::test]
async fn empty_stats_are_zero() {
    let db = open_memory().await.unwrap();
    let stats = db.quarantine_stats().await.unwrap();
    assert_eq!(stats.total, 0);
    assert_eq!(stats.max_failure_days, 0);
    assert_eq!(stats.mean_failure_days, 0.0);
}

#[tokio::test]
async fn open_at_creates_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("audits.db");
    let db = crate::audit_db::AuditDb::open_at(&path).await.unwrap();
    assert_eq!(db.count_audits().await.unwrap(), 0);
    assert!(path.exists());
}
