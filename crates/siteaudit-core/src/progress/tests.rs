//! Tests for the progress store and its file format.

use chrono::{Duration, TimeZone, Utc};
use tempfile::tempdir;

use super::*;

fn t(hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 22, hour, 0, 0).unwrap()
}

#[test]
fn missing_file_is_empty() {
    let dir = tempdir().unwrap();
    let store = ProgressStore::open(dir.path().join("progress.json")).unwrap();
    assert!(store.is_empty());
}

#[test]
fn attempt_then_success_updates_record() {
    let dir = tempdir().unwrap();
    let mut store = ProgressStore::open(dir.path().join("progress.json")).unwrap();
    store.record_attempt("https://a.gov.br", t(10));
    let rec = store.get("https://a.gov.br").unwrap();
    assert_eq!(rec.last_attempt, Some(t(10)));
    assert_eq!(rec.last_success(Strategy::Mobile), None);

    store.record_success("https://a.gov.br", Strategy::Mobile, t(10) + Duration::seconds(5));
    let rec = store.get("https://a.gov.br").unwrap();
    assert_eq!(rec.last_success(Strategy::Mobile), Some(t(10) + Duration::seconds(5)));
    assert_eq!(rec.last_success(Strategy::Desktop), None);
}

#[test]
fn out_of_order_completions_never_regress() {
    let dir = tempdir().unwrap();
    let mut store = ProgressStore::open(dir.path().join("progress.json")).unwrap();
    store.record_success("https://a.gov.br", Strategy::Desktop, t(12));
    store.record_success("https://a.gov.br", Strategy::Desktop, t(11));
    store.record_attempt("https://a.gov.br", t(9));
    let rec = store.get("https://a.gov.br").unwrap();
    assert_eq!(rec.last_success(Strategy::Desktop), Some(t(12)));
    assert_eq!(rec.last_attempt, Some(t(12)));
}

#[test]
fn save_and_reload_roundtrip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("state").join("progress.json");
    let mut store = ProgressStore::open(&path).unwrap();
    store.record_attempt("https://a.gov.br", t(8));
    store.record_success("https://b.gov.br", Strategy::Mobile, t(9));
    store.save().unwrap();

    let reloaded = ProgressStore::open(&path).unwrap();
    assert_eq!(reloaded.records(), store.records());
}

#[tokio::test]
async fn save_async_matches_save() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("progress.json");
    let mut store = ProgressStore::open(&path).unwrap();
    store.record_attempt("https://a.gov.br", t(8));
    store.record_success("https://a.gov.br", Strategy::Desktop, t(10));
    store.save_async().await.unwrap();

    assert_eq!(&ProgressStore::load(&path).unwrap(), store.records());
    let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
    assert_eq!(entries.len(), 1);
}

#[test]
fn file_format_is_keyed_by_url_with_iso_timestamps() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("progress.json");
    let mut store = ProgressStore::open(&path).unwrap();
    store.record_success("https://a.gov.br", Strategy::Mobile, t(9));
    store.save().unwrap();

    let value: serde_json::Value =
        serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
    let rec = &value["https://a.gov.br"];
    assert_eq!(rec["last_attempt"], "2025-01-22T09:00:00Z");
    assert_eq!(rec["last_success_mobile"], "2025-01-22T09:00:00Z");
    assert!(rec.get("last_success_desktop").is_none());
}

#[test]
fn save_leaves_no_temp_files_behind() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("progress.json");
    let mut store = ProgressStore::open(&path).unwrap();
    for h in 0..5 {
        store.record_attempt("https://a.gov.br", t(h));
        store.save().unwrap();
    }
    let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
    assert_eq!(entries.len(), 1);
}

#[test]
fn corrupt_file_is_an_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("progress.json");
    std::fs::write(&path, b"{ not json").unwrap();
    assert!(ProgressStore::open(&path).is_err());
}
