// tests/snapshot_store.rs
use std::fs;
use std::path::PathBuf;

use chrono::NaiveDate;

use trade_watch::record::{self, Dataset};
use trade_watch::store::{CsvSnapshotStore, SnapshotStore, SnapshotSummary};
use trade_watch::WatchError;

fn tmp_dir(name: &str) -> PathBuf {
    let mut p = std::env::temp_dir();
    p.push(format!("trade_watch_store_it_{}_{}", name, std::process::id()));
    let _ = fs::remove_dir_all(&p);
    fs::create_dir_all(&p).unwrap();
    p
}

fn sample() -> Dataset {
    let header = vec!["Ticker".into(), "Transaction Date".into(), "Amount".into(), "Note".into()];
    let rows = vec![
        vec!["NVDA".into(), "2024-01-15".into(), "$1,000,001 - $5,000,000".into(), "call \"options\"".into()],
        vec!["AAPL".into(), "Jan 12, 2024".into(), "$15,001 - $50,000".into(), "".into()],
    ];
    record::parse(rows, header, "Transaction Date").unwrap()
}

#[test]
fn missing_file_means_no_snapshot() {
    let dir = tmp_dir("missing");
    let store = CsvSnapshotStore::new(dir.join("trades.csv"), "Transaction Date");
    assert!(store.load().unwrap().is_none());
    assert!(store.summary().unwrap().is_none());
}

#[test]
fn saved_snapshot_loads_back_with_header_order_and_quoted_cells() {
    let dir = tmp_dir("reload");
    let store = CsvSnapshotStore::new(dir.join("trades.csv"), "Transaction Date");
    let ds = sample();
    store.save(&ds).unwrap();

    let text = fs::read_to_string(store.path()).unwrap();
    assert!(text.starts_with("Ticker,Transaction Date,Amount,Note\n"));

    let back = store.load().unwrap().unwrap();
    assert_eq!(back, ds);
    assert_eq!(back.trades()[0].get("Note"), Some("call \"options\""));
    assert_eq!(back.trades()[1].transaction_date(), NaiveDate::from_ymd_opt(2024, 1, 12).unwrap());
}

#[test]
fn save_creates_missing_parent_directories() {
    let dir = tmp_dir("nested");
    let path = dir.join("state").join("trades.csv");
    let store = CsvSnapshotStore::new(&path, "Transaction Date");
    store.save(&sample()).unwrap();
    assert!(path.exists());
}

#[test]
fn summary_reports_rows_and_watermark() {
    let dir = tmp_dir("summary");
    let store = CsvSnapshotStore::new(dir.join("trades.csv"), "Transaction Date");
    store.save(&sample()).unwrap();
    assert_eq!(
        store.summary().unwrap(),
        Some(SnapshotSummary { rows: 2, watermark: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap() })
    );
}

#[test]
fn header_only_file_is_corrupt() {
    let dir = tmp_dir("header_only");
    let path = dir.join("trades.csv");
    fs::write(&path, "Ticker,Transaction Date\n").unwrap();
    let err = CsvSnapshotStore::new(&path, "Transaction Date").load().unwrap_err();
    assert!(matches!(err, WatchError::CorruptSnapshot { .. }));
}

#[test]
fn ragged_rows_are_corrupt() {
    let dir = tmp_dir("ragged");
    let path = dir.join("trades.csv");
    fs::write(&path, "Ticker,Transaction Date\nA,2024-01-10\nB\n").unwrap();
    let err = CsvSnapshotStore::new(&path, "Transaction Date").load().unwrap_err();
    assert!(matches!(err, WatchError::CorruptSnapshot { .. }));
}

#[test]
fn snapshot_without_the_date_column_is_corrupt() {
    let dir = tmp_dir("no_date_col");
    let path = dir.join("trades.csv");
    fs::write(&path, "Ticker,Filed\nA,2024-01-10\n").unwrap();
    let err = CsvSnapshotStore::new(&path, "Transaction Date").load().unwrap_err();
    assert!(err.to_string().contains("corrupt snapshot"));
}

#[test]
fn second_save_replaces_the_first() {
    let dir = tmp_dir("replace");
    let store = CsvSnapshotStore::new(dir.join("trades.csv"), "Transaction Date");
    store.save(&sample()).unwrap();

    let header = vec!["Ticker".into(), "Transaction Date".into()];
    let newer = record::parse(vec![vec!["MSFT".into(), "2024-02-01".into()]], header, "Transaction Date").unwrap();
    store.save(&newer).unwrap();

    assert_eq!(store.load().unwrap().unwrap(), newer);
    assert_eq!(fs::read_dir(&dir).unwrap().count(), 1);
}
