// tests/offline_page.rs
use std::cell::Cell;
use std::fs;
use std::path::PathBuf;

use trade_watch::config::options::{PageSource, Settings};
use trade_watch::extract::HtmlTableExtractor;
use trade_watch::log::{Diagnostics, MemoryDiagnostics};
use trade_watch::notify::Notifier;
use trade_watch::record::Dataset;
use trade_watch::runner::{Pipeline, RunOutcome};
use trade_watch::store::{CsvSnapshotStore, SnapshotStore};
use trade_watch::Result;

fn tmp_dir(name: &str) -> PathBuf {
    let mut p = std::env::temp_dir();
    p.push(format!("trade_watch_offline_{}_{}", name, std::process::id()));
    let _ = fs::remove_dir_all(&p);
    fs::create_dir_all(&p).unwrap();
    p
}

fn page(rows: &[(&str, &str, &str)]) -> String {
    let mut html = String::from(
        "<html><body><h1>Trades</h1>\n<table class=\"tracker\">\n<thead><tr>\
         <th>Ticker</th><th>Transaction Date</th><th>Type</th></tr></thead>\n<tbody>\n",
    );
    for (t, d, k) in rows {
        html.push_str(&format!("<tr><td><a href=\"/s/{t}\">{t}</a></td><td>{d}</td><td>{k}</td></tr>\n"));
    }
    html.push_str("</tbody></table></body></html>\n");
    html
}

#[derive(Default)]
struct Counting {
    rows: Cell<usize>,
    calls: Cell<usize>,
}

impl Notifier for Counting {
    fn notify(&self, _: &[String], _: &str, records: &Dataset, _: &dyn Diagnostics) -> Result<()> {
        self.calls.set(self.calls.get() + 1);
        self.rows.set(self.rows.get() + records.len());
        Ok(())
    }
}

#[test]
fn saved_page_drives_bootstrap_then_update() {
    let dir = tmp_dir("two_runs");
    let html_path = dir.join("page.html");
    let store = CsvSnapshotStore::new(dir.join("trades.csv"), "transaction date");

    let mut settings = Settings::default();
    settings.extract.source = PageSource::File(html_path.clone());
    settings.date_column = "transaction date".into();
    settings.notify.recipients = vec!["a@example.com".into()];

    let notifier = Counting::default();
    let diag = MemoryDiagnostics::new();
    let pipeline = Pipeline {
        settings: &settings,
        extractor: &HtmlTableExtractor,
        store: &store,
        notifier: &notifier,
        diag: &diag,
    };

    fs::write(&html_path, page(&[("AAPL", "01/12/2024", "Sale"), ("MSFT", "01/05/2024", "Purchase")])).unwrap();
    assert!(matches!(pipeline.run(), Ok(RunOutcome::Bootstrapped { rows: 2, .. })));
    assert_eq!(notifier.calls.get(), 0);

    fs::write(
        &html_path,
        page(&[
            ("NVDA", "01/15/2024", "Purchase"),
            ("AAPL", "01/12/2024", "Sale"),
            ("MSFT", "01/05/2024", "Purchase"),
        ]),
    )
    .unwrap();
    assert!(matches!(pipeline.run(), Ok(RunOutcome::Updated { new_rows: 1, .. })));
    assert_eq!(notifier.calls.get(), 1);
    assert_eq!(notifier.rows.get(), 1);

    // Header text is stored as it appeared on the page.
    let saved = store.load().unwrap().unwrap();
    assert_eq!(saved.header(), ["Ticker", "Transaction Date", "Type"]);
    assert_eq!(saved.trades()[0].get("Ticker"), Some("NVDA"));

    assert!(matches!(pipeline.run(), Ok(RunOutcome::NoChange { .. })));
    assert_eq!(notifier.calls.get(), 1);
}

#[test]
fn missing_page_file_is_an_extraction_error() {
    let dir = tmp_dir("missing_page");
    let store = CsvSnapshotStore::new(dir.join("trades.csv"), "Transaction Date");
    let mut settings = Settings::default();
    settings.extract.source = PageSource::File(dir.join("nope.html"));

    let notifier = Counting::default();
    let diag = MemoryDiagnostics::new();
    let result = Pipeline {
        settings: &settings,
        extractor: &HtmlTableExtractor,
        store: &store,
        notifier: &notifier,
        diag: &diag,
    }
    .run();
    assert!(matches!(result, Err(trade_watch::WatchError::Extraction(_))));
    assert!(!store.path().exists());
}
