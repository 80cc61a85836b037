// src/store.rs
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tempfile::NamedTempFile;

use crate::error::{Result, WatchError};
use crate::record::{self, Dataset};

/// Sole owner of the persisted snapshot.
pub trait SnapshotStore {
    /// `None` if nothing was ever saved.
    fn load(&self) -> Result<Option<Dataset>>;

    /// Replace the whole snapshot. Either fully succeeds or leaves the old one in place.
    fn save(&self, dataset: &Dataset) -> Result<()>;
}

/// Snapshot as a CSV file: header line verbatim, then one trade per line.
#[derive(Clone, Debug)]
pub struct CsvSnapshotStore {
    path: PathBuf,
    date_column: String,
}

/// What `--status` prints.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SnapshotSummary {
    pub rows: usize,
    pub watermark: NaiveDate,
}

impl CsvSnapshotStore {
    pub fn new(path: impl Into<PathBuf>, date_column: impl Into<String>) -> Self {
        Self { path: path.into(), date_column: date_column.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn summary(&self) -> Result<Option<SnapshotSummary>> {
        let Some(ds) = self.load()? else { return Ok(None) };
        Ok(Some(SnapshotSummary { rows: ds.len(), watermark: ds.latest_date()? }))
    }

    fn corrupt(&self, reason: impl Into<String>) -> WatchError {
        WatchError::CorruptSnapshot { path: self.path.clone(), reason: reason.into() }
    }

    /// Write through `write` into a temp file next to the target, fsync, then rename over it.
    /// If `write` fails the temp file is dropped (deleted) and the target is untouched.
    pub(crate) fn replace_with<F>(&self, write: F) -> Result<()>
    where
        F: FnOnce(&mut dyn Write) -> io::Result<()>,
    {
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir)?;

        let mut tmp = NamedTempFile::new_in(&dir)?;
        {
            let mut out = BufWriter::new(tmp.as_file_mut());
            write(&mut out)?;
            out.flush()?;
        }
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| WatchError::Io(e.error))?;

        sync_dir(&dir);
        Ok(())
    }
}

// Make the rename itself durable.
#[cfg(unix)]
fn sync_dir(dir: &Path) {
    if let Ok(d) = File::open(dir) {
        let _ = d.sync_all();
    }
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) {}

impl SnapshotStore for CsvSnapshotStore {
    fn load(&self) -> Result<Option<Dataset>> {
        let file = match File::open(&self.path) {
            Ok(f) => f,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let mut rdr = csv::ReaderBuilder::new().has_headers(true).from_reader(file);
        let header: Vec<String> = rdr
            .headers()
            .map_err(|e| self.corrupt(e.to_string()))?
            .iter()
            .map(String::from)
            .collect();

        let mut rows = Vec::new();
        for rec in rdr.records() {
            let rec = rec.map_err(|e| self.corrupt(e.to_string()))?;
            rows.push(rec.iter().map(String::from).collect());
        }
        if rows.is_empty() {
            return Err(self.corrupt("snapshot has no rows"));
        }

        record::parse(rows, header, &self.date_column)
            .map(Some)
            .map_err(|e| self.corrupt(e.to_string()))
    }

    fn save(&self, dataset: &Dataset) -> Result<()> {
        self.replace_with(|out| write_dataset(out, dataset))
    }
}

pub fn write_dataset<W: Write>(out: W, dataset: &Dataset) -> io::Result<()> {
    let mut wtr = csv::Writer::from_writer(out);
    wtr.write_record(dataset.header()).map_err(io::Error::from)?;
    for trade in dataset {
        wtr.write_record(trade.values()).map_err(io::Error::from)?;
    }
    wtr.flush()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tmp_dir(name: &str) -> PathBuf {
        let mut p = std::env::temp_dir();
        p.push(format!("trade_watch_store_{}_{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&p);
        fs::create_dir_all(&p).unwrap();
        p
    }

    fn ds(rows: &[(&str, &str)]) -> Dataset {
        let header = vec![s!("Ticker"), s!("Transaction Date")];
        let rows = rows.iter().map(|(t, d)| vec![s!(*t), s!(*d)]).collect();
        record::parse(rows, header, "Transaction Date").unwrap()
    }

    #[test]
    fn failure_mid_save_keeps_previous_snapshot() {
        let dir = tmp_dir("mid_save");
        let store = CsvSnapshotStore::new(dir.join("trades.csv"), "Transaction Date");
        let before = ds(&[("A", "2024-01-10"), ("B", "2024-01-09")]);
        store.save(&before).unwrap();

        let res = store.replace_with(|out| {
            out.write_all(b"Ticker,Transaction Date\nN,2024-")?;
            Err(io::Error::other("disk full"))
        });
        assert!(res.is_err());

        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded, before);

        // No temp files left behind.
        let leftovers = fs::read_dir(&dir).unwrap().count();
        assert_eq!(leftovers, 1);
    }
}
