// src/runner.rs
//! One watch run: extract → parse → detect → (persist + notify) | no-op.
//!
//! Stages run in order on the calling thread. The snapshot is saved before the
//! notifier is called, so a crash or delivery failure between the two still
//! leaves the watermark advanced. Nothing is written unless detection says so.

use std::fmt;

use chrono::NaiveDate;

use crate::config::options::Settings;
use crate::detect::detect;
use crate::error::{Result, WatchError};
use crate::extract::TableExtractor;
use crate::log::Diagnostics;
use crate::notify::Notifier;
use crate::record;
use crate::store::SnapshotStore;

pub const EXIT_OK: u8 = 0;
pub const EXIT_ABORTED: u8 = 1;
pub const EXIT_CONFIG: u8 = 2;
pub const EXIT_NOTIFY_FAILED: u8 = 3;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    Idle,
    Extracting,
    Parsing,
    Detecting,
    Persisting,
    Notifying,
    NoOp,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Idle => "idle",
            Stage::Extracting => "extracting",
            Stage::Parsing => "parsing",
            Stage::Detecting => "detecting",
            Stage::Persisting => "persisting",
            Stage::Notifying => "notifying",
            Stage::NoOp => "no-op",
        };
        f.write_str(name)
    }
}

/// How a run that did not abort ended.
#[derive(Debug)]
pub enum RunOutcome {
    /// First run: snapshot created, nobody notified.
    Bootstrapped { rows: usize, watermark: NaiveDate },
    Updated { new_rows: usize, watermark: NaiveDate },
    /// Snapshot saved, but the alert was lost.
    NotifyFailed { new_rows: usize, watermark: NaiveDate, error: WatchError },
    NoChange { watermark: NaiveDate },
}

impl RunOutcome {
    pub fn exit_code(&self) -> u8 {
        match self {
            RunOutcome::NotifyFailed { .. } => EXIT_NOTIFY_FAILED,
            _ => EXIT_OK,
        }
    }
}

/// Process exit code for a finished run, aborted or not.
pub fn exit_code(result: &Result<RunOutcome>) -> u8 {
    match result {
        Ok(outcome) => outcome.exit_code(),
        Err(e) if e.is_configuration() => EXIT_CONFIG,
        Err(_) => EXIT_ABORTED,
    }
}

/// The collaborators of one run. All borrowed, so tests can hand in fakes.
pub struct Pipeline<'a> {
    pub settings: &'a Settings,
    pub extractor: &'a dyn TableExtractor,
    pub store: &'a dyn SnapshotStore,
    pub notifier: &'a dyn Notifier,
    pub diag: &'a dyn Diagnostics,
}

impl Pipeline<'_> {
    pub fn run(&self) -> Result<RunOutcome> {
        let mut stage = Stage::Idle;
        let result = self.run_stages(&mut stage);
        if let Err(e) = &result {
            self.diag.error(&format!("run aborted while {stage}: {e}"));
        }
        result
    }

    fn enter(&self, stage: &mut Stage, next: Stage) {
        self.diag.debug(&format!("stage {stage} -> {next}"));
        *stage = next;
    }

    fn run_stages(&self, stage: &mut Stage) -> Result<RunOutcome> {
        let settings = self.settings;

        self.enter(stage, Stage::Extracting);
        let raw = self.extractor.extract(&settings.extract, self.diag)?;
        self.diag.info(&format!(
            "extracted {} rows x {} columns from {}",
            raw.rows.len(),
            raw.header.len(),
            settings.extract.source
        ));

        self.enter(stage, Stage::Parsing);
        let current = record::from_raw(raw, &settings.date_column)?;
        if current.is_empty() {
            return Err(WatchError::Extraction(s!("page table had no trades")));
        }

        self.enter(stage, Stage::Detecting);
        let previous = self.store.load()?;
        let detection = detect(&current, previous.as_ref())?;
        let watermark = current.latest_date()?;

        if !detection.is_update {
            self.enter(stage, Stage::NoOp);
            self.diag.info(&format!(
                "no new trades (latest {watermark}, {} rows fetched)",
                current.len()
            ));
            self.enter(stage, Stage::Idle);
            return Ok(RunOutcome::NoChange { watermark });
        }

        self.enter(stage, Stage::Persisting);
        self.store.save(&current)?;

        if detection.bootstrap {
            self.diag.info(&format!(
                "initial snapshot saved: {} rows, latest {watermark}",
                current.len()
            ));
            self.enter(stage, Stage::Idle);
            return Ok(RunOutcome::Bootstrapped { rows: current.len(), watermark });
        }

        let new_rows = detection.new_records.len();
        self.diag.info(&format!("{new_rows} new trade(s), snapshot advanced to {watermark}"));

        self.enter(stage, Stage::Notifying);
        let notify = &settings.notify;
        let sent = self
            .notifier
            .notify(&notify.recipients, &notify.subject, &detection.new_records, self.diag);
        self.enter(stage, Stage::Idle);

        match sent {
            Ok(()) => {
                self.diag.info(&format!("notified {} recipient(s)", notify.recipients.len()));
                Ok(RunOutcome::Updated { new_rows, watermark })
            }
            Err(error) => {
                self.diag.error(&format!("snapshot saved but notification failed: {error}"));
                Ok(RunOutcome::NotifyFailed { new_rows, watermark, error })
            }
        }
    }
}
