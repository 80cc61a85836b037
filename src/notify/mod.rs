// src/notify/mod.rs
//! Delivering the digest of new trades.
//!
//! One call sends one message addressed to every recipient jointly.
//! Failures come back as `WatchError::Delivery` and are never swallowed:
//! a lost alert must not look like "nothing new". Calls are not idempotent.

pub mod digest;
pub mod smtp;

use std::io::{self, Write};

use chrono::Local;

use crate::error::{Result, WatchError};
use crate::log::Diagnostics;
use crate::record::Dataset;

pub use digest::Digest;
pub use smtp::SmtpNotifier;

pub trait Notifier {
    fn notify(
        &self,
        recipients: &[String],
        subject: &str,
        records: &Dataset,
        diag: &dyn Diagnostics,
    ) -> Result<()>;
}

/// Dry run: prints what would have been sent.
#[derive(Clone, Copy, Debug, Default)]
pub struct StdoutNotifier;

impl Notifier for StdoutNotifier {
    fn notify(
        &self,
        recipients: &[String],
        subject: &str,
        records: &Dataset,
        diag: &dyn Diagnostics,
    ) -> Result<()> {
        diag.info(&format!(
            "dry run: printing digest of {} trade(s) instead of sending",
            records.len()
        ));
        let digest = Digest::build(records, Local::now().date_naive());
        let mut out = io::stdout().lock();
        write_preview(&mut out, recipients, subject, &digest)
            .map_err(|e| WatchError::Delivery(format!("could not write to stdout: {e}")))
    }
}

fn write_preview<W: Write>(
    mut out: W,
    recipients: &[String],
    subject: &str,
    digest: &Digest,
) -> io::Result<()> {
    writeln!(out, "To: {}", recipients.join(", "))?;
    writeln!(out, "Subject: {subject}")?;
    writeln!(out)?;
    write!(out, "{}", digest.plain)?;
    out.flush()
}
