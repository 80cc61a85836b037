// src/log.rs
use std::fmt;
use std::fs::{self, OpenOptions};
use std::io;
use std::path::Path;
use std::sync::{Mutex, OnceLock};
use std::time::Instant;

use tracing::Level;
use tracing_subscriber::fmt::{format::Writer, time::FormatTime};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

static START: OnceLock<Instant> = OnceLock::new();

fn start() -> Instant {
    *START.get_or_init(Instant::now)
}

fn fmt_elapsed(ms: u128) -> String {
    let total_ms = ms as u64;
    let h = total_ms / 3_600_000;
    let m = (total_ms % 3_600_000) / 60_000;
    let s = (total_ms % 60_000) / 1_000;
    let ms = total_ms % 1_000;
    format!("{h:02}:{m:02}:{s:02}.{ms:03}")
}

/// Stamps each event with time since process start: `[hh:mm:ss.mmm]`.
#[derive(Clone, Copy, Default)]
pub struct ElapsedTimer;

impl FormatTime for ElapsedTimer {
    fn format_time(&self, w: &mut Writer<'_>) -> fmt::Result {
        write!(w, "[{}]", fmt_elapsed(start().elapsed().as_millis()))
    }
}

/// Install the global subscriber: stderr always, plus an append-only file when asked.
/// `RUST_LOG` wins over `verbose` when set.
pub fn init(verbose: bool, log_file: Option<&Path>) -> io::Result<()> {
    start();

    let default_level = if verbose { "trade_watch=debug" } else { "trade_watch=info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stderr)
        .with_timer(ElapsedTimer)
        .with_target(false);

    let file_layer = match log_file {
        Some(path) => {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    fs::create_dir_all(parent)?;
                }
            }
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_writer(Mutex::new(file))
                    .with_timer(ElapsedTimer)
                    .with_ansi(false),
            )
        }
        None => None,
    };

    // A second init (tests, embedding) keeps the first subscriber.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init();
    Ok(())
}

/* ---------------- Injected diagnostics sink ---------------- */

/// Where pipeline stages report what they did.
/// Passed explicitly so each stage can be tested with its own sink.
pub trait Diagnostics {
    fn debug(&self, msg: &str);
    fn info(&self, msg: &str);
    fn warn(&self, msg: &str);
    fn error(&self, msg: &str);
}

/// Production sink: forwards to `tracing`.
#[derive(Clone, Copy, Default)]
pub struct TracingDiagnostics;

impl Diagnostics for TracingDiagnostics {
    fn debug(&self, msg: &str) {
        tracing::debug!("{msg}");
    }
    fn info(&self, msg: &str) {
        tracing::info!("{msg}");
    }
    fn warn(&self, msg: &str) {
        tracing::warn!("{msg}");
    }
    fn error(&self, msg: &str) {
        tracing::error!("{msg}");
    }
}

/// Keeps every line in memory. Used by tests to assert on what a run reported.
#[derive(Default)]
pub struct MemoryDiagnostics {
    lines: Mutex<Vec<(Level, String)>>,
}

impl MemoryDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, level: Level, msg: &str) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.push((level, s!(msg)));
        }
    }

    pub fn lines(&self) -> Vec<(Level, String)> {
        self.lines.lock().map(|l| l.clone()).unwrap_or_default()
    }

    /// True if any line at `level` contains `needle`.
    pub fn contains(&self, level: Level, needle: &str) -> bool {
        self.lines()
            .iter()
            .any(|(l, msg)| *l == level && msg.contains(needle))
    }
}

impl Diagnostics for MemoryDiagnostics {
    fn debug(&self, msg: &str) {
        self.push(Level::DEBUG, msg);
    }
    fn info(&self, msg: &str) {
        self.push(Level::INFO, msg);
    }
    fn warn(&self, msg: &str) {
        self.push(Level::WARN, msg);
    }
    fn error(&self, msg: &str) {
        self.push(Level::ERROR, msg);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn elapsed_format_is_zero_padded() {
        assert_eq!(fmt_elapsed(0), "00:00:00.000");
        assert_eq!(fmt_elapsed(3_723_004), "01:02:03.004");
    }

    #[test]
    fn memory_sink_records_levels() {
        let diag = MemoryDiagnostics::new();
        diag.info("fetched 12 rows");
        diag.warn("no change");
        assert!(diag.contains(Level::INFO, "12 rows"));
        assert!(diag.contains(Level::WARN, "no change"));
        assert!(!diag.contains(Level::ERROR, "no change"));
    }
}
