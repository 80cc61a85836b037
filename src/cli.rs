// src/cli.rs
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use color_eyre::eyre::WrapErr;

use crate::config::consts::*;
use crate::config::options::{
    env_lookup, Credentials, ExecutionMode, ExtractOptions, NotifyOptions, PageSource, Settings,
    SmtpSettings,
};
use crate::error::WatchError;
use crate::extract::HtmlTableExtractor;
use crate::log::{self, Diagnostics, TracingDiagnostics};
use crate::notify::{Notifier, SmtpNotifier, StdoutNotifier};
use crate::runner::{self, Pipeline, RunOutcome, EXIT_CONFIG};
use crate::store::CsvSnapshotStore;

/// Check a trade-disclosure table for new rows, save them, and email the new ones.
///
/// Credentials come from EMAIL_USER / EMAIL_PASSWORD (a .env file is read first).
/// Exit codes: 0 ok, 1 aborted, 2 configuration error, 3 saved but notification failed.
#[derive(Parser, Debug)]
#[command(name = "trade_watch", version, about, long_about = None)]
pub struct Args {
    /// Page holding the trade table
    #[arg(long, env = "TRADE_WATCH_URL", default_value = DEFAULT_URL)]
    pub url: String,

    /// Read an already-rendered HTML page instead of fetching --url
    #[arg(long, env = "TRADE_WATCH_FROM_FILE")]
    pub from_file: Option<PathBuf>,

    /// Snapshot CSV (created on the first run)
    #[arg(long, env = "TRADE_WATCH_SNAPSHOT", default_value = DEFAULT_SNAPSHOT_FILE)]
    pub snapshot: PathBuf,

    /// Column holding each trade's transaction date
    #[arg(long, env = "TRADE_WATCH_DATE_COLUMN", default_value = DEFAULT_DATE_COLUMN)]
    pub date_column: String,

    /// Seconds to wait for the page before giving up
    #[arg(long, env = "TRADE_WATCH_TIMEOUT", default_value_t = FETCH_TIMEOUT_SECS)]
    pub timeout: u64,

    /// Local run: also keep the fetched page under .store/ for inspection
    #[arg(long, env = "TRADE_WATCH_INTERACTIVE")]
    pub interactive: bool,

    /// Recipient address (repeat, or comma-separate)
    #[arg(long = "to", env = "TRADE_WATCH_RECIPIENTS", value_delimiter = ',')]
    pub recipients: Vec<String>,

    #[arg(long, env = "TRADE_WATCH_SUBJECT", default_value = DEFAULT_SUBJECT)]
    pub subject: String,

    #[arg(long, env = "TRADE_WATCH_SMTP_HOST", default_value = DEFAULT_SMTP_HOST)]
    pub smtp_host: String,

    /// 465 = implicit TLS, anything else = STARTTLS
    #[arg(long, env = "TRADE_WATCH_SMTP_PORT", default_value_t = DEFAULT_SMTP_PORT)]
    pub smtp_port: u16,

    /// Print the digest instead of emailing it (no credentials needed).
    /// The snapshot is still saved, so trades shown here are not emailed by a later run.
    #[arg(long)]
    pub dry_run: bool,

    /// Show the stored snapshot's size and latest date, then exit
    #[arg(long)]
    pub status: bool,

    /// Also append log lines to this file
    #[arg(long, env = "TRADE_WATCH_LOG_FILE")]
    pub log_file: Option<PathBuf>,

    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    pub fn settings(&self) -> Settings {
        let source = match &self.from_file {
            Some(path) => PageSource::File(path.clone()),
            None => PageSource::Url(self.url.clone()),
        };
        let mode = if self.interactive {
            ExecutionMode::Interactive
        } else {
            ExecutionMode::Headless
        };

        Settings {
            extract: ExtractOptions {
                source,
                timeout: Duration::from_secs(self.timeout),
                mode,
                store_dir: PathBuf::from(STORE_DIR),
            },
            snapshot_path: self.snapshot.clone(),
            date_column: self.date_column.clone(),
            notify: NotifyOptions {
                recipients: self
                    .recipients
                    .iter()
                    .map(|r| r.trim().to_string())
                    .filter(|r| !r.is_empty())
                    .collect(),
                subject: self.subject.clone(),
                smtp: SmtpSettings { host: self.smtp_host.clone(), port: self.smtp_port },
                dry_run: self.dry_run,
            },
            log_file: self.log_file.clone(),
        }
    }
}

/// Entry point for the binary.
pub fn main() -> ExitCode {
    if let Err(e) = color_eyre::install() {
        eprintln!("Warning: could not install error reporter: {e}");
    }
    // .env must be loaded before clap reads env-backed options.
    if let Some(warning) = dotenv_warning(dotenvy::dotenv()) {
        eprintln!("Warning: {warning}");
    }

    let args = Args::parse();
    match run(args) {
        Ok(code) => code,
        Err(report) => {
            eprintln!("Error: {report:?}");
            ExitCode::from(runner::EXIT_ABORTED)
        }
    }
}

/// A missing .env is normal; an unreadable or malformed one is worth a warning.
fn dotenv_warning<T>(loaded: std::result::Result<T, dotenvy::Error>) -> Option<String> {
    match loaded {
        Ok(_) => None,
        Err(dotenvy::Error::Io(e)) if e.kind() == io::ErrorKind::NotFound => None,
        Err(e) => Some(format!("could not load .env: {e}")),
    }
}

pub fn run(args: Args) -> color_eyre::Result<ExitCode> {
    let code = execute(&args, env_lookup)?;
    Ok(ExitCode::from(code))
}

/// One invocation, with credentials read through `lookup`. Returns the exit code.
pub fn execute<F>(args: &Args, lookup: F) -> color_eyre::Result<u8>
where
    F: Fn(&str) -> Option<String>,
{
    let settings = args.settings();
    if let Err(e) = log::init(args.verbose, settings.log_file.as_deref()) {
        let path = settings.log_file.as_deref().unwrap_or(Path::new("")).display();
        eprintln!("Error: could not open log file {path}: {e}");
        return Ok(EXIT_CONFIG);
    }

    if args.status {
        return status(&settings);
    }

    let diag = TracingDiagnostics;

    // Pre-flight: every configuration problem surfaces before the page is touched.
    let notifier = match preflight(&settings, lookup) {
        Ok(n) => n,
        Err(e) => {
            diag.error(&e.to_string());
            return Ok(EXIT_CONFIG);
        }
    };

    let store = CsvSnapshotStore::new(&settings.snapshot_path, &settings.date_column);
    let pipeline = Pipeline {
        settings: &settings,
        extractor: &HtmlTableExtractor,
        store: &store,
        notifier: notifier.as_ref(),
        diag: &diag,
    };

    let result = pipeline.run();
    print_outcome(&result, &settings);
    Ok(runner::exit_code(&result))
}

fn preflight<F>(settings: &Settings, lookup: F) -> Result<Box<dyn Notifier>, WatchError>
where
    F: Fn(&str) -> Option<String>,
{
    settings.validate()?;
    if settings.notify.dry_run {
        return Ok(Box::new(StdoutNotifier));
    }
    let credentials = Credentials::from_lookup(lookup)?;
    Ok(Box::new(SmtpNotifier::new(settings.notify.smtp.clone(), credentials)?))
}

fn status(settings: &Settings) -> color_eyre::Result<u8> {
    let store = CsvSnapshotStore::new(&settings.snapshot_path, &settings.date_column);
    let summary = store
        .summary()
        .wrap_err_with(|| format!("could not read snapshot {}", store.path().display()))?;
    match summary {
        Some(s) => {
            println!("snapshot: {}", store.path().display());
            println!("rows:     {}", s.rows);
            println!("latest:   {}", s.watermark);
        }
        None => println!("no snapshot at {} yet", store.path().display()),
    }
    Ok(runner::EXIT_OK)
}

fn print_outcome(result: &Result<RunOutcome, WatchError>, settings: &Settings) {
    let path = settings.snapshot_path.display();
    match result {
        Ok(RunOutcome::Bootstrapped { rows, watermark }) => {
            println!("Initial data saved: {rows} trades (latest {watermark}) -> {path}");
        }
        Ok(RunOutcome::Updated { new_rows, watermark }) => {
            println!("{new_rows} new trade(s) up to {watermark}; saved {path}, notification sent");
        }
        Ok(RunOutcome::NotifyFailed { new_rows, watermark, error }) => {
            eprintln!("{new_rows} new trade(s) up to {watermark} saved to {path}, but notification failed: {error}");
        }
        Ok(RunOutcome::NoChange { watermark }) => {
            println!("No changes (latest {watermark})");
        }
        Err(e) => eprintln!("Error: {e}"),
    }
}
