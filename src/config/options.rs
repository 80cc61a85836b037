// src/config/options.rs
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use lettre::Address;

use super::consts::*;
use crate::error::{Result, WatchError};

/// Unattended (scheduler/container) vs local run.
/// Only changes how extraction is set up, never what the pipeline decides.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ExecutionMode {
    #[default]
    Headless,
    Interactive,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PageSource {
    Url(String),
    /// HTML already rendered by some other tool.
    File(PathBuf),
}

impl fmt::Display for PageSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageSource::Url(url) => write!(f, "{url}"),
            PageSource::File(path) => write!(f, "{}", path.display()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExtractOptions {
    pub source: PageSource,
    /// Fixed wait for the page; no retries beyond it.
    pub timeout: Duration,
    pub mode: ExecutionMode,
    /// Scratch dir for interactive page dumps.
    pub store_dir: PathBuf,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            source: PageSource::Url(s!(DEFAULT_URL)),
            timeout: Duration::from_secs(FETCH_TIMEOUT_SECS),
            mode: ExecutionMode::Headless,
            store_dir: PathBuf::from(STORE_DIR),
        }
    }
}

impl ExtractOptions {
    /// Interactive runs keep the last fetched page around for inspection.
    pub fn page_dump_path(&self) -> Option<PathBuf> {
        match self.mode {
            ExecutionMode::Interactive => Some(self.store_dir.join(LAST_PAGE_FILE)),
            ExecutionMode::Headless => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
}

impl Default for SmtpSettings {
    fn default() -> Self {
        Self { host: s!(DEFAULT_SMTP_HOST), port: DEFAULT_SMTP_PORT }
    }
}

impl SmtpSettings {
    /// 465 is SMTPS (TLS from the first byte); anything else upgrades via STARTTLS.
    pub fn implicit_tls(&self) -> bool {
        self.port == 465
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NotifyOptions {
    pub recipients: Vec<String>,
    pub subject: String,
    pub smtp: SmtpSettings,
    /// Print the digest instead of sending it. No credentials needed.
    pub dry_run: bool,
}

impl Default for NotifyOptions {
    fn default() -> Self {
        Self {
            recipients: Vec::new(),
            subject: s!(DEFAULT_SUBJECT),
            smtp: SmtpSettings::default(),
            dry_run: false,
        }
    }
}

/// Everything a run needs, resolved once at startup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Settings {
    pub extract: ExtractOptions,
    pub snapshot_path: PathBuf,
    pub date_column: String,
    pub notify: NotifyOptions,
    pub log_file: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            extract: ExtractOptions::default(),
            snapshot_path: PathBuf::from(DEFAULT_SNAPSHOT_FILE),
            date_column: s!(DEFAULT_DATE_COLUMN),
            notify: NotifyOptions::default(),
            log_file: None,
        }
    }
}

impl Settings {
    /// Pre-flight checks. Anything wrong here is a configuration error,
    /// raised before the page is fetched.
    pub fn validate(&self) -> Result<()> {
        if self.date_column.trim().is_empty() {
            return Err(WatchError::Configuration(s!("date column name is empty")));
        }
        if self.extract.timeout.is_zero() {
            return Err(WatchError::Configuration(s!("fetch timeout must be greater than zero")));
        }
        if let PageSource::Url(url) = &self.extract.source {
            if !(url.starts_with("https://") || url.starts_with("http://")) {
                return Err(WatchError::Configuration(format!("not an http(s) URL: {url}")));
            }
        }
        if !self.notify.dry_run && self.notify.recipients.is_empty() {
            return Err(WatchError::Configuration(s!("no recipients configured")));
        }
        for r in &self.notify.recipients {
            parse_address(r)?;
        }
        Ok(())
    }
}

pub fn parse_address(raw: &str) -> Result<Address> {
    raw.trim()
        .parse::<Address>()
        .map_err(|e| WatchError::Configuration(format!("invalid address {raw:?}: {e}")))
}

/* ---------------- Credentials ---------------- */

/// Process environment as a credential source. Unset or non-UTF-8 reads as missing.
pub fn env_lookup(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Sender identity + secret for the notification transport.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub user: String,
    password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    pub fn new(user: impl Into<String>, password: impl Into<String>) -> Self {
        Self { user: user.into(), password: password.into() }
    }

    pub fn from_env() -> Result<Self> {
        Self::from_lookup(env_lookup)
    }

    /// Reads both keys and reports every missing one in a single error.
    /// Blank values count as missing.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let user = get(ENV_EMAIL_USER);
        let password = get(ENV_EMAIL_PASSWORD);

        match (user, password) {
            (Some(user), Some(password)) => Ok(Self { user, password }),
            (user, password) => {
                let mut missing = Vec::new();
                if user.is_none() {
                    missing.push(ENV_EMAIL_USER);
                }
                if password.is_none() {
                    missing.push(ENV_EMAIL_PASSWORD);
                }
                Err(WatchError::Configuration(format!(
                    "missing credential(s): {}",
                    missing.join(", ")
                )))
            }
        }
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}
