// src/error.rs
//! Error taxonomy for a single watch run.
//!
//! Everything up to and including `CorruptSnapshot` aborts the run before the
//! snapshot is touched. `Delivery` is the only error that can happen after a
//! successful write, and the runner reports it as its own outcome.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum WatchError {
    /// Missing credentials, bad recipients, unusable options. Raised before extraction.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Page unreachable, timed out, or without the expected table.
    #[error("extraction failed: {0}")]
    Extraction(String),

    #[error("schema error: {0}")]
    Schema(String),

    #[error("date parse error: {0}")]
    DateParse(String),

    /// `latest_date` asked of a dataset with no rows.
    #[error("dataset is empty")]
    EmptyDataset,

    #[error("corrupt snapshot {}: {reason}", path.display())]
    CorruptSnapshot { path: PathBuf, reason: String },

    #[error("notification delivery failed: {0}")]
    Delivery(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl WatchError {
    pub fn is_configuration(&self) -> bool {
        matches!(self, WatchError::Configuration(_))
    }
}

pub type Result<T> = std::result::Result<T, WatchError>;
