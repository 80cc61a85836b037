// src/lib.rs

#[macro_use]
pub mod macros;

#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod log;

pub mod detect;
pub mod extract;
pub mod notify;
pub mod record;
pub mod runner;
pub mod store;

pub use error::{Result, WatchError};
