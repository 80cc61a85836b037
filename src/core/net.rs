// src/core/net.rs

// Blocking HTTPS GET with one fixed timeout. A failed fetch fails the run; no retries.

use std::time::Duration;

use reqwest::blocking::Client;

use crate::config::consts::USER_AGENT;
use crate::error::{Result, WatchError};

pub fn http_get(url: &str, timeout: Duration) -> Result<String> {
    let client = Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| WatchError::Extraction(format!("could not build HTTP client: {e}")))?;

    let resp = client.get(url).send().map_err(|e| {
        if e.is_timeout() {
            WatchError::Extraction(format!("timed out after {timeout:?}: {url}"))
        } else {
            WatchError::Extraction(format!("request failed: {url}: {e}"))
        }
    })?;

    let status = resp.status();
    if !status.is_success() {
        return Err(WatchError::Extraction(format!("HTTP error: {status} {url}")));
    }

    resp.text()
        .map_err(|e| WatchError::Extraction(format!("could not read body of {url}: {e}")))
}
