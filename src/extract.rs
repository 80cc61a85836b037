// src/extract.rs
//! # Table extraction
//!
//! Turns the source page into a header row plus data rows of plain text.
//! No business logic lives here: no dates, no comparisons, no persistence.
//!
//! ## Shape the page must have
//! - one `<table>` (the first one wins if there are several);
//! - header cells as `<th>`, in column order;
//! - data rows as `<tr>` blocks holding `<td>` cells. Rows with no `<td>`
//!   (the header row) are skipped.
//!
//! Any other shape is an external breaking change and surfaces as
//! `WatchError::Extraction`. So does an empty table: zero trades is never
//! a valid reading of the page.

use std::fs;

use crate::config::options::{ExtractOptions, PageSource};
use crate::core::html::{cell_text, element_ranges_ci, elements_ci, next_element_ci, to_lower};
use crate::core::net;
use crate::error::{Result, WatchError};
use crate::log::Diagnostics;

/// Raw text of one table.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RawTable {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Anything that can produce the table: HTTP fetch, a pre-rendered file,
/// a headless browser, a canned fixture in tests.
pub trait TableExtractor {
    fn extract(&self, opts: &ExtractOptions, diag: &dyn Diagnostics) -> Result<RawTable>;
}

/// Reads the page from `opts.source` and scans it for the table.
#[derive(Clone, Copy, Debug, Default)]
pub struct HtmlTableExtractor;

impl TableExtractor for HtmlTableExtractor {
    fn extract(&self, opts: &ExtractOptions, diag: &dyn Diagnostics) -> Result<RawTable> {
        let html = match &opts.source {
            PageSource::Url(url) => net::http_get(url, opts.timeout)?,
            PageSource::File(path) => fs::read_to_string(path).map_err(|e| {
                WatchError::Extraction(format!("could not read {}: {e}", path.display()))
            })?,
        };

        if let Some(dump) = opts.page_dump_path() {
            // Inspection aid only; a failed dump must not fail the run.
            if let Some(parent) = dump.parent() {
                let _ = fs::create_dir_all(parent);
            }
            match fs::write(&dump, &html) {
                Ok(()) => diag.debug(&format!("saved fetched page to {}", dump.display())),
                Err(e) => diag.warn(&format!("could not save page to {}: {e}", dump.display())),
            }
        }

        parse_table(&html)
    }
}

/// Split out for offline tests against saved pages.
pub fn parse_table(html: &str) -> Result<RawTable> {
    let lc = to_lower(html);

    let (ts, te) = next_element_ci(html, &lc, "table", 0)
        .ok_or_else(|| WatchError::Extraction(s!("no <table> element on page")))?;
    let table = &html[ts..te];
    let table_lc = &lc[ts..te];

    let header: Vec<String> = elements_ci(table, table_lc, "th")
        .into_iter()
        .map(cell_text)
        .collect();
    if header.is_empty() {
        return Err(WatchError::Extraction(s!("table has no <th> header cells")));
    }

    let mut rows = Vec::new();
    for (rs, re) in element_ranges_ci(table, table_lc, "tr") {
        let tr = &table[rs..re];
        let tds = elements_ci(tr, &table_lc[rs..re], "td");
        if tds.is_empty() {
            continue;
        }
        rows.push(tds.into_iter().map(cell_text).collect());
    }
    if rows.is_empty() {
        return Err(WatchError::Extraction(s!("table has a header but no data rows")));
    }

    Ok(RawTable { header, rows })
}
