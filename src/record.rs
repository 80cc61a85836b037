// src/record.rs
//! Typed rows. A `Trade` keeps every source column as text, in header order,
//! and carries its transaction date parsed once up front.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::NaiveDate;

use crate::error::{Result, WatchError};
use crate::extract::RawTable;

/// One row of the feed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Trade {
    columns: Arc<[String]>,
    values: Vec<String>,
    transaction_date: NaiveDate,
}

impl Trade {
    pub fn transaction_date(&self) -> NaiveDate {
        self.transaction_date
    }

    /// Value of `column`, if the header has it.
    pub fn get(&self, column: &str) -> Option<&str> {
        let ix = self.columns.iter().position(|c| c == column)?;
        self.values.get(ix).map(String::as_str)
    }

    /// Values in header order, exactly as extracted.
    pub fn values(&self) -> &[String] {
        &self.values
    }

    /// `(column, value)` pairs in header order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.columns
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().map(String::as_str))
    }
}

/// Ordered trades sharing one header.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Dataset {
    header: Arc<[String]>,
    date_column: String,
    trades: Vec<Trade>,
}

impl Dataset {
    pub fn header(&self) -> &[String] {
        &self.header
    }

    /// Date column name as spelled in the header.
    pub fn date_column(&self) -> &str {
        &self.date_column
    }

    pub fn trades(&self) -> &[Trade] {
        &self.trades
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Trade> {
        self.trades.iter()
    }

    pub fn len(&self) -> usize {
        self.trades.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trades.is_empty()
    }

    /// The watermark: max transaction date. Undefined for an empty dataset.
    pub fn latest_date(&self) -> Result<NaiveDate> {
        self.trades
            .iter()
            .map(Trade::transaction_date)
            .max()
            .ok_or(WatchError::EmptyDataset)
    }

    /// Same header, only the rows matching `keep`, source order preserved.
    pub fn filtered<F>(&self, mut keep: F) -> Dataset
    where
        F: FnMut(&Trade) -> bool,
    {
        Dataset {
            header: Arc::clone(&self.header),
            date_column: self.date_column.clone(),
            trades: self.trades.iter().filter(|t| keep(t)).cloned().collect(),
        }
    }

    /// Same header, no rows.
    pub fn empty_like(&self) -> Dataset {
        self.filtered(|_| false)
    }
}

impl<'a> IntoIterator for &'a Dataset {
    type Item = &'a Trade;
    type IntoIter = std::slice::Iter<'a, Trade>;

    fn into_iter(self) -> Self::IntoIter {
        self.trades.iter()
    }
}

/* ---------------- Parsing ---------------- */

/// Build a dataset from an extracted table.
pub fn from_raw(raw: RawTable, date_column: &str) -> Result<Dataset> {
    parse(raw.rows, raw.header, date_column)
}

/// Convert raw string rows into trades.
///
/// Fails with `Schema` when the header is empty or repeats a name, or when a row's
/// width differs from the header's; with `DateParse` when the date column is absent
/// or a row's date does not parse. The date column is matched case-insensitively.
pub fn parse(rows: Vec<Vec<String>>, header: Vec<String>, date_column: &str) -> Result<Dataset> {
    if header.is_empty() {
        return Err(WatchError::Schema(s!("header row is empty")));
    }
    let mut seen = HashSet::with_capacity(header.len());
    for name in &header {
        if !seen.insert(name.as_str()) {
            return Err(WatchError::Schema(format!("duplicate column {name:?} in header")));
        }
    }

    let wanted = date_column.trim();
    let date_ix = header
        .iter()
        .position(|c| c == wanted)
        .or_else(|| header.iter().position(|c| c.trim().eq_ignore_ascii_case(wanted)))
        .ok_or_else(|| {
            WatchError::DateParse(format!("date column {wanted:?} not found in header {header:?}"))
        })?;
    let date_column = header[date_ix].clone();
    let columns: Arc<[String]> = header.into();

    let mut trades = Vec::with_capacity(rows.len());
    for (i, values) in rows.into_iter().enumerate() {
        let row_no = i + 1;
        if values.len() != columns.len() {
            return Err(WatchError::Schema(format!(
                "row {row_no} has {} fields, header has {}",
                values.len(),
                columns.len()
            )));
        }
        let raw_date = &values[date_ix];
        let transaction_date = parse_date(raw_date).ok_or_else(|| {
            WatchError::DateParse(format!("row {row_no}: {date_column:?} = {raw_date:?} is not a date"))
        })?;
        trades.push(Trade { columns: Arc::clone(&columns), values, transaction_date });
    }

    Ok(Dataset { header: columns, date_column, trades })
}

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%b %d, %Y",
    "%B %d, %Y",
    "%b %d %Y",
    "%d %b %Y",
    "%d %B %Y",
];

/// Calendar date from the formats the source has been seen to use.
/// Any of them may be followed by a time part, e.g. `2024-01-10T09:30:00`
/// or `Jan 10, 2024 09:30`; the time is dropped.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    if let Some(d) = DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
    {
        return Some(d);
    }
    DATE_FORMATS.iter().find_map(|fmt| {
        let (d, rest) = NaiveDate::parse_and_remainder(s, fmt).ok()?;
        rest.starts_with(|c: char| c == 'T' || c.is_whitespace()).then_some(d)
    })
}
