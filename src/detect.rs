// src/detect.rs
//! Watermark-based change detection.
//!
//! Freshness is decided by the maximum transaction date alone. Row counts and
//! row contents are ignored: the source may reorder or reformat old rows on any
//! fetch, and only the date watermark is treated as monotonic.
//!
//! Equal watermarks are "no change" even if older rows were edited. Corrections
//! to existing rows are therefore never announced and only land in the snapshot
//! on the next run that also brings a newer date.

use chrono::NaiveDate;

use crate::error::Result;
use crate::record::Dataset;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DetectionResult {
    /// The snapshot should be replaced with the current dataset.
    pub is_update: bool,
    /// No snapshot existed. `new_records` is the initial data, not news.
    pub bootstrap: bool,
    pub new_records: Dataset,
}

/// Compare the fresh extraction against the persisted snapshot.
///
/// Errors only if a non-bootstrap comparison meets an empty dataset.
pub fn detect(current: &Dataset, previous: Option<&Dataset>) -> Result<DetectionResult> {
    let Some(previous) = previous else {
        return Ok(DetectionResult {
            is_update: true,
            bootstrap: true,
            new_records: current.clone(),
        });
    };

    let latest_old = previous.latest_date()?;
    let latest_new = current.latest_date()?;

    if latest_new > latest_old {
        Ok(DetectionResult {
            is_update: true,
            bootstrap: false,
            new_records: filter_newer(current, latest_old),
        })
    } else {
        Ok(DetectionResult {
            is_update: false,
            bootstrap: false,
            new_records: current.empty_like(),
        })
    }
}

/// Rows strictly newer than `watermark`, in source order.
pub fn filter_newer(dataset: &Dataset, watermark: NaiveDate) -> Dataset {
    dataset.filtered(|t| t.transaction_date() > watermark)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::parse;

    fn ds(rows: &[(&str, &str)]) -> Dataset {
        let header = vec![s!("Ticker"), s!("Transaction Date")];
        let rows = rows.iter().map(|(t, d)| vec![s!(*t), s!(*d)]).collect();
        parse(rows, header, "Transaction Date").unwrap()
    }

    fn tickers(d: &Dataset) -> Vec<&str> {
        d.iter().filter_map(|t| t.get("Ticker")).collect()
    }

    #[test]
    fn bootstrap_returns_everything() {
        let current = ds(&[("A", "2024-01-01"), ("B", "2024-01-02"), ("C", "2024-01-03"),
                           ("D", "2024-01-04"), ("E", "2024-01-05")]);
        let r = detect(&current, None).unwrap();
        assert!(r.is_update);
        assert!(r.bootstrap);
        assert_eq!(r.new_records.len(), 5);
    }

    #[test]
    fn update_returns_only_newer_rows_in_order() {
        let previous = ds(&[("A", "2024-01-08"), ("B", "2024-01-10"), ("C", "2024-01-05")]);
        let current = ds(&[
            ("N2", "2024-01-15"),
            ("A", "2024-01-08"),
            ("N1", "2024-01-12"),
            ("B", "2024-01-10"),
            ("C", "2024-01-05"),
        ]);
        let r = detect(&current, Some(&previous)).unwrap();
        assert!(r.is_update);
        assert!(!r.bootstrap);
        assert_eq!(tickers(&r.new_records), vec!["N2", "N1"]);
    }

    #[test]
    fn equal_watermark_is_no_change_even_with_more_rows() {
        let previous = ds(&[("A", "2024-01-10")]);
        let current = ds(&[("A", "2024-01-10"), ("B", "2024-01-09"), ("C", "2024-01-10")]);
        let r = detect(&current, Some(&previous)).unwrap();
        assert!(!r.is_update);
        assert!(r.new_records.is_empty());
        assert_eq!(r.new_records.header(), current.header());
    }

    #[test]
    fn same_dataset_twice_is_no_change() {
        let d = ds(&[("A", "2024-01-10"), ("B", "2024-01-09")]);
        let r = detect(&d, Some(&d)).unwrap();
        assert!(!r.is_update);
        assert!(r.new_records.is_empty());
    }

    #[test]
    fn regressed_dates_are_no_change() {
        let previous = ds(&[("A", "2024-02-01")]);
        let current = ds(&[("A", "2024-01-01")]);
        let r = detect(&current, Some(&previous)).unwrap();
        assert!(!r.is_update);
        assert!(r.new_records.is_empty());
    }

    #[test]
    fn empty_snapshot_cannot_be_compared() {
        let previous = ds(&[]);
        let current = ds(&[("A", "2024-01-01")]);
        assert!(detect(&current, Some(&previous)).is_err());
    }

    #[test]
    fn filter_newer_returns_exactly_the_later_rows_for_any_watermark() {
        let fixture = ds(&[
            ("A", "2024-01-12"),
            ("B", "2024-01-03"),
            ("C", "2024-01-12"),
            ("D", "2024-01-07"),
            ("E", "2024-01-01"),
            ("F", "2024-01-08"),
        ]);

        let mut watermarks: Vec<NaiveDate> = Vec::new();
        for t in &fixture {
            let d = t.transaction_date();
            watermarks.extend([d.pred_opt().unwrap(), d, d.succ_opt().unwrap()]);
        }

        for w in watermarks {
            let expected: Vec<&str> = fixture
                .iter()
                .filter(|t| t.transaction_date() > w)
                .filter_map(|t| t.get("Ticker"))
                .collect();
            let got = filter_newer(&fixture, w);
            assert_eq!(tickers(&got), expected, "watermark {w}");
            assert_eq!(got.header(), fixture.header());
        }

        let before_all = NaiveDate::from_ymd_opt(2023, 12, 31).unwrap();
        assert_eq!(filter_newer(&fixture, before_all).len(), fixture.len());
        let after_all = NaiveDate::from_ymd_opt(2024, 1, 12).unwrap();
        assert!(filter_newer(&fixture, after_all).is_empty());
        let mid = NaiveDate::from_ymd_opt(2024, 1, 7).unwrap();
        assert_eq!(tickers(&filter_newer(&fixture, mid)), vec!["A", "C", "F"]);
    }
}
