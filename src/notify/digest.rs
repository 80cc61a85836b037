// src/notify/digest.rs
use chrono::NaiveDate;

use crate::config::consts::UPDATE_DATE_COLUMN;
use crate::core::sanitize::escape_html;
use crate::record::Dataset;

/// Message bodies for one batch of new trades.
/// Both carry an extra `Update Date` column so readers can tell batches apart.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Digest {
    pub plain: String,
    pub html: String,
}

impl Digest {
    pub fn build(records: &Dataset, update_date: NaiveDate) -> Digest {
        let stamp = update_date.format("%Y-%m-%d").to_string();

        let mut header: Vec<&str> = records.header().iter().map(String::as_str).collect();
        header.push(UPDATE_DATE_COLUMN);
        let rows: Vec<Vec<&str>> = records
            .iter()
            .map(|t| {
                let mut r: Vec<&str> = t.values().iter().map(String::as_str).collect();
                r.push(&stamp);
                r
            })
            .collect();

        let intro = match records.len() {
            1 => s!("Please find below the latest trade:"),
            n => format!("Please find below the latest {n} trades:"),
        };

        Digest {
            plain: plain_body(&intro, &header, &rows),
            html: html_body(&intro, &header, &rows),
        }
    }
}

fn plain_body(intro: &str, header: &[&str], rows: &[Vec<&str>]) -> String {
    let mut widths: Vec<usize> = header.iter().map(|h| h.chars().count()).collect();
    for r in rows {
        for (w, cell) in widths.iter_mut().zip(r) {
            *w = (*w).max(cell.chars().count());
        }
    }

    let line = |cells: &[&str]| -> String {
        let padded: Vec<String> = cells
            .iter()
            .zip(&widths)
            .map(|(c, &w)| format!("{c:<w$}"))
            .collect();
        join!(padded.join(" | ").trim_end(), "\n")
    };

    let mut out = join!("Hi,\n\n", intro, "\n\n");
    out.push_str(&line(header));
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    out.push_str(&join!(rule.join("-+-"), "\n"));
    for r in rows {
        out.push_str(&line(r.as_slice()));
    }
    out.push_str("\nGood luck!\n");
    out
}

fn html_body(intro: &str, header: &[&str], rows: &[Vec<&str>]) -> String {
    let mut out = s!("<html>\n<body>\n<p>Hi,</p>\n");
    out.push_str(&format!("<p>{}</p>\n", escape_html(intro)));
    out.push_str("<table border=\"1\" cellpadding=\"4\" style=\"border-collapse: collapse\">\n<thead><tr>");
    for h in header {
        out.push_str(&format!("<th>{}</th>", escape_html(h)));
    }
    out.push_str("</tr></thead>\n<tbody>\n");
    for r in rows {
        out.push_str("<tr>");
        for cell in r {
            out.push_str(&format!("<td>{}</td>", escape_html(cell)));
        }
        out.push_str("</tr>\n");
    }
    out.push_str("</tbody>\n</table>\n<p>Good luck!</p>\n</body>\n</html>\n");
    out
}
