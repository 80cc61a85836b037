// src/core/html.rs
// Low-level HTML scanning. Enough for one well-formed table, nothing more.
// Tag matching is ASCII case-insensitive. Callers pass a lowercased copy (`lc`)
// alongside the original so each document is lowercased once, not per lookup.

use super::sanitize::{normalize_entities, normalize_ws};

/// ASCII-only lowercasing. Byte offsets in the result match the input.
pub fn to_lower(s: &str) -> String {
    s.to_ascii_lowercase()
}

/// True if `<name` at `at` in `lc` is really that tag (so `<th` does not match `<thead`).
fn tag_boundary(lc: &str, after_name: usize) -> bool {
    match lc.as_bytes().get(after_name) {
        Some(b) => b.is_ascii_whitespace() || *b == b'>' || *b == b'/',
        None => false,
    }
}

fn find_tag(lc: &str, pat: &str, from: usize) -> Option<usize> {
    let mut pos = from;
    loop {
        let at = lc.get(pos..)?.find(pat)? + pos;
        if tag_boundary(lc, at + pat.len()) {
            return Some(at);
        }
        pos = at + pat.len();
    }
}

/// Next complete `<tag …>…</tag>` block starting at or after `from`.
/// Returns byte range `(start, end)` covering both tags. `tag` is a bare name: `"td"`.
pub fn next_element_ci(s: &str, lc: &str, tag: &str, from: usize) -> Option<(usize, usize)> {
    let open_pat = join!("<", tag);
    let close_pat = join!("</", tag);

    let start = find_tag(lc, &open_pat, from)?;
    let open_end = s[start..].find('>')? + start + 1;
    let close = find_tag(lc, &close_pat, open_end)?;
    let end = s[close..].find('>')? + close + 1;
    Some((start, end))
}

/// Byte ranges of every `tag` block inside `s`, in document order.
pub fn element_ranges_ci(s: &str, lc: &str, tag: &str) -> Vec<(usize, usize)> {
    let mut out = Vec::new();
    let mut pos = 0usize;
    while let Some((a, b)) = next_element_ci(s, lc, tag, pos) {
        out.push((a, b));
        pos = b;
    }
    out
}

pub fn elements_ci<'a>(s: &'a str, lc: &str, tag: &str) -> Vec<&'a str> {
    element_ranges_ci(s, lc, tag)
        .into_iter()
        .map(|(a, b)| &s[a..b])
        .collect()
}

/// Given `<td …>INNER</td>`, return INNER (may still contain nested tags).
pub fn inner_after_open_tag(block: &str) -> &str {
    if let Some(open_end) = block.find('>') {
        if let Some(close_start) = block.rfind('<') {
            if close_start > open_end {
                return &block[open_end + 1..close_start];
            }
        }
    }
    ""
}

/// Drop every `<…>` tag. `<br>` becomes a space so wrapped lines don't fuse.
pub fn strip_tags(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_tag = false;
    let mut name_done = false;
    let mut name = String::new();
    for ch in s.chars() {
        match ch {
            '<' => {
                in_tag = true;
                name_done = false;
                name.clear();
            }
            '>' if in_tag => {
                in_tag = false;
                if name.eq_ignore_ascii_case("br") {
                    out.push(' ');
                }
            }
            c if in_tag => {
                if name_done {
                    continue;
                }
                if c.is_whitespace() || (c == '/' && !name.is_empty()) {
                    name_done = true;
                } else if name.len() < 8 {
                    name.push(c);
                }
            }
            c => out.push(c),
        }
    }
    out
}

/// Visible text of a cell block: tags stripped, entities decoded, whitespace collapsed.
pub fn cell_text(block: &str) -> String {
    normalize_ws(&normalize_entities(&strip_tags(inner_after_open_tag(block))))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn th_does_not_match_thead() {
        let s = "<THEAD><tr><TH class=x>Ticker</TH><th>Date</th></tr></THEAD>";
        let lc = to_lower(s);
        let ths = elements_ci(s, &lc, "th");
        assert_eq!(ths.len(), 2);
        assert_eq!(cell_text(ths[0]), "Ticker");
        assert_eq!(cell_text(ths[1]), "Date");
    }

    #[test]
    fn cell_text_strips_nested_markup() {
        let block = r#"<td><a href="/t/NVDA"><b>NVDA</b></a>&nbsp;<br/>Nvidia &amp; Co</td>"#;
        assert_eq!(cell_text(block), "NVDA Nvidia & Co");
    }

    #[test]
    fn missing_close_tag_yields_none() {
        let s = "<table><tr><td>1";
        let lc = to_lower(s);
        assert_eq!(next_element_ci(s, &lc, "table", 0), None);
    }
}
