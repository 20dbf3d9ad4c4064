use unicode_width::UnicodeWidthStr;

use crate::model::{Identity, SecondaryCandidate};

pub const LEFT_HEADER: &str = "unmatched in system A";
pub const RIGHT_HEADER: &str = "unmatched in system B";

/// Right-pad `s` with spaces to `width` display columns. Never truncates.
pub fn pad_right(s: &str, width: usize) -> String {
    let sw = UnicodeWidthStr::width(s);
    format!("{}{}", s, " ".repeat(width.saturating_sub(sw)))
}

/// Render two columns of leftovers side by side.
///
/// Column width is the wider of the header and the longest entry, in display
/// columns. The shorter column is filled with blanks.
pub fn diff_table(left: &[String], right: &[String]) -> Vec<String> {
    let width = |header: &str, entries: &[String]| {
        entries
            .iter()
            .map(|e| UnicodeWidthStr::width(e.as_str()))
            .chain(std::iter::once(UnicodeWidthStr::width(header)))
            .max()
            .unwrap_or(0)
    };
    let wl = width(LEFT_HEADER, left);
    let wr = width(RIGHT_HEADER, right);

    let mut lines = Vec::with_capacity(2 + left.len().max(right.len()));
    lines.push(format!(" {} │ {}", pad_right(LEFT_HEADER, wl), RIGHT_HEADER));
    lines.push(format!("{}┼{}", "─".repeat(wl + 2), "─".repeat(wr + 2)));

    for i in 0..left.len().max(right.len()) {
        let l = left.get(i).map(String::as_str).unwrap_or("");
        let r = right.get(i).map(String::as_str).unwrap_or("");
        lines.push(format!(" {} │ {}", pad_right(l, wl), pad_right(r, wr)));
    }

    lines
}

/// Diff table of the identities and candidates a reconciliation left over.
pub fn leftover_table(still_unlinked: &[Identity], leftover: &[SecondaryCandidate]) -> Vec<String> {
    let left: Vec<String> = still_unlinked.iter().map(|i| i.name().trim().to_string()).collect();
    let right: Vec<String> = leftover.iter().map(|c| c.name.trim().to_string()).collect();
    diff_table(&left, &right)
}
