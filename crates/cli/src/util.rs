use rostersync_recon::report::pad_right;
use unicode_width::UnicodeWidthStr;

/// Display width of a string, accounting for combining marks and wide characters.
pub(crate) fn display_width(s: &str) -> usize {
    UnicodeWidthStr::width(s)
}

/// Truncate a string to fit within `width` display columns, adding ".." if truncated.
pub(crate) fn truncate_display(s: &str, width: usize) -> String {
    if display_width(s) <= width {
        return s.to_string();
    }
    if width < 3 {
        return s
            .chars()
            .next()
            .filter(|ch| unicode_width::UnicodeWidthChar::width(*ch).unwrap_or(0) <= width)
            .map(String::from)
            .unwrap_or_default();
    }

    let budget = width - 2;
    let mut used = 0;
    let mut end_byte = 0;
    for (i, ch) in s.char_indices() {
        let cw = unicode_width::UnicodeWidthChar::width(ch).unwrap_or(0);
        if used + cw > budget {
            end_byte = i;
            break;
        }
        used += cw;
        end_byte = i + ch.len_utf8();
    }

    format!("{}..", &s[..end_byte])
}

/// Pad or truncate a string to exactly `width` display columns.
pub(crate) fn fit(s: &str, width: usize) -> String {
    if display_width(s) > width {
        truncate_display(s, width)
    } else {
        pad_right(s, width)
    }
}

/// Width of the widest entry, at least `min`.
pub(crate) fn column_width<'a>(entries: impl IntoIterator<Item = &'a str>, min: usize) -> usize {
    entries.into_iter().map(display_width).fold(min, usize::max)
}
