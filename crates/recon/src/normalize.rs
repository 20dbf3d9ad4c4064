//! Display-name canonicalization.
//!
//! Every comparison in the matcher, the roster lookup and the group parser goes
//! through [`normalize`], so two spellings of the same person ("Jürgen Weiß",
//! "JUERGEN WEISS", "Jürgen  Weiss") end up as the same token sequence.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Canonicalize a display name into comparable tokens.
///
/// Pipeline:
/// 1. Case-fold (composed first, so decomposed umlauts are folded like composed ones)
/// 2. German digraphs: `ä→ae`, `ö→oe`, `ü→ue`, `ß→ss`
/// 3. NFD, then drop combining marks (`é→e`)
/// 4. Split on whitespace, discarding empty tokens
pub fn normalize(name: &str) -> Vec<String> {
    fold(name).split_whitespace().map(str::to_string).collect()
}

/// Normalized tokens joined by a single space.
pub fn normalized_key(name: &str) -> String {
    normalize(name).join(" ")
}

/// Normalized tokens joined by `-`, the per-member form used in group labels.
pub fn label_part(name: &str) -> String {
    normalize(name).join("-")
}

/// Strip trailing ASCII punctuation (`"dr."` → `"dr"`).
pub fn strip_trailing_punctuation(token: &str) -> &str {
    token.trim_end_matches(|c: char| c.is_ascii_punctuation())
}

fn fold(name: &str) -> String {
    let lowered: String = name.nfc().collect::<String>().to_lowercase();

    let mut replaced = String::with_capacity(lowered.len());
    for ch in lowered.chars() {
        match ch {
            'ä' => replaced.push_str("ae"),
            'ö' => replaced.push_str("oe"),
            'ü' => replaced.push_str("ue"),
            'ß' => replaced.push_str("ss"),
            _ => replaced.push(ch),
        }
    }

    replaced.nfd().filter(|c| !is_combining_mark(*c)).collect()
}
