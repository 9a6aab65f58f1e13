//! Text normalization used for every neighborhood and city comparison.
//!
//! Trims the ends, lowercases, decomposes (NFD) and drops combining marks.
//! Every combining mark goes, spacing marks (Mc) and enclosing marks (Me)
//! included, not only the nonspacing accents Portuguese uses.
//! Internal whitespace is left untouched: `" sao  paulo"` keeps its double
//! space and therefore does not equal `"sao paulo"`.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Normalize a piece of free text for comparison.
pub fn normalize(text: &str) -> String {
    let folded: String = text
        .trim()
        .to_lowercase()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect();
    // Dropped marks can expose trailing whitespace.
    folded.trim().to_string()
}

/// Normalize an optional value. A missing value yields an empty string.
pub fn normalize_opt(text: Option<&str>) -> String {
    text.map(normalize).unwrap_or_default()
}
