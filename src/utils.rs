//! Small string helpers shared by the scraper, the speech client and logging.
//!
//! - Log-safe truncation of long response bodies
//! - Whitespace normalisation for text pulled out of HTML
//! - De-quoting of CSS `url(...)` arguments

/// Truncate a string for logging purposes.
///
/// Long strings are cut to at most `max` bytes, backing off to the nearest
/// char boundary so multi-byte (Devanagari) text never splits mid-codepoint.
/// A byte count of what was dropped is appended.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log(&"a".repeat(500), 10), "aaaaaaaaaa…(+490 bytes)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut cut = max;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}…(+{} bytes)", &s[..cut], s.len() - cut)
}

/// Collapse every run of whitespace (including the newlines and indentation
/// that HTML text nodes carry) into a single space and trim both ends.
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Strip one layer of matching single or double quotes from a CSS value.
///
/// `url('a.jpg')`, `url("a.jpg")` and `url(a.jpg)` all carry the same URL.
pub fn strip_css_quotes(s: &str) -> &str {
    let s = s.trim();
    for q in ['\'', '"'] {
        if let Some(inner) = s.strip_prefix(q).and_then(|r| r.strip_suffix(q)) {
            return inner.trim();
        }
    }
    s
}
