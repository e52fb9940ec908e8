use once_cell::sync::Lazy;
use regex::Regex;

static BLANK_LINE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());

/// Shared post-processing applied to every non-empty extraction.
///
/// - `\r\n` and bare `\r` become `\n`
/// - three or more consecutive newlines collapse to exactly two
/// - leading and trailing whitespace is trimmed
///
/// Idempotent: `normalize_whitespace(normalize_whitespace(s)) == normalize_whitespace(s)`.
pub fn normalize_whitespace(text: &str) -> String {
    let unified = text.replace("\r\n", "\n").replace('\r', "\n");
    BLANK_LINE_RUN
        .replace_all(&unified, "\n\n")
        .trim()
        .to_string()
}

/// Collapses every run of whitespace (including newlines) into a single space.
pub fn collapse_spaces(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
