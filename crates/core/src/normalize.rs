//! Whitespace normalization and length measurement for extracted text.
//!
//! All lengths in this workspace are counted in characters, not bytes, so
//! that CJK text and Latin text are weighed the same way.

use regex::Regex;
use std::sync::LazyLock;

/// Regex to collapse any run of whitespace (including newlines) into one space.
static WHITESPACE_COLLAPSE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Collapse whitespace runs to single spaces and trim both ends.
pub fn collapse_whitespace(text: &str) -> String {
    WHITESPACE_COLLAPSE_REGEX
        .replace_all(text, " ")
        .trim()
        .to_string()
}

/// Join text pieces with `separator`, skipping pieces that are blank once trimmed,
/// then collapse whitespace.
pub fn join_pieces<I, S>(pieces: I, separator: &str) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let joined = pieces
        .into_iter()
        .filter_map(|p| {
            let t = p.as_ref().trim();
            (!t.is_empty()).then(|| t.to_string())
        })
        .collect::<Vec<_>>()
        .join(separator);
    collapse_whitespace(&joined)
}

/// Length of `text` in characters.
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}
