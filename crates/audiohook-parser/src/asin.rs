//! ASIN detection in free text.

use std::sync::LazyLock;

use regex::Regex;

static LABELLED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bASIN\s*[:#=]?\s*([A-Z0-9]{10})\b").unwrap());

static BARE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b(B0[0-9A-Z]{8})\b").unwrap());

/// Find an ASIN in `text`.
///
/// A labelled `ASIN: XXXXXXXXXX` wins over a bare `B0…` token.
pub fn find_asin(text: &str) -> Option<String> {
    LABELLED
        .captures(text)
        .or_else(|| BARE.captures(text))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_ascii_uppercase())
}

/// Accept a value that is itself exactly an ASIN, normalized to uppercase.
pub fn normalize_asin(value: &str) -> Option<String> {
    let value = value.trim();
    if value.len() == 10 && value.chars().all(|c| c.is_ascii_alphanumeric()) {
        Some(value.to_ascii_uppercase())
    } else {
        None
    }
}
