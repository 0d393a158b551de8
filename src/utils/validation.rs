// src/utils/validation.rs
use regex::Regex;

lazy_static::lazy_static! {
    static ref QQ_NUMBER_REGEX: Regex = Regex::new(r"^\d+$").unwrap();
}

/// Trim and truncate untrusted text to a field's maximum length.
/// Truncation counts characters, never splitting a code point.
pub fn sanitize(input: Option<&str>, max_len: usize) -> String {
    let trimmed = input.unwrap_or("").trim();
    if trimmed.chars().count() <= max_len {
        trimmed.to_string()
    } else {
        trimmed.chars().take(max_len).collect()
    }
}

/// Empty cleaned text becomes NULL in the store rather than "".
pub fn non_empty(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

/// Download and group links must parse as absolute URLs.
pub fn is_valid_url(value: &str) -> bool {
    url::Url::parse(value).is_ok()
}

/// QQ group numbers are digit strings, nothing else.
pub fn is_valid_qq_number(value: &str) -> bool {
    QQ_NUMBER_REGEX.is_match(value)
}
