//! Text normalization helpers shared by the cascade builder and renderers.

use crate::constants::cascade::PLACEHOLDER_VALUES;

/// Collapse runs of whitespace into single spaces and trim.
pub fn normalize_inline_whitespace<T: AsRef<str>>(text: T) -> String {
    let mut normalized = String::new();
    let mut seen_space = false;
    for ch in text.as_ref().chars() {
        if ch.is_whitespace() {
            if !seen_space {
                normalized.push(' ');
                seen_space = true;
            }
        } else {
            normalized.push(ch);
            seen_space = false;
        }
    }
    normalized.trim().to_string()
}

/// True when a raw field carries no information (`""`, `None`, `N/A`, `-`).
pub fn is_placeholder(value: &str) -> bool {
    let trimmed = value.trim();
    trimmed.is_empty()
        || PLACEHOLDER_VALUES
            .iter()
            .any(|placeholder| trimmed.eq_ignore_ascii_case(placeholder))
}

/// Normalize an optional raw field, dropping placeholders entirely.
pub fn clean_field(value: Option<&str>) -> Option<String> {
    let value = value?;
    if is_placeholder(value) {
        return None;
    }
    Some(normalize_inline_whitespace(value))
}

/// Title-case a make or model name token by token.
///
/// Tokens that are fully uppercase (`HARRIER`, `4WD`) become capitalized
/// (`Harrier`, `4wd`); mixed-case or caseless tokens (`iX3`, `2.0`) pass
/// through untouched. Tokens are re-joined with single spaces.
pub fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|token| {
            if is_all_upper(token) {
                capitalize(token)
            } else {
                token.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Word-boundary title casing used for fuel labels (`PETROL/HYBRID` -> `Petrol/Hybrid`).
///
/// A letter is uppercased when it follows a non-letter and lowercased otherwise.
pub fn word_title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut prev_cased = false;
    for ch in normalize_inline_whitespace(text).chars() {
        if ch.is_alphabetic() {
            if prev_cased {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            prev_cased = true;
        } else {
            out.push(ch);
            prev_cased = false;
        }
    }
    out
}

/// Format a whole-shilling amount with thousands separators (`KES 1,234,567`).
pub fn format_kes(amount: u64) -> String {
    let digits = amount.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    format!("KES {out}")
}

fn is_all_upper(token: &str) -> bool {
    let mut has_cased = false;
    for ch in token.chars() {
        if ch.is_lowercase() {
            return false;
        }
        if ch.is_uppercase() {
            has_cased = true;
        }
    }
    has_cased
}

fn capitalize(token: &str) -> String {
    let mut chars = token.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}
