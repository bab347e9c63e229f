//! Field extractors for the CRM's `raw_email` property.
//!
//! The property holds `Display Name <address@domain>`. Both extractors are
//! total: malformed input yields `None`, never an error.

use once_cell::sync::Lazy;
use regex::Regex;

static ADDRESS_IN_BRACKETS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<([^<>]*)>").expect("static regex"));

static EMAIL_SHAPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s<>]+@[^@\s<>]+\.[^@\s<>.]+$").expect("static regex"));

/// The address between the first pair of angle brackets.
pub fn extract_email(raw_email: &str) -> Option<String> {
    let captures = ADDRESS_IN_BRACKETS.captures(raw_email)?;
    let address = captures.get(1)?.as_str().trim();
    if EMAIL_SHAPE.is_match(address) {
        Some(address.to_string())
    } else {
        None
    }
}

/// The text before the first `<`, trimmed and unquoted.
pub fn extract_display_name(raw_email: &str) -> Option<String> {
    let (name, _) = raw_email.split_once('<')?;
    let name = name.trim().trim_matches('"').trim();
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}
