//! Phone number extraction and normalization.
//!
//! Accepts international tokens (`+` and 8-15 digits) plus the local
//! Costa Rican forms the bot's users actually type (`506 1234 5678`,
//! `1234-5678`). Output is an E.164-like string with a leading `+`.

use once_cell::sync::Lazy;
use regex::Regex;

static PHONE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"\+506\s?\d{4}\s?\d{4}",    // +506 1234 5678
        r"\+\d{8,15}",               // generic international
        r"\b506\s?\d{4}\s?\d{4}\b",  // 506 1234 5678 (missing the +)
        r"\b\d{4}[-\s]\d{4}\b",      // 1234-5678 local form
        r"\b\d{8}\b",                // 12345678 local form
    ]
    .iter()
    .map(|p| Regex::new(p).expect("phone pattern must compile"))
    .collect()
});

/// Extract and normalize the first phone-shaped token in the message.
///
/// Numbers without a country code are assumed local (+506), matching the
/// bot's home market.
pub fn extract_phone(text: &str) -> Option<String> {
    for pattern in PHONE_PATTERNS.iter() {
        if let Some(m) = pattern.find(text) {
            return Some(normalize(m.as_str()));
        }
    }
    None
}

fn normalize(raw: &str) -> String {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    if raw.starts_with('+') {
        format!("+{digits}")
    } else if digits.starts_with("506") && digits.len() > 8 {
        format!("+{digits}")
    } else {
        format!("+506{digits}")
    }
}
