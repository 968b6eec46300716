//! Static lexicon for the Spanish/English finance-chat domain
//!
//! Trigger keywords per intent, currency tables, role and organization-type
//! tables, time-period phrases and expense/income category keywords.
//! Everything here is read-only and process-wide; nothing mutates after
//! first use.

pub mod tables;
pub mod triggers;

pub use tables::{
    category_for, currency_for_symbol, currency_for_word, is_cancel_keyword, org_type_for_word,
    role_for_word, symbol_for_currency, PERSONAL_MARKERS,
};
pub use triggers::{TriggerPattern, TRIGGERS};

/// Lowercase a message once for keyword containment checks.
///
/// Keyword tables are stored lowercase; callers compare against this.
pub fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}
