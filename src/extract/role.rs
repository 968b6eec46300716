//! Role extraction for invitations.

use crate::intent::OrgRole;
use crate::lexicon::tables::role_for_word;

/// Match a role word in the message ("como administradora", "de viewer").
///
/// Returns `None` when no role token is present; the invite flow then
/// defaults to `Member` rather than asking.
pub fn extract_role(text: &str) -> Option<OrgRole> {
    role_for_word(&text.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_words_in_spanish_and_english() {
        assert_eq!(extract_role("invita a +50612345678 como admin"), Some(OrgRole::Admin));
        assert_eq!(extract_role("agrega a Juan de contador"), Some(OrgRole::Accountant));
        assert_eq!(extract_role("add +50688887777 as viewer"), Some(OrgRole::Viewer));
    }

    #[test]
    fn absent_role_is_none() {
        assert_eq!(extract_role("invitar a mi esposa"), None);
    }
}
