//! Organization extraction: the type+name pair when creating one, and the
//! scope reference when a message names an organization the sender already
//! belongs to.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::intent::{Membership, OrgType, TxScope};
use crate::lexicon::tables::PERSONAL_MARKERS;

/// Result of parsing a "create organization" style phrase.
#[derive(Debug, Clone, PartialEq)]
pub struct OrgNameMatch {
    pub org_type: OrgType,
    /// Proposed name. Empty string is a valid "name still needed" result,
    /// not an error.
    pub name: String,
}

/// Org-type keyword followed by the remainder of the phrase as the name,
/// with connecting words ("que se llame", "llamada") stripped.
static ORG_TYPE_NAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(familia|empresa|negocio|equipo|departamento|organizaci[oó]n|family|company|team|department)\b\s*(?:que\s+se\s+llame\s+|llamad[oa]\s+|:\s*)?(.*)$",
    )
    .expect("org type pattern must compile")
});

fn org_type_from_keyword(keyword: &str) -> OrgType {
    match keyword.to_lowercase().as_str() {
        "familia" | "family" => OrgType::Family,
        "empresa" | "company" | "negocio" => OrgType::Company,
        "equipo" | "team" => OrgType::Team,
        "departamento" | "department" => OrgType::Department,
        // "organización" carries no concrete type; treat as family,
        // the product's most common case.
        _ => OrgType::Family,
    }
}

/// Extract the organization type and proposed name from a creation phrase.
///
/// "crear familia Los García" -> (Family, "Los García")
/// "nueva empresa" -> (Company, "") - the name is asked for next turn.
pub fn extract_org_type_and_name(text: &str) -> Option<OrgNameMatch> {
    let caps = ORG_TYPE_NAME_RE.captures(text)?;
    let org_type = org_type_from_keyword(caps.get(1).map_or("", |m| m.as_str()));
    let name = caps
        .get(2)
        .map_or("", |m| m.as_str())
        .trim()
        .trim_matches('"')
        .trim_matches('\'')
        .to_string();
    Some(OrgNameMatch { org_type, name })
}

/// Find an organization scope named or implied inside the message:
/// a membership's name ("gasté 5000 en la familia García") or a personal
/// marker ("personal", "mío").
pub fn extract_org_scope(text: &str, memberships: &[Membership]) -> Option<TxScope> {
    let lower = text.to_lowercase();

    for membership in memberships {
        let name = membership.name.to_lowercase();
        if !name.is_empty() && lower.contains(&name) {
            return Some(TxScope::Organization {
                id: membership.organization_id,
            });
        }
    }

    let is_word = |marker: &str| {
        lower
            .split(|c: char| !c.is_alphanumeric())
            .any(|w| w == marker)
            || (marker.contains(' ') && lower.contains(marker))
    };
    if PERSONAL_MARKERS.iter().any(|m| is_word(m)) {
        return Some(TxScope::Personal);
    }

    None
}
