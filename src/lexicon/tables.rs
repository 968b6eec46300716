//! Symbol, role, organization-type and category tables.

use crate::intent::{OrgRole, OrgType};

/// Currency symbols that pin a concrete currency code.
///
/// `$` is deliberately absent: a bare dollar sign is ambiguous
/// (USD/MXN/COP) and resolves to the configured default currency at low
/// confidence instead.
pub const CURRENCY_SYMBOLS: &[(&str, &str)] = &[
    ("₡", "CRC"),
    ("€", "EUR"),
    ("S/", "PEN"),
    ("s/", "PEN"),
];

/// Currency words, matched after a numeric token ("5000 colones").
pub const CURRENCY_WORDS: &[(&str, &str)] = &[
    ("colones", "CRC"),
    ("colón", "CRC"),
    ("colon", "CRC"),
    ("dólares", "USD"),
    ("dolares", "USD"),
    ("dollars", "USD"),
    ("usd", "USD"),
    ("euros", "EUR"),
    ("soles", "PEN"),
    ("quetzales", "GTQ"),
];

/// Display symbol for a currency code, used in confirmation text.
pub fn symbol_for_currency(code: &str) -> &'static str {
    match code {
        "CRC" => "₡",
        "EUR" => "€",
        "PEN" => "S/",
        "GTQ" => "Q",
        _ => "$",
    }
}

/// Resolve an explicit currency symbol to its code.
pub fn currency_for_symbol(symbol: &str) -> Option<&'static str> {
    CURRENCY_SYMBOLS
        .iter()
        .find(|(s, _)| *s == symbol)
        .map(|(_, code)| *code)
}

/// Resolve a currency word ("colones", "euros") to its code.
pub fn currency_for_word(word: &str) -> Option<&'static str> {
    CURRENCY_WORDS
        .iter()
        .find(|(w, _)| *w == word)
        .map(|(_, code)| *code)
}

const ROLE_WORDS: &[(&str, OrgRole)] = &[
    ("dueño", OrgRole::Owner),
    ("dueña", OrgRole::Owner),
    ("owner", OrgRole::Owner),
    ("administrador", OrgRole::Admin),
    ("administradora", OrgRole::Admin),
    ("admin", OrgRole::Admin),
    ("manager", OrgRole::Manager),
    ("gerente", OrgRole::Manager),
    ("miembro", OrgRole::Member),
    ("member", OrgRole::Member),
    ("viewer", OrgRole::Viewer),
    ("observador", OrgRole::Viewer),
    ("contador", OrgRole::Accountant),
    ("contadora", OrgRole::Accountant),
    ("accountant", OrgRole::Accountant),
];

/// Match a role word inside an already-lowercased message.
pub fn role_for_word(lower_text: &str) -> Option<OrgRole> {
    ROLE_WORDS
        .iter()
        .find(|(word, _)| contains_word(lower_text, word))
        .map(|(_, role)| *role)
}

const ORG_TYPE_WORDS: &[(&str, OrgType)] = &[
    ("familia", OrgType::Family),
    ("family", OrgType::Family),
    ("empresa", OrgType::Company),
    ("company", OrgType::Company),
    ("negocio", OrgType::Company),
    ("equipo", OrgType::Team),
    ("team", OrgType::Team),
    ("departamento", OrgType::Department),
    ("department", OrgType::Department),
];

/// Match an organization-type word inside an already-lowercased message.
pub fn org_type_for_word(lower_text: &str) -> Option<OrgType> {
    ORG_TYPE_WORDS
        .iter()
        .find(|(word, _)| contains_word(lower_text, word))
        .map(|(_, t)| *t)
}

/// Words that mean "my personal ledger, not a shared organization".
pub const PERSONAL_MARKERS: &[&str] = &["personal", "mío", "mio", "propio", "mi cuenta", "yo"];

/// Words that cancel a pending question.
const CANCEL_KEYWORDS: &[&str] = &["cancelar", "cancela", "olvídalo", "olvidalo", "cancel", "nada"];

pub fn is_cancel_keyword(lower_text: &str) -> bool {
    CANCEL_KEYWORDS.iter().any(|kw| lower_text == *kw)
}

const EXPENSE_CATEGORIES: &[(&str, &[&str])] = &[
    (
        "Alimentación",
        &["comida", "restaurant", "supermercado", "almuerzo", "desayuno", "cena", "groceries", "food"],
    ),
    (
        "Transporte",
        &["uber", "taxi", "gasolina", "bus", "transporte", "combustible", "parking"],
    ),
    (
        "Entretenimiento",
        &["cine", "bar", "fiesta", "diversión", "entretenimiento", "netflix", "spotify"],
    ),
    ("Salud", &["doctor", "medicina", "farmacia", "hospital", "salud", "médico"]),
    ("Educación", &["libros", "curso", "universidad", "educación", "estudio"]),
    ("Servicios", &["electricidad", "agua", "internet", "teléfono", "cable", "streaming"]),
    ("Ropa", &["ropa", "zapatos", "vestido", "camisa", "pantalón"]),
    ("Hogar", &["casa", "hogar", "muebles", "decoración", "limpieza"]),
];

const INCOME_CATEGORIES: &[(&str, &[&str])] = &[
    ("Salario", &["salario", "sueldo", "trabajo"]),
    ("Freelance", &["freelance", "proyecto", "consultoría"]),
    ("Inversiones", &["dividendos", "intereses", "inversión"]),
];

/// Best-effort category from description keywords. `None` means the
/// executor's fallback category applies; never a blocking slot.
pub fn category_for(lower_text: &str, income: bool) -> Option<&'static str> {
    let table = if income { INCOME_CATEGORIES } else { EXPENSE_CATEGORIES };
    table
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|kw| lower_text.contains(kw)))
        .map(|(category, _)| *category)
}

/// Containment check that respects word boundaries for short words.
///
/// "admin" must not fire inside "administración de gastos" for the wrong
/// table entry, and "yo" must not fire inside "mayo".
fn contains_word(haystack: &str, needle: &str) -> bool {
    haystack.split(|c: char| !c.is_alphanumeric()).any(|w| w == needle)
}
