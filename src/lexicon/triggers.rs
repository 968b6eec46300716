//! Per-intent trigger keyword tables.
//!
//! Each pattern carries a priority; when several intents match the same
//! message the highest (priority, confidence) pair wins. Priorities encode
//! the tie-break order: explicit-data intents outrank administrative ones,
//! administrative outrank help, help outranks unknown.

use crate::intent::Intent;

/// Keyword trigger set for one intent.
#[derive(Debug, Clone)]
pub struct TriggerPattern {
    pub intent: Intent,
    /// Lowercase keywords/phrases checked by containment.
    pub keywords: &'static [&'static str],
    /// If any of these appears, the pattern does not match at all.
    pub exclude: &'static [&'static str],
    /// Higher wins when several intents match.
    pub priority: u8,
    /// Intent is anchored on a monetary amount; a parsed amount boosts
    /// confidence (absence asks for the amount later, it never rejects).
    pub wants_amount: bool,
    /// Intent is anchored on a phone number; same boost semantics.
    pub wants_phone: bool,
}

pub static TRIGGERS: &[TriggerPattern] = &[
    // Exact acceptance replies outrank everything.
    TriggerPattern {
        intent: Intent::AcceptInvitation,
        keywords: &["acepto", "aceptar", "quiero unirme", "sí quiero", "si quiero"],
        exclude: &[],
        priority: 200,
        wants_amount: false,
        wants_phone: false,
    },
    TriggerPattern {
        intent: Intent::InviteMember,
        keywords: &["invitar", "invita", "invitá", "agregar a", "agrega a", "añadir a"],
        exclude: &[],
        priority: 90,
        wants_amount: false,
        wants_phone: true,
    },
    TriggerPattern {
        intent: Intent::CreateOrganization,
        keywords: &[
            "crear familia",
            "crear empresa",
            "crear equipo",
            "crear departamento",
            "crear organizacion",
            "crear organización",
            "nueva familia",
            "nueva empresa",
            "nuevo equipo",
            "agregar familia",
            "agregar empresa",
            "crear",
        ],
        // "crear presupuesto" must not read as organization creation.
        exclude: &["presupuesto", "budget", "límite"],
        priority: 80,
        wants_amount: false,
        wants_phone: false,
    },
    TriggerPattern {
        intent: Intent::RequestReport,
        keywords: &[
            "resumen",
            "reporte",
            "balance",
            "informe",
            "cuánto",
            "cuanto",
            "mis gastos",
            "total gastos",
            "gastos del mes",
            "cómo voy",
            "como voy",
        ],
        exclude: &[],
        priority: 75,
        wants_amount: false,
        wants_phone: false,
    },
    TriggerPattern {
        intent: Intent::ListMembers,
        keywords: &["miembros", "quiénes están", "quienes estan", "mostrar miembros", "ver miembros"],
        exclude: &[],
        priority: 70,
        wants_amount: false,
        wants_phone: false,
    },
    TriggerPattern {
        intent: Intent::LeaveOrganization,
        keywords: &["salir de", "salirme", "abandonar", "dejar la familia", "dejar familia", "dejar empresa"],
        exclude: &[],
        priority: 70,
        wants_amount: false,
        wants_phone: false,
    },
    TriggerPattern {
        intent: Intent::RecordExpense,
        keywords: &["gasté", "gaste", "pagué", "pague", "compré", "compre", "spent", "paid"],
        exclude: &[],
        priority: 60,
        wants_amount: true,
        wants_phone: false,
    },
    TriggerPattern {
        intent: Intent::RecordIncome,
        keywords: &["ingreso", "recibí", "recibi", "gané", "gane", "cobré", "cobre", "received", "earned"],
        exclude: &[],
        priority: 60,
        wants_amount: true,
        wants_phone: false,
    },
    TriggerPattern {
        intent: Intent::HelpRequest,
        keywords: &[
            "ayuda",
            "help",
            "comandos",
            "funciones",
            "qué puedo hacer",
            "que puedo hacer",
            "no entiendo",
        ],
        exclude: &[],
        priority: 50,
        wants_amount: false,
        wants_phone: false,
    },
];
