//! Deterministic response templates.
//!
//! Renders command confirmations and clarification questions from fixed
//! templates keyed by (intent, missing slot) or by command variant. Pure
//! functions of their input: no state, no side effects, and never any
//! content that is not present in the input.

use crate::extract::SlotName;
use crate::intent::{Intent, Membership, OrgRole, ResolvedCommand, TxScope};
use crate::lexicon::symbol_for_currency;

/// Render the confirmation text for a completed command.
pub fn confirmation(cmd: &ResolvedCommand, memberships: &[Membership]) -> String {
    match cmd {
        ResolvedCommand::CreateOrganization { org_type, name } => format!(
            "✅ ¡Listo! Creé la {} *{}*. Ahora puedes invitar miembros con 'invitar +506...'",
            org_type.display_es(),
            name
        ),
        ResolvedCommand::InviteMember {
            phone_number,
            role,
            organization,
        } => {
            let mut lines = vec![format!("📨 Invitación enviada a {}.", phone_number)];
            if *role != OrgRole::Member {
                lines.push(format!("Rol: {}", role_display(*role)));
            }
            if let Some(name) = organization.and_then(|id| org_name(memberships, id)) {
                lines.push(format!("Organización: {}", name));
            }
            lines.join("\n")
        }
        ResolvedCommand::ListMembers { organization } => match organization
            .and_then(|id| org_name(memberships, id))
        {
            Some(name) => format!("👥 Buscando los miembros de *{}*...", name),
            None => "👥 Buscando los miembros de tu organización...".to_string(),
        },
        ResolvedCommand::AcceptInvitation => {
            "🎉 ¡Bienvenido! Acepté tu invitación.".to_string()
        }
        ResolvedCommand::LeaveOrganization { organization } => match organization
            .and_then(|id| org_name(memberships, id))
        {
            Some(name) => format!("👋 Listo, saliste de *{}*.", name),
            None => "👋 Listo, saliste de la organización.".to_string(),
        },
        ResolvedCommand::RecordExpense {
            amount,
            currency,
            category,
            target,
            ..
        } => {
            let mut lines = vec![format!(
                "✅ Gasto registrado: {}{} {}",
                symbol_for_currency(currency),
                amount,
                currency
            )];
            if let Some(cat) = category {
                lines.push(format!("Categoría: {}", cat));
            }
            lines.push(scope_line(target, memberships));
            lines.join("\n")
        }
        ResolvedCommand::RecordIncome {
            amount,
            currency,
            category,
            target,
            ..
        } => {
            let mut lines = vec![format!(
                "💵 Ingreso registrado: {}{} {}",
                symbol_for_currency(currency),
                amount,
                currency
            )];
            if let Some(cat) = category {
                lines.push(format!("Categoría: {}", cat));
            }
            lines.push(scope_line(target, memberships));
            lines.join("\n")
        }
        ResolvedCommand::RequestReport { period, .. } => format!(
            "📊 Preparando tu reporte del {} al {}...",
            period.start.format("%d/%m/%Y"),
            period.end.format("%d/%m/%Y")
        ),
        ResolvedCommand::Help => help_text(),
    }
}

/// The clarification question for one missing slot.
pub fn clarification_prompt(
    intent: Intent,
    slot: SlotName,
    memberships: &[Membership],
    include_personal: bool,
) -> String {
    match (intent, slot) {
        (Intent::CreateOrganization, SlotName::OrgType) => [
            "🤔 ¿Qué quieres crear?",
            "",
            "👨‍👩‍👧 *Familia* - 'crear familia'",
            "🏢 *Empresa* - 'crear empresa'",
            "👥 *Equipo* - 'crear equipo'",
        ]
        .join("\n"),
        (Intent::CreateOrganization, SlotName::OrgName) => {
            "📝 ¿Cómo se va a llamar? Escribe el nombre.".to_string()
        }
        (Intent::InviteMember, SlotName::PhoneNumber) => {
            "📱 ¿Cuál es el número de teléfono de la persona que quieres invitar? (ej: +50612345678)"
                .to_string()
        }
        (Intent::RecordExpense, SlotName::Amount) => {
            "💰 ¿Cuánto fue el monto del gasto? (ej: ₡5000)".to_string()
        }
        (Intent::RecordIncome, SlotName::Amount) => {
            "💵 ¿Cuánto fue el monto del ingreso? (ej: ₡50000)".to_string()
        }
        (_, SlotName::TargetOrganization) => organization_choices(memberships, include_personal),
        // Remaining combinations share a generic one-slot question.
        (_, SlotName::Amount) => "💰 ¿Cuál es el monto?".to_string(),
        (_, SlotName::PhoneNumber) => "📱 ¿Cuál es el número de teléfono?".to_string(),
        (_, SlotName::Role) => "👤 ¿Qué rol le doy? (admin, miembro, viewer)".to_string(),
        (_, SlotName::OrgType) => "🤔 ¿Familia, empresa o equipo?".to_string(),
        (_, SlotName::OrgName) => "📝 ¿Cómo se llama?".to_string(),
        (_, SlotName::Period) => "📅 ¿De qué período? (hoy, esta semana, este mes)".to_string(),
        (_, SlotName::Category) => "🏷️ ¿En qué categoría lo pongo?".to_string(),
    }
}

/// Numbered list of the sender's organizations, optionally with a personal
/// option at the end.
fn organization_choices(memberships: &[Membership], include_personal: bool) -> String {
    let mut lines = vec!["🤔 ¿A cuál organización?".to_string(), String::new()];
    for (i, m) in memberships.iter().enumerate() {
        lines.push(format!("{}. {} ({})", i + 1, m.name, m.org_type.display_es()));
    }
    if include_personal {
        lines.push(format!("{}. Personal", memberships.len() + 1));
    }
    lines.push(String::new());
    lines.push("Responde con el número o el nombre.".to_string());
    lines.join("\n")
}

/// Prompt when the turn could not be understood at all.
pub fn unknown_prompt(text: &str) -> String {
    format!("🤔 No entendí \"{}\". ¿Podrías decirlo de otra forma?", text)
}

/// Re-ask a pending question after an answer that did not fill the slot.
pub fn reask(question: &str) -> String {
    format!("😅 No logré entender eso.\n\n{}", question)
}

/// Acknowledge an explicit cancellation.
pub fn cancel_ack() -> String {
    "👍 Listo, lo cancelé. ¿En qué más te ayudo?".to_string()
}

/// The help menu, also used as the loop-breaking response after repeated
/// not-understood turns.
pub fn help_text() -> String {
    [
        "🤖 Esto es lo que puedo hacer:",
        "",
        "💰 *Registrar gastos* - 'gasté ₡5000 en almuerzo'",
        "💵 *Registrar ingresos* - 'recibí ₡200000 de salario'",
        "📊 *Reportes* - 'cuánto gasté este mes'",
        "👨‍👩‍👧 *Crear organización* - 'crear familia Los García'",
        "📨 *Invitar* - 'invitar +50612345678'",
        "👥 *Miembros* - 'ver miembros'",
        "",
        "Escríbeme en lenguaje natural, yo me encargo del resto.",
    ]
    .join("\n")
}

fn role_display(role: OrgRole) -> &'static str {
    match role {
        OrgRole::Owner => "dueño",
        OrgRole::Admin => "admin",
        OrgRole::Manager => "manager",
        OrgRole::Member => "miembro",
        OrgRole::Viewer => "viewer",
        OrgRole::Accountant => "contador",
    }
}

fn scope_line(scope: &TxScope, memberships: &[Membership]) -> String {
    match scope {
        TxScope::Personal => "Cuenta: Personal".to_string(),
        TxScope::Organization { id } => match org_name(memberships, *id) {
            Some(name) => format!("Cuenta: {}", name),
            None => "Cuenta: Organización".to_string(),
        },
    }
}

fn org_name(memberships: &[Membership], id: uuid::Uuid) -> Option<String> {
    memberships
        .iter()
        .find(|m| m.organization_id == id)
        .map(|m| m.name.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intent::{OrgType, ResolvedCommand};
    use rust_decimal::Decimal;
    use uuid::Uuid;

    fn membership(name: &str) -> Membership {
        Membership {
            organization_id: Uuid::new_v4(),
            name: name.to_string(),
            org_type: OrgType::Family,
            role: OrgRole::Member,
        }
    }

    #[test]
    fn expense_confirmation_shows_amount_and_scope() {
        let cmd = ResolvedCommand::RecordExpense {
            amount: Decimal::new(5000, 0),
            currency: "CRC".to_string(),
            category: Some("Alimentación".to_string()),
            description: "gasté ₡5000 en almuerzo".to_string(),
            target: TxScope::Personal,
        };
        let text = confirmation(&cmd, &[]);
        assert!(text.contains("₡5000"));
        assert!(text.contains("Alimentación"));
        assert!(text.contains("Personal"));
    }

    #[test]
    fn organization_choices_lists_all_options() {
        let orgs = vec![membership("García"), membership("Acme")];
        let text = clarification_prompt(
            Intent::RecordExpense,
            SlotName::TargetOrganization,
            &orgs,
            true,
        );
        assert!(text.contains("1. García"));
        assert!(text.contains("2. Acme"));
        assert!(text.contains("3. Personal"));
    }

    #[test]
    fn invite_without_personal_option() {
        let orgs = vec![membership("García"), membership("Acme")];
        let text = clarification_prompt(
            Intent::InviteMember,
            SlotName::TargetOrganization,
            &orgs,
            false,
        );
        assert!(!text.contains("Personal"));
    }

    #[test]
    fn templates_never_invent_content() {
        // The unknown prompt echoes only the user's own words.
        let text = unknown_prompt("xyzzy");
        assert!(text.contains("xyzzy"));
    }
}
