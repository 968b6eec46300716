//! End-to-end conversation flows through the public `Engine` API.

use chrono::{DateTime, Datelike, Duration, TimeZone, Utc};
use finchat_agentic::{
    Engine, EngineConfig, Intent, Membership, Message, ModelClassification, OrgRole, OrgType,
    ResolvedCommand, SlotName, TxScope,
};
use rust_decimal::Decimal;
use uuid::Uuid;

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 15, 12, 0, 0).unwrap()
}

fn membership(name: &str, org_type: OrgType) -> Membership {
    Membership {
        organization_id: Uuid::new_v4(),
        name: name.to_string(),
        org_type,
        role: OrgRole::Owner,
    }
}

#[test]
fn onboarding_conversation_script() {
    let engine = Engine::new(EngineConfig::default());
    let user = "+50688880000";

    // Turn 1: create the family in one message.
    let reply = engine.resolve(
        &Message::new(user, "crear familia Los García", t0()),
        &[],
        None,
    );
    let garcia = match reply.command {
        Some(ResolvedCommand::CreateOrganization { org_type, ref name }) => {
            assert_eq!(org_type, OrgType::Family);
            assert_eq!(name, "Los García");
            membership(name, org_type)
        }
        other => panic!("expected create command, got {:?}", other),
    };
    assert!(reply.text.contains("Los García"));

    // Turn 2: invite without a phone number; the engine asks for it.
    let reply = engine.resolve(
        &Message::new(user, "invitar a mi esposa", t0() + Duration::minutes(1)),
        &[garcia.clone()],
        None,
    );
    assert!(reply.command.is_none());
    assert!(reply.text.contains("teléfono"));
    assert_eq!(
        engine.user_state(user).pending.map(|p| p.missing_slot),
        Some(SlotName::PhoneNumber)
    );

    // Turn 3: the bare number answers the question and completes the
    // invite, scoped to the only organization.
    let reply = engine.resolve(
        &Message::new(user, "+50612345678", t0() + Duration::minutes(2)),
        &[garcia.clone()],
        None,
    );
    match reply.command {
        Some(ResolvedCommand::InviteMember {
            ref phone_number,
            role,
            organization,
        }) => {
            assert_eq!(phone_number, "+50612345678");
            assert_eq!(role, OrgRole::Member);
            assert_eq!(organization, Some(garcia.organization_id));
        }
        other => panic!("expected invite command, got {:?}", other),
    }
    assert!(engine.user_state(user).pending.is_none());
}

#[test]
fn pending_question_expires_after_ttl() {
    let engine = Engine::new(EngineConfig::default());
    let user = "u1";

    engine.resolve(&Message::new(user, "invitar a mi esposa", t0()), &[], None);
    assert!(engine.user_state(user).pending.is_some());

    // Eleven minutes later the question is dead; the number is just an
    // unclassifiable fresh message.
    let reply = engine.resolve(
        &Message::new(user, "hola de nuevo", t0() + Duration::minutes(11)),
        &[],
        None,
    );
    assert!(reply.command.is_none());
    assert!(engine.user_state(user).pending.is_none());
    assert_eq!(engine.user_state(user).unknown_streak, 1);
}

#[test]
fn two_organizations_require_explicit_target() {
    let engine = Engine::new(EngineConfig::default());
    let user = "u1";
    let fam = membership("García", OrgType::Family);
    let work = membership("Acme", OrgType::Company);
    let orgs = vec![fam.clone(), work.clone()];

    let reply = engine.resolve(&Message::new(user, "gasté $10 comida", t0()), &orgs, None);
    assert!(reply.command.is_none());
    assert!(reply.text.contains("1. García"));
    assert!(reply.text.contains("2. Acme"));
    assert!(reply.text.contains("3. Personal"));

    let reply = engine.resolve(
        &Message::new(user, "1", t0() + Duration::minutes(1)),
        &orgs,
        None,
    );
    match reply.command {
        Some(ResolvedCommand::RecordExpense {
            amount,
            ref currency,
            ref category,
            target,
            ..
        }) => {
            assert_eq!(amount, Decimal::new(10, 0));
            // Bare `$` falls back to the configured default currency.
            assert_eq!(currency, "CRC");
            assert_eq!(category.as_deref(), Some("Alimentación"));
            assert_eq!(
                target,
                TxScope::Organization {
                    id: fam.organization_id
                }
            );
        }
        other => panic!("expected scoped expense, got {:?}", other),
    }
}

#[test]
fn org_choice_by_name_and_personal_marker() {
    let engine = Engine::new(EngineConfig::default());
    let orgs = vec![
        membership("García", OrgType::Family),
        membership("Acme", OrgType::Company),
    ];

    engine.resolve(&Message::new("u1", "recibí 200000 de salario", t0()), &orgs, None);
    let reply = engine.resolve(
        &Message::new("u1", "personal", t0() + Duration::minutes(1)),
        &orgs,
        None,
    );
    match reply.command {
        Some(ResolvedCommand::RecordIncome { target, ref category, .. }) => {
            assert_eq!(target, TxScope::Personal);
            assert_eq!(category.as_deref(), Some("Salario"));
        }
        other => panic!("expected personal income, got {:?}", other),
    }

    engine.resolve(&Message::new("u2", "gasté ₡8000 en gasolina", t0()), &orgs, None);
    let reply = engine.resolve(
        &Message::new("u2", "acme", t0() + Duration::minutes(1)),
        &orgs,
        None,
    );
    match reply.command {
        Some(ResolvedCommand::RecordExpense { target, .. }) => {
            assert_eq!(
                target,
                TxScope::Organization {
                    id: orgs[1].organization_id
                }
            );
        }
        other => panic!("expected org expense, got {:?}", other),
    }
}

#[test]
fn model_override_is_bounded() {
    let engine = Engine::new(EngineConfig::default());

    // Above threshold on an ambiguous message, the model wins.
    let model = ModelClassification {
        intent: Intent::RequestReport,
        confidence: 0.9,
        slots: Vec::new(),
    };
    let reply = engine.resolve(
        &Message::new("u1", "quiero ver cómo va todo", t0()),
        &[],
        Some(&model),
    );
    assert_eq!(
        reply.command.as_ref().map(|c| c.intent()),
        Some(Intent::RequestReport)
    );

    // Against explicit currency+amount evidence, the model never wins.
    let model = ModelClassification {
        intent: Intent::HelpRequest,
        confidence: 0.99,
        slots: Vec::new(),
    };
    let reply = engine.resolve(
        &Message::new("u2", "gasté ₡5000 en almuerzo", t0()),
        &[],
        Some(&model),
    );
    assert_eq!(
        reply.command.as_ref().map(|c| c.intent()),
        Some(Intent::RecordExpense)
    );
}

#[test]
fn unknown_turns_escalate_to_help() {
    let engine = Engine::new(EngineConfig::default());

    let reply = engine.resolve(&Message::new("u1", "asdf qwerty", t0()), &[], None);
    assert!(reply.command.is_none());
    assert!(reply.text.contains("asdf qwerty"));

    let reply = engine.resolve(
        &Message::new("u1", "blorp", t0() + Duration::minutes(1)),
        &[],
        None,
    );
    assert_eq!(reply.command, Some(ResolvedCommand::Help));
    // The streak resets after escalation.
    assert_eq!(engine.user_state("u1").unknown_streak, 0);
}

#[test]
fn cancellation_clears_context_mid_flow() {
    let engine = Engine::new(EngineConfig::default());

    engine.resolve(&Message::new("u1", "gasté mucho", t0()), &[], None);
    assert!(engine.user_state("u1").pending.is_some());

    let reply = engine.resolve(
        &Message::new("u1", "olvídalo", t0() + Duration::minutes(1)),
        &[],
        None,
    );
    assert!(reply.command.is_none());
    assert!(engine.user_state("u1").pending.is_none());

    // The next message starts clean.
    let reply = engine.resolve(
        &Message::new("u1", "gasté ₡2000 en bus", t0() + Duration::minutes(2)),
        &[],
        None,
    );
    assert!(matches!(
        reply.command,
        Some(ResolvedCommand::RecordExpense { .. })
    ));
}

#[test]
fn report_request_never_blocks_on_missing_details() {
    let engine = Engine::new(EngineConfig::default());
    let orgs = vec![
        membership("García", OrgType::Family),
        membership("Acme", OrgType::Company),
    ];

    let reply = engine.resolve(&Message::new("u1", "dame un resumen", t0()), &orgs, None);
    match reply.command {
        Some(ResolvedCommand::RequestReport { period, target }) => {
            // Defaults: the current calendar month, the personal ledger.
            assert_eq!(period.start, t0().date_naive().with_day(1).unwrap());
            assert_eq!(target, TxScope::Personal);
        }
        other => panic!("expected report command, got {:?}", other),
    }
}

#[test]
fn new_command_supersedes_stale_question() {
    let engine = Engine::new(EngineConfig::default());

    engine.resolve(&Message::new("u1", "invitar a alguien", t0()), &[], None);
    let reply = engine.resolve(
        &Message::new(
            "u1",
            "mejor apunta que gasté ₡3500 en parqueo",
            t0() + Duration::minutes(1),
        ),
        &[],
        None,
    );
    assert!(matches!(
        reply.command,
        Some(ResolvedCommand::RecordExpense { .. })
    ));
    assert!(engine.user_state("u1").pending.is_none());
}
