//! Turn resolution.
//!
//! `resolve_turn` is the whole decision procedure for one inbound message,
//! written as a pure function: message text, the sender's prior state, their
//! memberships, an optional model classification and the clock go in; a
//! resolution plus the sender's next state come out. Nothing here touches
//! the store, the network or the environment, so identical inputs always
//! produce identical outputs and the function can be replayed in tests.
//!
//! Precedence within a turn is fixed: cancellation first, then answering a
//! live pending question, then fresh classification. A pending question is
//! never half-honored; either its slot fills (and the accumulated text is
//! re-extracted as one utterance) or the turn is treated as fresh input.

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::classify::{classify, merge_intent};
use crate::config::EngineConfig;
use crate::context::{PendingQuestion, UserState};
use crate::extract::{
    extract_amount, extract_org_scope, extract_org_type_and_name, extract_period, extract_phone,
    extract_role, period, Slot, SlotName, SlotSet, SlotValue,
};
use crate::intent::{Intent, Membership, Message, OrgRole, ResolvedCommand, TxScope};
use crate::lexicon;
use crate::model::{ModelClassification, ModelSlot};
use crate::respond;

/// What a turn resolved to: an executable command, or a question back to
/// the sender.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Command(ResolvedCommand),
    Clarify(ClarificationRequest),
}

/// A question sent back to the sender, with the expectation (if any) stored
/// for the next turn.
#[derive(Debug, Clone, PartialEq)]
pub struct ClarificationRequest {
    /// Rendered question text.
    pub text: String,
    /// The slot the next message is expected to fill, when one is expected.
    pub expected_slot: Option<SlotName>,
}

/// A turn's resolution together with the sender's next state.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnOutcome {
    pub resolution: Resolution,
    pub next_state: UserState,
}

impl TurnOutcome {
    fn command(cmd: ResolvedCommand) -> Self {
        Self {
            resolution: Resolution::Command(cmd),
            next_state: UserState::default(),
        }
    }

    fn clarify(text: String, expected_slot: Option<SlotName>, next_state: UserState) -> Self {
        Self {
            resolution: Resolution::Clarify(ClarificationRequest { text, expected_slot }),
            next_state,
        }
    }
}

/// Resolve one inbound message.
pub fn resolve_turn(
    message: &Message,
    state: &UserState,
    memberships: &[Membership],
    model: Option<&ModelClassification>,
    config: &EngineConfig,
    now: DateTime<Utc>,
) -> TurnOutcome {
    let text = message.text.trim();
    let lower = lexicon::normalize(text);

    // Cancellation always wins, pending question or not.
    if lexicon::is_cancel_keyword(&lower) {
        debug!(sender = %message.sender_id, "turn cancelled pending context");
        return TurnOutcome::clarify(respond::cancel_ack(), None, UserState::default());
    }

    if let Some(pending) = state.active_pending(now) {
        return resolve_pending(message, pending, state, memberships, model, config, now);
    }

    let pattern = classify(text, config);
    let intent = merge_intent(&pattern, model, config);
    resolve_fresh(message, text, intent, state, memberships, model, config, now)
}

/// A turn while a pending question is live: try to fill the asked slot,
/// otherwise fall back to fresh classification, otherwise re-ask.
fn resolve_pending(
    message: &Message,
    pending: &PendingQuestion,
    state: &UserState,
    memberships: &[Membership],
    model: Option<&ModelClassification>,
    config: &EngineConfig,
    now: DateTime<Utc>,
) -> TurnOutcome {
    let text = message.text.trim();

    if let Some(filled) = fill_slot(pending, text, memberships, config, now) {
        debug!(
            sender = %message.sender_id,
            intent = pending.asked_intent.name(),
            slot = ?pending.missing_slot,
            "pending slot filled"
        );
        // Slots from earlier turns are authoritative; the reply's own text
        // only adds slots it states more strongly. Running the extractors
        // over the concatenation instead would let an answer like "2" to an
        // organization question read as a bare amount and displace the real
        // one.
        let combined = format!("{}\n{}", pending.accumulated_text, text);
        let mut slots =
            extract_all(pending.asked_intent, &pending.accumulated_text, memberships, config, now);
        for slot in extract_all(pending.asked_intent, text, memberships, config, now).iter() {
            slots.insert_if_stronger(slot.clone());
        }
        apply_model_slots(&mut slots, model, memberships, config, now);
        slots.insert(filled);
        return complete_or_ask(message, pending.asked_intent, slots, combined, memberships, config, now);
    }

    // The answer did not fill the slot. A clearly recognizable new command
    // supersedes the pending question; anything else re-asks it.
    let pattern = classify(text, config);
    let intent = merge_intent(&pattern, model, config);
    if intent != Intent::Unknown {
        debug!(
            sender = %message.sender_id,
            new_intent = intent.name(),
            "pending question superseded by new command"
        );
        return resolve_fresh(message, text, intent, state, memberships, model, config, now);
    }

    // Not an answer and not a command: count the miss and either escalate
    // or re-ask with a refreshed deadline.
    let streak = state.unknown_streak.saturating_add(1);
    if streak >= config.unknown_escalation_turns {
        return TurnOutcome::command(ResolvedCommand::Help);
    }

    let question = respond::clarification_prompt(
        pending.asked_intent,
        pending.missing_slot,
        memberships,
        personal_allowed(pending.asked_intent),
    );
    let refreshed = PendingQuestion {
        accumulated_text: format!("{}\n{}", pending.accumulated_text, text),
        expires_at: now + config.pending_ttl,
        ..pending.clone()
    };
    TurnOutcome::clarify(
        respond::reask(&question),
        Some(refreshed.missing_slot),
        UserState {
            pending: Some(refreshed),
            unknown_streak: streak,
        },
    )
}

/// A turn with no live pending question, after intent merge.
#[allow(clippy::too_many_arguments)]
fn resolve_fresh(
    message: &Message,
    text: &str,
    intent: Intent,
    state: &UserState,
    memberships: &[Membership],
    model: Option<&ModelClassification>,
    config: &EngineConfig,
    now: DateTime<Utc>,
) -> TurnOutcome {
    match intent {
        Intent::Unknown => {
            let streak = state.unknown_streak.saturating_add(1);
            if streak >= config.unknown_escalation_turns {
                debug!(sender = %message.sender_id, streak, "unknown streak escalated to help");
                return TurnOutcome::command(ResolvedCommand::Help);
            }
            TurnOutcome::clarify(
                respond::unknown_prompt(text),
                None,
                UserState {
                    pending: None,
                    unknown_streak: streak,
                },
            )
        }
        Intent::HelpRequest => TurnOutcome::command(ResolvedCommand::Help),
        Intent::AcceptInvitation => TurnOutcome::command(ResolvedCommand::AcceptInvitation),
        _ => {
            let mut slots = extract_all(intent, text, memberships, config, now);
            apply_model_slots(&mut slots, model, memberships, config, now);
            complete_or_ask(message, intent, slots, text.to_string(), memberships, config, now)
        }
    }
}

/// Either build the command (all required slots present) or ask for the
/// first missing one and park the turn as a pending question.
fn complete_or_ask(
    message: &Message,
    intent: Intent,
    slots: SlotSet,
    accumulated_text: String,
    memberships: &[Membership],
    config: &EngineConfig,
    now: DateTime<Utc>,
) -> TurnOutcome {
    if let Some(missing) = next_missing(intent, &slots, memberships) {
        let question =
            respond::clarification_prompt(intent, missing, memberships, personal_allowed(intent));
        let pending = PendingQuestion {
            user_id: message.sender_id.clone(),
            asked_intent: intent,
            missing_slot: missing,
            accumulated_text,
            created_at: now,
            expires_at: now + config.pending_ttl,
        };
        return TurnOutcome::clarify(
            question,
            Some(missing),
            UserState {
                pending: Some(pending),
                unknown_streak: 0,
            },
        );
    }

    match build_command(intent, &slots, &accumulated_text, memberships, now) {
        Some(cmd) => TurnOutcome::command(cmd),
        // Required slots checked out but construction found nothing usable;
        // treat like a not-understood turn rather than guessing.
        None => TurnOutcome::clarify(
            respond::unknown_prompt(&accumulated_text),
            None,
            UserState::default(),
        ),
    }
}

/// The first still-missing required slot for an intent, in asking order.
fn next_missing(intent: Intent, slots: &SlotSet, memberships: &[Membership]) -> Option<SlotName> {
    let needs_target =
        |slots: &SlotSet| memberships.len() > 1 && !slots.contains(SlotName::TargetOrganization);

    match intent {
        Intent::CreateOrganization => {
            if !slots.contains(SlotName::OrgType) {
                Some(SlotName::OrgType)
            } else if !slots.contains(SlotName::OrgName) {
                Some(SlotName::OrgName)
            } else {
                None
            }
        }
        Intent::InviteMember => {
            if !slots.contains(SlotName::PhoneNumber) {
                Some(SlotName::PhoneNumber)
            } else if needs_target(slots) {
                Some(SlotName::TargetOrganization)
            } else {
                None
            }
        }
        Intent::RecordExpense | Intent::RecordIncome => {
            if !slots.contains(SlotName::Amount) {
                Some(SlotName::Amount)
            } else if needs_target(slots) {
                Some(SlotName::TargetOrganization)
            } else {
                None
            }
        }
        Intent::ListMembers | Intent::LeaveOrganization => {
            if needs_target(slots) {
                Some(SlotName::TargetOrganization)
            } else {
                None
            }
        }
        // Reports never block: missing period and scope fall back to
        // this-month / personal.
        _ => None,
    }
}

/// Run every extractor that can serve this intent over the text.
fn extract_all(
    intent: Intent,
    text: &str,
    memberships: &[Membership],
    config: &EngineConfig,
    now: DateTime<Utc>,
) -> SlotSet {
    let mut slots = SlotSet::new();
    let lower = lexicon::normalize(text);

    match intent {
        Intent::RecordExpense | Intent::RecordIncome => {
            if let Some(m) = extract_amount(text, &config.default_currency) {
                slots.insert(Slot::pattern(
                    SlotName::Amount,
                    SlotValue::Amount {
                        amount: m.amount,
                        currency: m.currency,
                    },
                    m.confidence,
                ));
            }
            let income = intent == Intent::RecordIncome;
            if let Some(category) = lexicon::category_for(&lower, income) {
                slots.insert(Slot::pattern(
                    SlotName::Category,
                    SlotValue::Text(category.to_string()),
                    0.6,
                ));
            }
            insert_scope(&mut slots, text, memberships);
        }
        Intent::InviteMember => {
            if let Some(phone) = extract_phone(text) {
                slots.insert(Slot::pattern(SlotName::PhoneNumber, SlotValue::Phone(phone), 0.9));
            }
            if let Some(role) = extract_role(text) {
                slots.insert(Slot::pattern(SlotName::Role, SlotValue::Role(role), 0.9));
            }
            insert_scope(&mut slots, text, memberships);
        }
        Intent::CreateOrganization => {
            if let Some(m) = extract_org_type_and_name(text) {
                slots.insert(Slot::pattern(SlotName::OrgType, SlotValue::OrgType(m.org_type), 0.9));
                if !m.name.is_empty() {
                    slots.insert(Slot::pattern(SlotName::OrgName, SlotValue::Text(m.name), 0.8));
                }
            }
        }
        Intent::RequestReport => {
            if let Some(range) = extract_period(text, now) {
                slots.insert(Slot::pattern(SlotName::Period, SlotValue::Period(range), 0.9));
            }
            insert_scope(&mut slots, text, memberships);
        }
        Intent::ListMembers | Intent::LeaveOrganization => {
            insert_scope(&mut slots, text, memberships);
        }
        _ => {}
    }

    slots
}

fn insert_scope(slots: &mut SlotSet, text: &str, memberships: &[Membership]) {
    if let Some(scope) = extract_org_scope(text, memberships) {
        slots.insert(Slot::pattern(
            SlotName::TargetOrganization,
            SlotValue::Scope(scope),
            0.9,
        ));
    }
}

/// Re-parse model-supplied slot text through the same extractors the
/// pattern path uses, then merge at confidence precedence. Malformed or
/// unparseable model slots are dropped silently.
fn apply_model_slots(
    slots: &mut SlotSet,
    model: Option<&ModelClassification>,
    memberships: &[Membership],
    config: &EngineConfig,
    now: DateTime<Utc>,
) {
    let Some(model) = model else { return };
    for slot in &model.slots {
        if !(0.0..=1.0).contains(&slot.confidence) || slot.confidence.is_nan() {
            continue;
        }
        if let Some(typed) = type_model_slot(slot, memberships, config, now) {
            slots.insert_if_stronger(typed);
        }
    }
}

fn type_model_slot(
    slot: &ModelSlot,
    memberships: &[Membership],
    config: &EngineConfig,
    now: DateTime<Utc>,
) -> Option<Slot> {
    let lower = lexicon::normalize(&slot.value);
    let value = match slot.name {
        SlotName::Amount => {
            let m = extract_amount(&slot.value, &config.default_currency)?;
            SlotValue::Amount {
                amount: m.amount,
                currency: m.currency,
            }
        }
        SlotName::PhoneNumber => SlotValue::Phone(extract_phone(&slot.value)?),
        SlotName::Role => SlotValue::Role(extract_role(&slot.value)?),
        SlotName::OrgType => SlotValue::OrgType(lexicon::org_type_for_word(&lower)?),
        SlotName::OrgName | SlotName::Category => {
            let trimmed = slot.value.trim();
            if trimmed.is_empty() {
                return None;
            }
            SlotValue::Text(trimmed.to_string())
        }
        SlotName::Period => SlotValue::Period(extract_period(&slot.value, now)?),
        SlotName::TargetOrganization => {
            SlotValue::Scope(extract_org_scope(&slot.value, memberships)?)
        }
    };
    Some(Slot::model(slot.name, value, slot.confidence))
}

/// Parse the sender's reply as an answer to the pending question's slot.
fn fill_slot(
    pending: &PendingQuestion,
    text: &str,
    memberships: &[Membership],
    config: &EngineConfig,
    now: DateTime<Utc>,
) -> Option<Slot> {
    let lower = lexicon::normalize(text);
    match pending.missing_slot {
        SlotName::Amount => {
            let m = extract_amount(text, &config.default_currency)?;
            Some(Slot::pattern(
                SlotName::Amount,
                SlotValue::Amount {
                    amount: m.amount,
                    currency: m.currency,
                },
                m.confidence,
            ))
        }
        SlotName::PhoneNumber => extract_phone(text)
            .map(|p| Slot::pattern(SlotName::PhoneNumber, SlotValue::Phone(p), 0.9)),
        SlotName::Role => {
            extract_role(text).map(|r| Slot::pattern(SlotName::Role, SlotValue::Role(r), 0.9))
        }
        SlotName::OrgType => lexicon::org_type_for_word(&lower)
            .map(|t| Slot::pattern(SlotName::OrgType, SlotValue::OrgType(t), 0.9)),
        SlotName::OrgName => {
            // Any non-empty reply is accepted as the name.
            let name = text.trim().trim_matches('"').trim_matches('\'');
            if name.is_empty() {
                return None;
            }
            Some(Slot::pattern(SlotName::OrgName, SlotValue::Text(name.to_string()), 0.8))
        }
        SlotName::Period => extract_period(text, now)
            .map(|r| Slot::pattern(SlotName::Period, SlotValue::Period(r), 0.9)),
        SlotName::Category => lexicon::category_for(&lower, pending.asked_intent == Intent::RecordIncome)
            .map(|c| Slot::pattern(SlotName::Category, SlotValue::Text(c.to_string()), 0.6)),
        SlotName::TargetOrganization => {
            parse_org_choice(&lower, memberships, personal_allowed(pending.asked_intent))
                .map(|s| Slot::pattern(SlotName::TargetOrganization, SlotValue::Scope(s), 0.9))
        }
    }
}

/// Parse a reply to the organization-choice question: a 1-based index into
/// the rendered list, an organization name, or a personal marker.
fn parse_org_choice(
    lower: &str,
    memberships: &[Membership],
    include_personal: bool,
) -> Option<TxScope> {
    if let Ok(n) = lower.parse::<usize>() {
        if n >= 1 && n <= memberships.len() {
            return Some(TxScope::Organization {
                id: memberships[n - 1].organization_id,
            });
        }
        if include_personal && n == memberships.len() + 1 {
            return Some(TxScope::Personal);
        }
        return None;
    }

    for membership in memberships {
        let name = membership.name.to_lowercase();
        if name.is_empty() {
            continue;
        }
        // A prefix-style reply must carry at least three characters;
        // otherwise a stray "a" would select the first name containing it.
        let prefix_reply = lower.chars().count() >= 3 && name.contains(lower);
        if lower.contains(&name) || prefix_reply {
            return Some(TxScope::Organization {
                id: membership.organization_id,
            });
        }
    }

    if include_personal
        && lexicon::PERSONAL_MARKERS
            .iter()
            .any(|m| lower.split(|c: char| !c.is_alphanumeric()).any(|w| w == *m) || lower == *m)
    {
        return Some(TxScope::Personal);
    }

    None
}

/// The personal option only makes sense where a personal ledger exists.
fn personal_allowed(intent: Intent) -> bool {
    matches!(
        intent,
        Intent::RecordExpense | Intent::RecordIncome | Intent::RequestReport
    )
}

/// Assemble the command once `next_missing` reports nothing missing.
fn build_command(
    intent: Intent,
    slots: &SlotSet,
    description: &str,
    memberships: &[Membership],
    now: DateTime<Utc>,
) -> Option<ResolvedCommand> {
    match intent {
        Intent::CreateOrganization => {
            let org_type = match &slots.get(SlotName::OrgType)?.value {
                SlotValue::OrgType(t) => *t,
                _ => return None,
            };
            let name = match &slots.get(SlotName::OrgName)?.value {
                SlotValue::Text(n) => n.clone(),
                _ => return None,
            };
            Some(ResolvedCommand::CreateOrganization { org_type, name })
        }
        Intent::InviteMember => {
            let phone_number = match &slots.get(SlotName::PhoneNumber)?.value {
                SlotValue::Phone(p) => p.clone(),
                _ => return None,
            };
            let role = match slots.get(SlotName::Role).map(|s| &s.value) {
                Some(SlotValue::Role(r)) => *r,
                _ => OrgRole::Member,
            };
            Some(ResolvedCommand::InviteMember {
                phone_number,
                role,
                organization: org_for(slots, memberships),
            })
        }
        Intent::ListMembers => Some(ResolvedCommand::ListMembers {
            organization: org_for(slots, memberships),
        }),
        Intent::LeaveOrganization => Some(ResolvedCommand::LeaveOrganization {
            organization: org_for(slots, memberships),
        }),
        Intent::RecordExpense | Intent::RecordIncome => {
            let (amount, currency) = match &slots.get(SlotName::Amount)?.value {
                SlotValue::Amount { amount, currency } => (*amount, currency.clone()),
                _ => return None,
            };
            let category = match slots.get(SlotName::Category).map(|s| &s.value) {
                Some(SlotValue::Text(c)) => Some(c.clone()),
                _ => None,
            };
            let target = scope_for(slots, memberships);
            let description = description.to_string();
            Some(if intent == Intent::RecordExpense {
                ResolvedCommand::RecordExpense {
                    amount,
                    currency,
                    category,
                    description,
                    target,
                }
            } else {
                ResolvedCommand::RecordIncome {
                    amount,
                    currency,
                    category,
                    description,
                    target,
                }
            })
        }
        Intent::RequestReport => {
            let period = match slots.get(SlotName::Period).map(|s| &s.value) {
                Some(SlotValue::Period(range)) => *range,
                _ => period::month_of(now.date_naive()),
            };
            // Reports never ask for a scope; unscoped means personal.
            let target = match slots.get(SlotName::TargetOrganization).map(|s| &s.value) {
                Some(SlotValue::Scope(scope)) => *scope,
                _ => TxScope::Personal,
            };
            Some(ResolvedCommand::RequestReport { period, target })
        }
        Intent::HelpRequest => Some(ResolvedCommand::Help),
        Intent::AcceptInvitation => Some(ResolvedCommand::AcceptInvitation),
        Intent::Unknown => None,
    }
}

/// Transaction scope from a filled slot, falling back to the sender's only
/// organization, then to personal. Multi-org ambiguity never reaches here;
/// `next_missing` asks first.
fn scope_for(slots: &SlotSet, memberships: &[Membership]) -> TxScope {
    match slots.get(SlotName::TargetOrganization).map(|s| &s.value) {
        Some(SlotValue::Scope(scope)) => *scope,
        _ => match memberships {
            [only] => TxScope::Organization {
                id: only.organization_id,
            },
            _ => TxScope::Personal,
        },
    }
}

/// Organization id for member-management commands, where "personal" means
/// "no organization" and the executor rejects the command downstream.
fn org_for(slots: &SlotSet, memberships: &[Membership]) -> Option<uuid::Uuid> {
    match slots.get(SlotName::TargetOrganization).map(|s| &s.value) {
        Some(SlotValue::Scope(TxScope::Organization { id })) => Some(*id),
        Some(SlotValue::Scope(TxScope::Personal)) => None,
        _ => match memberships {
            [only] => Some(only.organization_id),
            _ => None,
        },
    }
}
