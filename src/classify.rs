//! Intent classification.
//!
//! Two sources feed classification: the always-available keyword/pattern
//! path over the lexicon triggers, and an optional model-supplied result.
//! The merge is a deterministic precedence function, not runtime branching:
//! the model wins only above a fixed confidence threshold and never against
//! a zero-ambiguity pattern match (an explicit currency+amount pins the
//! intent to a transaction).

use tracing::{debug, warn};

use crate::config::EngineConfig;
use crate::extract::{extract_amount, extract_phone, AmountMatch};
use crate::intent::Intent;
use crate::lexicon::{self, TriggerPattern, TRIGGERS};
use crate::model::ModelClassification;

/// Confidence assigned when no keyword matched but an explicit
/// currency+amount token forces a transaction reading.
const AMOUNT_ONLY_CONFIDENCE: f32 = 0.6;

/// Outcome of the pattern-only classification path.
#[derive(Debug, Clone)]
pub struct PatternClassification {
    pub intent: Intent,
    pub confidence: f32,
    /// Explicit amount+currency evidence: a model result may never flip
    /// this intent away from RecordExpense/RecordIncome.
    pub pinned: bool,
    pub matched_keywords: Vec<&'static str>,
}

impl PatternClassification {
    fn unknown() -> Self {
        Self {
            intent: Intent::Unknown,
            confidence: 0.0,
            pinned: false,
            matched_keywords: Vec::new(),
        }
    }
}

/// Classify a message against the trigger tables.
///
/// No match at all yields `Unknown`, never an error.
pub fn classify(text: &str, config: &EngineConfig) -> PatternClassification {
    let lower = lexicon::normalize(text);
    let amount = extract_amount(text, &config.default_currency);
    let has_phone = extract_phone(text).is_some();

    let mut best: Option<(u8, PatternClassification)> = None;
    for trigger in TRIGGERS {
        if let Some(candidate) = match_trigger(trigger, &lower, amount.as_ref(), has_phone) {
            debug!(
                intent = candidate.intent.name(),
                confidence = candidate.confidence,
                priority = trigger.priority,
                "trigger matched"
            );
            let replace = match &best {
                None => true,
                Some((prio, current)) => {
                    (trigger.priority, candidate.confidence) > (*prio, current.confidence)
                }
            };
            if replace {
                best = Some((trigger.priority, candidate));
            }
        }
    }

    let mut result = match best {
        Some((_, c)) => c,
        // No keyword matched; an explicit currency+amount is still a
        // transaction (default reading: expense).
        None => match &amount {
            Some(m) if m.explicit => PatternClassification {
                intent: Intent::RecordExpense,
                confidence: AMOUNT_ONLY_CONFIDENCE,
                pinned: true,
                matched_keywords: Vec::new(),
            },
            _ => PatternClassification::unknown(),
        },
    };

    // Explicit currency evidence pins transaction intents.
    if matches!(result.intent, Intent::RecordExpense | Intent::RecordIncome) {
        result.pinned = amount.as_ref().is_some_and(|m| m.explicit);
    }

    result
}

fn match_trigger(
    trigger: &TriggerPattern,
    lower: &str,
    amount: Option<&AmountMatch>,
    has_phone: bool,
) -> Option<PatternClassification> {
    if trigger.exclude.iter().any(|kw| lower.contains(kw)) {
        return None;
    }

    let matched: Vec<&'static str> = trigger
        .keywords
        .iter()
        .copied()
        .filter(|kw| lower.contains(kw))
        .collect();
    if matched.is_empty() {
        return None;
    }

    let mut confidence = matched.len() as f32 / trigger.keywords.len() as f32;
    if trigger.wants_amount && amount.is_some() {
        confidence += 0.2;
    }
    if trigger.wants_phone && has_phone {
        confidence += 0.2;
    }
    // Longer keywords are more specific.
    confidence += matched.iter().filter(|kw| kw.len() > 10).count() as f32 * 0.1;

    Some(PatternClassification {
        intent: trigger.intent,
        confidence: confidence.min(1.0),
        pinned: false,
        matched_keywords: matched,
    })
}

/// Merge the pattern result with an optional model result.
///
/// The model intent is accepted iff its confidence clears the configured
/// threshold AND it does not contradict a pinned pattern match. A malformed
/// model result (confidence outside 0..=1) is discarded, never surfaced.
pub fn merge_intent(
    pattern: &PatternClassification,
    model: Option<&ModelClassification>,
    config: &EngineConfig,
) -> Intent {
    let Some(model) = model else {
        return pattern.intent;
    };

    if !(0.0..=1.0).contains(&model.confidence) || model.confidence.is_nan() {
        warn!(confidence = model.confidence, "discarding malformed model result");
        return pattern.intent;
    }
    if model.intent == Intent::Unknown {
        // A model that gave up adds nothing over the pattern path.
        return pattern.intent;
    }
    if model.confidence < config.model_confidence_threshold {
        debug!(
            model_intent = model.intent.name(),
            confidence = model.confidence,
            "model below threshold, keeping pattern intent"
        );
        return pattern.intent;
    }
    if pattern.pinned && model.intent != pattern.intent {
        debug!(
            model_intent = model.intent.name(),
            pattern_intent = pattern.intent.name(),
            "pattern match is pinned, ignoring model override"
        );
        return pattern.intent;
    }

    model.intent
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::model::ModelClassification;

    fn config() -> EngineConfig {
        EngineConfig::default()
    }

    fn model(intent: Intent, confidence: f32) -> ModelClassification {
        ModelClassification {
            intent,
            confidence,
            slots: Vec::new(),
        }
    }

    #[test]
    fn expense_verb_with_amount() {
        let c = classify("gasté ₡5000 en almuerzo", &config());
        assert_eq!(c.intent, Intent::RecordExpense);
        assert!(c.pinned);
    }

    #[test]
    fn income_verb() {
        let c = classify("recibí 200000 colones de salario", &config());
        assert_eq!(c.intent, Intent::RecordIncome);
        assert!(c.pinned);
    }

    #[test]
    fn expense_without_amount_still_classifies() {
        let c = classify("pagué el almuerzo", &config());
        assert_eq!(c.intent, Intent::RecordExpense);
        assert!(!c.pinned);
    }

    #[test]
    fn amount_with_no_verb_is_expense() {
        let c = classify("₡3500 parqueo", &config());
        assert_eq!(c.intent, Intent::RecordExpense);
        assert!(c.pinned);
    }

    #[test]
    fn accept_outranks_everything() {
        let c = classify("acepto", &config());
        assert_eq!(c.intent, Intent::AcceptInvitation);
    }

    #[test]
    fn budget_text_does_not_create_organization() {
        let c = classify("crear presupuesto para comida", &config());
        assert_ne!(c.intent, Intent::CreateOrganization);
    }

    #[test]
    fn gibberish_is_unknown() {
        let c = classify("asdf qwerty", &config());
        assert_eq!(c.intent, Intent::Unknown);
        assert_eq!(c.confidence, 0.0);
    }

    #[test]
    fn invite_outranks_expense_on_priority() {
        // "agregar a" (invite, 90) and nothing transactional.
        let c = classify("agregar a +50612345678", &config());
        assert_eq!(c.intent, Intent::InviteMember);
    }

    #[test]
    fn model_wins_above_threshold_when_unpinned() {
        let pattern = classify("quiero ver algo", &config());
        assert_eq!(pattern.intent, Intent::Unknown);
        let m = model(Intent::RequestReport, 0.9);
        assert_eq!(merge_intent(&pattern, Some(&m), &config()), Intent::RequestReport);
    }

    #[test]
    fn model_below_threshold_is_ignored() {
        let pattern = classify("quiero ver algo", &config());
        let m = model(Intent::RequestReport, 0.3);
        assert_eq!(merge_intent(&pattern, Some(&m), &config()), Intent::Unknown);
    }

    #[test]
    fn model_cannot_override_pinned_transaction() {
        let pattern = classify("gasté ₡5000 en almuerzo", &config());
        assert!(pattern.pinned);
        let m = model(Intent::HelpRequest, 0.99);
        assert_eq!(merge_intent(&pattern, Some(&m), &config()), Intent::RecordExpense);
    }

    #[test]
    fn model_unknown_never_degrades_pattern() {
        let pattern = classify("gasté ₡5000 en almuerzo", &config());
        let m = model(Intent::Unknown, 0.99);
        assert_eq!(merge_intent(&pattern, Some(&m), &config()), Intent::RecordExpense);
    }

    #[test]
    fn malformed_model_confidence_is_discarded() {
        let pattern = classify("gasté ₡5000", &config());
        let m = model(Intent::HelpRequest, 7.5);
        assert_eq!(merge_intent(&pattern, Some(&m), &config()), Intent::RecordExpense);
    }
}
