//! Engine facade: the stateful entry point callers use per message.
//!
//! `Engine` owns the configuration and the context store and wires them to
//! the pure resolver. Each call runs the sender's whole read-resolve-write
//! under the store's per-user lock, so two messages from the same sender
//! can never interleave on one pending question. The optional model call
//! happens before the lock is taken; a slow or failing model never holds
//! up other senders.

use chrono::Utc;
use tracing::{info, warn};

use crate::config::EngineConfig;
use crate::context::{ContextStore, UserState};
use crate::intent::{Membership, Message, ResolvedCommand};
use crate::model::{IntentModel, ModelClassification};
use crate::resolver::{resolve_turn, Resolution};
use crate::respond;

/// What the caller sends back to the user, plus the command to execute if
/// the turn completed one.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineReply {
    /// Outbound message text: a confirmation or a question.
    pub text: String,
    /// Present when the turn resolved to an executable command.
    pub command: Option<ResolvedCommand>,
}

/// Stateful resolution engine.
#[derive(Debug, Default)]
pub struct Engine {
    config: EngineConfig,
    store: ContextStore,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            store: ContextStore::new(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Resolve one message with a model classification the caller already
    /// obtained (or `None` for the pattern-only path).
    ///
    /// The message's `received_at` is the turn's clock: expiry checks and
    /// new deadlines both derive from it.
    pub fn resolve(
        &self,
        message: &Message,
        memberships: &[Membership],
        model: Option<&ModelClassification>,
    ) -> EngineReply {
        let now = message.received_at;
        let outcome = self.store.with_user(&message.sender_id, |state| {
            let outcome = resolve_turn(message, state, memberships, model, &self.config, now);
            *state = outcome.next_state.clone();
            outcome
        });

        match outcome.resolution {
            Resolution::Command(cmd) => {
                info!(
                    sender = %message.sender_id,
                    intent = cmd.intent().name(),
                    "turn resolved to command"
                );
                EngineReply {
                    text: respond::confirmation(&cmd, memberships),
                    command: Some(cmd),
                }
            }
            Resolution::Clarify(clarify) => {
                info!(
                    sender = %message.sender_id,
                    expected_slot = ?clarify.expected_slot,
                    "turn resolved to clarification"
                );
                EngineReply {
                    text: clarify.text,
                    command: None,
                }
            }
        }
    }

    /// Resolve one message, first attempting a model classification with a
    /// hard timeout. Model errors and timeouts degrade to the pattern-only
    /// path; they are never user-visible.
    pub async fn resolve_with_model(
        &self,
        message: &Message,
        memberships: &[Membership],
        model: &dyn IntentModel,
    ) -> EngineReply {
        let classification =
            match tokio::time::timeout(self.config.model_timeout, model.classify(&message.text))
                .await
            {
                Ok(Ok(c)) => Some(c),
                Ok(Err(err)) => {
                    warn!(model = model.model_name(), error = %err, "model classification failed");
                    None
                }
                Err(_) => {
                    warn!(model = model.model_name(), "model classification timed out");
                    None
                }
            };
        self.resolve(message, memberships, classification.as_ref())
    }

    /// Snapshot a sender's conversational state (for inspection/tests).
    pub fn user_state(&self, sender_id: &str) -> UserState {
        self.store.get(sender_id)
    }

    /// Drop expired per-user entries.
    pub fn sweep_expired(&self) {
        self.store.sweep_expired(Utc::now());
    }
}
