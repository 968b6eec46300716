//! Finchat Agentic - Intent Resolution & Conversational Context Engine
//!
//! Turns raw Spanish/English finance chat messages into typed, executable
//! commands. Every turn flows through the same chain:
//! Message -> Classify (patterns + optional model) -> Extract slots ->
//! Resolve (complete command or clarification) -> Respond.
//!
//! ## Quick Start
//!
//! ```rust
//! use chrono::Utc;
//! use finchat_agentic::{Engine, EngineConfig, Message};
//!
//! let engine = Engine::new(EngineConfig::default());
//! let reply = engine.resolve(
//!     &Message::new("+50688880000", "gasté ₡5000 en almuerzo", Utc::now()),
//!     &[],
//!     None,
//! );
//! assert!(reply.command.is_some());
//! ```

// Core error handling
pub mod error;

// Domain types: intents, commands, scopes, memberships
pub mod intent;

// Static keyword, currency, role and category tables
pub mod lexicon;

// Pure slot extractors
pub mod extract;

// Pattern classification and the pattern/model merge
pub mod classify;

// Per-user pending questions and the context store
pub mod context;

// Model-backed classification contract and OpenAI client
pub mod model;

// The pure per-turn decision procedure
pub mod resolver;

// Outbound text templates
pub mod respond;

// Configuration
pub mod config;

// Stateful facade tying store + resolver together
pub mod engine;

pub use config::EngineConfig;
pub use context::{ContextStore, PendingQuestion, UserState};
pub use engine::{Engine, EngineReply};
pub use error::EngineError;
pub use extract::{DateRange, Slot, SlotName, SlotSet, SlotValue};
pub use intent::{
    Intent, Membership, Message, OrgRole, OrgType, ResolvedCommand, TxScope,
};
pub use model::{IntentModel, ModelClassification, ModelSlot, OpenAiIntentModel};
pub use resolver::{resolve_turn, ClarificationRequest, Resolution, TurnOutcome};
