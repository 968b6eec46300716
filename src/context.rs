//! Per-user conversational context.
//!
//! Each user has at most one `PendingQuestion` - the expectation that their
//! next message supplies a specific missing slot - plus a counter of
//! consecutive turns the engine failed to understand. Expiry is checked
//! lazily on access; an expired entry reads as absent and is not actively
//! evicted.
//!
//! The store is the engine's only mutable shared state. A turn's whole
//! read-modify-write for one sender happens under the store lock, so
//! concurrent messages from the same sender cannot race on the same
//! pending question. Different senders never share an entry.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::extract::SlotName;
use crate::intent::Intent;

/// Stored expectation that a user's next message answers a question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingQuestion {
    pub user_id: String,
    /// The intent awaiting completion.
    pub asked_intent: Intent,
    /// The single slot the question asked for.
    pub missing_slot: SlotName,
    /// The original utterance plus every partial answer so far; turns
    /// re-extract from this text rather than storing a slot sequence, and
    /// completed commands carry it as their description.
    pub accumulated_text: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl PendingQuestion {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Per-user conversational state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserState {
    pub pending: Option<PendingQuestion>,
    /// Consecutive turns classified Unknown; at the configured limit the
    /// resolver substitutes a help response instead of looping.
    pub unknown_streak: u8,
}

impl UserState {
    /// The live pending question, treating an expired one as absent.
    pub fn active_pending(&self, now: DateTime<Utc>) -> Option<&PendingQuestion> {
        self.pending.as_ref().filter(|p| !p.is_expired(now))
    }
}

/// Keyed store of per-user state.
#[derive(Debug, Default)]
pub struct ContextStore {
    states: Mutex<HashMap<String, UserState>>,
}

impl ContextStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` with exclusive access to one user's state.
    ///
    /// This is the per-sender atomicity boundary: the closure sees a
    /// consistent snapshot and its writes land before any other message
    /// from the same sender is processed.
    pub fn with_user<R>(&self, user_id: &str, f: impl FnOnce(&mut UserState) -> R) -> R {
        let mut states = self.states.lock().expect("context store lock poisoned");
        let state = states.entry(user_id.to_string()).or_default();
        f(state)
    }

    /// Snapshot a user's state (for inspection/tests).
    pub fn get(&self, user_id: &str) -> UserState {
        let states = self.states.lock().expect("context store lock poisoned");
        states.get(user_id).cloned().unwrap_or_default()
    }

    /// Drop expired entries. Optional housekeeping; correctness never
    /// depends on it because reads filter expired state themselves.
    pub fn sweep_expired(&self, now: DateTime<Utc>) {
        let mut states = self.states.lock().expect("context store lock poisoned");
        states.retain(|_, s| {
            s.unknown_streak > 0 || s.pending.as_ref().is_some_and(|p| !p.is_expired(now))
        });
    }
}
