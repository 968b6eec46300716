//! Slot extraction from raw message text
//!
//! Every extractor is a pure function: same text (and same reference time,
//! where one applies) always gives the same result, independent of call
//! order. Extraction never fails - text that carries no usable value simply
//! yields `None`, which the resolver treats as a still-missing slot.

pub mod amount;
pub mod organization;
pub mod period;
pub mod phone;
pub mod role;

pub use amount::{extract_amount, AmountMatch};
pub use organization::{extract_org_scope, extract_org_type_and_name, OrgNameMatch};
pub use period::{extract_period, DateRange};
pub use phone::extract_phone;
pub use role::extract_role;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::intent::{OrgRole, OrgType, TxScope};

/// Names of the slots the engine knows how to ask for and fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotName {
    Amount,
    PhoneNumber,
    Role,
    OrgType,
    OrgName,
    Period,
    Category,
    TargetOrganization,
}

/// Where an extracted value came from. Pattern-sourced values are only
/// displaced by model-sourced ones with strictly higher confidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotSource {
    Pattern,
    Model,
}

/// A typed extracted value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum SlotValue {
    Amount { amount: Decimal, currency: String },
    Phone(String),
    Role(OrgRole),
    OrgType(OrgType),
    Text(String),
    Period(DateRange),
    Scope(TxScope),
}

/// A named slot with provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Slot {
    pub name: SlotName,
    pub value: SlotValue,
    pub confidence: f32,
    pub source: SlotSource,
}

impl Slot {
    pub fn pattern(name: SlotName, value: SlotValue, confidence: f32) -> Self {
        Self {
            name,
            value,
            confidence,
            source: SlotSource::Pattern,
        }
    }

    pub fn model(name: SlotName, value: SlotValue, confidence: f32) -> Self {
        Self {
            name,
            value,
            confidence,
            source: SlotSource::Model,
        }
    }
}

/// The slots gathered for one turn, at most one value per name.
#[derive(Debug, Clone, Default)]
pub struct SlotSet {
    slots: Vec<Slot>,
}

impl SlotSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: SlotName) -> Option<&Slot> {
        self.slots.iter().find(|s| s.name == name)
    }

    pub fn contains(&self, name: SlotName) -> bool {
        self.get(name).is_some()
    }

    /// Insert unconditionally, replacing any slot of the same name.
    pub fn insert(&mut self, slot: Slot) {
        self.slots.retain(|s| s.name != slot.name);
        self.slots.push(slot);
    }

    /// Insert only if the slot is new, or strictly more confident than the
    /// existing one. A model-sourced slot never displaces an equally
    /// confident pattern-sourced slot.
    pub fn insert_if_stronger(&mut self, slot: Slot) {
        match self.get(slot.name) {
            Some(existing) if slot.confidence <= existing.confidence => {}
            _ => self.insert(slot),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Slot> {
        self.slots.iter()
    }
}

/// Build a `DateRange` covering a single day. Shared test/reporting helper.
pub fn single_day(date: NaiveDate) -> DateRange {
    DateRange { start: date, end: date }
}
