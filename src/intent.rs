//! Intent and command types for the finance chat engine
//!
//! These structures represent what the user wants to achieve, extracted
//! from a free-text chat message. An `Intent` is the bare classification;
//! a `ResolvedCommand` is an intent with every required slot populated,
//! ready to hand to the command-execution collaborator.
//!
//! # Design Principles
//!
//! 1. **Closed Enum**: the engine only ever classifies into known intents
//! 2. **Validated Structure**: serde handles JSON <-> struct validation
//! 3. **No Transport Knowledge**: nothing here knows about webhooks or
//!    message delivery

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::extract::DateRange;

/// An inbound chat message. Immutable, created once per webhook call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Opaque external identity of the sender (e.g. a phone number).
    pub sender_id: String,
    /// Raw message text.
    pub text: String,
    /// When the message was received.
    pub received_at: DateTime<Utc>,
}

impl Message {
    pub fn new(sender_id: impl Into<String>, text: impl Into<String>, received_at: DateTime<Utc>) -> Self {
        Self {
            sender_id: sender_id.into(),
            text: text.into(),
            received_at,
        }
    }
}

/// All intents the engine can classify into.
///
/// This is a CLOSED set - adding a capability means adding a variant here,
/// a trigger table entry, and a `ResolvedCommand` arm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    CreateOrganization,
    InviteMember,
    ListMembers,
    AcceptInvitation,
    LeaveOrganization,
    RecordExpense,
    RecordIncome,
    RequestReport,
    HelpRequest,
    Unknown,
}

impl Intent {
    /// Stable name for logging/debugging.
    pub fn name(&self) -> &'static str {
        match self {
            Intent::CreateOrganization => "create_organization",
            Intent::InviteMember => "invite_member",
            Intent::ListMembers => "list_members",
            Intent::AcceptInvitation => "accept_invitation",
            Intent::LeaveOrganization => "leave_organization",
            Intent::RecordExpense => "record_expense",
            Intent::RecordIncome => "record_income",
            Intent::RequestReport => "request_report",
            Intent::HelpRequest => "help_request",
            Intent::Unknown => "unknown",
        }
    }

    /// Whether commands of this intent apply within a shared organization.
    pub fn is_organization_scoped(&self) -> bool {
        matches!(
            self,
            Intent::InviteMember
                | Intent::ListMembers
                | Intent::LeaveOrganization
                | Intent::RecordExpense
                | Intent::RecordIncome
        )
    }
}

/// Organization kinds, from family groups up to whole companies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrgType {
    Family,
    Team,
    Department,
    Company,
}

impl OrgType {
    /// Spanish display name used in outbound text.
    pub fn display_es(&self) -> &'static str {
        match self {
            OrgType::Family => "familia",
            OrgType::Team => "equipo",
            OrgType::Department => "departamento",
            OrgType::Company => "empresa",
        }
    }
}

/// Roles within an organization, in decreasing permission order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrgRole {
    Owner,
    Admin,
    Manager,
    Member,
    Viewer,
    Accountant,
}

/// Where a transaction or report lands: the sender's personal ledger or a
/// shared organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "scope", rename_all = "snake_case")]
pub enum TxScope {
    Personal,
    Organization { id: Uuid },
}

/// One organization the sender belongs to, with their role in it.
///
/// Read-only input supplied by the persistence collaborator before each
/// `resolve` call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Membership {
    pub organization_id: Uuid,
    pub name: String,
    pub org_type: OrgType,
    pub role: OrgRole,
}

/// A fully-populated command, ready for the execution collaborator.
///
/// Invariant: every required slot of the corresponding intent is present.
/// The resolver never emits a partially filled command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "intent", rename_all = "snake_case")]
pub enum ResolvedCommand {
    CreateOrganization {
        org_type: OrgType,
        name: String,
    },
    InviteMember {
        phone_number: String,
        role: OrgRole,
        organization: Option<Uuid>,
    },
    ListMembers {
        organization: Option<Uuid>,
    },
    AcceptInvitation,
    LeaveOrganization {
        organization: Option<Uuid>,
    },
    RecordExpense {
        amount: Decimal,
        currency: String,
        category: Option<String>,
        description: String,
        target: TxScope,
    },
    RecordIncome {
        amount: Decimal,
        currency: String,
        category: Option<String>,
        description: String,
        target: TxScope,
    },
    RequestReport {
        period: DateRange,
        target: TxScope,
    },
    Help,
}

impl ResolvedCommand {
    /// The intent this command completes.
    pub fn intent(&self) -> Intent {
        match self {
            ResolvedCommand::CreateOrganization { .. } => Intent::CreateOrganization,
            ResolvedCommand::InviteMember { .. } => Intent::InviteMember,
            ResolvedCommand::ListMembers { .. } => Intent::ListMembers,
            ResolvedCommand::AcceptInvitation => Intent::AcceptInvitation,
            ResolvedCommand::LeaveOrganization { .. } => Intent::LeaveOrganization,
            ResolvedCommand::RecordExpense { .. } => Intent::RecordExpense,
            ResolvedCommand::RecordIncome { .. } => Intent::RecordIncome,
            ResolvedCommand::RequestReport { .. } => Intent::RequestReport,
            ResolvedCommand::Help => Intent::HelpRequest,
        }
    }

    /// Check if this command mutates state when executed.
    pub fn is_mutating(&self) -> bool {
        !matches!(
            self,
            ResolvedCommand::ListMembers { .. }
                | ResolvedCommand::RequestReport { .. }
                | ResolvedCommand::Help
        )
    }
}
