// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::error::DomainError;
use crate::period_status::PeriodStatus;
use crate::sync_state::SyncState;
use crate::time_window::TimeWindow;
use crate::trade_status::{TradeRequestType, TradeStatus};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use time::{Date, OffsetDateTime};

/// Generates a canonical numeric identifier newtype.
///
/// Identifiers are opaque row identifiers assigned by the store.
macro_rules! entity_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Creates an identifier from its raw value.
            #[must_use]
            pub const fn new(value: i64) -> Self {
                Self(value)
            }

            /// Returns the raw identifier value.
            #[must_use]
            pub const fn value(&self) -> i64 {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

entity_id!(
    /// Identifier of a live work ticket.
    TicketId
);
entity_id!(
    /// Identifier of a staff member.
    StaffId
);
entity_id!(
    /// Identifier of a subcontractor.
    SubcontractorId
);
entity_id!(
    /// Identifier of a service site.
    SiteId
);
entity_id!(
    /// Identifier of a schedule period.
    PeriodId
);
entity_id!(
    /// Identifier of a planning board.
    BoardId
);
entity_id!(
    /// Identifier of a planning board item.
    ItemId
);
entity_id!(
    /// Identifier of a planning item proposal.
    ProposalId
);
entity_id!(
    /// Identifier of a shift-trade request.
    TradeId
);
entity_id!(
    /// Identifier of a staff availability rule.
    RuleId
);

/// Opaque optimistic-concurrency version token.
///
/// Every mutable row carries a version; a write must supply the version it
/// read and fails if the stored version has since changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VersionToken(i64);

impl VersionToken {
    /// Creates a token from its raw value.
    #[must_use]
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    /// Returns the raw version value.
    #[must_use]
    pub const fn value(&self) -> i64 {
        self.0
    }

    /// The token following this one after a successful write.
    #[must_use]
    pub const fn next(&self) -> Self {
        Self(self.0 + 1)
    }
}

impl std::fmt::Display for VersionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The party a ticket or draft is assigned to.
///
/// Exactly one of staff or subcontractor, enforced by construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssigneeRef {
    /// An in-house staff member.
    Staff(StaffId),
    /// An external subcontractor.
    Subcontractor(SubcontractorId),
}

impl AssigneeRef {
    /// The staff id, if this assignee is a staff member.
    #[must_use]
    pub const fn staff_id(&self) -> Option<StaffId> {
        match self {
            Self::Staff(id) => Some(*id),
            Self::Subcontractor(_) => None,
        }
    }

    /// The subcontractor id, if this assignee is a subcontractor.
    #[must_use]
    pub const fn subcontractor_id(&self) -> Option<SubcontractorId> {
        match self {
            Self::Staff(_) => None,
            Self::Subcontractor(id) => Some(*id),
        }
    }
}

impl std::fmt::Display for AssigneeRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Staff(id) => write!(f, "staff:{id}"),
            Self::Subcontractor(id) => write!(f, "subcontractor:{id}"),
        }
    }
}

/// Lifecycle states of a live work ticket.
///
/// The ticket lifecycle is owned by the schedule domain; this core only
/// needs to know which tickets still occupy their time window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TicketStatus {
    /// Scheduled and occupying its window.
    Scheduled,
    /// Work underway.
    InProgress,
    /// Work finished.
    Completed,
    /// Completion verified by a supervisor.
    Verified,
    /// Canceled; no longer occupies its window.
    Canceled,
}

impl TicketStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Scheduled => "SCHEDULED",
            Self::InProgress => "IN_PROGRESS",
            Self::Completed => "COMPLETED",
            Self::Verified => "VERIFIED",
            Self::Canceled => "CANCELED",
        }
    }

    /// Returns true if the ticket still occupies its scheduled window.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        !matches!(self, Self::Canceled)
    }
}

impl FromStr for TicketStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SCHEDULED" => Ok(Self::Scheduled),
            "IN_PROGRESS" => Ok(Self::InProgress),
            "COMPLETED" => Ok(Self::Completed),
            "VERIFIED" => Ok(Self::Verified),
            "CANCELED" => Ok(Self::Canceled),
            _ => Err(DomainError::InvalidTicketStatus(s.to_string())),
        }
    }
}

impl std::fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A live, scheduled unit of work.
///
/// Assignment fields are mutated only through the orchestrated apply and
/// trade paths, never directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkTicket {
    /// The ticket identifier.
    pub id: TicketId,
    /// The site the work takes place at.
    pub site_id: SiteId,
    /// The schedule period the ticket belongs to.
    pub period_id: PeriodId,
    /// The scheduled calendar date.
    pub scheduled_date: Date,
    /// The scheduled time window.
    pub window: TimeWindow,
    /// The ticket lifecycle status.
    pub status: TicketStatus,
    /// The current assignee, if any.
    pub assignee: Option<AssigneeRef>,
    /// Certification code the assignee must hold, if the work requires one.
    pub required_certification: Option<String>,
}

/// Kinds of planning board items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ItemKind {
    /// Mirrors a live work ticket.
    Ticket,
    /// Free-form note; never syncs.
    Note,
    /// Ad-hoc task; never syncs.
    Task,
}

impl ItemKind {
    /// Returns the string representation of the kind.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Ticket => "TICKET",
            Self::Note => "NOTE",
            Self::Task => "TASK",
        }
    }
}

impl FromStr for ItemKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "TICKET" => Ok(Self::Ticket),
            "NOTE" => Ok(Self::Note),
            "TASK" => Ok(Self::Task),
            _ => Err(DomainError::InvalidItemKind(s.to_string())),
        }
    }
}

impl std::fmt::Display for ItemKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A per-date draft surface where reassignments are staged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanningBoard {
    /// The board identifier.
    pub id: BoardId,
    /// The date the board plans for.
    pub board_date: Date,
    /// A display label for the board.
    pub label: String,
}

/// A draft entry on a planning board.
///
/// Items are never physically deleted, only superseded by state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanningBoardItem {
    /// The item identifier.
    pub id: ItemId,
    /// The board this item belongs to.
    pub board_id: BoardId,
    /// The kind of item.
    pub kind: ItemKind,
    /// The live ticket this item mirrors, if any.
    pub ticket_id: Option<TicketId>,
    /// A display title.
    pub title: String,
    /// The assignee the board currently records for this item.
    pub assignee: Option<AssigneeRef>,
    /// The sync lifecycle state.
    pub sync_state: SyncState,
}

/// The apply lifecycle of a proposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplyState {
    /// Staged; not yet validated against the live schedule.
    Draft,
    /// Validated against the live schedule; awaiting commit.
    Validated,
    /// Committed to the live schedule. Terminal.
    Applied,
    /// Rejected. Terminal.
    Rejected,
}

impl ApplyState {
    /// Returns the string representation of the state.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Validated => "validated",
            Self::Applied => "applied",
            Self::Rejected => "rejected",
        }
    }

    /// Returns true while the proposal can still be applied.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        matches!(self, Self::Draft | Self::Validated)
    }

    /// Returns true if this state is terminal.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Applied | Self::Rejected)
    }

    /// Checks if a transition from this state to another is valid.
    #[must_use]
    pub const fn can_transition_to(&self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Draft, Self::Validated | Self::Applied | Self::Rejected)
                | (Self::Validated, Self::Applied | Self::Rejected)
        )
    }

    /// Validates a transition from this state to another.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidApplyStateTransition` if the transition
    /// is not permitted.
    pub const fn validate_transition(&self, target: Self) -> Result<(), DomainError> {
        if self.can_transition_to(target) {
            Ok(())
        } else {
            Err(DomainError::InvalidApplyStateTransition {
                from: *self,
                to: target,
            })
        }
    }

    /// All states, in a stable order. Used by exhaustive tests.
    #[must_use]
    pub const fn all() -> [Self; 4] {
        [Self::Draft, Self::Validated, Self::Applied, Self::Rejected]
    }
}

impl FromStr for ApplyState {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(Self::Draft),
            "validated" => Ok(Self::Validated),
            "applied" => Ok(Self::Applied),
            "rejected" => Ok(Self::Rejected),
            _ => Err(DomainError::InvalidApplyState(s.to_string())),
        }
    }
}

impl std::fmt::Display for ApplyState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A candidate reassignment staged against a planning item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanningItemProposal {
    /// The proposal identifier.
    pub id: ProposalId,
    /// The planning item the proposal targets.
    pub item_id: ItemId,
    /// The proposed new assignee.
    pub proposed: AssigneeRef,
    /// The apply lifecycle state.
    pub apply_state: ApplyState,
    /// Free-text justification from the supervisor.
    pub justification: Option<String>,
    /// When the proposal was staged.
    pub created_at: OffsetDateTime,
}

/// A bounded, lockable window of the live schedule for one site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulePeriod {
    /// The period identifier.
    pub id: PeriodId,
    /// The site the period covers.
    pub site_id: SiteId,
    /// A display name, e.g. "March week 2".
    pub name: String,
    /// First date of the period (inclusive).
    pub period_start: Date,
    /// Last date of the period (inclusive).
    pub period_end: Date,
    /// The lifecycle status.
    pub status: PeriodStatus,
    /// When the period was published, if it has been.
    pub published_at: Option<OffsetDateTime>,
    /// Who published the period.
    pub published_by: Option<String>,
    /// When the period was locked, if it has been.
    pub locked_at: Option<OffsetDateTime>,
    /// Who locked the period.
    pub locked_by: Option<String>,
}

/// A shift-trade request between two staff members.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShiftTradeRequest {
    /// The trade identifier.
    pub id: TradeId,
    /// The ticket whose shift is being traded.
    pub ticket_id: TicketId,
    /// The staff member giving up the shift.
    pub initiator_staff_id: StaffId,
    /// The staff member receiving the shift.
    pub target_staff_id: StaffId,
    /// The kind of trade.
    pub request_type: TradeRequestType,
    /// The lifecycle status.
    pub status: TradeStatus,
    /// Note from the initiator, shown to the target and managers.
    pub initiator_note: Option<String>,
    /// Manager note recorded on denial.
    pub manager_note: Option<String>,
    /// When the trade was requested.
    pub requested_at: OffsetDateTime,
    /// When the target accepted, if they have.
    pub accepted_at: Option<OffsetDateTime>,
    /// When a manager approved, if they have.
    pub approved_at: Option<OffsetDateTime>,
    /// When the reassignment was committed, if it was.
    pub applied_at: Option<OffsetDateTime>,
    /// When the trade reached a terminal denied/canceled state.
    pub resolved_at: Option<OffsetDateTime>,
}

/// Read-only staff directory record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaffRecord {
    /// The staff identifier.
    pub id: StaffId,
    /// Display name.
    pub full_name: String,
    /// Certification codes the staff member holds.
    pub certifications: Vec<String>,
    /// Whether the staff member is active.
    pub active: bool,
}

/// An existing assignment occupying a staff member's time.
///
/// This is the read model returned when listing a staff member's active
/// tickets for a date; it feeds the conflict detector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    /// The ticket occupying the window.
    pub ticket_id: TicketId,
    /// The date of the assignment.
    pub date: Date,
    /// The occupied time window.
    pub window: TimeWindow,
    /// The ticket status.
    pub status: TicketStatus,
}
