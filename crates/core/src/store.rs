// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Repository contracts the engine runs against.
//!
//! The underlying store is an ACID row store with per-row optimistic
//! concurrency; no cross-row transaction is assumed. Every mutable row
//! carries a version token, and versioned writes fail with
//! `StoreError::VersionConflict` when the stored version has moved.

use crate::error::StoreError;
use fieldops_audit::AuditRecord;
use fieldops_domain::{
    ApplyState, Assignment, AssigneeRef, AvailabilityRule, AvailabilityType, BoardId, ItemId,
    ItemKind, PeriodId, PeriodStatus, PlanningBoard, PlanningBoardItem, PlanningItemProposal,
    ProposalId, RuleId, RuleKind, ScheduleConflict, SchedulePeriod, Severity, ShiftTradeRequest,
    SiteId, StaffId, StaffRecord, SyncState, TicketId, TradeId, TradeRequestType, TradeStatus,
    VersionToken, WorkTicket,
};
use time::{Date, OffsetDateTime};

/// A row together with the version token it was read at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Versioned<T> {
    /// The row value.
    pub value: T,
    /// The version the row was read at.
    pub version: VersionToken,
}

impl<T> Versioned<T> {
    /// Pairs a value with its version.
    #[must_use]
    pub const fn new(value: T, version: VersionToken) -> Self {
        Self { value, version }
    }
}

/// Fields for creating a schedule period.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPeriod {
    /// The site the period covers.
    pub site_id: SiteId,
    /// Display name.
    pub name: String,
    /// First date (inclusive).
    pub period_start: Date,
    /// Last date (inclusive).
    pub period_end: Date,
}

/// Fields for creating a planning board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBoard {
    /// The date the board plans for.
    pub board_date: Date,
    /// Display label.
    pub label: String,
}

/// Fields for creating a planning board item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewItem {
    /// The board the item belongs to.
    pub board_id: BoardId,
    /// The kind of item.
    pub kind: ItemKind,
    /// The live ticket the item mirrors, if any.
    pub ticket_id: Option<TicketId>,
    /// Display title.
    pub title: String,
    /// The assignee the board records initially.
    pub assignee: Option<AssigneeRef>,
}

/// Fields for staging a proposal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProposal {
    /// The item the proposal targets.
    pub item_id: ItemId,
    /// The proposed new assignee.
    pub proposed: AssigneeRef,
    /// Free-text justification.
    pub justification: Option<String>,
}

/// Fields for creating an availability rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRule {
    /// The staff member the rule is about.
    pub staff_id: StaffId,
    /// When the rule applies.
    pub kind: RuleKind,
    /// What the rule says.
    pub availability: AvailabilityType,
    /// Free-text context.
    pub notes: Option<String>,
}

/// Fields for requesting a shift trade.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTrade {
    /// The ticket whose shift is traded.
    pub ticket_id: TicketId,
    /// The staff member giving up the shift.
    pub initiator_staff_id: StaffId,
    /// The staff member receiving the shift.
    pub target_staff_id: StaffId,
    /// The kind of trade.
    pub request_type: TradeRequestType,
    /// Note from the initiator.
    pub initiator_note: Option<String>,
}

/// An in-app notification row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// The staff member to notify.
    pub staff_id: StaffId,
    /// Short title.
    pub title: String,
    /// Body text.
    pub body: String,
    /// Deep link into the schedule surface.
    pub link: Option<String>,
}

/// A conflict persisted by a period validation sweep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedConflict {
    /// The row identifier.
    pub id: i64,
    /// The period the sweep covered.
    pub period_id: PeriodId,
    /// The detected conflict.
    pub conflict: ScheduleConflict,
    /// When the sweep ran.
    pub detected_at: OffsetDateTime,
}

/// An audit record with its assigned event id and timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredAuditRecord {
    /// The append-order event identifier.
    pub event_id: i64,
    /// The record.
    pub record: AuditRecord,
    /// When the record was appended.
    pub recorded_at: OffsetDateTime,
}

/// Filter for listing schedule periods.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PeriodFilter {
    /// Restrict to one site.
    pub site_id: Option<SiteId>,
    /// Restrict to one status.
    pub status: Option<PeriodStatus>,
}

/// Filter for listing shift trades.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TradeFilter {
    /// Restrict to one ticket.
    pub ticket_id: Option<TicketId>,
    /// Restrict to one status.
    pub status: Option<TradeStatus>,
}

/// Filter for listing persisted conflicts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConflictFilter {
    /// Restrict to one period.
    pub period_id: Option<PeriodId>,
    /// Restrict to one severity.
    pub severity: Option<Severity>,
    /// Only blocking conflicts.
    pub blocking_only: bool,
}

/// The repository surface the engine is generic over.
///
/// Implementations must satisfy the optimistic-concurrency contract:
/// versioned updates compare the supplied token against the stored row
/// and fail with `StoreError::VersionConflict` on mismatch, mutating
/// nothing. All reads reflect committed state.
#[allow(clippy::missing_errors_doc)]
pub trait ScheduleStore {
    // --- Work tickets -----------------------------------------------------

    /// Loads a ticket with its current version token.
    fn load_ticket(&mut self, id: TicketId) -> Result<Versioned<WorkTicket>, StoreError>;

    /// Conditionally updates a ticket's assignment fields.
    ///
    /// This is the single authoritative write of the apply and trade
    /// commits; it must be atomic per row.
    fn update_ticket_assignment(
        &mut self,
        id: TicketId,
        version: VersionToken,
        assignee: Option<AssigneeRef>,
    ) -> Result<Versioned<WorkTicket>, StoreError>;

    /// Lists the tickets inside a period, including unassigned ones.
    fn list_tickets_in_period(&mut self, period_id: PeriodId)
    -> Result<Vec<WorkTicket>, StoreError>;

    // --- Schedule periods -------------------------------------------------

    /// Loads a period.
    fn load_period(&mut self, id: PeriodId) -> Result<SchedulePeriod, StoreError>;

    /// Inserts a period in `DRAFT` status.
    fn insert_period(&mut self, period: &NewPeriod) -> Result<SchedulePeriod, StoreError>;

    /// Writes a period's status and the matching lifecycle stamp.
    fn update_period_status(
        &mut self,
        id: PeriodId,
        status: PeriodStatus,
        stamped_by: &str,
        stamped_at: OffsetDateTime,
    ) -> Result<SchedulePeriod, StoreError>;

    /// Lists periods matching the filter, newest first.
    fn list_periods(&mut self, filter: &PeriodFilter) -> Result<Vec<SchedulePeriod>, StoreError>;

    // --- Staff schedule reads ---------------------------------------------

    /// Lists a staff member's active (non-canceled) assignments on a date.
    fn list_active_assignments_for_staff_on_date(
        &mut self,
        staff_id: StaffId,
        date: Date,
    ) -> Result<Vec<Assignment>, StoreError>;

    /// Loads the unarchived availability rules for a staff member.
    fn load_availability_rules(
        &mut self,
        staff_id: StaffId,
    ) -> Result<Vec<AvailabilityRule>, StoreError>;

    /// Loads a staff directory record.
    fn load_staff(&mut self, id: StaffId) -> Result<StaffRecord, StoreError>;

    // --- Planning boards --------------------------------------------------

    /// Inserts a planning board.
    fn insert_board(&mut self, board: &NewBoard) -> Result<PlanningBoard, StoreError>;

    /// Lists planning boards, newest first.
    fn list_boards(&mut self) -> Result<Vec<PlanningBoard>, StoreError>;

    /// Inserts a planning item in `synced` state.
    fn insert_item(&mut self, item: &NewItem) -> Result<PlanningBoardItem, StoreError>;

    /// Loads a planning item with its current version token.
    fn load_item(&mut self, id: ItemId) -> Result<Versioned<PlanningBoardItem>, StoreError>;

    /// Lists the items on a board.
    fn list_items(&mut self, board_id: BoardId) -> Result<Vec<PlanningBoardItem>, StoreError>;

    /// Conditionally updates an item's sync state and recorded assignee.
    fn update_item_sync_state(
        &mut self,
        id: ItemId,
        version: VersionToken,
        state: SyncState,
        assignee: Option<AssigneeRef>,
    ) -> Result<Versioned<PlanningBoardItem>, StoreError>;

    /// Inserts a proposal in `draft` apply state.
    fn insert_proposal(
        &mut self,
        proposal: &NewProposal,
        created_at: OffsetDateTime,
    ) -> Result<PlanningItemProposal, StoreError>;

    /// Loads a proposal.
    fn load_proposal(&mut self, id: ProposalId) -> Result<PlanningItemProposal, StoreError>;

    /// The most recently staged still-active proposal for an item, if any.
    fn latest_active_proposal(
        &mut self,
        item_id: ItemId,
    ) -> Result<Option<PlanningItemProposal>, StoreError>;

    /// Writes a proposal's apply state.
    fn update_proposal_apply_state(
        &mut self,
        id: ProposalId,
        state: ApplyState,
    ) -> Result<(), StoreError>;

    // --- Shift trades -----------------------------------------------------

    /// Inserts a trade in `requested` status.
    fn insert_trade(
        &mut self,
        trade: &NewTrade,
        requested_at: OffsetDateTime,
    ) -> Result<ShiftTradeRequest, StoreError>;

    /// Loads a trade.
    fn load_trade(&mut self, id: TradeId) -> Result<ShiftTradeRequest, StoreError>;

    /// Lists trades matching the filter, newest first.
    fn list_trades(&mut self, filter: &TradeFilter)
    -> Result<Vec<ShiftTradeRequest>, StoreError>;

    /// Writes a trade's status, the per-transition timestamp, and an
    /// optional manager note.
    fn update_trade_status(
        &mut self,
        id: TradeId,
        status: TradeStatus,
        at: OffsetDateTime,
        manager_note: Option<&str>,
    ) -> Result<ShiftTradeRequest, StoreError>;

    // --- Availability rules -----------------------------------------------

    /// Inserts an availability rule.
    fn insert_availability_rule(&mut self, rule: &NewRule)
    -> Result<AvailabilityRule, StoreError>;

    /// Loads an unarchived availability rule.
    fn load_availability_rule(&mut self, id: RuleId) -> Result<AvailabilityRule, StoreError>;

    /// Soft-archives an availability rule.
    fn archive_availability_rule(
        &mut self,
        id: RuleId,
        archived_by: &str,
        archived_at: OffsetDateTime,
    ) -> Result<AvailabilityRule, StoreError>;

    // --- Conflicts --------------------------------------------------------

    /// Replaces the persisted conflicts for a period with a fresh sweep.
    fn record_conflicts(
        &mut self,
        period_id: PeriodId,
        conflicts: &[ScheduleConflict],
        detected_at: OffsetDateTime,
    ) -> Result<(), StoreError>;

    /// Lists persisted conflicts matching the filter.
    fn list_conflicts(
        &mut self,
        filter: &ConflictFilter,
    ) -> Result<Vec<PersistedConflict>, StoreError>;

    // --- Audit + notifications --------------------------------------------

    /// Appends an immutable audit record, returning its event id.
    fn append_audit_record(
        &mut self,
        record: &AuditRecord,
        recorded_at: OffsetDateTime,
    ) -> Result<i64, StoreError>;

    /// Lists the audit timeline for an entity, newest first.
    fn list_audit_records(
        &mut self,
        entity_type: &str,
        entity_id: &str,
    ) -> Result<Vec<StoredAuditRecord>, StoreError>;

    /// Appends an in-app notification.
    fn append_notification(
        &mut self,
        notification: &Notification,
        created_at: OffsetDateTime,
    ) -> Result<(), StoreError>;
}
