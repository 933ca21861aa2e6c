// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! API request and response data transfer objects.
//!
//! Requests carry the acting operator inline (`actor_id`, `roles`,
//! optional `staff_id`); session issuance is outside this system.
//! Dates arrive as ISO 8601 strings and are parsed at the boundary.

use fieldops_domain::{
    AssigneeRef, AvailabilityRule, PlanningBoard, PlanningBoardItem, PlanningItemProposal,
    RuleKind, ScheduleConflict, SchedulePeriod, ShiftTradeRequest,
};
use serde::{Deserialize, Serialize};

/// A conflict as surfaced to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictInfo {
    /// Deterministic key, used to acknowledge warnings.
    pub id: String,
    /// The conflict type string.
    pub conflict_type: String,
    /// `blocking` or `warning`.
    pub severity: String,
    /// Whether the conflict blocks commit.
    pub is_blocking: bool,
    /// Human-readable description.
    pub message: String,
    /// The ticket the conflict is about.
    pub ticket_id: i64,
    /// The staff member affected, when staff-scoped.
    pub staff_id: Option<i64>,
}

impl ConflictInfo {
    /// Converts a domain conflict for the wire.
    #[must_use]
    pub fn from_conflict(conflict: &ScheduleConflict) -> Self {
        Self {
            id: conflict.key(),
            conflict_type: conflict.conflict_type.to_string(),
            severity: conflict.severity.to_string(),
            is_blocking: conflict.is_blocking(),
            message: conflict.message.clone(),
            ticket_id: conflict.ticket_id.value(),
            staff_id: conflict.staff_id.map(|s| s.value()),
        }
    }
}

/// An assignment as surfaced to callers. At most one side is set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentInfo {
    /// The staff assignee, if any.
    pub staff_id: Option<i64>,
    /// The subcontractor assignee, if any.
    pub subcontractor_id: Option<i64>,
}

impl AssignmentInfo {
    /// Converts an assignee reference for the wire.
    #[must_use]
    pub const fn from_assignee(assignee: AssigneeRef) -> Self {
        match assignee {
            AssigneeRef::Staff(staff) => Self {
                staff_id: Some(staff.value()),
                subcontractor_id: None,
            },
            AssigneeRef::Subcontractor(sub) => Self {
                staff_id: None,
                subcontractor_id: Some(sub.value()),
            },
        }
    }

    /// Converts an optional assignee, preserving absence.
    #[must_use]
    pub fn from_option(assignee: Option<AssigneeRef>) -> Option<Self> {
        assignee.map(Self::from_assignee)
    }
}

/// API request to apply a proposal to the live schedule.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ApplyItemRequest {
    /// The acting operator.
    pub actor_id: String,
    /// The acting operator's roles.
    pub roles: Vec<String>,
    /// The staff record the operator corresponds to, if any.
    #[serde(default)]
    pub staff_id: Option<i64>,
    /// The proposal to apply.
    pub proposal_id: i64,
    /// Warning keys the caller has acknowledged.
    #[serde(default)]
    pub acknowledged_warning_ids: Vec<String>,
    /// Whether to override an exclusively-locked-period blocking set.
    #[serde(default)]
    pub override_locked_period: bool,
    /// The recorded reason for the override.
    #[serde(default)]
    pub override_reason: Option<String>,
}

/// API response for a committed apply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplyItemResponse {
    /// The applied planning item.
    pub board_item_id: i64,
    /// The item's sync state after the commit.
    pub sync_state: String,
    /// The reassigned ticket.
    pub ticket_id: i64,
    /// The committed assignment.
    pub new_assignment: AssignmentInfo,
    /// Warnings that were acknowledged as part of this apply.
    pub acknowledged_warnings: Vec<ConflictInfo>,
    /// The audit event id, when the append succeeded.
    pub audit_event_id: Option<i64>,
    /// Dependent writes that exhausted retries; non-empty needs operator
    /// review.
    pub inconsistencies: Vec<String>,
}

/// API request to check an item for drift.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DriftCheckRequest {
    /// The acting operator.
    pub actor_id: String,
    /// The acting operator's roles.
    pub roles: Vec<String>,
    /// The staff record the operator corresponds to, if any.
    #[serde(default)]
    pub staff_id: Option<i64>,
}

/// API request to resolve a drifted item.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ResolveDriftRequest {
    /// The acting operator.
    pub actor_id: String,
    /// The acting operator's roles.
    pub roles: Vec<String>,
    /// The staff record the operator corresponds to, if any.
    #[serde(default)]
    pub staff_id: Option<i64>,
    /// `use_board_version` or `accept_schedule_version`.
    pub resolution: String,
}

/// API response for drift checks and resolutions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriftResponse {
    /// The item that was checked or resolved.
    pub board_item_id: i64,
    /// Whether the item had drifted.
    pub drifted: bool,
    /// The item's sync state after the operation.
    pub sync_state: String,
    /// The assignee the board records.
    pub board_assignee: Option<AssignmentInfo>,
    /// The assignee the live ticket records.
    pub live_assignee: Option<AssignmentInfo>,
}

/// API request to create a planning board.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreateBoardRequest {
    /// The acting operator.
    pub actor_id: String,
    /// The acting operator's roles.
    pub roles: Vec<String>,
    /// The staff record the operator corresponds to, if any.
    #[serde(default)]
    pub staff_id: Option<i64>,
    /// The date the board plans for (ISO 8601).
    pub board_date: String,
    /// Display label.
    pub label: String,
}

/// A planning board as surfaced to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardInfo {
    /// The board identifier.
    pub board_id: i64,
    /// The date the board plans for (ISO 8601).
    pub board_date: String,
    /// Display label.
    pub label: String,
}

impl BoardInfo {
    /// Converts a domain board for the wire.
    #[must_use]
    pub fn from_board(board: &PlanningBoard) -> Self {
        Self {
            board_id: board.id.value(),
            board_date: board.board_date.to_string(),
            label: board.label.clone(),
        }
    }
}

/// API request to add an item to a board.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreateItemRequest {
    /// The acting operator.
    pub actor_id: String,
    /// The acting operator's roles.
    pub roles: Vec<String>,
    /// The staff record the operator corresponds to, if any.
    #[serde(default)]
    pub staff_id: Option<i64>,
    /// `TICKET`, `NOTE` or `TASK`.
    #[serde(default = "default_item_kind")]
    pub item_kind: String,
    /// The live ticket this item mirrors, if any.
    #[serde(default)]
    pub ticket_id: Option<i64>,
    /// Display title.
    pub title: String,
    /// The staff assignee the board records initially, if any.
    #[serde(default)]
    pub current_assignee_staff_id: Option<i64>,
    /// The subcontractor assignee the board records initially, if any.
    #[serde(default)]
    pub current_assignee_subcontractor_id: Option<i64>,
}

fn default_item_kind() -> String {
    String::from("TICKET")
}

/// A planning item as surfaced to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemInfo {
    /// The item identifier.
    pub board_item_id: i64,
    /// The board the item belongs to.
    pub board_id: i64,
    /// The item kind.
    pub item_kind: String,
    /// The mirrored ticket, if any.
    pub ticket_id: Option<i64>,
    /// Display title.
    pub title: String,
    /// The recorded assignee, if any.
    pub assignee: Option<AssignmentInfo>,
    /// The sync state string.
    pub sync_state: String,
}

impl ItemInfo {
    /// Converts a domain item for the wire.
    #[must_use]
    pub fn from_item(item: &PlanningBoardItem) -> Self {
        Self {
            board_item_id: item.id.value(),
            board_id: item.board_id.value(),
            item_kind: item.kind.to_string(),
            ticket_id: item.ticket_id.map(|t| t.value()),
            title: item.title.clone(),
            assignee: AssignmentInfo::from_option(item.assignee),
            sync_state: item.sync_state.to_string(),
        }
    }
}

/// API request to stage a proposal against an item.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreateProposalRequest {
    /// The acting operator.
    pub actor_id: String,
    /// The acting operator's roles.
    pub roles: Vec<String>,
    /// The staff record the operator corresponds to, if any.
    #[serde(default)]
    pub staff_id: Option<i64>,
    /// The proposed staff assignee, if any.
    #[serde(default)]
    pub proposed_staff_id: Option<i64>,
    /// The proposed subcontractor assignee, if any.
    #[serde(default)]
    pub proposed_subcontractor_id: Option<i64>,
    /// Free-text justification.
    #[serde(default)]
    pub justification: Option<String>,
}

/// A proposal as surfaced to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalInfo {
    /// The proposal identifier.
    pub proposal_id: i64,
    /// The item the proposal targets.
    pub board_item_id: i64,
    /// The proposed assignee.
    pub proposed: AssignmentInfo,
    /// The apply state string.
    pub apply_state: String,
    /// Free-text justification.
    pub justification: Option<String>,
}

impl ProposalInfo {
    /// Converts a domain proposal for the wire.
    #[must_use]
    pub fn from_proposal(proposal: &PlanningItemProposal) -> Self {
        Self {
            proposal_id: proposal.id.value(),
            board_item_id: proposal.item_id.value(),
            proposed: AssignmentInfo::from_assignee(proposal.proposed),
            apply_state: proposal.apply_state.to_string(),
            justification: proposal.justification.clone(),
        }
    }
}

/// API request to create a schedule period.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreatePeriodRequest {
    /// The acting operator.
    pub actor_id: String,
    /// The acting operator's roles.
    pub roles: Vec<String>,
    /// The staff record the operator corresponds to, if any.
    #[serde(default)]
    pub staff_id: Option<i64>,
    /// The site the period covers.
    pub site_id: i64,
    /// Display name.
    pub period_name: String,
    /// First date (ISO 8601, inclusive).
    pub period_start: String,
    /// Last date (ISO 8601, inclusive).
    pub period_end: String,
}

/// A period lifecycle action request (publish, lock, archive, validate).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PeriodActionRequest {
    /// The acting operator.
    pub actor_id: String,
    /// The acting operator's roles.
    pub roles: Vec<String>,
    /// The staff record the operator corresponds to, if any.
    #[serde(default)]
    pub staff_id: Option<i64>,
}

/// A schedule period as surfaced to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodInfo {
    /// The period identifier.
    pub period_id: i64,
    /// The site the period covers.
    pub site_id: i64,
    /// Display name.
    pub period_name: String,
    /// First date (ISO 8601, inclusive).
    pub period_start: String,
    /// Last date (ISO 8601, inclusive).
    pub period_end: String,
    /// The lifecycle status string.
    pub status: String,
    /// Who published the period, if anyone.
    pub published_by: Option<String>,
    /// Who locked the period, if anyone.
    pub locked_by: Option<String>,
}

impl PeriodInfo {
    /// Converts a domain period for the wire.
    #[must_use]
    pub fn from_period(period: &SchedulePeriod) -> Self {
        Self {
            period_id: period.id.value(),
            site_id: period.site_id.value(),
            period_name: period.name.clone(),
            period_start: period.period_start.to_string(),
            period_end: period.period_end.to_string(),
            status: period.status.to_string(),
            published_by: period.published_by.clone(),
            locked_by: period.locked_by.clone(),
        }
    }
}

/// API response for a period validation sweep.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatePeriodResponse {
    /// The period that was swept.
    pub period_id: i64,
    /// How many tickets were checked.
    pub tickets_checked: usize,
    /// Every conflict found, in detector order.
    pub conflicts: Vec<ConflictInfo>,
}

/// API request to create an availability rule.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreateAvailabilityRequest {
    /// The acting operator.
    pub actor_id: String,
    /// The acting operator's roles.
    pub roles: Vec<String>,
    /// The staff record the operator corresponds to, if any.
    #[serde(default)]
    pub staff_id: Option<i64>,
    /// The staff member the rule is about.
    pub rule_staff_id: i64,
    /// `WEEKLY_RECURRING` or `ONE_OFF`.
    pub rule_type: String,
    /// `UNAVAILABLE`, `PREFERRED` or `NOT_PREFERRED`.
    pub availability_type: String,
    /// ISO weekday number (Monday = 1), for weekly rules.
    #[serde(default)]
    pub weekday: Option<u8>,
    /// Window start in minutes since midnight, for weekly rules.
    #[serde(default)]
    pub start_min: Option<u16>,
    /// Window end in minutes since midnight, for weekly rules.
    #[serde(default)]
    pub end_min: Option<u16>,
    /// First covered date (ISO 8601), for one-off rules.
    #[serde(default)]
    pub from_date: Option<String>,
    /// Last covered date (ISO 8601), for one-off rules.
    #[serde(default)]
    pub to_date: Option<String>,
    /// Free-text context.
    #[serde(default)]
    pub notes: Option<String>,
}

/// An availability rule as surfaced to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityRuleInfo {
    /// The rule identifier.
    pub rule_id: i64,
    /// The staff member the rule is about.
    pub staff_id: i64,
    /// The rule kind string.
    pub rule_type: String,
    /// The availability type string.
    pub availability_type: String,
    /// Free-text context.
    pub notes: Option<String>,
}

impl AvailabilityRuleInfo {
    /// Converts a domain rule for the wire.
    #[must_use]
    pub fn from_rule(rule: &AvailabilityRule) -> Self {
        let rule_type: &str = match rule.kind {
            RuleKind::WeeklyRecurring { .. } => "WEEKLY_RECURRING",
            RuleKind::OneOff { .. } => "ONE_OFF",
        };
        Self {
            rule_id: rule.id.value(),
            staff_id: rule.staff_id.value(),
            rule_type: rule_type.to_string(),
            availability_type: rule.availability.to_string(),
            notes: rule.notes.clone(),
        }
    }
}

/// API request to archive an availability rule.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ArchiveRuleRequest {
    /// The acting operator.
    pub actor_id: String,
    /// The acting operator's roles.
    pub roles: Vec<String>,
    /// The staff record the operator corresponds to, if any.
    #[serde(default)]
    pub staff_id: Option<i64>,
}

/// API request to request a shift trade.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreateTradeRequest {
    /// The acting operator.
    pub actor_id: String,
    /// The acting operator's roles.
    pub roles: Vec<String>,
    /// The staff record the operator corresponds to, if any.
    #[serde(default)]
    pub staff_id: Option<i64>,
    /// The ticket whose shift is traded.
    pub ticket_id: i64,
    /// The staff member giving up the shift.
    pub initiator_staff_id: i64,
    /// The staff member receiving the shift.
    pub target_staff_id: i64,
    /// `give_away` or `swap`.
    pub request_type: String,
    /// Note from the initiator.
    #[serde(default)]
    pub initiator_note: Option<String>,
}

/// A manager decision on a trade (apply/approve), with conflict policy
/// inputs.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TradeDecisionRequest {
    /// The acting operator.
    pub actor_id: String,
    /// The acting operator's roles.
    pub roles: Vec<String>,
    /// The staff record the operator corresponds to, if any.
    #[serde(default)]
    pub staff_id: Option<i64>,
    /// Warning keys the manager has acknowledged.
    #[serde(default)]
    pub acknowledged_warning_ids: Vec<String>,
    /// Whether to override an exclusively-locked-period blocking set.
    #[serde(default)]
    pub override_locked_period: bool,
    /// The recorded reason for the override.
    #[serde(default)]
    pub override_reason: Option<String>,
}

/// A participant action on a trade (accept/cancel) or a denial.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TradeActionRequest {
    /// The acting operator.
    pub actor_id: String,
    /// The acting operator's roles.
    pub roles: Vec<String>,
    /// The staff record the operator corresponds to, if any.
    #[serde(default)]
    pub staff_id: Option<i64>,
    /// Manager note, recorded on denial.
    #[serde(default)]
    pub manager_note: Option<String>,
}

/// A shift trade as surfaced to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeInfo {
    /// The trade identifier.
    pub trade_id: i64,
    /// The ticket whose shift is traded.
    pub ticket_id: i64,
    /// The staff member giving up the shift.
    pub initiator_staff_id: i64,
    /// The staff member receiving the shift.
    pub target_staff_id: i64,
    /// The request type string.
    pub request_type: String,
    /// The lifecycle status string.
    pub status: String,
    /// Note from the initiator.
    pub initiator_note: Option<String>,
    /// Manager note recorded on denial.
    pub manager_note: Option<String>,
}

impl TradeInfo {
    /// Converts a domain trade for the wire.
    #[must_use]
    pub fn from_trade(trade: &ShiftTradeRequest) -> Self {
        Self {
            trade_id: trade.id.value(),
            ticket_id: trade.ticket_id.value(),
            initiator_staff_id: trade.initiator_staff_id.value(),
            target_staff_id: trade.target_staff_id.value(),
            request_type: trade.request_type.to_string(),
            status: trade.status.to_string(),
            initiator_note: trade.initiator_note.clone(),
            manager_note: trade.manager_note.clone(),
        }
    }
}

/// API response for a committed trade apply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeApplyResponse {
    /// The trade after the commit.
    pub trade: TradeInfo,
    /// The reassigned ticket.
    pub ticket_id: i64,
    /// The committed assignment.
    pub new_assignment: AssignmentInfo,
    /// Dependent writes that exhausted retries; non-empty needs operator
    /// review.
    pub inconsistencies: Vec<String>,
}

/// An audit record as surfaced to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditRecordInfo {
    /// The append-order event identifier.
    pub event_id: i64,
    /// The action name.
    pub action: String,
    /// Optional action details.
    pub details: Option<String>,
    /// The state before the change.
    pub before: Option<serde_json::Value>,
    /// The state after the change.
    pub after: Option<serde_json::Value>,
    /// The actor who made the change.
    pub actor_id: String,
    /// The actor type.
    pub actor_type: String,
    /// The operation tag that caused the change.
    pub cause: String,
}

/// Whether an action is permitted for the current actor.
///
/// Capabilities are advisory only and never replace the checks run by
/// the engine itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// The action is permitted.
    Allowed,
    /// The action is denied.
    Denied,
}

impl Capability {
    /// Builds a capability from a boolean decision.
    #[must_use]
    pub const fn from_bool(allowed: bool) -> Self {
        if allowed { Self::Allowed } else { Self::Denied }
    }

    /// Returns true if the capability is allowed.
    #[must_use]
    pub const fn is_allowed(self) -> bool {
        matches!(self, Self::Allowed)
    }
}

/// Schedule capabilities for UI gating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleCapabilities {
    /// May stage, apply and resolve planning changes.
    pub can_manage_schedule: Capability,
    /// May publish, lock and archive periods.
    pub can_publish_schedule: Capability,
    /// May override locked periods with a reason.
    pub can_override_locked_period: Capability,
    /// May approve, apply and deny trades.
    pub can_approve_trade: Capability,
}
