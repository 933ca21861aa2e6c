// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! The shift-trade workflow.
//!
//! Trades and planning-board applies are two front-ends onto one
//! conflict-resolution core: every manager-gated transition re-runs the
//! conflict detector against the target staff member with the same
//! blocking/warning policy before it may succeed.

use crate::apply::{notify_assignment_change, run_dependent_write};
use crate::context::RequestContext;
use crate::detector::{detect_for_ticket, partition_conflicts};
use crate::error::CoreError;
use crate::store::{NewTrade, ScheduleStore, Versioned};
use fieldops_audit::{Action, AuditRecord, EntityRef, Snapshot};
use fieldops_domain::{
    AssigneeRef, ConflictType, RoleGate, ScheduleConflict, SchedulePeriod, ShiftTradeRequest,
    TradeId, TradeStatus, WorkTicket,
};
use serde_json::json;
use tracing::info;

/// Conflict policy inputs for a manager-gated trade transition.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TradeDecision {
    /// Keys of warning conflicts the manager has acknowledged.
    pub acknowledged_warning_keys: Vec<String>,
    /// Whether to override an exclusively-locked-period blocking set.
    pub override_locked_period: bool,
    /// The recorded reason for the override. Required with the flag.
    pub override_reason: Option<String>,
}

/// The result of a committed trade apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TradeApplied {
    /// The trade after the commit.
    pub trade: ShiftTradeRequest,
    /// The ticket after the commit.
    pub ticket: WorkTicket,
    /// Dependent writes that exhausted their retries.
    pub inconsistencies: Vec<String>,
}

/// Requests a shift trade.
///
/// The initiator must be the ticket's current staff assignee and must be
/// acting for themself unless they hold `manage_schedule`.
///
/// # Errors
///
/// Returns `Forbidden` for an actor who is neither the initiator nor a
/// schedule manager, `TradeRuleViolation` when the initiator does not
/// hold the ticket or names themself as target (`SelfTrade` via
/// `DomainViolation`), and store errors otherwise.
pub fn request_trade<S: ScheduleStore>(
    store: &mut S,
    ctx: &RequestContext,
    trade: &NewTrade,
) -> Result<ShiftTradeRequest, CoreError> {
    if !ctx.is_staff(trade.initiator_staff_id) && !RoleGate::can_manage_schedule(&ctx.roles) {
        return Err(CoreError::Forbidden {
            action: "trade_request",
            required: "SUPERVISOR",
        });
    }
    if trade.initiator_staff_id == trade.target_staff_id {
        return Err(CoreError::DomainViolation(
            fieldops_domain::DomainError::SelfTrade,
        ));
    }

    let ticket: Versioned<WorkTicket> = store.load_ticket(trade.ticket_id)?;
    if !ticket.value.status.is_active() {
        return Err(CoreError::TradeRuleViolation {
            detail: format!("Ticket {} is not active", trade.ticket_id),
        });
    }
    if ticket.value.assignee != Some(AssigneeRef::Staff(trade.initiator_staff_id)) {
        return Err(CoreError::TradeRuleViolation {
            detail: format!(
                "Staff {} is not the current assignee of ticket {}",
                trade.initiator_staff_id, trade.ticket_id
            ),
        });
    }

    let created: ShiftTradeRequest = store.insert_trade(trade, ctx.now)?;
    info!(
        trade = created.id.value(),
        ticket = created.ticket_id.value(),
        initiator = created.initiator_staff_id.value(),
        target = created.target_staff_id.value(),
        "Requested shift trade"
    );

    let record: AuditRecord = AuditRecord::new(
        EntityRef::new(String::from("shift_trade_requests"), created.id.to_string()),
        Action::new(String::from("CREATE"), None),
        None,
        Some(Snapshot::new(json!({
            "ticket_id": created.ticket_id,
            "initiator_staff_id": created.initiator_staff_id,
            "target_staff_id": created.target_staff_id,
            "request_type": created.request_type,
            "status": created.status,
        }))),
        ctx.audit_actor(),
        ctx.audit_cause("schedule_trade_create"),
    );
    let mut inconsistencies: Vec<String> = Vec::new();
    run_dependent_write("audit_records.append", &mut inconsistencies, || {
        store.append_audit_record(&record, ctx.now).map(|_| ())
    });
    Ok(created)
}

/// Target staff accepts a requested trade.
///
/// # Errors
///
/// Returns `Forbidden` for an actor who is neither the target nor a
/// schedule manager and `InvalidTradeTransition` (via `DomainViolation`)
/// outside `requested`.
pub fn accept_trade<S: ScheduleStore>(
    store: &mut S,
    ctx: &RequestContext,
    trade_id: TradeId,
) -> Result<ShiftTradeRequest, CoreError> {
    let trade: ShiftTradeRequest = store.load_trade(trade_id)?;
    if !ctx.is_staff(trade.target_staff_id) && !RoleGate::can_manage_schedule(&ctx.roles) {
        return Err(CoreError::Forbidden {
            action: "trade_accept",
            required: "SUPERVISOR",
        });
    }
    transition_trade(store, ctx, trade, TradeStatus::Accepted, "ACCEPT", None)
}

/// The initiator withdraws a requested trade.
///
/// # Errors
///
/// Returns `Forbidden` for an actor who is neither the initiator nor a
/// schedule manager and `InvalidTradeTransition` (via `DomainViolation`)
/// outside `requested`.
pub fn cancel_trade<S: ScheduleStore>(
    store: &mut S,
    ctx: &RequestContext,
    trade_id: TradeId,
) -> Result<ShiftTradeRequest, CoreError> {
    let trade: ShiftTradeRequest = store.load_trade(trade_id)?;
    if !ctx.is_staff(trade.initiator_staff_id) && !RoleGate::can_manage_schedule(&ctx.roles) {
        return Err(CoreError::Forbidden {
            action: "trade_cancel",
            required: "SUPERVISOR",
        });
    }
    transition_trade(store, ctx, trade, TradeStatus::Canceled, "CANCEL", None)
}

/// A manager denies a requested trade, recording a note.
///
/// # Errors
///
/// Returns `Forbidden` without `approve_trade` and
/// `InvalidTradeTransition` (via `DomainViolation`) outside `requested`.
pub fn deny_trade<S: ScheduleStore>(
    store: &mut S,
    ctx: &RequestContext,
    trade_id: TradeId,
    manager_note: Option<&str>,
) -> Result<ShiftTradeRequest, CoreError> {
    if !RoleGate::can_approve_trade(&ctx.roles) {
        return Err(CoreError::Forbidden {
            action: "trade_deny",
            required: "SUPERVISOR",
        });
    }
    let trade: ShiftTradeRequest = store.load_trade(trade_id)?;
    transition_trade(store, ctx, trade, TradeStatus::Denied, "DENY", manager_note)
}

/// A manager approves an accepted trade without committing it yet.
///
/// The detector runs against the target staff member first; the
/// blocking/warning policy is identical to the planning apply.
///
/// # Errors
///
/// Returns `Forbidden` without `approve_trade`, the conflict-policy
/// errors (`ApplyBlocked`, `AckRequired`, `OverrideRequired`,
/// `OverrideReasonRequired`) and `InvalidTradeTransition` (via
/// `DomainViolation`) outside `accepted`.
pub fn approve_trade<S: ScheduleStore>(
    store: &mut S,
    ctx: &RequestContext,
    trade_id: TradeId,
    decision: &TradeDecision,
) -> Result<ShiftTradeRequest, CoreError> {
    if !RoleGate::can_approve_trade(&ctx.roles) {
        return Err(CoreError::Forbidden {
            action: "trade_approve",
            required: "SUPERVISOR",
        });
    }

    let trade: ShiftTradeRequest = store.load_trade(trade_id)?;
    trade.status.validate_transition(TradeStatus::Approved)?;
    check_trade_conflicts(store, ctx, &trade, decision)?;
    transition_trade(store, ctx, trade, TradeStatus::Approved, "APPROVE", None)
}

/// A manager applies a trade, committing the reassignment.
///
/// The detector runs against the target staff member, then the ticket is
/// reassigned under the same versioned-write and dependent-write sequence
/// as the planning apply.
///
/// # Errors
///
/// Returns `Forbidden` without `approve_trade`, the conflict-policy
/// errors, `InvalidTradeTransition` (via `DomainViolation`) outside
/// `accepted`/`approved`, and `ConcurrencyConflict` when the ticket
/// version check fails.
#[allow(clippy::too_many_lines)]
pub fn apply_trade<S: ScheduleStore>(
    store: &mut S,
    ctx: &RequestContext,
    trade_id: TradeId,
    decision: &TradeDecision,
) -> Result<TradeApplied, CoreError> {
    if !RoleGate::can_approve_trade(&ctx.roles) {
        return Err(CoreError::Forbidden {
            action: "trade_apply",
            required: "SUPERVISOR",
        });
    }

    let trade: ShiftTradeRequest = store.load_trade(trade_id)?;
    trade.status.validate_transition(TradeStatus::Applied)?;
    check_trade_conflicts(store, ctx, &trade, decision)?;

    let ticket: Versioned<WorkTicket> = store.load_ticket(trade.ticket_id)?;
    let before_assignee: Option<AssigneeRef> = ticket.value.assignee;
    let new_assignee: AssigneeRef = AssigneeRef::Staff(trade.target_staff_id);

    let updated: Versioned<WorkTicket> =
        store.update_ticket_assignment(trade.ticket_id, ticket.version, Some(new_assignee))?;
    info!(
        trade = trade_id.value(),
        ticket = trade.ticket_id.value(),
        target = trade.target_staff_id.value(),
        "Committed trade reassignment"
    );

    let mut inconsistencies: Vec<String> = Vec::new();
    let mut updated_trade: ShiftTradeRequest = trade.clone();
    run_dependent_write("shift_trade_requests.status", &mut inconsistencies, || {
        store
            .update_trade_status(trade_id, TradeStatus::Applied, ctx.now, None)
            .map(|t| updated_trade = t)
    });

    let record: AuditRecord = AuditRecord::new(
        EntityRef::new(String::from("shift_trade_requests"), trade_id.to_string()),
        Action::new(
            String::from("APPLY"),
            Some(format!("Reassigned ticket {} via trade", trade.ticket_id)),
        ),
        Some(Snapshot::new(json!({
            "status": trade.status,
            "assignee": before_assignee,
        }))),
        Some(Snapshot::new(json!({
            "status": TradeStatus::Applied,
            "assignee": new_assignee,
            "override_locked_period": decision.override_locked_period,
            "override_reason": decision.override_reason,
        }))),
        ctx.audit_actor(),
        ctx.audit_cause("schedule_trade_apply"),
    );
    run_dependent_write("audit_records.append", &mut inconsistencies, || {
        store.append_audit_record(&record, ctx.now).map(|_| ())
    });

    notify_assignment_change(store, ctx, &updated.value, before_assignee, new_assignee);

    Ok(TradeApplied {
        trade: updated_trade,
        ticket: updated.value,
        inconsistencies,
    })
}

/// Runs the shared conflict policy for a manager-gated trade transition.
fn check_trade_conflicts<S: ScheduleStore>(
    store: &mut S,
    ctx: &RequestContext,
    trade: &ShiftTradeRequest,
    decision: &TradeDecision,
) -> Result<(), CoreError> {
    let ticket: Versioned<WorkTicket> = store.load_ticket(trade.ticket_id)?;
    let period: SchedulePeriod = store.load_period(ticket.value.period_id)?;

    let can_override: bool = RoleGate::can_override_locked_period(&ctx.roles);
    if decision.override_locked_period && !can_override {
        return Err(CoreError::Forbidden {
            action: "override_locked_period",
            required: "MANAGER",
        });
    }
    let reason_present: bool = decision
        .override_reason
        .as_deref()
        .is_some_and(|reason| !reason.trim().is_empty());
    if decision.override_locked_period && !reason_present {
        return Err(CoreError::OverrideReasonRequired);
    }
    let override_authorized: bool = decision.override_locked_period && can_override;

    let conflicts: Vec<ScheduleConflict> = detect_for_ticket(
        store,
        &ticket.value,
        &period,
        AssigneeRef::Staff(trade.target_staff_id),
        override_authorized,
    )?;
    let (blocking, warnings) = partition_conflicts(conflicts);

    if !blocking.is_empty() {
        let exclusively_locked: bool = blocking
            .iter()
            .all(|c| c.conflict_type == ConflictType::LockedPeriod);
        if exclusively_locked && can_override {
            return Err(CoreError::OverrideRequired {
                ticket_id: trade.ticket_id,
            });
        }
        return Err(CoreError::ApplyBlocked { blocking });
    }

    let unacknowledged: Vec<String> = warnings
        .iter()
        .map(ScheduleConflict::key)
        .filter(|key| !decision.acknowledged_warning_keys.contains(key))
        .collect();
    if unacknowledged.is_empty() {
        Ok(())
    } else {
        Err(CoreError::AckRequired {
            warning_keys: unacknowledged,
        })
    }
}

/// Shared transition path for accept/cancel/deny and the approve tail.
fn transition_trade<S: ScheduleStore>(
    store: &mut S,
    ctx: &RequestContext,
    trade: ShiftTradeRequest,
    target: TradeStatus,
    action: &str,
    manager_note: Option<&str>,
) -> Result<ShiftTradeRequest, CoreError> {
    trade.status.validate_transition(target)?;

    let updated: ShiftTradeRequest =
        store.update_trade_status(trade.id, target, ctx.now, manager_note)?;
    info!(trade = trade.id.value(), from = %trade.status, to = %target, "Transitioned trade");

    let record: AuditRecord = AuditRecord::new(
        EntityRef::new(String::from("shift_trade_requests"), trade.id.to_string()),
        Action::new(
            action.to_string(),
            manager_note.map(|note| format!("Manager note: {note}")),
        ),
        Some(Snapshot::new(json!({ "status": trade.status }))),
        Some(Snapshot::new(json!({
            "status": target,
            "manager_note": manager_note,
        }))),
        ctx.audit_actor(),
        ctx.audit_cause("schedule_trade_transition"),
    );
    let mut inconsistencies: Vec<String> = Vec::new();
    run_dependent_write("audit_records.append", &mut inconsistencies, || {
        store.append_audit_record(&record, ctx.now).map(|_| ())
    });
    Ok(updated)
}
