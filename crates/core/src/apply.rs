// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! The apply orchestrator.
//!
//! Applies a staged proposal to the live schedule as one logically atomic
//! operation: detection, authorization, conflict branching, the versioned
//! ticket write, dependent writes, and the audit record. The read phase is
//! idempotent; the commit is guarded by the ticket's version token and by
//! the proposal's apply state.
//!
//! The store offers per-row optimistic concurrency only, so the commit is
//! an explicit saga: the ticket write (the source of truth) goes first and
//! is the one gated by the version check. Dependent writes are retried and
//! any that still fail are reported as inconsistencies for operator
//! review, never dropped.

use crate::context::RequestContext;
use crate::detector::{detect_for_ticket, partition_conflicts};
use crate::error::{CoreError, StoreError};
use crate::store::{Notification, ScheduleStore, Versioned};
use fieldops_audit::{Action, AuditRecord, EntityRef, Snapshot};
use fieldops_domain::{
    ApplyState, AssigneeRef, ConflictType, ItemId, PlanningBoardItem, PlanningItemProposal,
    ProposalId, RoleGate, ScheduleConflict, SchedulePeriod, SyncState, WorkTicket,
};
use serde_json::json;
use tracing::{error, info, warn};

/// How many times a dependent write is retried before it is flagged.
const DEPENDENT_WRITE_ATTEMPTS: u32 = 3;

/// An apply submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyRequest {
    /// The proposal to apply. Must target the item and still be active.
    pub proposal_id: ProposalId,
    /// Keys of warning conflicts the caller has acknowledged.
    pub acknowledged_warning_keys: Vec<String>,
    /// Whether to override an exclusively-locked-period blocking set.
    pub override_locked_period: bool,
    /// The recorded reason for the override. Required with the flag.
    pub override_reason: Option<String>,
}

/// The result of a committed apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplySuccess {
    /// The planning item that was applied.
    pub item_id: ItemId,
    /// The ticket after the commit.
    pub ticket: WorkTicket,
    /// The item's sync state after the commit.
    pub sync_state: SyncState,
    /// The warnings that were acknowledged as part of this apply.
    pub acknowledged_warnings: Vec<ScheduleConflict>,
    /// The audit event id, when the audit append succeeded.
    pub audit_event_id: Option<i64>,
    /// Dependent writes that exhausted their retries. Non-empty results
    /// require operator review; the ticket write itself stands.
    pub inconsistencies: Vec<String>,
}

/// Applies the given proposal to the live schedule.
///
/// The workflow of the apply state machine, in order:
///
/// 1. Entry authorization (`manage_schedule`), before any read.
/// 2. Resolve the proposal, item, ticket and period; reject terminal
///    proposals with `AlreadyApplied`.
/// 3. Run the conflict detector and partition the result.
/// 4. Blocking conflicts that are not an authorized override: `ApplyBlocked`,
///    or `OverrideRequired` when the blocking set is exclusively the locked
///    period and the caller is privileged.
/// 5. Unacknowledged warnings: `AckRequired` with the missing keys.
/// 6. Commit: versioned ticket write, then item/proposal/audit dependent
///    writes, then best-effort notifications.
///
/// Re-invoking after a non-commit outcome with unchanged inputs reproduces
/// the same classification; re-invoking after success yields
/// `AlreadyApplied`.
///
/// # Errors
///
/// Returns the error taxonomy described above, plus
/// `ConcurrencyConflict` when the ticket version check fails and
/// `NotFound`/`StoreFailure` for store-level problems.
#[allow(clippy::too_many_lines)]
pub fn apply_proposal<S: ScheduleStore>(
    store: &mut S,
    ctx: &RequestContext,
    item_id: ItemId,
    request: &ApplyRequest,
) -> Result<ApplySuccess, CoreError> {
    if !RoleGate::can_manage_schedule(&ctx.roles) {
        return Err(CoreError::Forbidden {
            action: "planning_apply",
            required: "SUPERVISOR",
        });
    }

    let item: Versioned<PlanningBoardItem> = store.load_item(item_id)?;
    let proposal: PlanningItemProposal = store.load_proposal(request.proposal_id)?;
    if proposal.item_id != item_id {
        return Err(CoreError::NotFound {
            entity: "proposal",
            id: request.proposal_id.to_string(),
        });
    }
    if !proposal.apply_state.is_active() {
        return Err(CoreError::AlreadyApplied {
            proposal_id: proposal.id,
            apply_state: proposal.apply_state.as_str(),
        });
    }

    let Some(ticket_id) = item.value.ticket_id else {
        return Err(CoreError::ItemNotLinked { item_id });
    };
    let ticket: Versioned<WorkTicket> = store.load_ticket(ticket_id)?;
    let period: SchedulePeriod = store.load_period(ticket.value.period_id)?;

    // Override authorization is resolved before detection so an authorized
    // override suppresses the locked-period conflict in one pass.
    let can_override: bool = RoleGate::can_override_locked_period(&ctx.roles);
    if request.override_locked_period && !can_override {
        return Err(CoreError::Forbidden {
            action: "override_locked_period",
            required: "MANAGER",
        });
    }
    let override_reason: Option<&str> = request
        .override_reason
        .as_deref()
        .map(str::trim)
        .filter(|reason| !reason.is_empty());
    if request.override_locked_period && override_reason.is_none() {
        return Err(CoreError::OverrideReasonRequired);
    }
    let override_authorized: bool = request.override_locked_period && can_override;

    let conflicts: Vec<ScheduleConflict> = detect_for_ticket(
        store,
        &ticket.value,
        &period,
        proposal.proposed,
        override_authorized,
    )?;
    let (blocking, warnings) = partition_conflicts(conflicts);

    if !blocking.is_empty() {
        let exclusively_locked: bool = blocking
            .iter()
            .all(|c| c.conflict_type == ConflictType::LockedPeriod);
        if exclusively_locked && can_override {
            return Err(CoreError::OverrideRequired { ticket_id });
        }
        return Err(CoreError::ApplyBlocked { blocking });
    }

    let unacknowledged: Vec<String> = warnings
        .iter()
        .map(ScheduleConflict::key)
        .filter(|key| !request.acknowledged_warning_keys.contains(key))
        .collect();
    if !unacknowledged.is_empty() {
        return Err(CoreError::AckRequired {
            warning_keys: unacknowledged,
        });
    }

    // The sync edges must be legal before anything is written. A
    // drift-resolving apply commits the conflict -> draft_change ->
    // applied path in one write.
    match item.value.sync_state {
        SyncState::Conflict => {
            item.value
                .sync_state
                .validate_transition(SyncState::DraftChange)?;
            SyncState::DraftChange.validate_transition(SyncState::Applied)?;
        }
        other => other.validate_transition(SyncState::Applied)?,
    }

    // Primary write: the ticket is the source of truth and carries the
    // version gate. A conflict here aborts the whole commit.
    let before_assignee: Option<AssigneeRef> = ticket.value.assignee;
    let updated: Versioned<WorkTicket> =
        store.update_ticket_assignment(ticket_id, ticket.version, Some(proposal.proposed))?;
    info!(
        item = item_id.value(),
        ticket = ticket_id.value(),
        proposal = proposal.id.value(),
        assignee = %proposal.proposed,
        override_locked_period = request.override_locked_period,
        "Committed ticket assignment"
    );

    let mut inconsistencies: Vec<String> = Vec::new();

    run_dependent_write(
        "planning_board_items.sync_state",
        &mut inconsistencies,
        || {
            store
                .update_item_sync_state(
                    item_id,
                    item.version,
                    SyncState::Applied,
                    Some(proposal.proposed),
                )
                .map(|_| ())
        },
    );
    run_dependent_write(
        "planning_item_proposals.apply_state",
        &mut inconsistencies,
        || store.update_proposal_apply_state(proposal.id, ApplyState::Applied),
    );

    let record: AuditRecord = AuditRecord::new(
        EntityRef::new(
            String::from("planning_board_items"),
            item_id.to_string(),
        ),
        Action::new(
            String::from("APPLY"),
            Some(format!(
                "Applied proposal {} to ticket {ticket_id}",
                proposal.id
            )),
        ),
        Some(Snapshot::new(json!({
            "sync_state": item.value.sync_state,
            "assignee": before_assignee,
        }))),
        Some(Snapshot::new(json!({
            "sync_state": SyncState::Applied,
            "assignee": proposal.proposed,
            "ticket_id": ticket_id,
            "override_locked_period": request.override_locked_period,
            "override_reason": override_reason,
        }))),
        ctx.audit_actor(),
        ctx.audit_cause("planning_apply"),
    );
    let mut audit_event_id: Option<i64> = None;
    run_dependent_write("audit_records.append", &mut inconsistencies, || {
        store
            .append_audit_record(&record, ctx.now)
            .map(|event_id| audit_event_id = Some(event_id))
    });

    notify_assignment_change(store, ctx, &updated.value, before_assignee, proposal.proposed);

    Ok(ApplySuccess {
        item_id,
        ticket: updated.value,
        sync_state: SyncState::Applied,
        acknowledged_warnings: warnings,
        audit_event_id,
        inconsistencies,
    })
}

/// Runs a dependent write with bounded retries.
///
/// The primary write has already succeeded when this runs; a dependent
/// write that exhausts its retries is appended to `inconsistencies` and
/// logged for operator review.
pub(crate) fn run_dependent_write<F>(
    label: &str,
    inconsistencies: &mut Vec<String>,
    mut write: F,
) where
    F: FnMut() -> Result<(), StoreError>,
{
    for attempt in 1..=DEPENDENT_WRITE_ATTEMPTS {
        match write() {
            Ok(()) => return,
            Err(err) if attempt < DEPENDENT_WRITE_ATTEMPTS => {
                warn!(label, attempt, %err, "Dependent write failed; retrying");
            }
            Err(err) => {
                error!(label, %err, "Dependent write failed after retries; flagging inconsistency");
                inconsistencies.push(format!("{label}: {err}"));
            }
        }
    }
}

/// Writes best-effort notifications after a committed reassignment.
///
/// Notification failures are logged and never affect the commit result.
pub(crate) fn notify_assignment_change<S: ScheduleStore>(
    store: &mut S,
    ctx: &RequestContext,
    ticket: &WorkTicket,
    before: Option<AssigneeRef>,
    after: AssigneeRef,
) {
    if let AssigneeRef::Staff(new_staff) = after {
        let notification: Notification = Notification {
            staff_id: new_staff,
            title: String::from("Assignment updated"),
            body: String::from(
                "Your assignment was updated from planning. Check your schedule for details.",
            ),
            link: Some(format!("/work?ticket={}", ticket.id)),
        };
        if let Err(err) = store.append_notification(&notification, ctx.now) {
            warn!(staff = new_staff.value(), %err, "Failed to notify new assignee");
        }
    }

    if let Some(AssigneeRef::Staff(previous_staff)) = before {
        if Some(previous_staff) == after.staff_id() {
            return;
        }
        let notification: Notification = Notification {
            staff_id: previous_staff,
            title: String::from("Assignment updated"),
            body: String::from("A supervisor reassigned this ticket during planning."),
            link: Some(format!("/work?ticket={}", ticket.id)),
        };
        if let Err(err) = store.append_notification(&notification, ctx.now) {
            warn!(staff = previous_staff.value(), %err, "Failed to notify previous assignee");
        }
    }
}
