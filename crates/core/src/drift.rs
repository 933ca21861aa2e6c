// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Drift detection and resolution.
//!
//! An applied item drifts when someone else changes the live ticket
//! afterwards. Detection is opportunistic: it compares the item's
//! recorded assignee with the ticket's live assignee. Resolution offers
//! exactly two terminal choices; partial merges do not exist, a human
//! picks one side.

use crate::apply::run_dependent_write;
use crate::context::RequestContext;
use crate::error::CoreError;
use crate::store::{ScheduleStore, Versioned};
use fieldops_audit::{Action, AuditRecord, EntityRef, Snapshot};
use fieldops_domain::{
    AssigneeRef, ItemId, PlanningBoardItem, RoleGate, SyncState, WorkTicket,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

/// The two ways a drift conflict can be resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DriftResolution {
    /// Keep the board's draft; nothing is written to the ticket and a
    /// later apply can retry.
    UseBoardVersion,
    /// Accept the live schedule as-is; the item becomes inert.
    AcceptScheduleVersion,
}

impl DriftResolution {
    /// The sync state the item lands in for this resolution.
    #[must_use]
    pub const fn target_state(&self) -> SyncState {
        match self {
            Self::UseBoardVersion => SyncState::DraftChange,
            Self::AcceptScheduleVersion => SyncState::Dismissed,
        }
    }

    /// Returns the string representation of the resolution.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::UseBoardVersion => "use_board_version",
            Self::AcceptScheduleVersion => "accept_schedule_version",
        }
    }
}

impl std::fmt::Display for DriftResolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The outcome of a drift check or resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriftStatus {
    /// The item that was checked.
    pub item_id: ItemId,
    /// Whether the item had drifted from the live schedule.
    pub drifted: bool,
    /// The item's sync state after the operation.
    pub sync_state: SyncState,
    /// The assignee the board records.
    pub board_assignee: Option<AssigneeRef>,
    /// The assignee the live ticket records.
    pub live_assignee: Option<AssigneeRef>,
}

/// Opportunistically checks an applied item against its live ticket.
///
/// When the recorded assignee no longer matches the ticket, the item
/// moves `applied` → `conflict` and the detection is audited. Items in
/// any other sync state are reported unchanged.
///
/// # Errors
///
/// Returns `Forbidden` without `manage_schedule`, `ItemNotLinked` for
/// ticketless items, and store errors from the reads and the conditional
/// item write.
pub fn detect_drift<S: ScheduleStore>(
    store: &mut S,
    ctx: &RequestContext,
    item_id: ItemId,
) -> Result<DriftStatus, CoreError> {
    if !RoleGate::can_manage_schedule(&ctx.roles) {
        return Err(CoreError::Forbidden {
            action: "planning_drift_check",
            required: "SUPERVISOR",
        });
    }

    let item: Versioned<PlanningBoardItem> = store.load_item(item_id)?;
    let Some(ticket_id) = item.value.ticket_id else {
        return Err(CoreError::ItemNotLinked { item_id });
    };
    let ticket: Versioned<WorkTicket> = store.load_ticket(ticket_id)?;

    let drifted: bool =
        item.value.sync_state == SyncState::Applied && item.value.assignee != ticket.value.assignee;
    if !drifted {
        return Ok(DriftStatus {
            item_id,
            drifted: false,
            sync_state: item.value.sync_state,
            board_assignee: item.value.assignee,
            live_assignee: ticket.value.assignee,
        });
    }

    item.value
        .sync_state
        .validate_transition(SyncState::Conflict)?;
    store.update_item_sync_state(item_id, item.version, SyncState::Conflict, item.value.assignee)?;
    info!(
        item = item_id.value(),
        ticket = ticket_id.value(),
        "Planning item drifted from live schedule"
    );

    let record: AuditRecord = AuditRecord::new(
        EntityRef::new(String::from("planning_board_items"), item_id.to_string()),
        Action::new(
            String::from("DRIFT_DETECTED"),
            Some(format!("Ticket {ticket_id} diverged from the board")),
        ),
        Some(Snapshot::new(json!({
            "sync_state": SyncState::Applied,
            "assignee": item.value.assignee,
        }))),
        Some(Snapshot::new(json!({
            "sync_state": SyncState::Conflict,
            "live_assignee": ticket.value.assignee,
        }))),
        ctx.audit_actor(),
        ctx.audit_cause("planning_drift_check"),
    );
    let mut inconsistencies: Vec<String> = Vec::new();
    run_dependent_write("audit_records.append", &mut inconsistencies, || {
        store.append_audit_record(&record, ctx.now).map(|_| ())
    });

    Ok(DriftStatus {
        item_id,
        drifted: true,
        sync_state: SyncState::Conflict,
        board_assignee: item.value.assignee,
        live_assignee: ticket.value.assignee,
    })
}

/// Resolves a drifted item one way or the other.
///
/// Neither resolution writes the ticket. `use_board_version` returns the
/// item to `draft_change`; `accept_schedule_version` dismisses it.
///
/// # Errors
///
/// Returns `Forbidden` without `manage_schedule`, `InvalidSyncTransition`
/// (via `DomainViolation`) when the item is not in `conflict`, and store
/// errors from the conditional item write.
pub fn resolve_drift<S: ScheduleStore>(
    store: &mut S,
    ctx: &RequestContext,
    item_id: ItemId,
    resolution: DriftResolution,
) -> Result<DriftStatus, CoreError> {
    if !RoleGate::can_manage_schedule(&ctx.roles) {
        return Err(CoreError::Forbidden {
            action: "planning_drift_resolve",
            required: "SUPERVISOR",
        });
    }

    let item: Versioned<PlanningBoardItem> = store.load_item(item_id)?;
    let target: SyncState = resolution.target_state();
    item.value.sync_state.validate_transition(target)?;

    let updated: Versioned<PlanningBoardItem> =
        store.update_item_sync_state(item_id, item.version, target, item.value.assignee)?;
    info!(
        item = item_id.value(),
        resolution = %resolution,
        "Resolved planning drift"
    );

    let record: AuditRecord = AuditRecord::new(
        EntityRef::new(String::from("planning_board_items"), item_id.to_string()),
        Action::new(
            String::from("RESOLVE_DRIFT"),
            Some(format!("Resolution: {resolution}")),
        ),
        Some(Snapshot::new(json!({ "sync_state": item.value.sync_state }))),
        Some(Snapshot::new(json!({
            "sync_state": target,
            "resolution": resolution,
        }))),
        ctx.audit_actor(),
        ctx.audit_cause("planning_drift_resolve"),
    );
    let mut inconsistencies: Vec<String> = Vec::new();
    run_dependent_write("audit_records.append", &mut inconsistencies, || {
        store.append_audit_record(&record, ctx.now).map(|_| ())
    });

    let live_assignee: Option<AssigneeRef> = match item.value.ticket_id {
        Some(ticket_id) => store.load_ticket(ticket_id)?.value.assignee,
        None => None,
    };

    Ok(DriftStatus {
        item_id,
        drifted: false,
        sync_state: updated.value.sync_state,
        board_assignee: updated.value.assignee,
        live_assignee,
    })
}
