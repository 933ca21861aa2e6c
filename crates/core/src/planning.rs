// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Planning board, item and proposal management.
//!
//! Boards are per-date draft surfaces. Staging a proposal moves the
//! targeted item into `draft_change`; nothing here touches the live
//! schedule.

use crate::apply::run_dependent_write;
use crate::context::RequestContext;
use crate::error::CoreError;
use crate::store::{NewBoard, NewItem, NewProposal, ScheduleStore, Versioned};
use fieldops_audit::{Action, AuditRecord, EntityRef, Snapshot};
use fieldops_domain::{
    DomainError, PlanningBoard, PlanningBoardItem, PlanningItemProposal, RoleGate, SyncState,
};
use serde_json::json;
use tracing::info;

/// Creates a planning board.
///
/// # Errors
///
/// Returns `Forbidden` without `manage_schedule` and `EmptyField` (via
/// `DomainViolation`) for a blank label.
pub fn create_board<S: ScheduleStore>(
    store: &mut S,
    ctx: &RequestContext,
    board: &NewBoard,
) -> Result<PlanningBoard, CoreError> {
    if !RoleGate::can_manage_schedule(&ctx.roles) {
        return Err(CoreError::Forbidden {
            action: "planning_board_create",
            required: "SUPERVISOR",
        });
    }
    if board.label.trim().is_empty() {
        return Err(CoreError::DomainViolation(DomainError::EmptyField("label")));
    }

    let created: PlanningBoard = store.insert_board(board)?;
    info!(board = created.id.value(), date = %created.board_date, "Created planning board");

    append_create_audit(
        store,
        ctx,
        "planning_boards",
        &created.id.to_string(),
        json!({ "board_date": created.board_date, "label": created.label }),
        "planning_board_create",
    );
    Ok(created)
}

/// Adds an item to a planning board.
///
/// Items start `synced`; the caller validates assignee exclusivity at the
/// boundary by constructing the `AssigneeRef`.
///
/// # Errors
///
/// Returns `Forbidden` without `manage_schedule`, `EmptyField` for a
/// blank title, and `NotFound` if the board does not exist.
pub fn add_item<S: ScheduleStore>(
    store: &mut S,
    ctx: &RequestContext,
    item: &NewItem,
) -> Result<PlanningBoardItem, CoreError> {
    if !RoleGate::can_manage_schedule(&ctx.roles) {
        return Err(CoreError::Forbidden {
            action: "planning_item_create",
            required: "SUPERVISOR",
        });
    }
    if item.title.trim().is_empty() {
        return Err(CoreError::DomainViolation(DomainError::EmptyField("title")));
    }

    let created: PlanningBoardItem = store.insert_item(item)?;
    info!(
        item = created.id.value(),
        board = created.board_id.value(),
        kind = %created.kind,
        "Created planning item"
    );

    append_create_audit(
        store,
        ctx,
        "planning_board_items",
        &created.id.to_string(),
        json!({
            "board_id": created.board_id,
            "kind": created.kind,
            "ticket_id": created.ticket_id,
            "title": created.title,
            "sync_state": created.sync_state,
        }),
        "planning_item_create",
    );
    Ok(created)
}

/// Stages a proposal against a planning item.
///
/// The item moves into `draft_change` if it is not there already. Several
/// proposals may coexist; the orchestrator treats the most recent active
/// one as authoritative.
///
/// # Errors
///
/// Returns `Forbidden` without `manage_schedule`, `NotFound` for a
/// missing item, and `InvalidSyncTransition` (via `DomainViolation`) when
/// the item cannot accept a draft, e.g. straight after an apply.
pub fn stage_proposal<S: ScheduleStore>(
    store: &mut S,
    ctx: &RequestContext,
    proposal: &NewProposal,
) -> Result<PlanningItemProposal, CoreError> {
    if !RoleGate::can_manage_schedule(&ctx.roles) {
        return Err(CoreError::Forbidden {
            action: "planning_proposal_create",
            required: "SUPERVISOR",
        });
    }

    let item: Versioned<PlanningBoardItem> = store.load_item(proposal.item_id)?;
    if item.value.sync_state != SyncState::DraftChange {
        item.value
            .sync_state
            .validate_transition(SyncState::DraftChange)?;
        store.update_item_sync_state(
            proposal.item_id,
            item.version,
            SyncState::DraftChange,
            item.value.assignee,
        )?;
    }

    let created: PlanningItemProposal = store.insert_proposal(proposal, ctx.now)?;
    info!(
        proposal = created.id.value(),
        item = created.item_id.value(),
        proposed = %created.proposed,
        "Staged proposal"
    );

    append_create_audit(
        store,
        ctx,
        "planning_item_proposals",
        &created.id.to_string(),
        json!({
            "item_id": created.item_id,
            "proposed": created.proposed,
            "apply_state": created.apply_state,
            "justification": created.justification,
        }),
        "planning_proposal_create",
    );
    Ok(created)
}

/// Appends a CREATE audit record, retried like any dependent write.
fn append_create_audit<S: ScheduleStore>(
    store: &mut S,
    ctx: &RequestContext,
    entity_type: &str,
    entity_id: &str,
    after: serde_json::Value,
    operation: &str,
) {
    let record: AuditRecord = AuditRecord::new(
        EntityRef::new(entity_type.to_string(), entity_id.to_string()),
        Action::new(String::from("CREATE"), None),
        None,
        Some(Snapshot::new(after)),
        ctx.audit_actor(),
        ctx.audit_cause(operation),
    );
    let mut inconsistencies: Vec<String> = Vec::new();
    run_dependent_write("audit_records.append", &mut inconsistencies, || {
        store.append_audit_record(&record, ctx.now).map(|_| ())
    });
}
