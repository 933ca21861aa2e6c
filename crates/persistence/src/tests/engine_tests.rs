// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! The engine running end-to-end against the SQLite store.

use super::helpers::{date, open_store, seed_schedule, supervisor_ctx, window};
use fieldops::{
    ApplyRequest, CoreError, NewBoard, NewItem, NewProposal, ScheduleStore, apply_proposal,
    create_board, stage_proposal, add_item,
};
use fieldops_domain::{
    ApplyState, AssigneeRef, ItemKind, PeriodStatus, SyncState,
};
use time::Month;

#[test]
fn test_full_planning_flow_on_sqlite() {
    let mut store = open_store();
    let seeded = seed_schedule(&mut store, PeriodStatus::Published);
    let ctx = supervisor_ctx();

    let board = match create_board(
        &mut store,
        &ctx,
        &NewBoard {
            board_date: date(2026, Month::March, 2),
            label: String::from("Monday night plan"),
        },
    ) {
        Ok(b) => b,
        Err(e) => panic!("board must create: {e}"),
    };
    let item = match add_item(
        &mut store,
        &ctx,
        &NewItem {
            board_id: board.id,
            kind: ItemKind::Ticket,
            ticket_id: Some(seeded.ticket),
            title: String::from("Harborview nightly"),
            assignee: Some(AssigneeRef::Staff(seeded.staff_a)),
        },
    ) {
        Ok(i) => i,
        Err(e) => panic!("item must create: {e}"),
    };
    let proposal = match stage_proposal(
        &mut store,
        &ctx,
        &NewProposal {
            item_id: item.id,
            proposed: AssigneeRef::Staff(seeded.staff_b),
            justification: Some(String::from("Ana asked off")),
        },
    ) {
        Ok(p) => p,
        Err(e) => panic!("proposal must stage: {e}"),
    };

    // Staging moved the item into draft_change.
    let staged = match store.load_item(item.id) {
        Ok(i) => i.value,
        Err(e) => panic!("item must load: {e}"),
    };
    assert_eq!(staged.sync_state, SyncState::DraftChange);

    let request = ApplyRequest {
        proposal_id: proposal.id,
        acknowledged_warning_keys: Vec::new(),
        override_locked_period: false,
        override_reason: None,
    };
    let success = match apply_proposal(&mut store, &ctx, item.id, &request) {
        Ok(s) => s,
        Err(e) => panic!("apply must succeed: {e}"),
    };

    assert_eq!(success.ticket.assignee, Some(AssigneeRef::Staff(seeded.staff_b)));
    assert!(success.inconsistencies.is_empty());

    let item_after = match store.load_item(item.id) {
        Ok(i) => i.value,
        Err(e) => panic!("item must load: {e}"),
    };
    assert_eq!(item_after.sync_state, SyncState::Applied);
    let proposal_after = match store.load_proposal(proposal.id) {
        Ok(p) => p,
        Err(e) => panic!("proposal must load: {e}"),
    };
    assert_eq!(proposal_after.apply_state, ApplyState::Applied);

    // One APPLY record in the item's audit timeline, plus the creation.
    let timeline = match store.list_audit_records("planning_board_items", &item.id.to_string()) {
        Ok(t) => t,
        Err(e) => panic!("timeline must list: {e}"),
    };
    let applies = timeline
        .iter()
        .filter(|r| r.record.action.name == "APPLY")
        .count();
    assert_eq!(applies, 1);

    // The reassigned staff member has a notification queued.
    let notifications = match store.list_notifications(seeded.staff_b) {
        Ok(n) => n,
        Err(e) => panic!("notifications must list: {e}"),
    };
    assert_eq!(notifications.len(), 1);

    // Re-applying is an idempotency error, not a second commit.
    let again = apply_proposal(&mut store, &ctx, item.id, &request);
    assert!(matches!(again, Err(CoreError::AlreadyApplied { .. })));
}

#[test]
fn test_locked_period_guard_on_sqlite() {
    let mut store = open_store();
    let seeded = seed_schedule(&mut store, PeriodStatus::Published);
    let ctx = supervisor_ctx();

    let board = match create_board(
        &mut store,
        &ctx,
        &NewBoard {
            board_date: date(2026, Month::March, 2),
            label: String::from("Monday night plan"),
        },
    ) {
        Ok(b) => b,
        Err(e) => panic!("board must create: {e}"),
    };
    let item = match add_item(
        &mut store,
        &ctx,
        &NewItem {
            board_id: board.id,
            kind: ItemKind::Ticket,
            ticket_id: Some(seeded.ticket),
            title: String::from("Harborview nightly"),
            assignee: Some(AssigneeRef::Staff(seeded.staff_a)),
        },
    ) {
        Ok(i) => i,
        Err(e) => panic!("item must create: {e}"),
    };
    let proposal = match stage_proposal(
        &mut store,
        &ctx,
        &NewProposal {
            item_id: item.id,
            proposed: AssigneeRef::Staff(seeded.staff_b),
            justification: None,
        },
    ) {
        Ok(p) => p,
        Err(e) => panic!("proposal must stage: {e}"),
    };

    // Lock the period underneath the staged draft.
    let ops = super::helpers::operations_ctx();
    if let Err(e) =
        store.update_period_status(seeded.period, PeriodStatus::Locked, &ops.actor_id, ops.now)
    {
        panic!("period must lock: {e}");
    }

    let request = ApplyRequest {
        proposal_id: proposal.id,
        acknowledged_warning_keys: Vec::new(),
        override_locked_period: false,
        override_reason: None,
    };
    let blocked = apply_proposal(&mut store, &ctx, item.id, &request);
    match blocked {
        Err(CoreError::ApplyBlocked { blocking }) => {
            assert!(blocking.iter().any(|c| {
                c.conflict_type == fieldops_domain::ConflictType::LockedPeriod
            }));
        }
        other => panic!("expected ApplyBlocked, got {other:?}"),
    }

    // An overlapping second ticket for staff B also blocks, on top of the lock.
    if let Err(e) = store.insert_ticket(&crate::store::NewTicket {
        site_id: seeded.site,
        period_id: seeded.period,
        scheduled_date: date(2026, Month::March, 2),
        window: window(1200, 1260),
        status: fieldops_domain::TicketStatus::Scheduled,
        assignee: Some(AssigneeRef::Staff(seeded.staff_b)),
        required_certification: None,
    }) {
        panic!("ticket must insert: {e}");
    }
    let blocked = apply_proposal(&mut store, &ctx, item.id, &request);
    match blocked {
        Err(CoreError::ApplyBlocked { blocking }) => assert_eq!(blocking.len(), 2),
        other => panic!("expected ApplyBlocked, got {other:?}"),
    }
}
