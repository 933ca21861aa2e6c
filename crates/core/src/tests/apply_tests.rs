// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Apply orchestrator workflow tests: conflict branching, overrides,
//! idempotency, the versioned commit and the dependent-write saga.

use super::helpers::{MemoryStore, date, manager_ctx, supervisor_ctx, window};
use crate::apply::{ApplyRequest, apply_proposal};
use crate::error::CoreError;
use crate::store::ScheduleStore;
use fieldops_domain::{
    ApplyState, AssigneeRef, ConflictType, ItemId, PeriodStatus, Role, StaffId, SyncState,
    TicketId,
};
use time::Month;

struct Fixture {
    store: MemoryStore,
    item_id: ItemId,
    ticket_id: TicketId,
    proposal_id: fieldops_domain::ProposalId,
    staff_a: StaffId,
    staff_b: StaffId,
}

/// Proposal P targets item I (draft_change), reassigning ticket T from
/// staff A to staff B.
fn fixture(period_status: PeriodStatus) -> Fixture {
    let mut store = MemoryStore::new();
    let staff_a = store.put_staff(1, "Ana Reyes", &[]);
    let staff_b = store.put_staff(2, "Ben Park", &[]);
    let period = store.put_period(1, period_status);
    let night = date(2026, Month::March, 2);
    let ticket_id = store.put_ticket(
        10,
        period,
        night,
        window(1080, 1320),
        Some(AssigneeRef::Staff(staff_a)),
    );
    let item_id = store.put_item(
        40,
        Some(ticket_id),
        SyncState::DraftChange,
        Some(AssigneeRef::Staff(staff_a)),
    );
    let proposal_id =
        store.put_proposal(50, item_id, AssigneeRef::Staff(staff_b), ApplyState::Draft);
    Fixture {
        store,
        item_id,
        ticket_id,
        proposal_id,
        staff_a,
        staff_b,
    }
}

fn plain_request(fixture: &Fixture) -> ApplyRequest {
    ApplyRequest {
        proposal_id: fixture.proposal_id,
        acknowledged_warning_keys: Vec::new(),
        override_locked_period: false,
        override_reason: None,
    }
}

#[test]
fn test_end_to_end_apply_commits_everything_once() {
    let mut f = fixture(PeriodStatus::Published);
    let request = plain_request(&f);

    let success = match apply_proposal(&mut f.store, &supervisor_ctx(), f.item_id, &request) {
        Ok(s) => s,
        Err(e) => panic!("apply must succeed: {e}"),
    };

    assert_eq!(success.sync_state, SyncState::Applied);
    assert_eq!(success.ticket.assignee, Some(AssigneeRef::Staff(f.staff_b)));
    assert!(success.inconsistencies.is_empty());
    assert!(success.audit_event_id.is_some());

    // Item, proposal and audit all landed.
    let item = match f.store.load_item(f.item_id) {
        Ok(i) => i.value,
        Err(e) => panic!("item must load: {e}"),
    };
    assert_eq!(item.sync_state, SyncState::Applied);
    assert_eq!(item.assignee, Some(AssigneeRef::Staff(f.staff_b)));
    let proposal = match f.store.load_proposal(f.proposal_id) {
        Ok(p) => p,
        Err(e) => panic!("proposal must load: {e}"),
    };
    assert_eq!(proposal.apply_state, ApplyState::Applied);

    let applies: Vec<_> = f
        .store
        .audits
        .iter()
        .filter(|a| a.record.action.name == "APPLY")
        .collect();
    assert_eq!(applies.len(), 1);
    let before = applies[0].record.before.as_ref().map(|s| s.data.clone());
    let after = applies[0].record.after.as_ref().map(|s| s.data.clone());
    assert_eq!(
        before.and_then(|b| b["assignee"]["staff"].as_i64()),
        Some(f.staff_a.value())
    );
    assert_eq!(
        after.and_then(|a| a["assignee"]["staff"].as_i64()),
        Some(f.staff_b.value())
    );

    // The new assignee was notified.
    assert!(
        f.store
            .notifications
            .iter()
            .any(|n| n.staff_id == f.staff_b)
    );
}

#[test]
fn test_second_apply_is_rejected_not_recommitted() {
    let mut f = fixture(PeriodStatus::Published);
    let request = plain_request(&f);

    assert!(apply_proposal(&mut f.store, &supervisor_ctx(), f.item_id, &request).is_ok());
    let version_after_first = f.store.ticket_version(f.ticket_id);

    let second = apply_proposal(&mut f.store, &supervisor_ctx(), f.item_id, &request);
    assert!(matches!(second, Err(CoreError::AlreadyApplied { .. })));
    assert_eq!(f.store.ticket_version(f.ticket_id), version_after_first);
}

#[test]
fn test_cleaner_cannot_apply() {
    let mut f = fixture(PeriodStatus::Published);
    let request = plain_request(&f);
    let ctx = super::helpers::ctx_with_roles(&[Role::Cleaner]);

    let result = apply_proposal(&mut f.store, &ctx, f.item_id, &request);
    assert!(matches!(result, Err(CoreError::Forbidden { .. })));
}

#[test]
fn test_double_booking_blocks_even_for_manager() {
    let mut f = fixture(PeriodStatus::Published);
    // Staff B already works an overlapping window that night.
    let period = f.store.periods.values().next().map(|p| p.id);
    let period = match period {
        Some(p) => p,
        None => panic!("period must exist"),
    };
    f.store.put_ticket(
        11,
        period,
        date(2026, Month::March, 2),
        window(1200, 1260),
        Some(AssigneeRef::Staff(f.staff_b)),
    );
    let request = plain_request(&f);

    let result = apply_proposal(&mut f.store, &manager_ctx(), f.item_id, &request);
    match result {
        Err(CoreError::ApplyBlocked { blocking }) => {
            assert_eq!(blocking.len(), 1);
            assert_eq!(blocking[0].conflict_type, ConflictType::DoubleBooking);
        }
        other => panic!("expected ApplyBlocked, got {other:?}"),
    }
    // No write happened.
    assert_eq!(f.store.ticket_version(f.ticket_id), 1);
}

#[test]
fn test_warnings_require_acknowledgment_then_commit() {
    let mut f = fixture(PeriodStatus::Published);
    // Staff B has a back-to-back ticket with a 15 minute gap: a warning.
    let period = match f.store.periods.values().next().map(|p| p.id) {
        Some(p) => p,
        None => panic!("period must exist"),
    };
    f.store.put_ticket(
        11,
        period,
        date(2026, Month::March, 2),
        window(1335, 1440),
        Some(AssigneeRef::Staff(f.staff_b)),
    );
    let request = plain_request(&f);

    let keys = match apply_proposal(&mut f.store, &supervisor_ctx(), f.item_id, &request) {
        Err(CoreError::AckRequired { warning_keys }) => warning_keys,
        other => panic!("expected AckRequired, got {other:?}"),
    };
    assert_eq!(keys.len(), 1);
    assert_eq!(f.store.ticket_version(f.ticket_id), 1);

    // Re-submission with the keys acknowledged commits.
    let request = ApplyRequest {
        acknowledged_warning_keys: keys,
        ..request
    };
    let success = match apply_proposal(&mut f.store, &supervisor_ctx(), f.item_id, &request) {
        Ok(s) => s,
        Err(e) => panic!("apply must succeed after ack: {e}"),
    };
    assert_eq!(success.acknowledged_warnings.len(), 1);
    assert_eq!(success.ticket.assignee, Some(AssigneeRef::Staff(f.staff_b)));
}

#[test]
fn test_locked_period_blocks_supervisor_outright() {
    let mut f = fixture(PeriodStatus::Locked);
    let request = plain_request(&f);

    let result = apply_proposal(&mut f.store, &supervisor_ctx(), f.item_id, &request);
    match result {
        Err(CoreError::ApplyBlocked { blocking }) => {
            assert!(
                blocking
                    .iter()
                    .any(|c| c.conflict_type == ConflictType::LockedPeriod)
            );
        }
        other => panic!("expected ApplyBlocked, got {other:?}"),
    }
}

#[test]
fn test_locked_period_offers_override_to_manager() {
    let mut f = fixture(PeriodStatus::Locked);
    let request = plain_request(&f);

    let result = apply_proposal(&mut f.store, &manager_ctx(), f.item_id, &request);
    assert!(matches!(result, Err(CoreError::OverrideRequired { .. })));
}

#[test]
fn test_override_without_reason_is_rejected() {
    let mut f = fixture(PeriodStatus::Locked);
    let request = ApplyRequest {
        override_locked_period: true,
        override_reason: Some(String::from("   ")),
        ..plain_request(&f)
    };

    let result = apply_proposal(&mut f.store, &manager_ctx(), f.item_id, &request);
    assert!(matches!(result, Err(CoreError::OverrideReasonRequired)));
}

#[test]
fn test_override_flag_needs_manager_role() {
    let mut f = fixture(PeriodStatus::Locked);
    let request = ApplyRequest {
        override_locked_period: true,
        override_reason: Some(String::from("client emergency")),
        ..plain_request(&f)
    };

    let result = apply_proposal(&mut f.store, &supervisor_ctx(), f.item_id, &request);
    assert!(matches!(
        result,
        Err(CoreError::Forbidden {
            action: "override_locked_period",
            ..
        })
    ));
}

#[test]
fn test_manager_override_commits_and_records_reason() {
    let mut f = fixture(PeriodStatus::Locked);
    let request = ApplyRequest {
        override_locked_period: true,
        override_reason: Some(String::from("client emergency")),
        ..plain_request(&f)
    };

    let success = match apply_proposal(&mut f.store, &manager_ctx(), f.item_id, &request) {
        Ok(s) => s,
        Err(e) => panic!("override apply must succeed: {e}"),
    };
    assert_eq!(success.ticket.assignee, Some(AssigneeRef::Staff(f.staff_b)));

    let apply_audit = f
        .store
        .audits
        .iter()
        .find(|a| a.record.action.name == "APPLY");
    let after = match apply_audit.and_then(|a| a.record.after.as_ref()) {
        Some(snapshot) => snapshot.data.clone(),
        None => panic!("apply audit must exist"),
    };
    assert_eq!(after["override_locked_period"], true);
    assert_eq!(after["override_reason"], "client emergency");
}

#[test]
fn test_mixed_blocking_set_is_never_override_eligible() {
    let mut f = fixture(PeriodStatus::Locked);
    // Add a hard double-booking on top of the locked period.
    let period = match f.store.periods.values().next().map(|p| p.id) {
        Some(p) => p,
        None => panic!("period must exist"),
    };
    f.store.put_ticket(
        11,
        period,
        date(2026, Month::March, 2),
        window(1100, 1200),
        Some(AssigneeRef::Staff(f.staff_b)),
    );
    let request = plain_request(&f);

    let result = apply_proposal(&mut f.store, &manager_ctx(), f.item_id, &request);
    match result {
        Err(CoreError::ApplyBlocked { blocking }) => {
            assert_eq!(blocking.len(), 2);
        }
        other => panic!("expected ApplyBlocked for mixed set, got {other:?}"),
    }
}

#[test]
fn test_lost_version_race_aborts_whole_commit() {
    let mut f = fixture(PeriodStatus::Published);
    f.store.conflict_ticket_updates = 1;
    let request = plain_request(&f);

    let result = apply_proposal(&mut f.store, &supervisor_ctx(), f.item_id, &request);
    assert!(matches!(result, Err(CoreError::ConcurrencyConflict { .. })));

    // No partial writes are observable: item and proposal are untouched.
    let item = match f.store.load_item(f.item_id) {
        Ok(i) => i.value,
        Err(e) => panic!("item must load: {e}"),
    };
    assert_eq!(item.sync_state, SyncState::DraftChange);
    let proposal = match f.store.load_proposal(f.proposal_id) {
        Ok(p) => p,
        Err(e) => panic!("proposal must load: {e}"),
    };
    assert_eq!(proposal.apply_state, ApplyState::Draft);
    assert!(f.store.audits.is_empty());
}

#[test]
fn test_transient_dependent_write_failure_converges() {
    let mut f = fixture(PeriodStatus::Published);
    f.store.fail_item_updates = 2;
    let request = plain_request(&f);

    let success = match apply_proposal(&mut f.store, &supervisor_ctx(), f.item_id, &request) {
        Ok(s) => s,
        Err(e) => panic!("apply must succeed: {e}"),
    };
    assert!(success.inconsistencies.is_empty());
    let item = match f.store.load_item(f.item_id) {
        Ok(i) => i.value,
        Err(e) => panic!("item must load: {e}"),
    };
    assert_eq!(item.sync_state, SyncState::Applied);
}

#[test]
fn test_exhausted_dependent_write_is_flagged_not_dropped() {
    let mut f = fixture(PeriodStatus::Published);
    f.store.fail_item_updates = 99;
    let request = plain_request(&f);

    let success = match apply_proposal(&mut f.store, &supervisor_ctx(), f.item_id, &request) {
        Ok(s) => s,
        Err(e) => panic!("apply must succeed: {e}"),
    };
    // The primary write stands; the failed dependent write is reported.
    assert_eq!(success.ticket.assignee, Some(AssigneeRef::Staff(f.staff_b)));
    assert_eq!(success.inconsistencies.len(), 1);
    assert!(success.inconsistencies[0].contains("planning_board_items.sync_state"));
}

#[test]
fn test_read_phase_is_idempotent_for_blocked_outcomes() {
    let mut f = fixture(PeriodStatus::Locked);
    let request = plain_request(&f);

    let first = apply_proposal(&mut f.store, &supervisor_ctx(), f.item_id, &request);
    let second = apply_proposal(&mut f.store, &supervisor_ctx(), f.item_id, &request);
    assert_eq!(first, second);
    assert_eq!(f.store.ticket_version(f.ticket_id), 1);
}

#[test]
fn test_item_without_ticket_cannot_apply() {
    let mut f = fixture(PeriodStatus::Published);
    let item_id = f.store.put_item(41, None, SyncState::DraftChange, None);
    let proposal_id = f.store.put_proposal(
        51,
        item_id,
        AssigneeRef::Staff(f.staff_b),
        ApplyState::Draft,
    );
    let request = ApplyRequest {
        proposal_id,
        acknowledged_warning_keys: Vec::new(),
        override_locked_period: false,
        override_reason: None,
    };

    let result = apply_proposal(&mut f.store, &supervisor_ctx(), item_id, &request);
    assert!(matches!(result, Err(CoreError::ItemNotLinked { .. })));
}

#[test]
fn test_proposal_must_target_the_item() {
    let mut f = fixture(PeriodStatus::Published);
    let other_item = f.store.put_item(41, Some(f.ticket_id), SyncState::DraftChange, None);
    let stray_proposal = f.store.put_proposal(
        51,
        other_item,
        AssigneeRef::Staff(f.staff_b),
        ApplyState::Draft,
    );
    let request = ApplyRequest {
        proposal_id: stray_proposal,
        acknowledged_warning_keys: Vec::new(),
        override_locked_period: false,
        override_reason: None,
    };

    let result = apply_proposal(&mut f.store, &supervisor_ctx(), f.item_id, &request);
    assert!(matches!(result, Err(CoreError::NotFound { entity: "proposal", .. })));
}

#[test]
fn test_apply_from_synced_item_is_invalid_transition() {
    let mut f = fixture(PeriodStatus::Published);
    let item_id = f.store.put_item(
        41,
        Some(f.ticket_id),
        SyncState::Synced,
        Some(AssigneeRef::Staff(f.staff_a)),
    );
    let proposal_id = f.store.put_proposal(
        51,
        item_id,
        AssigneeRef::Staff(f.staff_b),
        ApplyState::Draft,
    );
    let request = ApplyRequest {
        proposal_id,
        acknowledged_warning_keys: Vec::new(),
        override_locked_period: false,
        override_reason: None,
    };

    let result = apply_proposal(&mut f.store, &supervisor_ctx(), item_id, &request);
    assert!(matches!(result, Err(CoreError::DomainViolation(_))));
}
