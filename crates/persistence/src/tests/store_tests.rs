// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Row round trips and the versioned-write contract.

use super::helpers::{date, open_store, seed_schedule, window};
use fieldops::{
    ConflictFilter, NewBoard, NewItem, NewProposal, NewRule, NewTrade, ScheduleStore,
    StoreError, TradeFilter,
};
use fieldops_domain::{
    ApplyState, AssigneeRef, AvailabilityType, ConflictType, ItemKind, PeriodStatus, RuleKind,
    ScheduleConflict, Severity, SyncState, TicketStatus, TradeRequestType, TradeStatus,
    VersionToken,
};
use time::{Month, OffsetDateTime, Weekday};

#[test]
fn test_ticket_round_trip_preserves_fields() {
    let mut store = open_store();
    let seeded = seed_schedule(&mut store, PeriodStatus::Published);

    let loaded = match store.load_ticket(seeded.ticket) {
        Ok(t) => t,
        Err(e) => panic!("ticket must load: {e}"),
    };
    assert_eq!(loaded.value.scheduled_date, date(2026, Month::March, 2));
    assert_eq!(loaded.value.window, window(1080, 1320));
    assert_eq!(loaded.value.status, TicketStatus::Scheduled);
    assert_eq!(loaded.value.assignee, Some(AssigneeRef::Staff(seeded.staff_a)));
    assert_eq!(loaded.version, VersionToken::new(1));
}

#[test]
fn test_versioned_ticket_write_contract() {
    let mut store = open_store();
    let seeded = seed_schedule(&mut store, PeriodStatus::Published);
    let loaded = match store.load_ticket(seeded.ticket) {
        Ok(t) => t,
        Err(e) => panic!("ticket must load: {e}"),
    };

    // A write with the freshly read version succeeds and bumps it.
    let updated = match store.update_ticket_assignment(
        seeded.ticket,
        loaded.version,
        Some(AssigneeRef::Staff(seeded.staff_b)),
    ) {
        Ok(t) => t,
        Err(e) => panic!("write must succeed: {e}"),
    };
    assert_eq!(updated.version, loaded.version.next());
    assert_eq!(updated.value.assignee, Some(AssigneeRef::Staff(seeded.staff_b)));

    // Replaying the same stale version fails and mutates nothing.
    let stale = store.update_ticket_assignment(
        seeded.ticket,
        loaded.version,
        Some(AssigneeRef::Staff(seeded.staff_a)),
    );
    assert!(matches!(stale, Err(StoreError::VersionConflict { .. })));
    let after = match store.load_ticket(seeded.ticket) {
        Ok(t) => t,
        Err(e) => panic!("ticket must load: {e}"),
    };
    assert_eq!(after.value.assignee, Some(AssigneeRef::Staff(seeded.staff_b)));
    assert_eq!(after.version, updated.version);
}

#[test]
fn test_missing_ticket_is_not_found() {
    let mut store = open_store();
    let result = store.load_ticket(fieldops_domain::TicketId::new(999));
    assert!(matches!(result, Err(StoreError::NotFound { .. })));
}

#[test]
fn test_item_and_proposal_round_trip() {
    let mut store = open_store();
    let seeded = seed_schedule(&mut store, PeriodStatus::Published);
    let board = match store.insert_board(&NewBoard {
        board_date: date(2026, Month::March, 2),
        label: String::from("Monday night plan"),
    }) {
        Ok(b) => b,
        Err(e) => panic!("board must insert: {e}"),
    };

    let item = match store.insert_item(&NewItem {
        board_id: board.id,
        kind: ItemKind::Ticket,
        ticket_id: Some(seeded.ticket),
        title: String::from("Harborview nightly"),
        assignee: Some(AssigneeRef::Staff(seeded.staff_a)),
    }) {
        Ok(i) => i,
        Err(e) => panic!("item must insert: {e}"),
    };
    assert_eq!(item.sync_state, SyncState::Synced);

    let proposal = match store.insert_proposal(
        &NewProposal {
            item_id: item.id,
            proposed: AssigneeRef::Staff(seeded.staff_b),
            justification: Some(String::from("Ana asked off")),
        },
        OffsetDateTime::UNIX_EPOCH,
    ) {
        Ok(p) => p,
        Err(e) => panic!("proposal must insert: {e}"),
    };
    assert_eq!(proposal.apply_state, ApplyState::Draft);

    let latest = match store.latest_active_proposal(item.id) {
        Ok(p) => p,
        Err(e) => panic!("latest must load: {e}"),
    };
    assert_eq!(latest.map(|p| p.id), Some(proposal.id));

    // Terminal proposals drop out of the active lookup.
    if let Err(e) = store.update_proposal_apply_state(proposal.id, ApplyState::Applied) {
        panic!("proposal state must update: {e}");
    }
    let latest = match store.latest_active_proposal(item.id) {
        Ok(p) => p,
        Err(e) => panic!("latest must load: {e}"),
    };
    assert!(latest.is_none());
}

#[test]
fn test_item_versioned_write_contract() {
    let mut store = open_store();
    let seeded = seed_schedule(&mut store, PeriodStatus::Published);
    let board = match store.insert_board(&NewBoard {
        board_date: date(2026, Month::March, 2),
        label: String::from("Monday night plan"),
    }) {
        Ok(b) => b,
        Err(e) => panic!("board must insert: {e}"),
    };
    let item = match store.insert_item(&NewItem {
        board_id: board.id,
        kind: ItemKind::Ticket,
        ticket_id: Some(seeded.ticket),
        title: String::from("Harborview nightly"),
        assignee: None,
    }) {
        Ok(i) => i,
        Err(e) => panic!("item must insert: {e}"),
    };

    let loaded = match store.load_item(item.id) {
        Ok(i) => i,
        Err(e) => panic!("item must load: {e}"),
    };
    assert!(
        store
            .update_item_sync_state(item.id, loaded.version, SyncState::DraftChange, None)
            .is_ok()
    );
    let stale = store.update_item_sync_state(item.id, loaded.version, SyncState::Synced, None);
    assert!(matches!(stale, Err(StoreError::VersionConflict { .. })));
}

#[test]
fn test_assignments_listing_excludes_canceled_and_other_dates() {
    let mut store = open_store();
    let seeded = seed_schedule(&mut store, PeriodStatus::Published);
    let night = date(2026, Month::March, 2);

    // A canceled ticket and one on another date must not appear.
    let canceled = match store.insert_ticket(&crate::store::NewTicket {
        site_id: seeded.site,
        period_id: seeded.period,
        scheduled_date: night,
        window: window(600, 700),
        status: TicketStatus::Scheduled,
        assignee: Some(AssigneeRef::Staff(seeded.staff_a)),
        required_certification: None,
    }) {
        Ok(t) => t.id,
        Err(e) => panic!("ticket must insert: {e}"),
    };
    if let Err(e) = store.set_ticket_status(canceled, TicketStatus::Canceled) {
        panic!("status must update: {e}");
    }
    if let Err(e) = store.insert_ticket(&crate::store::NewTicket {
        site_id: seeded.site,
        period_id: seeded.period,
        scheduled_date: date(2026, Month::March, 3),
        window: window(600, 700),
        status: TicketStatus::Scheduled,
        assignee: Some(AssigneeRef::Staff(seeded.staff_a)),
        required_certification: None,
    }) {
        panic!("ticket must insert: {e}");
    }

    let assignments = match store.list_active_assignments_for_staff_on_date(seeded.staff_a, night)
    {
        Ok(a) => a,
        Err(e) => panic!("assignments must list: {e}"),
    };
    assert_eq!(assignments.len(), 1);
    assert_eq!(assignments[0].ticket_id, seeded.ticket);
}

#[test]
fn test_availability_rule_round_trip_and_archive() {
    let mut store = open_store();
    let seeded = seed_schedule(&mut store, PeriodStatus::Published);

    let weekly = match store.insert_availability_rule(&NewRule {
        staff_id: seeded.staff_a,
        kind: RuleKind::WeeklyRecurring {
            weekday: Weekday::Monday,
            window: window(1080, 1440),
        },
        availability: AvailabilityType::Unavailable,
        notes: Some(String::from("evening class")),
    }) {
        Ok(r) => r,
        Err(e) => panic!("rule must insert: {e}"),
    };
    let one_off = match store.insert_availability_rule(&NewRule {
        staff_id: seeded.staff_a,
        kind: RuleKind::OneOff {
            from: date(2026, Month::March, 5),
            to: date(2026, Month::March, 6),
        },
        availability: AvailabilityType::NotPreferred,
        notes: None,
    }) {
        Ok(r) => r,
        Err(e) => panic!("rule must insert: {e}"),
    };

    let rules = match store.load_availability_rules(seeded.staff_a) {
        Ok(r) => r,
        Err(e) => panic!("rules must list: {e}"),
    };
    assert_eq!(rules.len(), 2);
    assert_eq!(rules[0], weekly);
    assert_eq!(rules[1], one_off);

    // Archiving removes the rule from listings and lookups.
    if let Err(e) =
        store.archive_availability_rule(weekly.id, "op-1", OffsetDateTime::UNIX_EPOCH)
    {
        panic!("archive must succeed: {e}");
    }
    let rules = match store.load_availability_rules(seeded.staff_a) {
        Ok(r) => r,
        Err(e) => panic!("rules must list: {e}"),
    };
    assert_eq!(rules.len(), 1);
    assert!(matches!(
        store.load_availability_rule(weekly.id),
        Err(StoreError::NotFound { .. })
    ));
}

#[test]
fn test_trade_round_trip_and_status_stamps() {
    let mut store = open_store();
    let seeded = seed_schedule(&mut store, PeriodStatus::Published);

    let trade = match store.insert_trade(
        &NewTrade {
            ticket_id: seeded.ticket,
            initiator_staff_id: seeded.staff_a,
            target_staff_id: seeded.staff_b,
            request_type: TradeRequestType::GiveAway,
            initiator_note: Some(String::from("family event")),
        },
        OffsetDateTime::UNIX_EPOCH,
    ) {
        Ok(t) => t,
        Err(e) => panic!("trade must insert: {e}"),
    };
    assert_eq!(trade.status, TradeStatus::Requested);

    let accepted = match store.update_trade_status(
        trade.id,
        TradeStatus::Accepted,
        OffsetDateTime::UNIX_EPOCH,
        None,
    ) {
        Ok(t) => t,
        Err(e) => panic!("trade must update: {e}"),
    };
    assert!(accepted.accepted_at.is_some());

    let denied = match store.update_trade_status(
        trade.id,
        TradeStatus::Denied,
        OffsetDateTime::UNIX_EPOCH,
        Some("coverage too thin"),
    ) {
        Ok(t) => t,
        Err(e) => panic!("trade must update: {e}"),
    };
    assert_eq!(denied.manager_note.as_deref(), Some("coverage too thin"));
    assert!(denied.resolved_at.is_some());

    let listed = match store.list_trades(&TradeFilter {
        ticket_id: Some(seeded.ticket),
        status: Some(TradeStatus::Denied),
    }) {
        Ok(t) => t,
        Err(e) => panic!("trades must list: {e}"),
    };
    assert_eq!(listed.len(), 1);
}

#[test]
fn test_conflict_sweep_replaces_prior_rows() {
    let mut store = open_store();
    let seeded = seed_schedule(&mut store, PeriodStatus::Published);
    let conflict = |ticket: i64| ScheduleConflict {
        conflict_type: ConflictType::DoubleBooking,
        severity: Severity::Blocking,
        message: String::from("overlap"),
        ticket_id: fieldops_domain::TicketId::new(ticket),
        staff_id: Some(seeded.staff_a),
    };

    if let Err(e) = store.record_conflicts(
        seeded.period,
        &[conflict(1), conflict(2)],
        OffsetDateTime::UNIX_EPOCH,
    ) {
        panic!("sweep must record: {e}");
    }
    if let Err(e) =
        store.record_conflicts(seeded.period, &[conflict(3)], OffsetDateTime::UNIX_EPOCH)
    {
        panic!("sweep must record: {e}");
    }

    let listed = match store.list_conflicts(&ConflictFilter {
        period_id: Some(seeded.period),
        ..ConflictFilter::default()
    }) {
        Ok(c) => c,
        Err(e) => panic!("conflicts must list: {e}"),
    };
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].conflict.ticket_id.value(), 3);
    assert_eq!(
        listed[0].conflict.key(),
        format!("double_booking:3:{}", seeded.staff_a)
    );
}

#[test]
fn test_blocking_only_filter() {
    let mut store = open_store();
    let seeded = seed_schedule(&mut store, PeriodStatus::Published);
    let conflicts = vec![
        ScheduleConflict {
            conflict_type: ConflictType::DoubleBooking,
            severity: Severity::Blocking,
            message: String::from("overlap"),
            ticket_id: seeded.ticket,
            staff_id: Some(seeded.staff_a),
        },
        ScheduleConflict {
            conflict_type: ConflictType::NotPreferred,
            severity: Severity::Warning,
            message: String::from("prefers mornings"),
            ticket_id: seeded.ticket,
            staff_id: Some(seeded.staff_a),
        },
    ];
    if let Err(e) = store.record_conflicts(seeded.period, &conflicts, OffsetDateTime::UNIX_EPOCH) {
        panic!("sweep must record: {e}");
    }

    let blocking = match store.list_conflicts(&ConflictFilter {
        period_id: Some(seeded.period),
        severity: None,
        blocking_only: true,
    }) {
        Ok(c) => c,
        Err(e) => panic!("conflicts must list: {e}"),
    };
    assert_eq!(blocking.len(), 1);
    assert_eq!(blocking[0].conflict.conflict_type, ConflictType::DoubleBooking);
}
