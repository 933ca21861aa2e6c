// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Shared fixtures for API tests.
//!
//! Handlers run against a real in-memory SQLite store so the tests
//! exercise the same store contract production uses.

use fieldops::{NewPeriod, ScheduleStore};
use fieldops_domain::{
    AssigneeRef, PeriodId, PeriodStatus, SiteId, StaffId, TicketId, TicketStatus, TimeWindow,
};
use fieldops_persistence::{NewTicket, SqliteStore};
use time::{Date, Month, OffsetDateTime};

use crate::request_response::{
    ApplyItemRequest, CreateBoardRequest, CreateItemRequest, CreateProposalRequest,
    DriftCheckRequest,
};

pub const REQUEST_ID: &str = "req-test";

pub fn now() -> OffsetDateTime {
    OffsetDateTime::UNIX_EPOCH
}

pub fn open_store() -> SqliteStore {
    match SqliteStore::new_in_memory() {
        Ok(store) => store,
        Err(e) => panic!("in-memory store must open: {e}"),
    }
}

pub fn date(year: i32, month: Month, day: u8) -> Date {
    match Date::from_calendar_date(year, month, day) {
        Ok(d) => d,
        Err(e) => panic!("valid date: {e}"),
    }
}

pub fn window(start: u16, end: u16) -> TimeWindow {
    match TimeWindow::new(start, end) {
        Ok(w) => w,
        Err(e) => panic!("valid window: {e}"),
    }
}

pub fn roles(names: &[&str]) -> Vec<String> {
    names.iter().map(ToString::to_string).collect()
}

pub struct Seeded {
    pub site: SiteId,
    pub period: PeriodId,
    pub staff_a: StaffId,
    pub staff_b: StaffId,
    pub ticket: TicketId,
}

/// A site with a period in the given status, two staff members and one
/// ticket on March 2 from 18:00 to 22:00 assigned to staff A.
pub fn seed_schedule(store: &mut SqliteStore, period_status: PeriodStatus) -> Seeded {
    let site = match store.insert_site("Harborview Offices") {
        Ok(s) => s,
        Err(e) => panic!("site must insert: {e}"),
    };
    let staff_a = match store.insert_staff("Ana Reyes", &[]) {
        Ok(s) => s,
        Err(e) => panic!("staff must insert: {e}"),
    };
    let staff_b = match store.insert_staff("Ben Park", &[]) {
        Ok(s) => s,
        Err(e) => panic!("staff must insert: {e}"),
    };
    let period = match store.insert_period(&NewPeriod {
        site_id: site,
        name: String::from("March week 1"),
        period_start: date(2026, Month::March, 1),
        period_end: date(2026, Month::March, 7),
    }) {
        Ok(p) => p.id,
        Err(e) => panic!("period must insert: {e}"),
    };
    if period_status != PeriodStatus::Draft {
        if let Err(e) = store.update_period_status(period, period_status, "op-seed", now()) {
            panic!("period status must update: {e}");
        }
    }
    let ticket = seed_ticket(store, site, period, staff_a, window(1080, 1320));
    Seeded {
        site,
        period,
        staff_a,
        staff_b,
        ticket,
    }
}

/// A second ticket on the seeded date, assigned to the given staff.
pub fn seed_ticket(
    store: &mut SqliteStore,
    site: SiteId,
    period: PeriodId,
    staff: StaffId,
    window: TimeWindow,
) -> TicketId {
    match store.insert_ticket(&NewTicket {
        site_id: site,
        period_id: period,
        scheduled_date: date(2026, Month::March, 2),
        window,
        status: TicketStatus::Scheduled,
        assignee: Some(AssigneeRef::Staff(staff)),
        required_certification: None,
    }) {
        Ok(t) => t.id,
        Err(e) => panic!("ticket must insert: {e}"),
    }
}

/// Stages a board, an item mirroring the seeded ticket, and a proposal
/// reassigning it to staff B. Returns `(item_id, proposal_id)`.
pub fn stage_reassignment(store: &mut SqliteStore, seeded: &Seeded) -> (i64, i64) {
    let board = match crate::create_board(
        store,
        &CreateBoardRequest {
            actor_id: String::from("op-sup"),
            roles: roles(&["SUPERVISOR"]),
            staff_id: None,
            board_date: String::from("2026-03-02"),
            label: String::from("Monday night plan"),
        },
        REQUEST_ID,
        now(),
    ) {
        Ok(b) => b,
        Err(e) => panic!("board must create: {e}"),
    };
    let item = match crate::create_item(
        store,
        board.board_id,
        &CreateItemRequest {
            actor_id: String::from("op-sup"),
            roles: roles(&["SUPERVISOR"]),
            staff_id: None,
            item_kind: String::from("TICKET"),
            ticket_id: Some(seeded.ticket.value()),
            title: String::from("Harborview nightly"),
            current_assignee_staff_id: Some(seeded.staff_a.value()),
            current_assignee_subcontractor_id: None,
        },
        REQUEST_ID,
        now(),
    ) {
        Ok(i) => i,
        Err(e) => panic!("item must create: {e}"),
    };
    let proposal = match crate::create_proposal(
        store,
        item.board_item_id,
        &CreateProposalRequest {
            actor_id: String::from("op-sup"),
            roles: roles(&["SUPERVISOR"]),
            staff_id: None,
            proposed_staff_id: Some(seeded.staff_b.value()),
            proposed_subcontractor_id: None,
            justification: Some(String::from("Ana asked off")),
        },
        REQUEST_ID,
        now(),
    ) {
        Ok(p) => p,
        Err(e) => panic!("proposal must stage: {e}"),
    };
    (item.board_item_id, proposal.proposal_id)
}

/// A supervisor drift check.
pub fn drift_check_request() -> DriftCheckRequest {
    DriftCheckRequest {
        actor_id: String::from("op-sup"),
        roles: roles(&["SUPERVISOR"]),
        staff_id: None,
    }
}

/// A plain supervisor apply submission with no overrides.
pub fn apply_request(proposal_id: i64) -> ApplyItemRequest {
    ApplyItemRequest {
        actor_id: String::from("op-sup"),
        roles: roles(&["SUPERVISOR"]),
        staff_id: None,
        proposal_id,
        acknowledged_warning_ids: vec![],
        override_locked_period: false,
        override_reason: None,
    }
}
