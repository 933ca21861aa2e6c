// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Shared fixtures for persistence tests.

use crate::store::{NewTicket, SqliteStore};
use fieldops::{RequestContext, ScheduleStore};
use fieldops_domain::{
    AssigneeRef, PeriodId, PeriodStatus, Role, SiteId, StaffId, TicketId, TicketStatus,
    TimeWindow,
};
use time::{Date, Month, OffsetDateTime};

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

pub fn supervisor_ctx() -> RequestContext {
    RequestContext::new(
        String::from("op-1"),
        vec![Role::Supervisor],
        None,
        String::from("req-1"),
        OffsetDateTime::UNIX_EPOCH,
    )
}

pub fn operations_ctx() -> RequestContext {
    RequestContext::new(
        String::from("op-2"),
        vec![Role::Operations],
        None,
        String::from("req-1"),
        OffsetDateTime::UNIX_EPOCH,
    )
}

pub struct Seeded {
    pub site: SiteId,
    pub period: PeriodId,
    pub staff_a: StaffId,
    pub staff_b: StaffId,
    pub ticket: TicketId,
}

/// A site with a published period, two staff members and one ticket
/// assigned to staff A.
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
    let period = match store.insert_period(&fieldops::NewPeriod {
        site_id: site,
        name: String::from("March week 1"),
        period_start: date(2026, Month::March, 1),
        period_end: date(2026, Month::March, 7),
    }) {
        Ok(p) => p.id,
        Err(e) => panic!("period must insert: {e}"),
    };
    if period_status != PeriodStatus::Draft {
        let ctx = operations_ctx();
        if let Err(e) = store.update_period_status(
            period,
            period_status,
            &ctx.actor_id,
            ctx.now,
        ) {
            panic!("period status must update: {e}");
        }
    }
    let ticket = match store.insert_ticket(&NewTicket {
        site_id: site,
        period_id: period,
        scheduled_date: date(2026, Month::March, 2),
        window: window(1080, 1320),
        status: TicketStatus::Scheduled,
        assignee: Some(AssigneeRef::Staff(staff_a)),
        required_certification: None,
    }) {
        Ok(t) => t.id,
        Err(e) => panic!("ticket must insert: {e}"),
    };
    Seeded {
        site,
        period,
        staff_a,
        staff_b,
        ticket,
    }
}
