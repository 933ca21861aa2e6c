// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Test helpers: an in-memory `ScheduleStore` with failure injection,
//! plus builders for the common fixtures.

use crate::error::StoreError;
use crate::store::{
    ConflictFilter, NewBoard, NewItem, NewPeriod, NewProposal, NewRule, NewTrade, Notification,
    PeriodFilter, PersistedConflict, ScheduleStore, StoredAuditRecord, TradeFilter, Versioned,
};
use crate::RequestContext;
use fieldops_audit::AuditRecord;
use fieldops_domain::{
    ApplyState, Assignment, AssigneeRef, AvailabilityRule, AvailabilityType, BoardId, ItemId,
    ItemKind, PeriodId, PeriodStatus, PlanningBoard, PlanningBoardItem, PlanningItemProposal,
    ProposalId, Role, RuleId, RuleKind, ScheduleConflict, SchedulePeriod, ShiftTradeRequest,
    SiteId, StaffId, StaffRecord, SyncState, TicketId, TicketStatus, TimeWindow, TradeId,
    TradeRequestType, TradeStatus, VersionToken, WorkTicket,
};
use std::collections::HashMap;
use time::{Date, Month, OffsetDateTime};

/// In-memory store satisfying the optimistic-concurrency contract.
///
/// Failure counters let tests inject transient dependent-write failures.
#[derive(Default)]
pub struct MemoryStore {
    pub tickets: HashMap<i64, (WorkTicket, i64)>,
    pub periods: HashMap<i64, SchedulePeriod>,
    pub boards: HashMap<i64, PlanningBoard>,
    pub items: HashMap<i64, (PlanningBoardItem, i64)>,
    pub proposals: HashMap<i64, PlanningItemProposal>,
    pub trades: HashMap<i64, ShiftTradeRequest>,
    pub rules: HashMap<i64, (AvailabilityRule, bool)>,
    pub staff: HashMap<i64, StaffRecord>,
    pub conflicts: Vec<PersistedConflict>,
    pub audits: Vec<StoredAuditRecord>,
    pub notifications: Vec<Notification>,
    next_id: i64,
    /// Remaining ticket writes that will lose the version race.
    pub conflict_ticket_updates: u32,
    /// Remaining item-sync-state writes that will fail.
    pub fail_item_updates: u32,
    /// Remaining proposal-state writes that will fail.
    pub fail_proposal_updates: u32,
    /// Remaining audit appends that will fail.
    pub fail_audit_appends: u32,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    pub fn put_staff(&mut self, id: i64, name: &str, certifications: &[&str]) -> StaffId {
        let staff_id = StaffId::new(id);
        self.staff.insert(
            id,
            StaffRecord {
                id: staff_id,
                full_name: name.to_string(),
                certifications: certifications.iter().map(ToString::to_string).collect(),
                active: true,
            },
        );
        staff_id
    }

    pub fn put_period(&mut self, id: i64, status: PeriodStatus) -> PeriodId {
        let period_id = PeriodId::new(id);
        self.periods.insert(
            id,
            SchedulePeriod {
                id: period_id,
                site_id: SiteId::new(1),
                name: format!("Period {id}"),
                period_start: date(2026, Month::March, 1),
                period_end: date(2026, Month::March, 14),
                status,
                published_at: None,
                published_by: None,
                locked_at: None,
                locked_by: None,
            },
        );
        period_id
    }

    pub fn put_ticket(
        &mut self,
        id: i64,
        period_id: PeriodId,
        scheduled_date: Date,
        window: TimeWindow,
        assignee: Option<AssigneeRef>,
    ) -> TicketId {
        let ticket_id = TicketId::new(id);
        self.tickets.insert(
            id,
            (
                WorkTicket {
                    id: ticket_id,
                    site_id: SiteId::new(1),
                    period_id,
                    scheduled_date,
                    window,
                    status: TicketStatus::Scheduled,
                    assignee,
                    required_certification: None,
                },
                1,
            ),
        );
        ticket_id
    }

    pub fn put_item(
        &mut self,
        id: i64,
        ticket_id: Option<TicketId>,
        sync_state: SyncState,
        assignee: Option<AssigneeRef>,
    ) -> ItemId {
        let item_id = ItemId::new(id);
        self.items.insert(
            id,
            (
                PlanningBoardItem {
                    id: item_id,
                    board_id: BoardId::new(1),
                    kind: ItemKind::Ticket,
                    ticket_id,
                    title: format!("Item {id}"),
                    assignee,
                    sync_state,
                },
                1,
            ),
        );
        item_id
    }

    pub fn put_proposal(
        &mut self,
        id: i64,
        item_id: ItemId,
        proposed: AssigneeRef,
        apply_state: ApplyState,
    ) -> ProposalId {
        let proposal_id = ProposalId::new(id);
        self.proposals.insert(
            id,
            PlanningItemProposal {
                id: proposal_id,
                item_id,
                proposed,
                apply_state,
                justification: None,
                created_at: OffsetDateTime::UNIX_EPOCH,
            },
        );
        proposal_id
    }

    pub fn put_rule(
        &mut self,
        id: i64,
        staff_id: StaffId,
        kind: RuleKind,
        availability: AvailabilityType,
    ) -> RuleId {
        let rule_id = RuleId::new(id);
        self.rules.insert(
            id,
            (
                AvailabilityRule {
                    id: rule_id,
                    staff_id,
                    kind,
                    availability,
                    notes: None,
                },
                false,
            ),
        );
        rule_id
    }

    pub fn ticket_version(&self, id: TicketId) -> i64 {
        self.tickets.get(&id.value()).map_or(0, |(_, v)| *v)
    }

    pub fn audit_actions(&self) -> Vec<String> {
        self.audits
            .iter()
            .map(|a| a.record.action.name.clone())
            .collect()
    }
}

impl ScheduleStore for MemoryStore {
    fn load_ticket(&mut self, id: TicketId) -> Result<Versioned<WorkTicket>, StoreError> {
        self.tickets
            .get(&id.value())
            .map(|(t, v)| Versioned::new(t.clone(), VersionToken::new(*v)))
            .ok_or(StoreError::NotFound {
                entity: "work_ticket",
                id: id.to_string(),
            })
    }

    fn update_ticket_assignment(
        &mut self,
        id: TicketId,
        version: VersionToken,
        assignee: Option<AssigneeRef>,
    ) -> Result<Versioned<WorkTicket>, StoreError> {
        if self.conflict_ticket_updates > 0 {
            // Simulates another writer having committed between this
            // request's read and its conditional write.
            self.conflict_ticket_updates -= 1;
            if let Some((_, stored)) = self.tickets.get_mut(&id.value()) {
                *stored += 1;
            }
        }
        let Some((ticket, stored)) = self.tickets.get_mut(&id.value()) else {
            return Err(StoreError::NotFound {
                entity: "work_ticket",
                id: id.to_string(),
            });
        };
        if *stored != version.value() {
            return Err(StoreError::VersionConflict {
                entity: "work_ticket",
                id: id.to_string(),
            });
        }
        ticket.assignee = assignee;
        *stored += 1;
        Ok(Versioned::new(ticket.clone(), VersionToken::new(*stored)))
    }

    fn list_tickets_in_period(
        &mut self,
        period_id: PeriodId,
    ) -> Result<Vec<WorkTicket>, StoreError> {
        let mut tickets: Vec<WorkTicket> = self
            .tickets
            .values()
            .filter(|(t, _)| t.period_id == period_id)
            .map(|(t, _)| t.clone())
            .collect();
        tickets.sort_by_key(|t| t.id);
        Ok(tickets)
    }

    fn load_period(&mut self, id: PeriodId) -> Result<SchedulePeriod, StoreError> {
        self.periods
            .get(&id.value())
            .cloned()
            .ok_or(StoreError::NotFound {
                entity: "schedule_period",
                id: id.to_string(),
            })
    }

    fn insert_period(&mut self, period: &NewPeriod) -> Result<SchedulePeriod, StoreError> {
        let id = self.next_id();
        let created = SchedulePeriod {
            id: PeriodId::new(id),
            site_id: period.site_id,
            name: period.name.clone(),
            period_start: period.period_start,
            period_end: period.period_end,
            status: PeriodStatus::Draft,
            published_at: None,
            published_by: None,
            locked_at: None,
            locked_by: None,
        };
        self.periods.insert(id, created.clone());
        Ok(created)
    }

    fn update_period_status(
        &mut self,
        id: PeriodId,
        status: PeriodStatus,
        stamped_by: &str,
        stamped_at: OffsetDateTime,
    ) -> Result<SchedulePeriod, StoreError> {
        let Some(period) = self.periods.get_mut(&id.value()) else {
            return Err(StoreError::NotFound {
                entity: "schedule_period",
                id: id.to_string(),
            });
        };
        period.status = status;
        match status {
            PeriodStatus::Published => {
                period.published_at = Some(stamped_at);
                period.published_by = Some(stamped_by.to_string());
            }
            PeriodStatus::Locked => {
                period.locked_at = Some(stamped_at);
                period.locked_by = Some(stamped_by.to_string());
            }
            PeriodStatus::Draft | PeriodStatus::Archived => {}
        }
        Ok(period.clone())
    }

    fn list_periods(&mut self, filter: &PeriodFilter) -> Result<Vec<SchedulePeriod>, StoreError> {
        let mut periods: Vec<SchedulePeriod> = self
            .periods
            .values()
            .filter(|p| filter.site_id.is_none_or(|s| p.site_id == s))
            .filter(|p| filter.status.is_none_or(|s| p.status == s))
            .cloned()
            .collect();
        periods.sort_by_key(|p| std::cmp::Reverse(p.id));
        Ok(periods)
    }

    fn list_active_assignments_for_staff_on_date(
        &mut self,
        staff_id: StaffId,
        date: Date,
    ) -> Result<Vec<Assignment>, StoreError> {
        let mut assignments: Vec<Assignment> = self
            .tickets
            .values()
            .filter(|(t, _)| {
                t.assignee == Some(AssigneeRef::Staff(staff_id))
                    && t.scheduled_date == date
                    && t.status.is_active()
            })
            .map(|(t, _)| Assignment {
                ticket_id: t.id,
                date: t.scheduled_date,
                window: t.window,
                status: t.status,
            })
            .collect();
        assignments.sort_by_key(|a| a.ticket_id);
        Ok(assignments)
    }

    fn load_availability_rules(
        &mut self,
        staff_id: StaffId,
    ) -> Result<Vec<AvailabilityRule>, StoreError> {
        let mut rules: Vec<AvailabilityRule> = self
            .rules
            .values()
            .filter(|(r, archived)| r.staff_id == staff_id && !archived)
            .map(|(r, _)| r.clone())
            .collect();
        rules.sort_by_key(|r| r.id);
        Ok(rules)
    }

    fn load_staff(&mut self, id: StaffId) -> Result<StaffRecord, StoreError> {
        self.staff
            .get(&id.value())
            .cloned()
            .ok_or(StoreError::NotFound {
                entity: "staff",
                id: id.to_string(),
            })
    }

    fn insert_board(&mut self, board: &NewBoard) -> Result<PlanningBoard, StoreError> {
        let id = self.next_id();
        let created = PlanningBoard {
            id: BoardId::new(id),
            board_date: board.board_date,
            label: board.label.clone(),
        };
        self.boards.insert(id, created.clone());
        Ok(created)
    }

    fn list_boards(&mut self) -> Result<Vec<PlanningBoard>, StoreError> {
        let mut boards: Vec<PlanningBoard> = self.boards.values().cloned().collect();
        boards.sort_by_key(|b| std::cmp::Reverse(b.id));
        Ok(boards)
    }

    fn insert_item(&mut self, item: &NewItem) -> Result<PlanningBoardItem, StoreError> {
        if !self.boards.contains_key(&item.board_id.value()) {
            return Err(StoreError::NotFound {
                entity: "planning_board",
                id: item.board_id.to_string(),
            });
        }
        let id = self.next_id();
        let created = PlanningBoardItem {
            id: ItemId::new(id),
            board_id: item.board_id,
            kind: item.kind,
            ticket_id: item.ticket_id,
            title: item.title.clone(),
            assignee: item.assignee,
            sync_state: SyncState::Synced,
        };
        self.items.insert(id, (created.clone(), 1));
        Ok(created)
    }

    fn load_item(&mut self, id: ItemId) -> Result<Versioned<PlanningBoardItem>, StoreError> {
        self.items
            .get(&id.value())
            .map(|(i, v)| Versioned::new(i.clone(), VersionToken::new(*v)))
            .ok_or(StoreError::NotFound {
                entity: "planning_board_item",
                id: id.to_string(),
            })
    }

    fn list_items(&mut self, board_id: BoardId) -> Result<Vec<PlanningBoardItem>, StoreError> {
        let mut items: Vec<PlanningBoardItem> = self
            .items
            .values()
            .filter(|(i, _)| i.board_id == board_id)
            .map(|(i, _)| i.clone())
            .collect();
        items.sort_by_key(|i| i.id);
        Ok(items)
    }

    fn update_item_sync_state(
        &mut self,
        id: ItemId,
        version: VersionToken,
        state: SyncState,
        assignee: Option<AssigneeRef>,
    ) -> Result<Versioned<PlanningBoardItem>, StoreError> {
        if self.fail_item_updates > 0 {
            self.fail_item_updates -= 1;
            return Err(StoreError::Backend(String::from("injected item failure")));
        }
        let Some((item, stored)) = self.items.get_mut(&id.value()) else {
            return Err(StoreError::NotFound {
                entity: "planning_board_item",
                id: id.to_string(),
            });
        };
        if *stored != version.value() {
            return Err(StoreError::VersionConflict {
                entity: "planning_board_item",
                id: id.to_string(),
            });
        }
        item.sync_state = state;
        item.assignee = assignee;
        *stored += 1;
        Ok(Versioned::new(item.clone(), VersionToken::new(*stored)))
    }

    fn insert_proposal(
        &mut self,
        proposal: &NewProposal,
        created_at: OffsetDateTime,
    ) -> Result<PlanningItemProposal, StoreError> {
        let id = self.next_id();
        let created = PlanningItemProposal {
            id: ProposalId::new(id),
            item_id: proposal.item_id,
            proposed: proposal.proposed,
            apply_state: ApplyState::Draft,
            justification: proposal.justification.clone(),
            created_at,
        };
        self.proposals.insert(id, created.clone());
        Ok(created)
    }

    fn load_proposal(&mut self, id: ProposalId) -> Result<PlanningItemProposal, StoreError> {
        self.proposals
            .get(&id.value())
            .cloned()
            .ok_or(StoreError::NotFound {
                entity: "proposal",
                id: id.to_string(),
            })
    }

    fn latest_active_proposal(
        &mut self,
        item_id: ItemId,
    ) -> Result<Option<PlanningItemProposal>, StoreError> {
        Ok(self
            .proposals
            .values()
            .filter(|p| p.item_id == item_id && p.apply_state.is_active())
            .max_by_key(|p| (p.created_at, p.id))
            .cloned())
    }

    fn update_proposal_apply_state(
        &mut self,
        id: ProposalId,
        state: ApplyState,
    ) -> Result<(), StoreError> {
        if self.fail_proposal_updates > 0 {
            self.fail_proposal_updates -= 1;
            return Err(StoreError::Backend(String::from(
                "injected proposal failure",
            )));
        }
        let Some(proposal) = self.proposals.get_mut(&id.value()) else {
            return Err(StoreError::NotFound {
                entity: "proposal",
                id: id.to_string(),
            });
        };
        proposal.apply_state = state;
        Ok(())
    }

    fn insert_trade(
        &mut self,
        trade: &NewTrade,
        requested_at: OffsetDateTime,
    ) -> Result<ShiftTradeRequest, StoreError> {
        let id = self.next_id();
        let created = ShiftTradeRequest {
            id: TradeId::new(id),
            ticket_id: trade.ticket_id,
            initiator_staff_id: trade.initiator_staff_id,
            target_staff_id: trade.target_staff_id,
            request_type: trade.request_type,
            status: TradeStatus::Requested,
            initiator_note: trade.initiator_note.clone(),
            manager_note: None,
            requested_at,
            accepted_at: None,
            approved_at: None,
            applied_at: None,
            resolved_at: None,
        };
        self.trades.insert(id, created.clone());
        Ok(created)
    }

    fn load_trade(&mut self, id: TradeId) -> Result<ShiftTradeRequest, StoreError> {
        self.trades
            .get(&id.value())
            .cloned()
            .ok_or(StoreError::NotFound {
                entity: "shift_trade_request",
                id: id.to_string(),
            })
    }

    fn list_trades(
        &mut self,
        filter: &TradeFilter,
    ) -> Result<Vec<ShiftTradeRequest>, StoreError> {
        let mut trades: Vec<ShiftTradeRequest> = self
            .trades
            .values()
            .filter(|t| filter.ticket_id.is_none_or(|id| t.ticket_id == id))
            .filter(|t| filter.status.is_none_or(|s| t.status == s))
            .cloned()
            .collect();
        trades.sort_by_key(|t| std::cmp::Reverse(t.id));
        Ok(trades)
    }

    fn update_trade_status(
        &mut self,
        id: TradeId,
        status: TradeStatus,
        at: OffsetDateTime,
        manager_note: Option<&str>,
    ) -> Result<ShiftTradeRequest, StoreError> {
        let Some(trade) = self.trades.get_mut(&id.value()) else {
            return Err(StoreError::NotFound {
                entity: "shift_trade_request",
                id: id.to_string(),
            });
        };
        trade.status = status;
        match status {
            TradeStatus::Accepted => trade.accepted_at = Some(at),
            TradeStatus::Approved => trade.approved_at = Some(at),
            TradeStatus::Applied => trade.applied_at = Some(at),
            TradeStatus::Denied | TradeStatus::Canceled => trade.resolved_at = Some(at),
            TradeStatus::Requested => {}
        }
        if let Some(note) = manager_note {
            trade.manager_note = Some(note.to_string());
        }
        Ok(trade.clone())
    }

    fn insert_availability_rule(
        &mut self,
        rule: &NewRule,
    ) -> Result<AvailabilityRule, StoreError> {
        let id = self.next_id();
        let created = AvailabilityRule {
            id: RuleId::new(id),
            staff_id: rule.staff_id,
            kind: rule.kind.clone(),
            availability: rule.availability,
            notes: rule.notes.clone(),
        };
        self.rules.insert(id, (created.clone(), false));
        Ok(created)
    }

    fn load_availability_rule(&mut self, id: RuleId) -> Result<AvailabilityRule, StoreError> {
        match self.rules.get(&id.value()) {
            Some((rule, false)) => Ok(rule.clone()),
            _ => Err(StoreError::NotFound {
                entity: "availability_rule",
                id: id.to_string(),
            }),
        }
    }

    fn archive_availability_rule(
        &mut self,
        id: RuleId,
        _archived_by: &str,
        _archived_at: OffsetDateTime,
    ) -> Result<AvailabilityRule, StoreError> {
        match self.rules.get_mut(&id.value()) {
            Some((rule, archived)) if !*archived => {
                *archived = true;
                Ok(rule.clone())
            }
            _ => Err(StoreError::NotFound {
                entity: "availability_rule",
                id: id.to_string(),
            }),
        }
    }

    fn record_conflicts(
        &mut self,
        period_id: PeriodId,
        conflicts: &[ScheduleConflict],
        detected_at: OffsetDateTime,
    ) -> Result<(), StoreError> {
        self.conflicts.retain(|c| c.period_id != period_id);
        for conflict in conflicts {
            let id = self.next_id();
            self.conflicts.push(PersistedConflict {
                id,
                period_id,
                conflict: conflict.clone(),
                detected_at,
            });
        }
        Ok(())
    }

    fn list_conflicts(
        &mut self,
        filter: &ConflictFilter,
    ) -> Result<Vec<PersistedConflict>, StoreError> {
        Ok(self
            .conflicts
            .iter()
            .filter(|c| filter.period_id.is_none_or(|id| c.period_id == id))
            .filter(|c| filter.severity.is_none_or(|s| c.conflict.severity == s))
            .filter(|c| !filter.blocking_only || c.conflict.is_blocking())
            .cloned()
            .collect())
    }

    fn append_audit_record(
        &mut self,
        record: &AuditRecord,
        recorded_at: OffsetDateTime,
    ) -> Result<i64, StoreError> {
        if self.fail_audit_appends > 0 {
            self.fail_audit_appends -= 1;
            return Err(StoreError::Backend(String::from("injected audit failure")));
        }
        let event_id = self.next_id();
        self.audits.push(StoredAuditRecord {
            event_id,
            record: record.clone(),
            recorded_at,
        });
        Ok(event_id)
    }

    fn list_audit_records(
        &mut self,
        entity_type: &str,
        entity_id: &str,
    ) -> Result<Vec<StoredAuditRecord>, StoreError> {
        let mut records: Vec<StoredAuditRecord> = self
            .audits
            .iter()
            .filter(|a| {
                a.record.entity.entity_type == entity_type && a.record.entity.entity_id == entity_id
            })
            .cloned()
            .collect();
        records.sort_by_key(|a| std::cmp::Reverse(a.event_id));
        Ok(records)
    }

    fn append_notification(
        &mut self,
        notification: &Notification,
        _created_at: OffsetDateTime,
    ) -> Result<(), StoreError> {
        self.notifications.push(notification.clone());
        Ok(())
    }
}

/// A calendar date fixture.
pub fn date(year: i32, month: Month, day: u8) -> Date {
    match Date::from_calendar_date(year, month, day) {
        Ok(d) => d,
        Err(e) => panic!("valid date: {e}"),
    }
}

/// A time window fixture.
pub fn window(start: u16, end: u16) -> TimeWindow {
    match TimeWindow::new(start, end) {
        Ok(w) => w,
        Err(e) => panic!("valid window: {e}"),
    }
}

/// A request context fixture for an operator with the given roles.
pub fn ctx_with_roles(roles: &[Role]) -> RequestContext {
    RequestContext::new(
        String::from("op-1"),
        roles.to_vec(),
        None,
        String::from("req-1"),
        OffsetDateTime::UNIX_EPOCH,
    )
}

/// A request context fixture for a staff member acting for themself.
pub fn ctx_as_staff(staff_id: StaffId) -> RequestContext {
    RequestContext::new(
        format!("staff-{staff_id}"),
        vec![Role::Cleaner],
        Some(staff_id),
        String::from("req-1"),
        OffsetDateTime::UNIX_EPOCH,
    )
}

/// A supervisor context, the common case for planning operations.
pub fn supervisor_ctx() -> RequestContext {
    ctx_with_roles(&[Role::Supervisor])
}

/// A manager context, for override and trade decisions.
pub fn manager_ctx() -> RequestContext {
    ctx_with_roles(&[Role::Manager])
}
