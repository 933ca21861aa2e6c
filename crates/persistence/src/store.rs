// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! The SQLite store.
//!
//! Implements the engine's repository contract over rusqlite. Versioned
//! writes are conditional updates (`WHERE version = ?`); zero affected
//! rows is disambiguated into `NotFound` or `VersionConflict` with a
//! follow-up existence check.

use crate::encode::{
    RuleRow, assignee_columns, decode_assignee, decode_certifications, decode_date, decode_enum,
    decode_timestamp, decode_timestamp_opt, decode_window, encode_timestamp, rule_kind_columns,
};
use crate::error::{PersistenceError, db_err};
use crate::schema::initialize_schema;
use fieldops::{
    ConflictFilter, NewBoard, NewItem, NewPeriod, NewProposal, NewRule, NewTrade, Notification,
    PeriodFilter, PersistedConflict, ScheduleStore, StoreError, StoredAuditRecord, TradeFilter,
    Versioned,
};
use fieldops_audit::{Action, Actor, AuditRecord, Cause, EntityRef, Snapshot};
use fieldops_domain::{
    ApplyState, Assignment, AssigneeRef, AvailabilityRule, BoardId, ItemId, PeriodId,
    PeriodStatus, PlanningBoard, PlanningBoardItem, PlanningItemProposal, ProposalId, RuleId,
    ScheduleConflict, SchedulePeriod, ShiftTradeRequest, SiteId, StaffId, StaffRecord,
    SubcontractorId, SyncState, TicketId, TicketStatus, TimeWindow, TradeId, TradeStatus,
    VersionToken, WorkTicket,
};
use rusqlite::{Connection, OptionalExtension, params};
use std::path::Path;
use std::time::Duration;
use time::{Date, OffsetDateTime};
use tracing::{debug, info};

/// How long a statement may wait on a locked database.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Fields for seeding a work ticket.
///
/// Tickets are owned by the schedule domain; the engine only mutates
/// their assignment fields, so creation lives here rather than in the
/// store trait.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTicket {
    /// The site the work takes place at.
    pub site_id: SiteId,
    /// The period the ticket belongs to.
    pub period_id: PeriodId,
    /// The scheduled date.
    pub scheduled_date: Date,
    /// The scheduled window.
    pub window: TimeWindow,
    /// The lifecycle status.
    pub status: TicketStatus,
    /// The initial assignee, if any.
    pub assignee: Option<AssigneeRef>,
    /// Certification the work requires, if any.
    pub required_certification: Option<String>,
}

/// A SQLite-backed [`ScheduleStore`].
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Opens (or creates) a database file and applies the schema.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError` if the file cannot be opened or the
    /// schema cannot be applied.
    pub fn open(path: &Path) -> Result<Self, PersistenceError> {
        let conn: Connection =
            Connection::open(path).map_err(|e| PersistenceError::OpenFailed(e.to_string()))?;
        Self::prepare(conn)
    }

    /// Opens a fresh in-memory database. Used by tests and demos.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError` if the database cannot be created.
    pub fn new_in_memory() -> Result<Self, PersistenceError> {
        let conn: Connection =
            Connection::open_in_memory().map_err(|e| PersistenceError::OpenFailed(e.to_string()))?;
        Self::prepare(conn)
    }

    fn prepare(conn: Connection) -> Result<Self, PersistenceError> {
        conn.busy_timeout(BUSY_TIMEOUT)
            .map_err(|e| PersistenceError::OpenFailed(e.to_string()))?;
        conn.pragma_update(None, "foreign_keys", "ON")
            .map_err(|e| PersistenceError::OpenFailed(e.to_string()))?;
        initialize_schema(&conn)?;
        info!("SQLite store ready");
        Ok(Self { conn })
    }

    // --- Seed helpers (directory data is read-only input to the engine) ---

    /// Inserts a site.
    ///
    /// # Errors
    ///
    /// Returns a store error if the insert fails.
    pub fn insert_site(&mut self, name: &str) -> Result<SiteId, StoreError> {
        self.conn
            .execute("INSERT INTO sites (name) VALUES (?1)", params![name])
            .map_err(|e| db_err(&e))?;
        Ok(SiteId::new(self.conn.last_insert_rowid()))
    }

    /// Inserts a staff member.
    ///
    /// # Errors
    ///
    /// Returns a store error if the insert fails.
    pub fn insert_staff(
        &mut self,
        full_name: &str,
        certifications: &[String],
    ) -> Result<StaffId, StoreError> {
        let certs: String = serde_json::to_string(certifications)
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        self.conn
            .execute(
                "INSERT INTO staff (full_name, certifications) VALUES (?1, ?2)",
                params![full_name, certs],
            )
            .map_err(|e| db_err(&e))?;
        Ok(StaffId::new(self.conn.last_insert_rowid()))
    }

    /// Inserts a subcontractor.
    ///
    /// # Errors
    ///
    /// Returns a store error if the insert fails.
    pub fn insert_subcontractor(&mut self, name: &str) -> Result<SubcontractorId, StoreError> {
        self.conn
            .execute("INSERT INTO subcontractors (name) VALUES (?1)", params![name])
            .map_err(|e| db_err(&e))?;
        Ok(SubcontractorId::new(self.conn.last_insert_rowid()))
    }

    /// Inserts a work ticket.
    ///
    /// # Errors
    ///
    /// Returns a store error if the insert fails.
    pub fn insert_ticket(&mut self, ticket: &NewTicket) -> Result<WorkTicket, StoreError> {
        let (staff, subcontractor) = assignee_columns(ticket.assignee);
        self.conn
            .execute(
                "INSERT INTO work_tickets
                 (site_id, period_id, scheduled_date, start_min, end_min, status,
                  assignee_staff_id, assignee_subcontractor_id, required_certification)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    ticket.site_id.value(),
                    ticket.period_id.value(),
                    ticket.scheduled_date.to_string(),
                    i64::from(ticket.window.start_min()),
                    i64::from(ticket.window.end_min()),
                    ticket.status.as_str(),
                    staff,
                    subcontractor,
                    ticket.required_certification,
                ],
            )
            .map_err(|e| db_err(&e))?;
        let id: TicketId = TicketId::new(self.conn.last_insert_rowid());
        Ok(self.load_ticket(id)?.value)
    }

    /// Writes a ticket's lifecycle status. Used by fixtures and demos.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the ticket does not exist.
    pub fn set_ticket_status(
        &mut self,
        id: TicketId,
        status: TicketStatus,
    ) -> Result<(), StoreError> {
        let affected: usize = self
            .conn
            .execute(
                "UPDATE work_tickets SET status = ?1, version = version + 1 WHERE id = ?2",
                params![status.as_str(), id.value()],
            )
            .map_err(|e| db_err(&e))?;
        if affected == 0 {
            return Err(StoreError::NotFound {
                entity: "work_ticket",
                id: id.to_string(),
            });
        }
        Ok(())
    }

    /// Lists the notifications queued for a staff member, oldest first.
    ///
    /// # Errors
    ///
    /// Returns a store error if the query fails.
    pub fn list_notifications(&mut self, staff_id: StaffId) -> Result<Vec<Notification>, StoreError> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT staff_id, title, body, link FROM notifications
                 WHERE staff_id = ?1 ORDER BY id ASC",
            )
            .map_err(|e| db_err(&e))?;
        let rows = stmt
            .query_map(params![staff_id.value()], |row| {
                Ok(Notification {
                    staff_id: StaffId::new(row.get(0)?),
                    title: row.get(1)?,
                    body: row.get(2)?,
                    link: row.get(3)?,
                })
            })
            .map_err(|e| db_err(&e))?;
        rows.collect::<Result<Vec<_>, _>>().map_err(|e| db_err(&e))
    }

    /// Whether a row exists, for disambiguating failed conditional writes.
    fn row_exists(&self, table: &str, id: i64) -> Result<bool, StoreError> {
        let sql: String = format!("SELECT EXISTS(SELECT 1 FROM {table} WHERE id = ?1)");
        self.conn
            .query_row(&sql, params![id], |row| row.get::<_, bool>(0))
            .map_err(|e| db_err(&e))
    }
}

type TicketRaw = (
    i64,
    i64,
    i64,
    String,
    i64,
    i64,
    String,
    Option<i64>,
    Option<i64>,
    Option<String>,
    i64,
);

fn ticket_from_raw(raw: TicketRaw) -> Result<Versioned<WorkTicket>, StoreError> {
    let (id, site, period, date, start, end, status, staff, sub, cert, version) = raw;
    Ok(Versioned::new(
        WorkTicket {
            id: TicketId::new(id),
            site_id: SiteId::new(site),
            period_id: PeriodId::new(period),
            scheduled_date: decode_date(&date)?,
            window: decode_window(start, end)?,
            status: decode_enum(&status)?,
            assignee: decode_assignee(staff, sub)?,
            required_certification: cert,
        },
        VersionToken::new(version),
    ))
}

type PeriodRaw = (
    i64,
    i64,
    String,
    String,
    String,
    String,
    Option<String>,
    Option<String>,
    Option<String>,
    Option<String>,
);

fn period_from_raw(raw: PeriodRaw) -> Result<SchedulePeriod, StoreError> {
    let (id, site, name, start, end, status, published_at, published_by, locked_at, locked_by) =
        raw;
    Ok(SchedulePeriod {
        id: PeriodId::new(id),
        site_id: SiteId::new(site),
        name,
        period_start: decode_date(&start)?,
        period_end: decode_date(&end)?,
        status: decode_enum(&status)?,
        published_at: decode_timestamp_opt(published_at)?,
        published_by,
        locked_at: decode_timestamp_opt(locked_at)?,
        locked_by,
    })
}

type ItemRaw = (
    i64,
    i64,
    String,
    Option<i64>,
    String,
    Option<i64>,
    Option<i64>,
    String,
    i64,
);

fn item_from_raw(raw: ItemRaw) -> Result<Versioned<PlanningBoardItem>, StoreError> {
    let (id, board, kind, ticket, title, staff, sub, sync_state, version) = raw;
    Ok(Versioned::new(
        PlanningBoardItem {
            id: ItemId::new(id),
            board_id: BoardId::new(board),
            kind: decode_enum(&kind)?,
            ticket_id: ticket.map(TicketId::new),
            title,
            assignee: decode_assignee(staff, sub)?,
            sync_state: decode_enum(&sync_state)?,
        },
        VersionToken::new(version),
    ))
}

type ProposalRaw = (i64, i64, Option<i64>, Option<i64>, String, Option<String>, String);

fn proposal_from_raw(raw: ProposalRaw) -> Result<PlanningItemProposal, StoreError> {
    let (id, item, staff, sub, apply_state, justification, created_at) = raw;
    let proposed: AssigneeRef = decode_assignee(staff, sub)?.ok_or_else(|| {
        StoreError::Backend(String::from("Proposal row has no proposed assignee"))
    })?;
    Ok(PlanningItemProposal {
        id: ProposalId::new(id),
        item_id: ItemId::new(item),
        proposed,
        apply_state: decode_enum(&apply_state)?,
        justification,
        created_at: decode_timestamp(&created_at)?,
    })
}

type TradeRaw = (
    i64,
    i64,
    i64,
    i64,
    String,
    String,
    Option<String>,
    Option<String>,
    String,
    Option<String>,
    Option<String>,
    Option<String>,
    Option<String>,
);

fn trade_from_raw(raw: TradeRaw) -> Result<ShiftTradeRequest, StoreError> {
    let (
        id,
        ticket,
        initiator,
        target,
        request_type,
        status,
        initiator_note,
        manager_note,
        requested_at,
        accepted_at,
        approved_at,
        applied_at,
        resolved_at,
    ) = raw;
    Ok(ShiftTradeRequest {
        id: TradeId::new(id),
        ticket_id: TicketId::new(ticket),
        initiator_staff_id: StaffId::new(initiator),
        target_staff_id: StaffId::new(target),
        request_type: decode_enum(&request_type)?,
        status: decode_enum(&status)?,
        initiator_note,
        manager_note,
        requested_at: decode_timestamp(&requested_at)?,
        accepted_at: decode_timestamp_opt(accepted_at)?,
        approved_at: decode_timestamp_opt(approved_at)?,
        applied_at: decode_timestamp_opt(applied_at)?,
        resolved_at: decode_timestamp_opt(resolved_at)?,
    })
}

const TICKET_COLUMNS: &str = "id, site_id, period_id, scheduled_date, start_min, end_min, status,
    assignee_staff_id, assignee_subcontractor_id, required_certification, version";

const PERIOD_COLUMNS: &str = "id, site_id, period_name, period_start, period_end, status,
    published_at, published_by, locked_at, locked_by";

const ITEM_COLUMNS: &str = "id, board_id, item_kind, ticket_id, title, assignee_staff_id,
    assignee_subcontractor_id, sync_state, version";

const PROPOSAL_COLUMNS: &str =
    "id, item_id, proposed_staff_id, proposed_subcontractor_id, apply_state, justification,
    created_at";

const TRADE_COLUMNS: &str = "id, ticket_id, initiator_staff_id, target_staff_id, request_type,
    status, initiator_note, manager_note, requested_at, accepted_at, approved_at, applied_at,
    resolved_at";

#[allow(clippy::too_many_lines)]
impl ScheduleStore for SqliteStore {
    fn load_ticket(&mut self, id: TicketId) -> Result<Versioned<WorkTicket>, StoreError> {
        let sql: String = format!("SELECT {TICKET_COLUMNS} FROM work_tickets WHERE id = ?1");
        let raw: Option<TicketRaw> = self
            .conn
            .query_row(&sql, params![id.value()], |row| {
                Ok((
                    row.get(0)?,
                    row.get(1)?,
                    row.get(2)?,
                    row.get(3)?,
                    row.get(4)?,
                    row.get(5)?,
                    row.get(6)?,
                    row.get(7)?,
                    row.get(8)?,
                    row.get(9)?,
                    row.get(10)?,
                ))
            })
            .optional()
            .map_err(|e| db_err(&e))?;
        raw.map_or_else(
            || {
                Err(StoreError::NotFound {
                    entity: "work_ticket",
                    id: id.to_string(),
                })
            },
            ticket_from_raw,
        )
    }

    fn update_ticket_assignment(
        &mut self,
        id: TicketId,
        version: VersionToken,
        assignee: Option<AssigneeRef>,
    ) -> Result<Versioned<WorkTicket>, StoreError> {
        let (staff, subcontractor) = assignee_columns(assignee);
        let affected: usize = self
            .conn
            .execute(
                "UPDATE work_tickets
                 SET assignee_staff_id = ?1, assignee_subcontractor_id = ?2,
                     version = version + 1
                 WHERE id = ?3 AND version = ?4",
                params![staff, subcontractor, id.value(), version.value()],
            )
            .map_err(|e| db_err(&e))?;
        if affected == 0 {
            return if self.row_exists("work_tickets", id.value())? {
                Err(StoreError::VersionConflict {
                    entity: "work_ticket",
                    id: id.to_string(),
                })
            } else {
                Err(StoreError::NotFound {
                    entity: "work_ticket",
                    id: id.to_string(),
                })
            };
        }
        debug!(ticket = id.value(), "Updated ticket assignment");
        self.load_ticket(id)
    }

    fn list_tickets_in_period(
        &mut self,
        period_id: PeriodId,
    ) -> Result<Vec<WorkTicket>, StoreError> {
        let sql: String = format!(
            "SELECT {TICKET_COLUMNS} FROM work_tickets WHERE period_id = ?1 ORDER BY id ASC"
        );
        let mut stmt = self.conn.prepare(&sql).map_err(|e| db_err(&e))?;
        let rows = stmt
            .query_map(params![period_id.value()], |row| {
                Ok((
                    row.get(0)?,
                    row.get(1)?,
                    row.get(2)?,
                    row.get(3)?,
                    row.get(4)?,
                    row.get(5)?,
                    row.get(6)?,
                    row.get(7)?,
                    row.get(8)?,
                    row.get(9)?,
                    row.get(10)?,
                ))
            })
            .map_err(|e| db_err(&e))?;
        let mut tickets: Vec<WorkTicket> = Vec::new();
        for raw in rows {
            let raw: TicketRaw = raw.map_err(|e| db_err(&e))?;
            tickets.push(ticket_from_raw(raw)?.value);
        }
        Ok(tickets)
    }

    fn load_period(&mut self, id: PeriodId) -> Result<SchedulePeriod, StoreError> {
        let sql: String = format!("SELECT {PERIOD_COLUMNS} FROM schedule_periods WHERE id = ?1");
        let raw: Option<PeriodRaw> = self
            .conn
            .query_row(&sql, params![id.value()], |row| {
                Ok((
                    row.get(0)?,
                    row.get(1)?,
                    row.get(2)?,
                    row.get(3)?,
                    row.get(4)?,
                    row.get(5)?,
                    row.get(6)?,
                    row.get(7)?,
                    row.get(8)?,
                    row.get(9)?,
                ))
            })
            .optional()
            .map_err(|e| db_err(&e))?;
        raw.map_or_else(
            || {
                Err(StoreError::NotFound {
                    entity: "schedule_period",
                    id: id.to_string(),
                })
            },
            period_from_raw,
        )
    }

    fn insert_period(&mut self, period: &NewPeriod) -> Result<SchedulePeriod, StoreError> {
        self.conn
            .execute(
                "INSERT INTO schedule_periods (site_id, period_name, period_start, period_end)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    period.site_id.value(),
                    period.name,
                    period.period_start.to_string(),
                    period.period_end.to_string(),
                ],
            )
            .map_err(|e| db_err(&e))?;
        let id: PeriodId = PeriodId::new(self.conn.last_insert_rowid());
        self.load_period(id)
    }

    fn update_period_status(
        &mut self,
        id: PeriodId,
        status: PeriodStatus,
        stamped_by: &str,
        stamped_at: OffsetDateTime,
    ) -> Result<SchedulePeriod, StoreError> {
        let stamp: String = encode_timestamp(stamped_at)?;
        let affected: usize = match status {
            PeriodStatus::Published => self
                .conn
                .execute(
                    "UPDATE schedule_periods
                     SET status = ?1, published_at = ?2, published_by = ?3,
                         version = version + 1
                     WHERE id = ?4",
                    params![status.as_str(), stamp, stamped_by, id.value()],
                )
                .map_err(|e| db_err(&e))?,
            PeriodStatus::Locked => self
                .conn
                .execute(
                    "UPDATE schedule_periods
                     SET status = ?1, locked_at = ?2, locked_by = ?3, version = version + 1
                     WHERE id = ?4",
                    params![status.as_str(), stamp, stamped_by, id.value()],
                )
                .map_err(|e| db_err(&e))?,
            PeriodStatus::Draft | PeriodStatus::Archived => self
                .conn
                .execute(
                    "UPDATE schedule_periods SET status = ?1, version = version + 1
                     WHERE id = ?2",
                    params![status.as_str(), id.value()],
                )
                .map_err(|e| db_err(&e))?,
        };
        if affected == 0 {
            return Err(StoreError::NotFound {
                entity: "schedule_period",
                id: id.to_string(),
            });
        }
        debug!(period = id.value(), status = %status, "Updated period status");
        self.load_period(id)
    }

    fn list_periods(&mut self, filter: &PeriodFilter) -> Result<Vec<SchedulePeriod>, StoreError> {
        let sql: String = format!(
            "SELECT {PERIOD_COLUMNS} FROM schedule_periods
             WHERE (?1 IS NULL OR site_id = ?1) AND (?2 IS NULL OR status = ?2)
             ORDER BY period_start DESC, id DESC"
        );
        let mut stmt = self.conn.prepare(&sql).map_err(|e| db_err(&e))?;
        let site: Option<i64> = filter.site_id.map(|s| s.value());
        let status: Option<&str> = filter.status.map(|s| s.as_str());
        let rows = stmt
            .query_map(params![site, status], |row| {
                Ok((
                    row.get(0)?,
                    row.get(1)?,
                    row.get(2)?,
                    row.get(3)?,
                    row.get(4)?,
                    row.get(5)?,
                    row.get(6)?,
                    row.get(7)?,
                    row.get(8)?,
                    row.get(9)?,
                ))
            })
            .map_err(|e| db_err(&e))?;
        let mut periods: Vec<SchedulePeriod> = Vec::new();
        for raw in rows {
            let raw: PeriodRaw = raw.map_err(|e| db_err(&e))?;
            periods.push(period_from_raw(raw)?);
        }
        Ok(periods)
    }

    fn list_active_assignments_for_staff_on_date(
        &mut self,
        staff_id: StaffId,
        date: Date,
    ) -> Result<Vec<Assignment>, StoreError> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT id, scheduled_date, start_min, end_min, status FROM work_tickets
                 WHERE assignee_staff_id = ?1 AND scheduled_date = ?2 AND status != 'CANCELED'
                 ORDER BY id ASC",
            )
            .map_err(|e| db_err(&e))?;
        let rows = stmt
            .query_map(params![staff_id.value(), date.to_string()], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, i64>(2)?,
                    row.get::<_, i64>(3)?,
                    row.get::<_, String>(4)?,
                ))
            })
            .map_err(|e| db_err(&e))?;
        let mut assignments: Vec<Assignment> = Vec::new();
        for raw in rows {
            let (id, date, start, end, status) = raw.map_err(|e| db_err(&e))?;
            assignments.push(Assignment {
                ticket_id: TicketId::new(id),
                date: decode_date(&date)?,
                window: decode_window(start, end)?,
                status: decode_enum(&status)?,
            });
        }
        Ok(assignments)
    }

    fn load_availability_rules(
        &mut self,
        staff_id: StaffId,
    ) -> Result<Vec<AvailabilityRule>, StoreError> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT id, staff_id, rule_type, availability_type, weekday, start_min, end_min,
                        from_date, to_date, notes
                 FROM staff_availability_rules
                 WHERE staff_id = ?1 AND archived_at IS NULL
                 ORDER BY id ASC",
            )
            .map_err(|e| db_err(&e))?;
        let rows = stmt
            .query_map(params![staff_id.value()], |row| {
                Ok(RuleRow {
                    id: row.get(0)?,
                    staff_id: row.get(1)?,
                    rule_type: row.get(2)?,
                    availability_type: row.get(3)?,
                    weekday: row.get(4)?,
                    start_min: row.get(5)?,
                    end_min: row.get(6)?,
                    from_date: row.get(7)?,
                    to_date: row.get(8)?,
                    notes: row.get(9)?,
                })
            })
            .map_err(|e| db_err(&e))?;
        let mut rules: Vec<AvailabilityRule> = Vec::new();
        for raw in rows {
            rules.push(raw.map_err(|e| db_err(&e))?.into_rule()?);
        }
        Ok(rules)
    }

    fn load_staff(&mut self, id: StaffId) -> Result<StaffRecord, StoreError> {
        let raw: Option<(i64, String, String, bool)> = self
            .conn
            .query_row(
                "SELECT id, full_name, certifications, active FROM staff WHERE id = ?1",
                params![id.value()],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
            )
            .optional()
            .map_err(|e| db_err(&e))?;
        let Some((id, full_name, certifications, active)) = raw else {
            return Err(StoreError::NotFound {
                entity: "staff",
                id: id.to_string(),
            });
        };
        Ok(StaffRecord {
            id: StaffId::new(id),
            full_name,
            certifications: decode_certifications(&certifications)?,
            active,
        })
    }

    fn insert_board(&mut self, board: &NewBoard) -> Result<PlanningBoard, StoreError> {
        self.conn
            .execute(
                "INSERT INTO planning_boards (board_date, label) VALUES (?1, ?2)",
                params![board.board_date.to_string(), board.label],
            )
            .map_err(|e| db_err(&e))?;
        let id: i64 = self.conn.last_insert_rowid();
        Ok(PlanningBoard {
            id: BoardId::new(id),
            board_date: board.board_date,
            label: board.label.clone(),
        })
    }

    fn list_boards(&mut self) -> Result<Vec<PlanningBoard>, StoreError> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT id, board_date, label FROM planning_boards
                 ORDER BY board_date DESC, id DESC",
            )
            .map_err(|e| db_err(&e))?;
        let rows = stmt
            .query_map(params![], |row| {
                Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?, row.get::<_, String>(2)?))
            })
            .map_err(|e| db_err(&e))?;
        let mut boards: Vec<PlanningBoard> = Vec::new();
        for raw in rows {
            let (id, board_date, label) = raw.map_err(|e| db_err(&e))?;
            boards.push(PlanningBoard {
                id: BoardId::new(id),
                board_date: decode_date(&board_date)?,
                label,
            });
        }
        Ok(boards)
    }

    fn insert_item(&mut self, item: &NewItem) -> Result<PlanningBoardItem, StoreError> {
        let (staff, subcontractor) = assignee_columns(item.assignee);
        self.conn
            .execute(
                "INSERT INTO planning_board_items
                 (board_id, item_kind, ticket_id, title, assignee_staff_id,
                  assignee_subcontractor_id, sync_state)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    item.board_id.value(),
                    item.kind.as_str(),
                    item.ticket_id.map(|t| t.value()),
                    item.title,
                    staff,
                    subcontractor,
                    SyncState::Synced.as_str(),
                ],
            )
            .map_err(|e| db_err(&e))?;
        let id: ItemId = ItemId::new(self.conn.last_insert_rowid());
        Ok(self.load_item(id)?.value)
    }

    fn load_item(&mut self, id: ItemId) -> Result<Versioned<PlanningBoardItem>, StoreError> {
        let sql: String = format!("SELECT {ITEM_COLUMNS} FROM planning_board_items WHERE id = ?1");
        let raw: Option<ItemRaw> = self
            .conn
            .query_row(&sql, params![id.value()], |row| {
                Ok((
                    row.get(0)?,
                    row.get(1)?,
                    row.get(2)?,
                    row.get(3)?,
                    row.get(4)?,
                    row.get(5)?,
                    row.get(6)?,
                    row.get(7)?,
                    row.get(8)?,
                ))
            })
            .optional()
            .map_err(|e| db_err(&e))?;
        raw.map_or_else(
            || {
                Err(StoreError::NotFound {
                    entity: "planning_board_item",
                    id: id.to_string(),
                })
            },
            item_from_raw,
        )
    }

    fn list_items(&mut self, board_id: BoardId) -> Result<Vec<PlanningBoardItem>, StoreError> {
        let sql: String = format!(
            "SELECT {ITEM_COLUMNS} FROM planning_board_items WHERE board_id = ?1 ORDER BY id ASC"
        );
        let mut stmt = self.conn.prepare(&sql).map_err(|e| db_err(&e))?;
        let rows = stmt
            .query_map(params![board_id.value()], |row| {
                Ok((
                    row.get(0)?,
                    row.get(1)?,
                    row.get(2)?,
                    row.get(3)?,
                    row.get(4)?,
                    row.get(5)?,
                    row.get(6)?,
                    row.get(7)?,
                    row.get(8)?,
                ))
            })
            .map_err(|e| db_err(&e))?;
        let mut items: Vec<PlanningBoardItem> = Vec::new();
        for raw in rows {
            let raw: ItemRaw = raw.map_err(|e| db_err(&e))?;
            items.push(item_from_raw(raw)?.value);
        }
        Ok(items)
    }

    fn update_item_sync_state(
        &mut self,
        id: ItemId,
        version: VersionToken,
        state: SyncState,
        assignee: Option<AssigneeRef>,
    ) -> Result<Versioned<PlanningBoardItem>, StoreError> {
        let (staff, subcontractor) = assignee_columns(assignee);
        let affected: usize = self
            .conn
            .execute(
                "UPDATE planning_board_items
                 SET sync_state = ?1, assignee_staff_id = ?2, assignee_subcontractor_id = ?3,
                     version = version + 1
                 WHERE id = ?4 AND version = ?5",
                params![state.as_str(), staff, subcontractor, id.value(), version.value()],
            )
            .map_err(|e| db_err(&e))?;
        if affected == 0 {
            return if self.row_exists("planning_board_items", id.value())? {
                Err(StoreError::VersionConflict {
                    entity: "planning_board_item",
                    id: id.to_string(),
                })
            } else {
                Err(StoreError::NotFound {
                    entity: "planning_board_item",
                    id: id.to_string(),
                })
            };
        }
        debug!(item = id.value(), state = %state, "Updated item sync state");
        self.load_item(id)
    }

    fn insert_proposal(
        &mut self,
        proposal: &NewProposal,
        created_at: OffsetDateTime,
    ) -> Result<PlanningItemProposal, StoreError> {
        let (staff, subcontractor) = assignee_columns(Some(proposal.proposed));
        self.conn
            .execute(
                "INSERT INTO planning_item_proposals
                 (item_id, proposed_staff_id, proposed_subcontractor_id, justification,
                  created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    proposal.item_id.value(),
                    staff,
                    subcontractor,
                    proposal.justification,
                    encode_timestamp(created_at)?,
                ],
            )
            .map_err(|e| db_err(&e))?;
        let id: ProposalId = ProposalId::new(self.conn.last_insert_rowid());
        self.load_proposal(id)
    }

    fn load_proposal(&mut self, id: ProposalId) -> Result<PlanningItemProposal, StoreError> {
        let sql: String =
            format!("SELECT {PROPOSAL_COLUMNS} FROM planning_item_proposals WHERE id = ?1");
        let raw: Option<ProposalRaw> = self
            .conn
            .query_row(&sql, params![id.value()], |row| {
                Ok((
                    row.get(0)?,
                    row.get(1)?,
                    row.get(2)?,
                    row.get(3)?,
                    row.get(4)?,
                    row.get(5)?,
                    row.get(6)?,
                ))
            })
            .optional()
            .map_err(|e| db_err(&e))?;
        raw.map_or_else(
            || {
                Err(StoreError::NotFound {
                    entity: "proposal",
                    id: id.to_string(),
                })
            },
            proposal_from_raw,
        )
    }

    fn latest_active_proposal(
        &mut self,
        item_id: ItemId,
    ) -> Result<Option<PlanningItemProposal>, StoreError> {
        let sql: String = format!(
            "SELECT {PROPOSAL_COLUMNS} FROM planning_item_proposals
             WHERE item_id = ?1 AND apply_state IN ('draft', 'validated')
             ORDER BY created_at DESC, id DESC LIMIT 1"
        );
        let raw: Option<ProposalRaw> = self
            .conn
            .query_row(&sql, params![item_id.value()], |row| {
                Ok((
                    row.get(0)?,
                    row.get(1)?,
                    row.get(2)?,
                    row.get(3)?,
                    row.get(4)?,
                    row.get(5)?,
                    row.get(6)?,
                ))
            })
            .optional()
            .map_err(|e| db_err(&e))?;
        raw.map(proposal_from_raw).transpose()
    }

    fn update_proposal_apply_state(
        &mut self,
        id: ProposalId,
        state: ApplyState,
    ) -> Result<(), StoreError> {
        let affected: usize = self
            .conn
            .execute(
                "UPDATE planning_item_proposals SET apply_state = ?1 WHERE id = ?2",
                params![state.as_str(), id.value()],
            )
            .map_err(|e| db_err(&e))?;
        if affected == 0 {
            return Err(StoreError::NotFound {
                entity: "proposal",
                id: id.to_string(),
            });
        }
        Ok(())
    }

    fn insert_trade(
        &mut self,
        trade: &NewTrade,
        requested_at: OffsetDateTime,
    ) -> Result<ShiftTradeRequest, StoreError> {
        self.conn
            .execute(
                "INSERT INTO shift_trade_requests
                 (ticket_id, initiator_staff_id, target_staff_id, request_type,
                  initiator_note, requested_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    trade.ticket_id.value(),
                    trade.initiator_staff_id.value(),
                    trade.target_staff_id.value(),
                    trade.request_type.as_str(),
                    trade.initiator_note,
                    encode_timestamp(requested_at)?,
                ],
            )
            .map_err(|e| db_err(&e))?;
        let id: TradeId = TradeId::new(self.conn.last_insert_rowid());
        self.load_trade(id)
    }

    fn load_trade(&mut self, id: TradeId) -> Result<ShiftTradeRequest, StoreError> {
        let sql: String = format!("SELECT {TRADE_COLUMNS} FROM shift_trade_requests WHERE id = ?1");
        let raw: Option<TradeRaw> = self
            .conn
            .query_row(&sql, params![id.value()], |row| {
                Ok((
                    row.get(0)?,
                    row.get(1)?,
                    row.get(2)?,
                    row.get(3)?,
                    row.get(4)?,
                    row.get(5)?,
                    row.get(6)?,
                    row.get(7)?,
                    row.get(8)?,
                    row.get(9)?,
                    row.get(10)?,
                    row.get(11)?,
                    row.get(12)?,
                ))
            })
            .optional()
            .map_err(|e| db_err(&e))?;
        raw.map_or_else(
            || {
                Err(StoreError::NotFound {
                    entity: "shift_trade_request",
                    id: id.to_string(),
                })
            },
            trade_from_raw,
        )
    }

    fn list_trades(
        &mut self,
        filter: &TradeFilter,
    ) -> Result<Vec<ShiftTradeRequest>, StoreError> {
        let sql: String = format!(
            "SELECT {TRADE_COLUMNS} FROM shift_trade_requests
             WHERE (?1 IS NULL OR ticket_id = ?1) AND (?2 IS NULL OR status = ?2)
             ORDER BY requested_at DESC, id DESC"
        );
        let mut stmt = self.conn.prepare(&sql).map_err(|e| db_err(&e))?;
        let ticket: Option<i64> = filter.ticket_id.map(|t| t.value());
        let status: Option<&str> = filter.status.map(|s| s.as_str());
        let rows = stmt
            .query_map(params![ticket, status], |row| {
                Ok((
                    row.get(0)?,
                    row.get(1)?,
                    row.get(2)?,
                    row.get(3)?,
                    row.get(4)?,
                    row.get(5)?,
                    row.get(6)?,
                    row.get(7)?,
                    row.get(8)?,
                    row.get(9)?,
                    row.get(10)?,
                    row.get(11)?,
                    row.get(12)?,
                ))
            })
            .map_err(|e| db_err(&e))?;
        let mut trades: Vec<ShiftTradeRequest> = Vec::new();
        for raw in rows {
            let raw: TradeRaw = raw.map_err(|e| db_err(&e))?;
            trades.push(trade_from_raw(raw)?);
        }
        Ok(trades)
    }

    fn update_trade_status(
        &mut self,
        id: TradeId,
        status: TradeStatus,
        at: OffsetDateTime,
        manager_note: Option<&str>,
    ) -> Result<ShiftTradeRequest, StoreError> {
        let stamp: String = encode_timestamp(at)?;
        let timestamp_column: Option<&str> = match status {
            TradeStatus::Accepted => Some("accepted_at"),
            TradeStatus::Approved => Some("approved_at"),
            TradeStatus::Applied => Some("applied_at"),
            TradeStatus::Denied | TradeStatus::Canceled => Some("resolved_at"),
            TradeStatus::Requested => None,
        };
        let affected: usize = match timestamp_column {
            Some(column) => {
                let sql: String = format!(
                    "UPDATE shift_trade_requests
                     SET status = ?1, manager_note = COALESCE(?2, manager_note),
                         {column} = ?3, version = version + 1
                     WHERE id = ?4"
                );
                self.conn
                    .execute(&sql, params![status.as_str(), manager_note, stamp, id.value()])
                    .map_err(|e| db_err(&e))?
            }
            None => self
                .conn
                .execute(
                    "UPDATE shift_trade_requests
                     SET status = ?1, version = version + 1 WHERE id = ?2",
                    params![status.as_str(), id.value()],
                )
                .map_err(|e| db_err(&e))?,
        };
        if affected == 0 {
            return Err(StoreError::NotFound {
                entity: "shift_trade_request",
                id: id.to_string(),
            });
        }
        debug!(trade = id.value(), status = %status, "Updated trade status");
        self.load_trade(id)
    }

    fn insert_availability_rule(
        &mut self,
        rule: &NewRule,
    ) -> Result<AvailabilityRule, StoreError> {
        let (rule_type, weekday, start_min, end_min, from_date, to_date) =
            rule_kind_columns(&rule.kind);
        self.conn
            .execute(
                "INSERT INTO staff_availability_rules
                 (staff_id, rule_type, availability_type, weekday, start_min, end_min,
                  from_date, to_date, notes)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    rule.staff_id.value(),
                    rule_type,
                    rule.availability.as_str(),
                    weekday,
                    start_min,
                    end_min,
                    from_date,
                    to_date,
                    rule.notes,
                ],
            )
            .map_err(|e| db_err(&e))?;
        let id: RuleId = RuleId::new(self.conn.last_insert_rowid());
        self.load_availability_rule(id)
    }

    fn load_availability_rule(&mut self, id: RuleId) -> Result<AvailabilityRule, StoreError> {
        let raw: Option<RuleRow> = self
            .conn
            .query_row(
                "SELECT id, staff_id, rule_type, availability_type, weekday, start_min, end_min,
                        from_date, to_date, notes
                 FROM staff_availability_rules WHERE id = ?1 AND archived_at IS NULL",
                params![id.value()],
                |row| {
                    Ok(RuleRow {
                        id: row.get(0)?,
                        staff_id: row.get(1)?,
                        rule_type: row.get(2)?,
                        availability_type: row.get(3)?,
                        weekday: row.get(4)?,
                        start_min: row.get(5)?,
                        end_min: row.get(6)?,
                        from_date: row.get(7)?,
                        to_date: row.get(8)?,
                        notes: row.get(9)?,
                    })
                },
            )
            .optional()
            .map_err(|e| db_err(&e))?;
        raw.map_or_else(
            || {
                Err(StoreError::NotFound {
                    entity: "availability_rule",
                    id: id.to_string(),
                })
            },
            RuleRow::into_rule,
        )
    }

    fn archive_availability_rule(
        &mut self,
        id: RuleId,
        archived_by: &str,
        archived_at: OffsetDateTime,
    ) -> Result<AvailabilityRule, StoreError> {
        let rule: AvailabilityRule = self.load_availability_rule(id)?;
        let affected: usize = self
            .conn
            .execute(
                "UPDATE staff_availability_rules SET archived_at = ?1, archived_by = ?2
                 WHERE id = ?3 AND archived_at IS NULL",
                params![encode_timestamp(archived_at)?, archived_by, id.value()],
            )
            .map_err(|e| db_err(&e))?;
        if affected == 0 {
            return Err(StoreError::NotFound {
                entity: "availability_rule",
                id: id.to_string(),
            });
        }
        debug!(rule = id.value(), "Archived availability rule");
        Ok(rule)
    }

    fn record_conflicts(
        &mut self,
        period_id: PeriodId,
        conflicts: &[ScheduleConflict],
        detected_at: OffsetDateTime,
    ) -> Result<(), StoreError> {
        let stamp: String = encode_timestamp(detected_at)?;
        let tx = self.conn.transaction().map_err(|e| db_err(&e))?;
        tx.execute(
            "DELETE FROM schedule_conflicts WHERE period_id = ?1",
            params![period_id.value()],
        )
        .map_err(|e| db_err(&e))?;
        for conflict in conflicts {
            tx.execute(
                "INSERT INTO schedule_conflicts
                 (period_id, ticket_id, staff_id, conflict_type, severity, is_blocking,
                  message, conflict_key, detected_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    period_id.value(),
                    conflict.ticket_id.value(),
                    conflict.staff_id.map(|s| s.value()),
                    conflict.conflict_type.as_str(),
                    conflict.severity.as_str(),
                    conflict.is_blocking(),
                    conflict.message,
                    conflict.key(),
                    stamp,
                ],
            )
            .map_err(|e| db_err(&e))?;
        }
        tx.commit().map_err(|e| db_err(&e))?;
        debug!(
            period = period_id.value(),
            count = conflicts.len(),
            "Recorded conflict sweep"
        );
        Ok(())
    }

    fn list_conflicts(
        &mut self,
        filter: &ConflictFilter,
    ) -> Result<Vec<PersistedConflict>, StoreError> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT id, period_id, ticket_id, staff_id, conflict_type, severity, message,
                        detected_at
                 FROM schedule_conflicts
                 WHERE (?1 IS NULL OR period_id = ?1) AND (?2 IS NULL OR severity = ?2)
                   AND (?3 = 0 OR is_blocking = 1)
                 ORDER BY id ASC",
            )
            .map_err(|e| db_err(&e))?;
        let period: Option<i64> = filter.period_id.map(|p| p.value());
        let severity: Option<&str> = filter.severity.map(|s| s.as_str());
        let rows = stmt
            .query_map(params![period, severity, filter.blocking_only], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, i64>(2)?,
                    row.get::<_, Option<i64>>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, String>(5)?,
                    row.get::<_, String>(6)?,
                    row.get::<_, String>(7)?,
                ))
            })
            .map_err(|e| db_err(&e))?;
        let mut conflicts: Vec<PersistedConflict> = Vec::new();
        for raw in rows {
            let (id, period, ticket, staff, conflict_type, severity, message, detected_at) =
                raw.map_err(|e| db_err(&e))?;
            conflicts.push(PersistedConflict {
                id,
                period_id: PeriodId::new(period),
                conflict: ScheduleConflict {
                    conflict_type: decode_enum(&conflict_type)?,
                    severity: decode_enum(&severity)?,
                    message,
                    ticket_id: TicketId::new(ticket),
                    staff_id: staff.map(StaffId::new),
                },
                detected_at: decode_timestamp(&detected_at)?,
            });
        }
        Ok(conflicts)
    }

    fn append_audit_record(
        &mut self,
        record: &AuditRecord,
        recorded_at: OffsetDateTime,
    ) -> Result<i64, StoreError> {
        let before: Option<String> = record
            .before
            .as_ref()
            .map(|s| serde_json::to_string(&s.data))
            .transpose()
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        let after: Option<String> = record
            .after
            .as_ref()
            .map(|s| serde_json::to_string(&s.data))
            .transpose()
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        self.conn
            .execute(
                "INSERT INTO audit_records
                 (entity_type, entity_id, action, action_details, before_json, after_json,
                  actor_id, actor_type, cause_id, cause_description, recorded_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                params![
                    record.entity.entity_type,
                    record.entity.entity_id,
                    record.action.name,
                    record.action.details,
                    before,
                    after,
                    record.actor.id,
                    record.actor.actor_type,
                    record.cause.id,
                    record.cause.description,
                    encode_timestamp(recorded_at)?,
                ],
            )
            .map_err(|e| db_err(&e))?;
        let event_id: i64 = self.conn.last_insert_rowid();
        debug!(event_id, action = %record.action.name, "Appended audit record");
        Ok(event_id)
    }

    fn list_audit_records(
        &mut self,
        entity_type: &str,
        entity_id: &str,
    ) -> Result<Vec<StoredAuditRecord>, StoreError> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT event_id, entity_type, entity_id, action, action_details, before_json,
                        after_json, actor_id, actor_type, cause_id, cause_description,
                        recorded_at
                 FROM audit_records
                 WHERE entity_type = ?1 AND entity_id = ?2
                 ORDER BY event_id DESC",
            )
            .map_err(|e| db_err(&e))?;
        let rows = stmt
            .query_map(params![entity_type, entity_id], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, Option<String>>(4)?,
                    row.get::<_, Option<String>>(5)?,
                    row.get::<_, Option<String>>(6)?,
                    row.get::<_, String>(7)?,
                    row.get::<_, String>(8)?,
                    row.get::<_, String>(9)?,
                    row.get::<_, String>(10)?,
                    row.get::<_, String>(11)?,
                ))
            })
            .map_err(|e| db_err(&e))?;
        let mut records: Vec<StoredAuditRecord> = Vec::new();
        for raw in rows {
            let (
                event_id,
                entity_type,
                entity_id,
                action,
                details,
                before,
                after,
                actor_id,
                actor_type,
                cause_id,
                cause_description,
                recorded_at,
            ) = raw.map_err(|e| db_err(&e))?;
            let before: Option<Snapshot> = before
                .as_deref()
                .map(serde_json::from_str)
                .transpose()
                .map_err(|e| StoreError::Backend(e.to_string()))?
                .map(Snapshot::new);
            let after: Option<Snapshot> = after
                .as_deref()
                .map(serde_json::from_str)
                .transpose()
                .map_err(|e| StoreError::Backend(e.to_string()))?
                .map(Snapshot::new);
            records.push(StoredAuditRecord {
                event_id,
                record: AuditRecord::new(
                    EntityRef::new(entity_type, entity_id),
                    Action::new(action, details),
                    before,
                    after,
                    Actor::new(actor_id, actor_type),
                    Cause::new(cause_id, cause_description),
                ),
                recorded_at: decode_timestamp(&recorded_at)?,
            });
        }
        Ok(records)
    }

    fn append_notification(
        &mut self,
        notification: &Notification,
        created_at: OffsetDateTime,
    ) -> Result<(), StoreError> {
        self.conn
            .execute(
                "INSERT INTO notifications (staff_id, title, body, link, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    notification.staff_id.value(),
                    notification.title,
                    notification.body,
                    notification.link,
                    encode_timestamp(created_at)?,
                ],
            )
            .map_err(|e| db_err(&e))?;
        Ok(())
    }
}
