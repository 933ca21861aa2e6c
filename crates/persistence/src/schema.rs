// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Schema bootstrap.
//!
//! Every mutable row carries a `version` column for optimistic
//! concurrency. Soft-deletable rows carry `archived_at`/`archived_by`.

use crate::error::PersistenceError;
use rusqlite::Connection;

/// The full schema, applied idempotently.
const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS sites (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS staff (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    full_name TEXT NOT NULL,
    certifications TEXT NOT NULL DEFAULT '[]',
    active INTEGER NOT NULL DEFAULT 1
);

CREATE TABLE IF NOT EXISTS subcontractors (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    active INTEGER NOT NULL DEFAULT 1
);

CREATE TABLE IF NOT EXISTS schedule_periods (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    site_id INTEGER NOT NULL REFERENCES sites(id),
    period_name TEXT NOT NULL,
    period_start TEXT NOT NULL,
    period_end TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'DRAFT',
    published_at TEXT,
    published_by TEXT,
    locked_at TEXT,
    locked_by TEXT,
    version INTEGER NOT NULL DEFAULT 1
);

CREATE TABLE IF NOT EXISTS work_tickets (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    site_id INTEGER NOT NULL REFERENCES sites(id),
    period_id INTEGER NOT NULL REFERENCES schedule_periods(id),
    scheduled_date TEXT NOT NULL,
    start_min INTEGER NOT NULL,
    end_min INTEGER NOT NULL,
    status TEXT NOT NULL DEFAULT 'SCHEDULED',
    assignee_staff_id INTEGER REFERENCES staff(id),
    assignee_subcontractor_id INTEGER REFERENCES subcontractors(id),
    required_certification TEXT,
    version INTEGER NOT NULL DEFAULT 1,
    CHECK (assignee_staff_id IS NULL OR assignee_subcontractor_id IS NULL)
);

CREATE INDEX IF NOT EXISTS idx_tickets_staff_date
    ON work_tickets(assignee_staff_id, scheduled_date);
CREATE INDEX IF NOT EXISTS idx_tickets_period ON work_tickets(period_id);

CREATE TABLE IF NOT EXISTS planning_boards (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    board_date TEXT NOT NULL,
    label TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS planning_board_items (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    board_id INTEGER NOT NULL REFERENCES planning_boards(id),
    item_kind TEXT NOT NULL DEFAULT 'TICKET',
    ticket_id INTEGER REFERENCES work_tickets(id),
    title TEXT NOT NULL,
    assignee_staff_id INTEGER REFERENCES staff(id),
    assignee_subcontractor_id INTEGER REFERENCES subcontractors(id),
    sync_state TEXT NOT NULL DEFAULT 'synced',
    version INTEGER NOT NULL DEFAULT 1,
    CHECK (assignee_staff_id IS NULL OR assignee_subcontractor_id IS NULL)
);

CREATE INDEX IF NOT EXISTS idx_items_board ON planning_board_items(board_id);

CREATE TABLE IF NOT EXISTS planning_item_proposals (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    item_id INTEGER NOT NULL REFERENCES planning_board_items(id),
    proposed_staff_id INTEGER REFERENCES staff(id),
    proposed_subcontractor_id INTEGER REFERENCES subcontractors(id),
    apply_state TEXT NOT NULL DEFAULT 'draft',
    justification TEXT,
    created_at TEXT NOT NULL,
    CHECK (proposed_staff_id IS NOT NULL OR proposed_subcontractor_id IS NOT NULL),
    CHECK (proposed_staff_id IS NULL OR proposed_subcontractor_id IS NULL)
);

CREATE INDEX IF NOT EXISTS idx_proposals_item ON planning_item_proposals(item_id);

CREATE TABLE IF NOT EXISTS staff_availability_rules (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    staff_id INTEGER NOT NULL REFERENCES staff(id),
    rule_type TEXT NOT NULL,
    availability_type TEXT NOT NULL,
    weekday INTEGER,
    start_min INTEGER,
    end_min INTEGER,
    from_date TEXT,
    to_date TEXT,
    notes TEXT,
    archived_at TEXT,
    archived_by TEXT
);

CREATE INDEX IF NOT EXISTS idx_rules_staff ON staff_availability_rules(staff_id);

CREATE TABLE IF NOT EXISTS shift_trade_requests (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    ticket_id INTEGER NOT NULL REFERENCES work_tickets(id),
    initiator_staff_id INTEGER NOT NULL REFERENCES staff(id),
    target_staff_id INTEGER NOT NULL REFERENCES staff(id),
    request_type TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'requested',
    initiator_note TEXT,
    manager_note TEXT,
    requested_at TEXT NOT NULL,
    accepted_at TEXT,
    approved_at TEXT,
    applied_at TEXT,
    resolved_at TEXT,
    version INTEGER NOT NULL DEFAULT 1
);

CREATE INDEX IF NOT EXISTS idx_trades_ticket ON shift_trade_requests(ticket_id);

CREATE TABLE IF NOT EXISTS schedule_conflicts (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    period_id INTEGER NOT NULL REFERENCES schedule_periods(id),
    ticket_id INTEGER NOT NULL,
    staff_id INTEGER,
    conflict_type TEXT NOT NULL,
    severity TEXT NOT NULL,
    is_blocking INTEGER NOT NULL,
    message TEXT NOT NULL,
    conflict_key TEXT NOT NULL,
    detected_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_conflicts_period ON schedule_conflicts(period_id);

CREATE TABLE IF NOT EXISTS audit_records (
    event_id INTEGER PRIMARY KEY AUTOINCREMENT,
    entity_type TEXT NOT NULL,
    entity_id TEXT NOT NULL,
    action TEXT NOT NULL,
    action_details TEXT,
    before_json TEXT,
    after_json TEXT,
    actor_id TEXT NOT NULL,
    actor_type TEXT NOT NULL,
    cause_id TEXT NOT NULL,
    cause_description TEXT NOT NULL,
    recorded_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_audit_entity ON audit_records(entity_type, entity_id);

CREATE TABLE IF NOT EXISTS notifications (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    staff_id INTEGER NOT NULL REFERENCES staff(id),
    title TEXT NOT NULL,
    body TEXT NOT NULL,
    link TEXT,
    created_at TEXT NOT NULL
);
";

/// Applies the schema to a connection.
///
/// # Errors
///
/// Returns `PersistenceError::SchemaFailed` if any statement fails.
pub fn initialize_schema(conn: &Connection) -> Result<(), PersistenceError> {
    conn.execute_batch(SCHEMA)
        .map_err(|e| PersistenceError::SchemaFailed(e.to_string()))
}
