// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Schedule period lifecycle operations.
//!
//! Publishing, locking and archiving are forward-only and gated on the
//! `publish_schedule` capability. The validation sweep runs the conflict
//! detector across every active assigned ticket in a period and persists
//! the result for reporting.

use crate::apply::run_dependent_write;
use crate::context::RequestContext;
use crate::detector::detect_for_ticket;
use crate::error::CoreError;
use crate::store::{NewPeriod, ScheduleStore};
use fieldops_audit::{Action, AuditRecord, EntityRef, Snapshot};
use fieldops_domain::{
    DomainError, PeriodId, PeriodStatus, RoleGate, ScheduleConflict, SchedulePeriod, WorkTicket,
    sort_conflicts, validate_period_range,
};
use serde_json::json;
use tracing::info;

/// The result of a period validation sweep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeriodValidation {
    /// The period that was swept.
    pub period_id: PeriodId,
    /// How many tickets were checked.
    pub tickets_checked: usize,
    /// Every conflict found, in detector order.
    pub conflicts: Vec<ScheduleConflict>,
}

/// Creates a schedule period in `DRAFT` status.
///
/// # Errors
///
/// Returns `Forbidden` without `publish_schedule`, `EmptyField` for a
/// blank name and `InvalidPeriodRange` for a reversed date range (both
/// via `DomainViolation`).
pub fn create_period<S: ScheduleStore>(
    store: &mut S,
    ctx: &RequestContext,
    period: &NewPeriod,
) -> Result<SchedulePeriod, CoreError> {
    if !RoleGate::can_publish_schedule(&ctx.roles) {
        return Err(CoreError::Forbidden {
            action: "schedule_period_create",
            required: "OPERATIONS",
        });
    }
    if period.name.trim().is_empty() {
        return Err(CoreError::DomainViolation(DomainError::EmptyField("name")));
    }
    validate_period_range(period.period_start, period.period_end)?;

    let created: SchedulePeriod = store.insert_period(period)?;
    info!(period = created.id.value(), site = created.site_id.value(), "Created schedule period");

    append_lifecycle_audit(
        store,
        ctx,
        &created,
        "CREATE",
        None,
        "schedule_period_create",
    );
    Ok(created)
}

/// Publishes a `DRAFT` period.
///
/// # Errors
///
/// Returns `Forbidden` without `publish_schedule` and
/// `InvalidPeriodTransition` (via `DomainViolation`) from any other
/// status; illegal transitions error rather than no-op.
pub fn publish_period<S: ScheduleStore>(
    store: &mut S,
    ctx: &RequestContext,
    period_id: PeriodId,
) -> Result<SchedulePeriod, CoreError> {
    transition_period(store, ctx, period_id, PeriodStatus::Published, "PUBLISH")
}

/// Locks a `PUBLISHED` period.
///
/// Tickets inside a locked period may only be reassigned through the
/// explicit override path, which records a reason.
///
/// # Errors
///
/// Returns `Forbidden` without `publish_schedule` and
/// `InvalidPeriodTransition` (via `DomainViolation`) from any other
/// status.
pub fn lock_period<S: ScheduleStore>(
    store: &mut S,
    ctx: &RequestContext,
    period_id: PeriodId,
) -> Result<SchedulePeriod, CoreError> {
    transition_period(store, ctx, period_id, PeriodStatus::Locked, "LOCK")
}

/// Archives a period from any non-terminal status.
///
/// # Errors
///
/// Returns `Forbidden` without `publish_schedule` and
/// `InvalidPeriodTransition` (via `DomainViolation`) when the period is
/// already archived.
pub fn archive_period<S: ScheduleStore>(
    store: &mut S,
    ctx: &RequestContext,
    period_id: PeriodId,
) -> Result<SchedulePeriod, CoreError> {
    transition_period(store, ctx, period_id, PeriodStatus::Archived, "ARCHIVE")
}

/// Shared transition path for publish/lock/archive.
fn transition_period<S: ScheduleStore>(
    store: &mut S,
    ctx: &RequestContext,
    period_id: PeriodId,
    target: PeriodStatus,
    action: &str,
) -> Result<SchedulePeriod, CoreError> {
    if !RoleGate::can_publish_schedule(&ctx.roles) {
        return Err(CoreError::Forbidden {
            action: "schedule_period_transition",
            required: "OPERATIONS",
        });
    }

    let period: SchedulePeriod = store.load_period(period_id)?;
    period.status.validate_transition(target)?;

    let updated: SchedulePeriod =
        store.update_period_status(period_id, target, &ctx.actor_id, ctx.now)?;
    info!(
        period = period_id.value(),
        from = %period.status,
        to = %target,
        "Transitioned schedule period"
    );

    append_lifecycle_audit(
        store,
        ctx,
        &updated,
        action,
        Some(json!({ "status": period.status })),
        "schedule_period_transition",
    );
    Ok(updated)
}

/// Sweeps a period for conflicts and persists the result.
///
/// Every active assigned ticket is run through the detector against its
/// current assignee. The sweep replaces the period's persisted conflicts,
/// so an unchanged schedule yields an identical set on every run.
///
/// # Errors
///
/// Returns `Forbidden` without `manage_schedule` and store errors from
/// the reads or the conflict write.
pub fn validate_period<S: ScheduleStore>(
    store: &mut S,
    ctx: &RequestContext,
    period_id: PeriodId,
) -> Result<PeriodValidation, CoreError> {
    if !RoleGate::can_manage_schedule(&ctx.roles) {
        return Err(CoreError::Forbidden {
            action: "schedule_period_validate",
            required: "SUPERVISOR",
        });
    }

    let period: SchedulePeriod = store.load_period(period_id)?;
    let tickets: Vec<WorkTicket> = store.list_tickets_in_period(period_id)?;

    let mut conflicts: Vec<ScheduleConflict> = Vec::new();
    let mut tickets_checked: usize = 0;
    for ticket in &tickets {
        if !ticket.status.is_active() {
            continue;
        }
        let Some(assignee) = ticket.assignee else {
            continue;
        };
        tickets_checked += 1;
        // The sweep evaluates the schedule as it stands; the locked-period
        // check is irrelevant here because nothing is being changed.
        let mut found = detect_for_ticket(store, ticket, &period, assignee, true)?;
        conflicts.append(&mut found);
    }
    sort_conflicts(&mut conflicts);
    conflicts.dedup();

    store.record_conflicts(period_id, &conflicts, ctx.now)?;
    info!(
        period = period_id.value(),
        tickets_checked,
        conflicts = conflicts.len(),
        "Validated schedule period"
    );

    let record: AuditRecord = AuditRecord::new(
        EntityRef::new(String::from("schedule_periods"), period_id.to_string()),
        Action::new(String::from("VALIDATE"), None),
        None,
        Some(Snapshot::new(json!({
            "tickets_checked": tickets_checked,
            "conflict_count": conflicts.len(),
        }))),
        ctx.audit_actor(),
        ctx.audit_cause("schedule_period_validate"),
    );
    let mut inconsistencies: Vec<String> = Vec::new();
    run_dependent_write("audit_records.append", &mut inconsistencies, || {
        store.append_audit_record(&record, ctx.now).map(|_| ())
    });

    Ok(PeriodValidation {
        period_id,
        tickets_checked,
        conflicts,
    })
}

/// Appends a lifecycle audit record for a period.
fn append_lifecycle_audit<S: ScheduleStore>(
    store: &mut S,
    ctx: &RequestContext,
    period: &SchedulePeriod,
    action: &str,
    before: Option<serde_json::Value>,
    operation: &str,
) {
    let record: AuditRecord = AuditRecord::new(
        EntityRef::new(String::from("schedule_periods"), period.id.to_string()),
        Action::new(action.to_string(), None),
        before.map(Snapshot::new),
        Some(Snapshot::new(json!({
            "status": period.status,
            "name": period.name,
            "period_start": period.period_start,
            "period_end": period.period_end,
            "published_by": period.published_by,
            "locked_by": period.locked_by,
        }))),
        ctx.audit_actor(),
        ctx.audit_cause(operation),
    );
    let mut inconsistencies: Vec<String> = Vec::new();
    run_dependent_write("audit_records.append", &mut inconsistencies, || {
        store.append_audit_record(&record, ctx.now).map(|_| ())
    });
}
