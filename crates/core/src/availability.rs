// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Availability rule management.
//!
//! Staff members manage their own rules; anyone with `manage_schedule`
//! may manage rules for any staff member. Rules are soft-archived, never
//! deleted.

use crate::apply::run_dependent_write;
use crate::context::RequestContext;
use crate::error::CoreError;
use crate::store::{NewRule, ScheduleStore};
use fieldops_audit::{Action, AuditRecord, EntityRef, Snapshot};
use fieldops_domain::{AvailabilityRule, RoleGate, RuleId};
use serde_json::json;
use tracing::info;

/// Creates an availability rule.
///
/// # Errors
///
/// Returns `Forbidden` when the actor is neither the rule's staff member
/// nor a schedule manager, and store errors otherwise.
pub fn create_rule<S: ScheduleStore>(
    store: &mut S,
    ctx: &RequestContext,
    rule: &NewRule,
) -> Result<AvailabilityRule, CoreError> {
    if !ctx.is_staff(rule.staff_id) && !RoleGate::can_manage_schedule(&ctx.roles) {
        return Err(CoreError::Forbidden {
            action: "availability_rule_create",
            required: "SUPERVISOR",
        });
    }

    let created: AvailabilityRule = store.insert_availability_rule(rule)?;
    info!(
        rule = created.id.value(),
        staff = created.staff_id.value(),
        availability = %created.availability,
        "Created availability rule"
    );

    let record: AuditRecord = AuditRecord::new(
        EntityRef::new(
            String::from("staff_availability_rules"),
            created.id.to_string(),
        ),
        Action::new(String::from("CREATE"), None),
        None,
        Some(Snapshot::new(json!({
            "staff_id": created.staff_id,
            "kind": created.kind,
            "availability": created.availability,
            "notes": created.notes,
        }))),
        ctx.audit_actor(),
        ctx.audit_cause("schedule_availability_create"),
    );
    let mut inconsistencies: Vec<String> = Vec::new();
    run_dependent_write("audit_records.append", &mut inconsistencies, || {
        store.append_audit_record(&record, ctx.now).map(|_| ())
    });
    Ok(created)
}

/// Soft-archives an availability rule.
///
/// # Errors
///
/// Returns `Forbidden` when the actor is neither the rule's staff member
/// nor a schedule manager, `NotFound` for a missing or already archived
/// rule, and store errors otherwise.
pub fn archive_rule<S: ScheduleStore>(
    store: &mut S,
    ctx: &RequestContext,
    rule_id: RuleId,
) -> Result<AvailabilityRule, CoreError> {
    let before: AvailabilityRule = store.load_availability_rule(rule_id)?;
    if !ctx.is_staff(before.staff_id) && !RoleGate::can_manage_schedule(&ctx.roles) {
        return Err(CoreError::Forbidden {
            action: "availability_rule_archive",
            required: "SUPERVISOR",
        });
    }

    let archived: AvailabilityRule =
        store.archive_availability_rule(rule_id, &ctx.actor_id, ctx.now)?;
    info!(rule = rule_id.value(), staff = archived.staff_id.value(), "Archived availability rule");

    let record: AuditRecord = AuditRecord::new(
        EntityRef::new(String::from("staff_availability_rules"), rule_id.to_string()),
        Action::new(String::from("ARCHIVE"), None),
        Some(Snapshot::new(json!({
            "staff_id": before.staff_id,
            "kind": before.kind,
            "availability": before.availability,
        }))),
        Some(Snapshot::new(json!({ "archived_by": ctx.actor_id }))),
        ctx.audit_actor(),
        ctx.audit_cause("schedule_availability_archive"),
    );
    let mut inconsistencies: Vec<String> = Vec::new();
    run_dependent_write("audit_records.append", &mut inconsistencies, || {
        store.append_audit_record(&record, ctx.now).map(|_| ())
    });
    Ok(archived)
}
