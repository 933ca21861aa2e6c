// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! The conflict detector.
//!
//! Given a proposed assignment and a snapshot of the live schedule, the
//! detector produces the full classified conflict list in a deterministic
//! order. It performs no mutation and makes no policy decision; the apply
//! orchestrator and the trade workflow decide from the list.

use crate::error::CoreError;
use crate::store::ScheduleStore;
use fieldops_domain::{
    AssigneeRef, AvailabilityRule, AvailabilityType, ConflictType, PeriodStatus,
    ScheduleConflict, SchedulePeriod, Severity, StaffRecord, TRAVEL_BUFFER_MINUTES, WorkTicket,
    sort_conflicts,
};
use fieldops_domain::Assignment;

/// A proposed assignment change, as the detector sees it.
#[derive(Debug, Clone, Copy)]
pub struct ProposedAssignment<'a> {
    /// The ticket being reassigned.
    pub ticket: &'a WorkTicket,
    /// The period the ticket belongs to.
    pub period: &'a SchedulePeriod,
    /// The proposed new assignee.
    pub assignee: AssigneeRef,
}

/// The live-schedule inputs the detector consults.
///
/// Staff-scoped fields are empty for subcontractor assignees; only the
/// locked-period check applies to subcontractors.
#[derive(Debug, Clone, Default)]
pub struct ScheduleSnapshot {
    /// The proposed assignee's active assignments on the ticket's date.
    pub existing_assignments: Vec<Assignment>,
    /// The proposed assignee's unarchived availability rules.
    pub availability_rules: Vec<AvailabilityRule>,
    /// The proposed assignee's directory record.
    pub staff: Option<StaffRecord>,
}

/// Runs the detector over a proposed assignment.
///
/// Determinism contract: identical inputs produce an identical ordered
/// conflict list. Ordering is by conflict-type priority, then ticket id,
/// then staff id.
///
/// # Arguments
///
/// * `proposed` - The proposed assignment
/// * `snapshot` - The live-schedule snapshot for the proposed assignee
/// * `override_preauthorized` - Suppresses the locked-period conflict when
///   the caller already holds an authorized override
#[must_use]
pub fn detect_conflicts(
    proposed: &ProposedAssignment<'_>,
    snapshot: &ScheduleSnapshot,
    override_preauthorized: bool,
) -> Vec<ScheduleConflict> {
    let mut conflicts: Vec<ScheduleConflict> = Vec::new();

    if proposed.period.status == PeriodStatus::Locked && !override_preauthorized {
        conflicts.push(ScheduleConflict {
            conflict_type: ConflictType::LockedPeriod,
            severity: Severity::Blocking,
            message: format!(
                "Ticket {} belongs to locked schedule period '{}'",
                proposed.ticket.id, proposed.period.name
            ),
            ticket_id: proposed.ticket.id,
            staff_id: None,
        });
    }

    if let AssigneeRef::Staff(staff_id) = proposed.assignee {
        detect_double_bookings(proposed, snapshot, staff_id, &mut conflicts);
        detect_availability(proposed, snapshot, staff_id, &mut conflicts);
        detect_certification(proposed, snapshot, staff_id, &mut conflicts);
    }

    sort_conflicts(&mut conflicts);
    conflicts
}

/// Emits double-booking conflicts against the assignee's other tickets.
///
/// Exact time overlap is blocking; a back-to-back assignment with less
/// than the travel buffer between windows is a warning.
fn detect_double_bookings(
    proposed: &ProposedAssignment<'_>,
    snapshot: &ScheduleSnapshot,
    staff_id: fieldops_domain::StaffId,
    conflicts: &mut Vec<ScheduleConflict>,
) {
    for assignment in &snapshot.existing_assignments {
        if assignment.ticket_id == proposed.ticket.id
            || !assignment.status.is_active()
            || assignment.date != proposed.ticket.scheduled_date
        {
            continue;
        }

        if assignment.window.overlaps(&proposed.ticket.window) {
            conflicts.push(ScheduleConflict {
                conflict_type: ConflictType::DoubleBooking,
                severity: Severity::Blocking,
                message: format!(
                    "Assignee already holds ticket {} at {} on {}",
                    assignment.ticket_id, assignment.window, assignment.date
                ),
                ticket_id: assignment.ticket_id,
                staff_id: Some(staff_id),
            });
        } else if let Some(gap) = assignment.window.gap_minutes(&proposed.ticket.window) {
            if gap < TRAVEL_BUFFER_MINUTES {
                conflicts.push(ScheduleConflict {
                    conflict_type: ConflictType::DoubleBooking,
                    severity: Severity::Warning,
                    message: format!(
                        "Only {gap} minute(s) between ticket {} at {} and this window",
                        assignment.ticket_id, assignment.window
                    ),
                    ticket_id: assignment.ticket_id,
                    staff_id: Some(staff_id),
                });
            }
        }
    }
}

/// Emits availability conflicts from the assignee's rules.
///
/// An unavailable rule dominates a not-preferred rule for the same window.
fn detect_availability(
    proposed: &ProposedAssignment<'_>,
    snapshot: &ScheduleSnapshot,
    staff_id: fieldops_domain::StaffId,
    conflicts: &mut Vec<ScheduleConflict>,
) {
    let mut unavailable: bool = false;
    let mut not_preferred: bool = false;

    for rule in &snapshot.availability_rules {
        if rule.staff_id != staff_id
            || !rule.applies_to(proposed.ticket.scheduled_date, &proposed.ticket.window)
        {
            continue;
        }
        match rule.availability {
            AvailabilityType::Unavailable => unavailable = true,
            AvailabilityType::NotPreferred => not_preferred = true,
            AvailabilityType::Preferred => {}
        }
    }

    if unavailable {
        conflicts.push(ScheduleConflict {
            conflict_type: ConflictType::Unavailable,
            severity: Severity::Blocking,
            message: format!(
                "Assignee is unavailable on {} during {}",
                proposed.ticket.scheduled_date, proposed.ticket.window
            ),
            ticket_id: proposed.ticket.id,
            staff_id: Some(staff_id),
        });
    } else if not_preferred {
        conflicts.push(ScheduleConflict {
            conflict_type: ConflictType::NotPreferred,
            severity: Severity::Warning,
            message: format!(
                "Assignee prefers not to work {} during {}",
                proposed.ticket.scheduled_date, proposed.ticket.window
            ),
            ticket_id: proposed.ticket.id,
            staff_id: Some(staff_id),
        });
    }
}

/// Emits a certification conflict when the ticket requires one the
/// assignee does not hold.
fn detect_certification(
    proposed: &ProposedAssignment<'_>,
    snapshot: &ScheduleSnapshot,
    staff_id: fieldops_domain::StaffId,
    conflicts: &mut Vec<ScheduleConflict>,
) {
    let Some(required) = proposed.ticket.required_certification.as_deref() else {
        return;
    };
    let holds: bool = snapshot
        .staff
        .as_ref()
        .is_some_and(|staff| staff.certifications.iter().any(|c| c == required));
    if !holds {
        conflicts.push(ScheduleConflict {
            conflict_type: ConflictType::CertificationMissing,
            severity: Severity::Blocking,
            message: format!("Ticket {} requires certification '{required}'", proposed.ticket.id),
            ticket_id: proposed.ticket.id,
            staff_id: Some(staff_id),
        });
    }
}

/// Gathers the snapshot for an assignee and runs the detector.
///
/// Staff-scoped inputs are loaded from the store; subcontractor assignees
/// get an empty snapshot so only the locked-period check applies.
///
/// # Errors
///
/// Returns a `CoreError` if any store read fails.
pub fn detect_for_ticket<S: ScheduleStore>(
    store: &mut S,
    ticket: &WorkTicket,
    period: &SchedulePeriod,
    assignee: AssigneeRef,
    override_preauthorized: bool,
) -> Result<Vec<ScheduleConflict>, CoreError> {
    let snapshot: ScheduleSnapshot = match assignee {
        AssigneeRef::Staff(staff_id) => ScheduleSnapshot {
            existing_assignments: store
                .list_active_assignments_for_staff_on_date(staff_id, ticket.scheduled_date)?,
            availability_rules: store.load_availability_rules(staff_id)?,
            staff: Some(store.load_staff(staff_id)?),
        },
        AssigneeRef::Subcontractor(_) => ScheduleSnapshot::default(),
    };

    let proposed: ProposedAssignment<'_> = ProposedAssignment {
        ticket,
        period,
        assignee,
    };
    Ok(detect_conflicts(&proposed, &snapshot, override_preauthorized))
}

/// Splits a conflict list into blocking and warning sets, preserving order.
#[must_use]
pub fn partition_conflicts(
    conflicts: Vec<ScheduleConflict>,
) -> (Vec<ScheduleConflict>, Vec<ScheduleConflict>) {
    conflicts.into_iter().partition(ScheduleConflict::is_blocking)
}
