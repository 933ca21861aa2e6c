// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::error::DomainError;
use crate::types::{AssigneeRef, StaffId, SubcontractorId};
use time::Date;
use time::format_description::well_known::Iso8601;

/// Validates that exactly one assignee was provided and builds the reference.
///
/// # Arguments
///
/// * `staff_id` - Staff assignee, if any
/// * `subcontractor_id` - Subcontractor assignee, if any
///
/// # Errors
///
/// Returns `DomainError::AmbiguousAssignee` if both are set and
/// `DomainError::MissingAssignee` if neither is.
pub const fn validate_assignee_parts(
    staff_id: Option<StaffId>,
    subcontractor_id: Option<SubcontractorId>,
) -> Result<AssigneeRef, DomainError> {
    match (staff_id, subcontractor_id) {
        (Some(_), Some(_)) => Err(DomainError::AmbiguousAssignee),
        (Some(staff), None) => Ok(AssigneeRef::Staff(staff)),
        (None, Some(sub)) => Ok(AssigneeRef::Subcontractor(sub)),
        (None, None) => Err(DomainError::MissingAssignee),
    }
}

/// Validates that a period date range is ordered.
///
/// # Errors
///
/// Returns `DomainError::InvalidPeriodRange` if `end` precedes `start`.
pub fn validate_period_range(start: Date, end: Date) -> Result<(), DomainError> {
    if end < start {
        return Err(DomainError::InvalidPeriodRange { start, end });
    }
    Ok(())
}

/// Parses an ISO 8601 calendar date.
///
/// # Errors
///
/// Returns `DomainError::DateParseError` if the string is not a valid
/// ISO 8601 date.
pub fn parse_iso_date(s: &str) -> Result<Date, DomainError> {
    Date::parse(s, &Iso8601::DEFAULT).map_err(|e| DomainError::DateParseError {
        date_string: s.to_string(),
        error: e.to_string(),
    })
}
