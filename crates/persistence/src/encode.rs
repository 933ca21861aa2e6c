// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Column encoding between SQLite rows and domain types.
//!
//! Dates and timestamps are stored as ISO 8601 text; windows as minutes
//! since midnight; enums by their canonical strings; JSON payloads as
//! serialized text.

use fieldops::StoreError;
use fieldops_domain::{
    AssigneeRef, AvailabilityRule, AvailabilityType, DomainError, RuleId, RuleKind, StaffId,
    SubcontractorId, TimeWindow,
};
use std::str::FromStr;
use time::format_description::well_known::Iso8601;
use time::{Date, OffsetDateTime, Weekday};

/// Formats a timestamp for storage.
pub(crate) fn encode_timestamp(t: OffsetDateTime) -> Result<String, StoreError> {
    t.format(&Iso8601::DEFAULT)
        .map_err(|e| StoreError::Backend(format!("Failed to format timestamp: {e}")))
}

/// Parses a stored timestamp.
pub(crate) fn decode_timestamp(s: &str) -> Result<OffsetDateTime, StoreError> {
    OffsetDateTime::parse(s, &Iso8601::DEFAULT)
        .map_err(|e| StoreError::Backend(format!("Failed to parse timestamp '{s}': {e}")))
}

/// Parses an optional stored timestamp.
pub(crate) fn decode_timestamp_opt(
    s: Option<String>,
) -> Result<Option<OffsetDateTime>, StoreError> {
    s.as_deref().map(decode_timestamp).transpose()
}

/// Parses a stored calendar date.
pub(crate) fn decode_date(s: &str) -> Result<Date, StoreError> {
    fieldops_domain::parse_iso_date(s)
        .map_err(|e| StoreError::Backend(format!("Failed to parse date: {e}")))
}

/// Rebuilds a window from its stored minute columns.
pub(crate) fn decode_window(start_min: i64, end_min: i64) -> Result<TimeWindow, StoreError> {
    let start: u16 = u16::try_from(start_min)
        .map_err(|_| StoreError::Backend(format!("Window start {start_min} out of range")))?;
    let end: u16 = u16::try_from(end_min)
        .map_err(|_| StoreError::Backend(format!("Window end {end_min} out of range")))?;
    TimeWindow::new(start, end)
        .map_err(|e| StoreError::Backend(format!("Stored window invalid: {e}")))
}

/// Rebuilds an optional assignee from its two columns.
pub(crate) fn decode_assignee(
    staff: Option<i64>,
    subcontractor: Option<i64>,
) -> Result<Option<AssigneeRef>, StoreError> {
    match (staff, subcontractor) {
        (None, None) => Ok(None),
        (Some(id), None) => Ok(Some(AssigneeRef::Staff(StaffId::new(id)))),
        (None, Some(id)) => Ok(Some(AssigneeRef::Subcontractor(SubcontractorId::new(id)))),
        (Some(_), Some(_)) => Err(StoreError::Backend(String::from(
            "Row has both staff and subcontractor assignees",
        ))),
    }
}

/// Splits an optional assignee into its two columns.
pub(crate) const fn assignee_columns(
    assignee: Option<AssigneeRef>,
) -> (Option<i64>, Option<i64>) {
    match assignee {
        None => (None, None),
        Some(AssigneeRef::Staff(id)) => (Some(id.value()), None),
        Some(AssigneeRef::Subcontractor(id)) => (None, Some(id.value())),
    }
}

/// Parses a stored enum string via its domain `FromStr`.
pub(crate) fn decode_enum<T>(s: &str) -> Result<T, StoreError>
where
    T: FromStr<Err = DomainError>,
{
    T::from_str(s).map_err(|e| StoreError::Backend(format!("Stored enum invalid: {e}")))
}

/// Parses a stored certifications JSON array.
pub(crate) fn decode_certifications(s: &str) -> Result<Vec<String>, StoreError> {
    serde_json::from_str(s)
        .map_err(|e| StoreError::Backend(format!("Stored certifications invalid: {e}")))
}

/// Weekday as stored (ISO: Monday = 1).
pub(crate) fn encode_weekday(weekday: Weekday) -> i64 {
    i64::from(weekday.number_from_monday())
}

/// Rebuilds a weekday from its stored number.
pub(crate) fn decode_weekday(n: i64) -> Result<Weekday, StoreError> {
    match n {
        1 => Ok(Weekday::Monday),
        2 => Ok(Weekday::Tuesday),
        3 => Ok(Weekday::Wednesday),
        4 => Ok(Weekday::Thursday),
        5 => Ok(Weekday::Friday),
        6 => Ok(Weekday::Saturday),
        7 => Ok(Weekday::Sunday),
        other => Err(StoreError::Backend(format!("Stored weekday {other} invalid"))),
    }
}

/// The raw columns of one availability rule row.
pub(crate) struct RuleRow {
    pub id: i64,
    pub staff_id: i64,
    pub rule_type: String,
    pub availability_type: String,
    pub weekday: Option<i64>,
    pub start_min: Option<i64>,
    pub end_min: Option<i64>,
    pub from_date: Option<String>,
    pub to_date: Option<String>,
    pub notes: Option<String>,
}

impl RuleRow {
    /// Converts the raw row into a domain rule.
    pub(crate) fn into_rule(self) -> Result<AvailabilityRule, StoreError> {
        let kind: RuleKind = match self.rule_type.as_str() {
            "WEEKLY_RECURRING" => {
                let (Some(weekday), Some(start), Some(end)) =
                    (self.weekday, self.start_min, self.end_min)
                else {
                    return Err(StoreError::Backend(String::from(
                        "Weekly rule row missing weekday/window columns",
                    )));
                };
                RuleKind::WeeklyRecurring {
                    weekday: decode_weekday(weekday)?,
                    window: decode_window(start, end)?,
                }
            }
            "ONE_OFF" => {
                let (Some(from), Some(to)) = (self.from_date.as_deref(), self.to_date.as_deref())
                else {
                    return Err(StoreError::Backend(String::from(
                        "One-off rule row missing date columns",
                    )));
                };
                RuleKind::OneOff {
                    from: decode_date(from)?,
                    to: decode_date(to)?,
                }
            }
            other => {
                return Err(StoreError::Backend(format!(
                    "Stored rule type '{other}' invalid"
                )));
            }
        };
        let availability: AvailabilityType = decode_enum(&self.availability_type)?;
        Ok(AvailabilityRule {
            id: RuleId::new(self.id),
            staff_id: StaffId::new(self.staff_id),
            kind,
            availability,
            notes: self.notes,
        })
    }
}

/// Splits a rule kind into its storage columns:
/// `(rule_type, weekday, start_min, end_min, from_date, to_date)`.
pub(crate) fn rule_kind_columns(
    kind: &RuleKind,
) -> (
    &'static str,
    Option<i64>,
    Option<i64>,
    Option<i64>,
    Option<String>,
    Option<String>,
) {
    match kind {
        RuleKind::WeeklyRecurring { weekday, window } => (
            "WEEKLY_RECURRING",
            Some(encode_weekday(*weekday)),
            Some(i64::from(window.start_min())),
            Some(i64::from(window.end_min())),
            None,
            None,
        ),
        RuleKind::OneOff { from, to } => (
            "ONE_OFF",
            None,
            None,
            None,
            Some(from.to_string()),
            Some(to.to_string()),
        ),
    }
}
