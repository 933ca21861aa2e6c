// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::period_status::PeriodStatus;
use crate::sync_state::SyncState;
use crate::trade_status::TradeStatus;
use crate::types::ApplyState;

/// Errors that can occur during domain validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A planning-item sync transition is not permitted by the lifecycle graph.
    InvalidSyncTransition {
        /// The current sync state.
        from: SyncState,
        /// The requested sync state.
        to: SyncState,
    },
    /// A schedule-period transition is not permitted by the lifecycle graph.
    InvalidPeriodTransition {
        /// The current period status.
        from: PeriodStatus,
        /// The requested period status.
        to: PeriodStatus,
    },
    /// A shift-trade transition is not permitted by the lifecycle graph.
    InvalidTradeTransition {
        /// The current trade status.
        from: TradeStatus,
        /// The requested trade status.
        to: TradeStatus,
    },
    /// A proposal apply-state transition is not permitted.
    InvalidApplyStateTransition {
        /// The current apply state.
        from: ApplyState,
        /// The requested apply state.
        to: ApplyState,
    },
    /// A sync state string could not be parsed.
    InvalidSyncState(String),
    /// A period status string could not be parsed.
    InvalidPeriodStatus(String),
    /// A trade status string could not be parsed.
    InvalidTradeStatus(String),
    /// A proposal apply-state string could not be parsed.
    InvalidApplyState(String),
    /// A ticket status string could not be parsed.
    InvalidTicketStatus(String),
    /// An item kind string could not be parsed.
    InvalidItemKind(String),
    /// A trade request type string could not be parsed.
    InvalidTradeRequestType(String),
    /// A role string could not be parsed.
    InvalidRole(String),
    /// A conflict type string could not be parsed.
    InvalidConflictType(String),
    /// A conflict severity string could not be parsed.
    InvalidSeverity(String),
    /// An availability type string could not be parsed.
    InvalidAvailabilityType(String),
    /// An availability rule kind string could not be parsed.
    InvalidRuleKind(String),
    /// Both a staff and a subcontractor assignee were provided.
    AmbiguousAssignee,
    /// Neither a staff nor a subcontractor assignee was provided.
    MissingAssignee,
    /// A time window has an invalid start/end pair.
    InvalidTimeWindow {
        /// Start of the window, minutes since midnight.
        start_min: u16,
        /// End of the window, minutes since midnight (exclusive).
        end_min: u16,
    },
    /// A period date range has end before start.
    InvalidPeriodRange {
        /// The period start date.
        start: time::Date,
        /// The period end date.
        end: time::Date,
    },
    /// A required text field is empty.
    EmptyField(&'static str),
    /// Failed to parse a date from a string.
    DateParseError {
        /// The invalid date string.
        date_string: String,
        /// The parsing error message.
        error: String,
    },
    /// A trade names the same staff member as initiator and target.
    SelfTrade,
}

impl std::fmt::Display for DomainError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidSyncTransition { from, to } => {
                write!(f, "Invalid sync transition: {from} -> {to}")
            }
            Self::InvalidPeriodTransition { from, to } => {
                write!(f, "Invalid period transition: {from} -> {to}")
            }
            Self::InvalidTradeTransition { from, to } => {
                write!(f, "Invalid trade transition: {from} -> {to}")
            }
            Self::InvalidApplyStateTransition { from, to } => {
                write!(f, "Invalid proposal apply-state transition: {from} -> {to}")
            }
            Self::InvalidSyncState(s) => write!(f, "Invalid sync state: {s}"),
            Self::InvalidPeriodStatus(s) => write!(f, "Invalid period status: {s}"),
            Self::InvalidTradeStatus(s) => write!(f, "Invalid trade status: {s}"),
            Self::InvalidApplyState(s) => write!(f, "Invalid apply state: {s}"),
            Self::InvalidTicketStatus(s) => write!(f, "Invalid ticket status: {s}"),
            Self::InvalidItemKind(s) => write!(f, "Invalid item kind: {s}"),
            Self::InvalidTradeRequestType(s) => write!(f, "Invalid trade request type: {s}"),
            Self::InvalidRole(s) => write!(f, "Invalid role: {s}"),
            Self::InvalidConflictType(s) => write!(f, "Invalid conflict type: {s}"),
            Self::InvalidSeverity(s) => write!(f, "Invalid conflict severity: {s}"),
            Self::InvalidAvailabilityType(s) => write!(f, "Invalid availability type: {s}"),
            Self::InvalidRuleKind(s) => write!(f, "Invalid availability rule kind: {s}"),
            Self::AmbiguousAssignee => {
                write!(f, "Exactly one of staff or subcontractor may be assigned")
            }
            Self::MissingAssignee => {
                write!(f, "An assignee (staff or subcontractor) is required")
            }
            Self::InvalidTimeWindow { start_min, end_min } => {
                write!(
                    f,
                    "Invalid time window: start {start_min} must be before end {end_min} (max 1440)"
                )
            }
            Self::InvalidPeriodRange { start, end } => {
                write!(f, "Invalid period range: {start} must not be after {end}")
            }
            Self::EmptyField(field) => write!(f, "Field '{field}' cannot be empty"),
            Self::DateParseError { date_string, error } => {
                write!(f, "Failed to parse date '{date_string}': {error}")
            }
            Self::SelfTrade => {
                write!(f, "Initiator and target of a trade must differ")
            }
        }
    }
}

impl std::error::Error for DomainError {}
