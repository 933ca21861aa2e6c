// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all,
    clippy::suspicious,
    clippy::complexity,
    clippy::perf,
    clippy::unwrap_used,
    clippy::expect_used
)]

mod availability;
mod conflict;
mod error;
mod period_status;
mod roles;
mod sync_state;
mod time_window;
mod trade_status;
mod types;
mod validation;

#[cfg(test)]
mod tests;

pub use availability::{AvailabilityRule, AvailabilityType, RuleKind};
pub use conflict::{ConflictType, ScheduleConflict, Severity, sort_conflicts};
pub use error::DomainError;
pub use period_status::PeriodStatus;
pub use roles::{Role, RoleGate};
pub use sync_state::SyncState;
pub use time_window::{TRAVEL_BUFFER_MINUTES, TimeWindow};
pub use trade_status::{TradeRequestType, TradeStatus};
pub use types::{
    ApplyState, Assignment, AssigneeRef, BoardId, ItemKind, ItemId, PeriodId, PlanningBoard,
    PlanningBoardItem, PlanningItemProposal, ProposalId, RuleId, SchedulePeriod,
    ShiftTradeRequest, SiteId, StaffId, StaffRecord, SubcontractorId, TicketId, TicketStatus,
    TradeId, VersionToken, WorkTicket,
};
pub use validation::{parse_iso_date, validate_assignee_parts, validate_period_range};
