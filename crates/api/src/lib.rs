// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! API boundary for the fieldops scheduling system.
//!
//! This crate translates between wire DTOs and the engine: it resolves
//! the acting operator, enforces the override-reason policy, runs the
//! engine operation, and shapes outcomes as problem-details errors with
//! stable machine-readable codes.

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

mod auth;
mod capabilities;
mod error;
mod handlers;
mod override_policy;
mod request_response;

#[cfg(test)]
mod tests;

pub use auth::AuthenticatedActor;
pub use capabilities::compute_schedule_capabilities;
pub use error::{ApiError, ErrorBody, ErrorSurface, ProblemDetails, translate_core_error};
pub use handlers::{
    accept_trade, apply_item, apply_trade, approve_trade, archive_availability_rule,
    archive_period, cancel_trade, check_drift, create_availability_rule, create_board,
    create_item, create_period, create_proposal, create_trade, deny_trade, get_audit_timeline,
    get_capabilities, get_trade, list_availability_rules, list_boards, list_conflicts, list_items,
    list_periods, list_trades, lock_period, publish_period, resolve_drift, validate_period,
};
pub use override_policy::{OverridePolicy, OverridePolicyError};
pub use request_response::{
    ApplyItemRequest, ApplyItemResponse, ArchiveRuleRequest, AssignmentInfo, AuditRecordInfo,
    AvailabilityRuleInfo, BoardInfo, Capability, ConflictInfo, CreateAvailabilityRequest,
    CreateBoardRequest, CreateItemRequest, CreatePeriodRequest, CreateProposalRequest,
    CreateTradeRequest, DriftCheckRequest, DriftResponse, ItemInfo, PeriodActionRequest,
    PeriodInfo, ProposalInfo, ResolveDriftRequest, ScheduleCapabilities, TradeActionRequest,
    TradeApplyResponse, TradeDecisionRequest, TradeInfo, ValidatePeriodResponse,
};
