// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! API handler functions for state-changing and read-only operations.
//!
//! Each mutating handler resolves the acting operator from the request,
//! builds the explicit request context, translates the DTO into domain
//! inputs, runs the engine operation, and translates the outcome back.
//! Handlers are generic over the store so tests can run them against
//! any `ScheduleStore` implementation.

use std::str::FromStr;
use time::{Date, OffsetDateTime, Weekday};

use fieldops::{
    ApplyRequest, ConflictFilter, DriftResolution, NewBoard, NewItem, NewPeriod, NewProposal,
    NewRule, NewTrade, PeriodFilter, RequestContext, ScheduleStore, TradeDecision, TradeFilter,
};
use fieldops_domain::{
    AvailabilityType, BoardId, ItemId, ItemKind, PeriodId, PeriodStatus, ProposalId, RuleId,
    RuleKind, Severity, StaffId, SiteId, SubcontractorId, TicketId, TimeWindow, TradeId,
    TradeRequestType, TradeStatus, validate_assignee_parts,
};

use crate::auth::AuthenticatedActor;
use crate::capabilities::compute_schedule_capabilities;
use crate::error::{ApiError, ErrorSurface, conflict_infos, translate_core_error};
use crate::override_policy::OverridePolicy;
use crate::request_response::{
    ApplyItemRequest, ApplyItemResponse, ArchiveRuleRequest, AssignmentInfo, AuditRecordInfo,
    AvailabilityRuleInfo, BoardInfo, ConflictInfo, CreateAvailabilityRequest, CreateBoardRequest,
    CreateItemRequest, CreatePeriodRequest, CreateProposalRequest, CreateTradeRequest,
    DriftCheckRequest, DriftResponse, ItemInfo, PeriodActionRequest, PeriodInfo, ProposalInfo,
    ResolveDriftRequest, ScheduleCapabilities, TradeActionRequest, TradeApplyResponse,
    TradeDecisionRequest, TradeInfo, ValidatePeriodResponse,
};

/// Resolves the acting operator and builds the engine's request context.
fn resolve_context(
    actor_id: &str,
    roles: &[String],
    staff_id: Option<i64>,
    request_id: &str,
    now: OffsetDateTime,
) -> Result<RequestContext, ApiError> {
    let actor: AuthenticatedActor = AuthenticatedActor::from_request(actor_id, roles, staff_id)?;
    Ok(actor.into_context(request_id, now))
}

/// Parses an ISO 8601 date at the boundary.
fn parse_date(field: &str, value: &str) -> Result<Date, ApiError> {
    fieldops_domain::parse_iso_date(value)
        .map_err(|e| ApiError::validation(&format!("{field}: {e}")))
}

/// Translates a raw store error from a read-only query.
fn translate_store_error(err: fieldops::StoreError, surface: ErrorSurface) -> ApiError {
    translate_core_error(fieldops::CoreError::from(err), surface)
}

// --- Planning boards ------------------------------------------------------

/// Creates a planning board.
///
/// # Errors
///
/// Returns `AUTH_FORBIDDEN` without `manage_schedule` and
/// `VALIDATION_FAILED` for an unparsable date or blank label.
pub fn create_board<S: ScheduleStore>(
    store: &mut S,
    request: &CreateBoardRequest,
    request_id: &str,
    now: OffsetDateTime,
) -> Result<BoardInfo, ApiError> {
    let ctx: RequestContext = resolve_context(
        &request.actor_id,
        &request.roles,
        request.staff_id,
        request_id,
        now,
    )?;
    let board: NewBoard = NewBoard {
        board_date: parse_date("board_date", &request.board_date)?,
        label: request.label.clone(),
    };
    let created = fieldops::create_board(store, &ctx, &board)
        .map_err(|e| translate_core_error(e, ErrorSurface::Planning))?;
    Ok(BoardInfo::from_board(&created))
}

/// Lists planning boards, newest first.
///
/// # Errors
///
/// Returns `INTERNAL` on store failure.
pub fn list_boards<S: ScheduleStore>(store: &mut S) -> Result<Vec<BoardInfo>, ApiError> {
    let boards = store
        .list_boards()
        .map_err(|e| translate_store_error(e, ErrorSurface::Planning))?;
    Ok(boards.iter().map(BoardInfo::from_board).collect())
}

/// Adds an item to a planning board.
///
/// # Errors
///
/// Returns `AUTH_FORBIDDEN` without `manage_schedule`,
/// `VALIDATION_FAILED` for an unknown kind or an ambiguous assignee, and
/// `NOT_FOUND` for a missing board or ticket.
pub fn create_item<S: ScheduleStore>(
    store: &mut S,
    board_id: i64,
    request: &CreateItemRequest,
    request_id: &str,
    now: OffsetDateTime,
) -> Result<ItemInfo, ApiError> {
    let ctx: RequestContext = resolve_context(
        &request.actor_id,
        &request.roles,
        request.staff_id,
        request_id,
        now,
    )?;
    let kind: ItemKind = ItemKind::from_str(&request.item_kind)
        .map_err(|e| ApiError::validation(&e.to_string()))?;
    let assignee = match (
        request.current_assignee_staff_id,
        request.current_assignee_subcontractor_id,
    ) {
        (None, None) => None,
        (staff, sub) => Some(
            validate_assignee_parts(staff.map(StaffId::new), sub.map(SubcontractorId::new))
                .map_err(|e| ApiError::validation(&e.to_string()))?,
        ),
    };
    let item: NewItem = NewItem {
        board_id: BoardId::new(board_id),
        kind,
        ticket_id: request.ticket_id.map(TicketId::new),
        title: request.title.clone(),
        assignee,
    };
    let created = fieldops::add_item(store, &ctx, &item)
        .map_err(|e| translate_core_error(e, ErrorSurface::Planning))?;
    Ok(ItemInfo::from_item(&created))
}

/// Lists the items on a board.
///
/// # Errors
///
/// Returns `NOT_FOUND` for a missing board and `INTERNAL` on store
/// failure.
pub fn list_items<S: ScheduleStore>(
    store: &mut S,
    board_id: i64,
) -> Result<Vec<ItemInfo>, ApiError> {
    let items = store
        .list_items(BoardId::new(board_id))
        .map_err(|e| translate_store_error(e, ErrorSurface::Planning))?;
    Ok(items.iter().map(ItemInfo::from_item).collect())
}

/// Stages a proposal against a planning item.
///
/// # Errors
///
/// Returns `AUTH_FORBIDDEN` without `manage_schedule` and
/// `VALIDATION_FAILED` unless exactly one proposed assignee is given.
pub fn create_proposal<S: ScheduleStore>(
    store: &mut S,
    item_id: i64,
    request: &CreateProposalRequest,
    request_id: &str,
    now: OffsetDateTime,
) -> Result<ProposalInfo, ApiError> {
    let ctx: RequestContext = resolve_context(
        &request.actor_id,
        &request.roles,
        request.staff_id,
        request_id,
        now,
    )?;
    let proposed = validate_assignee_parts(
        request.proposed_staff_id.map(StaffId::new),
        request.proposed_subcontractor_id.map(SubcontractorId::new),
    )
    .map_err(|e| ApiError::validation(&e.to_string()))?;
    let proposal: NewProposal = NewProposal {
        item_id: ItemId::new(item_id),
        proposed,
        justification: request.justification.clone(),
    };
    let created = fieldops::stage_proposal(store, &ctx, &proposal)
        .map_err(|e| translate_core_error(e, ErrorSurface::Planning))?;
    Ok(ProposalInfo::from_proposal(&created))
}

/// Applies a staged proposal to the live schedule.
///
/// The conflict round-trip surfaces as typed errors:
/// `PLANNING_APPLY_BLOCKED` with the blocking list,
/// `PLANNING_ACK_REQUIRED` with the unacknowledged warning keys, and
/// `PLANNING_OVERRIDE_REQUIRED` when the caller may override the locked
/// period by re-submitting with a reason.
///
/// # Errors
///
/// Returns the full apply taxonomy, plus `PLANNING_ALREADY_APPLIED` for
/// a terminal proposal and `CONCURRENCY_CONFLICT` when the versioned
/// ticket write loses a race.
pub fn apply_item<S: ScheduleStore>(
    store: &mut S,
    item_id: i64,
    request: &ApplyItemRequest,
    request_id: &str,
    now: OffsetDateTime,
) -> Result<ApplyItemResponse, ApiError> {
    let ctx: RequestContext = resolve_context(
        &request.actor_id,
        &request.roles,
        request.staff_id,
        request_id,
        now,
    )?;
    if request.override_locked_period {
        OverridePolicy::default()
            .validate(request.override_reason.as_deref())
            .map_err(|e| ApiError::validation(&e.to_string()))?;
    }
    let apply: ApplyRequest = ApplyRequest {
        proposal_id: ProposalId::new(request.proposal_id),
        acknowledged_warning_keys: request.acknowledged_warning_ids.clone(),
        override_locked_period: request.override_locked_period,
        override_reason: request.override_reason.clone(),
    };
    let success = fieldops::apply_proposal(store, &ctx, ItemId::new(item_id), &apply)
        .map_err(|e| translate_core_error(e, ErrorSurface::Planning))?;
    Ok(ApplyItemResponse {
        board_item_id: success.item_id.value(),
        sync_state: success.sync_state.to_string(),
        ticket_id: success.ticket.id.value(),
        new_assignment: success
            .ticket
            .assignee
            .map_or(
                AssignmentInfo {
                    staff_id: None,
                    subcontractor_id: None,
                },
                AssignmentInfo::from_assignee,
            ),
        acknowledged_warnings: conflict_infos(&success.acknowledged_warnings),
        audit_event_id: success.audit_event_id,
        inconsistencies: success.inconsistencies,
    })
}

/// Checks an applied item for drift against its live ticket.
///
/// # Errors
///
/// Returns `AUTH_FORBIDDEN` without `manage_schedule` and `NOT_FOUND`
/// for a missing item.
pub fn check_drift<S: ScheduleStore>(
    store: &mut S,
    item_id: i64,
    request: &DriftCheckRequest,
    request_id: &str,
    now: OffsetDateTime,
) -> Result<DriftResponse, ApiError> {
    let ctx: RequestContext = resolve_context(
        &request.actor_id,
        &request.roles,
        request.staff_id,
        request_id,
        now,
    )?;
    let status = fieldops::detect_drift(store, &ctx, ItemId::new(item_id))
        .map_err(|e| translate_core_error(e, ErrorSurface::Planning))?;
    Ok(drift_response(&status))
}

/// Resolves a drifted item one way or the other.
///
/// # Errors
///
/// Returns `VALIDATION_FAILED` for an unknown resolution string and
/// `INVALID_TRANSITION` when the item is not in a resolvable state.
pub fn resolve_drift<S: ScheduleStore>(
    store: &mut S,
    item_id: i64,
    request: &ResolveDriftRequest,
    request_id: &str,
    now: OffsetDateTime,
) -> Result<DriftResponse, ApiError> {
    let ctx: RequestContext = resolve_context(
        &request.actor_id,
        &request.roles,
        request.staff_id,
        request_id,
        now,
    )?;
    let resolution: DriftResolution = match request.resolution.as_str() {
        "use_board_version" => DriftResolution::UseBoardVersion,
        "accept_schedule_version" => DriftResolution::AcceptScheduleVersion,
        other => {
            return Err(ApiError::validation(&format!(
                "Unknown drift resolution: {other}"
            )));
        }
    };
    let status = fieldops::resolve_drift(store, &ctx, ItemId::new(item_id), resolution)
        .map_err(|e| translate_core_error(e, ErrorSurface::Planning))?;
    Ok(drift_response(&status))
}

fn drift_response(status: &fieldops::DriftStatus) -> DriftResponse {
    DriftResponse {
        board_item_id: status.item_id.value(),
        drifted: status.drifted,
        sync_state: status.sync_state.to_string(),
        board_assignee: AssignmentInfo::from_option(status.board_assignee),
        live_assignee: AssignmentInfo::from_option(status.live_assignee),
    }
}

// --- Schedule periods -----------------------------------------------------

/// Creates a schedule period in `DRAFT` status.
///
/// # Errors
///
/// Returns `AUTH_FORBIDDEN` without `publish_schedule` and
/// `VALIDATION_FAILED` for unparsable or reversed dates.
pub fn create_period<S: ScheduleStore>(
    store: &mut S,
    request: &CreatePeriodRequest,
    request_id: &str,
    now: OffsetDateTime,
) -> Result<PeriodInfo, ApiError> {
    let ctx: RequestContext = resolve_context(
        &request.actor_id,
        &request.roles,
        request.staff_id,
        request_id,
        now,
    )?;
    let period: NewPeriod = NewPeriod {
        site_id: SiteId::new(request.site_id),
        name: request.period_name.clone(),
        period_start: parse_date("period_start", &request.period_start)?,
        period_end: parse_date("period_end", &request.period_end)?,
    };
    let created = fieldops::create_period(store, &ctx, &period)
        .map_err(|e| translate_core_error(e, ErrorSurface::Schedule))?;
    Ok(PeriodInfo::from_period(&created))
}

/// Lists periods, optionally filtered by site and status.
///
/// # Errors
///
/// Returns `VALIDATION_FAILED` for an unknown status string.
pub fn list_periods<S: ScheduleStore>(
    store: &mut S,
    site_id: Option<i64>,
    status: Option<&str>,
) -> Result<Vec<PeriodInfo>, ApiError> {
    let status: Option<PeriodStatus> = status
        .map(PeriodStatus::from_str)
        .transpose()
        .map_err(|e| ApiError::validation(&e.to_string()))?;
    let filter: PeriodFilter = PeriodFilter {
        site_id: site_id.map(SiteId::new),
        status,
    };
    let periods = store
        .list_periods(&filter)
        .map_err(|e| translate_store_error(e, ErrorSurface::Schedule))?;
    Ok(periods.iter().map(PeriodInfo::from_period).collect())
}

/// Publishes a `DRAFT` period.
///
/// # Errors
///
/// Returns `AUTH_FORBIDDEN` without `publish_schedule` and
/// `INVALID_TRANSITION` from any other status.
pub fn publish_period<S: ScheduleStore>(
    store: &mut S,
    period_id: i64,
    request: &PeriodActionRequest,
    request_id: &str,
    now: OffsetDateTime,
) -> Result<PeriodInfo, ApiError> {
    period_action(store, period_id, request, request_id, now, fieldops::publish_period)
}

/// Locks a `PUBLISHED` period.
///
/// # Errors
///
/// Returns `AUTH_FORBIDDEN` without `publish_schedule` and
/// `INVALID_TRANSITION` from any other status.
pub fn lock_period<S: ScheduleStore>(
    store: &mut S,
    period_id: i64,
    request: &PeriodActionRequest,
    request_id: &str,
    now: OffsetDateTime,
) -> Result<PeriodInfo, ApiError> {
    period_action(store, period_id, request, request_id, now, fieldops::lock_period)
}

/// Archives a period from any non-terminal status.
///
/// # Errors
///
/// Returns `AUTH_FORBIDDEN` without `publish_schedule` and
/// `INVALID_TRANSITION` for an already archived period.
pub fn archive_period<S: ScheduleStore>(
    store: &mut S,
    period_id: i64,
    request: &PeriodActionRequest,
    request_id: &str,
    now: OffsetDateTime,
) -> Result<PeriodInfo, ApiError> {
    period_action(store, period_id, request, request_id, now, fieldops::archive_period)
}

fn period_action<S, F>(
    store: &mut S,
    period_id: i64,
    request: &PeriodActionRequest,
    request_id: &str,
    now: OffsetDateTime,
    action: F,
) -> Result<PeriodInfo, ApiError>
where
    S: ScheduleStore,
    F: FnOnce(
        &mut S,
        &RequestContext,
        PeriodId,
    ) -> Result<fieldops_domain::SchedulePeriod, fieldops::CoreError>,
{
    let ctx: RequestContext = resolve_context(
        &request.actor_id,
        &request.roles,
        request.staff_id,
        request_id,
        now,
    )?;
    let period = action(store, &ctx, PeriodId::new(period_id))
        .map_err(|e| translate_core_error(e, ErrorSurface::Schedule))?;
    Ok(PeriodInfo::from_period(&period))
}

/// Runs the conflict detector across every active ticket in a period.
///
/// # Errors
///
/// Returns `AUTH_FORBIDDEN` without `manage_schedule` and `NOT_FOUND`
/// for a missing period.
pub fn validate_period<S: ScheduleStore>(
    store: &mut S,
    period_id: i64,
    request: &PeriodActionRequest,
    request_id: &str,
    now: OffsetDateTime,
) -> Result<ValidatePeriodResponse, ApiError> {
    let ctx: RequestContext = resolve_context(
        &request.actor_id,
        &request.roles,
        request.staff_id,
        request_id,
        now,
    )?;
    let validation = fieldops::validate_period(store, &ctx, PeriodId::new(period_id))
        .map_err(|e| translate_core_error(e, ErrorSurface::Schedule))?;
    Ok(ValidatePeriodResponse {
        period_id: validation.period_id.value(),
        tickets_checked: validation.tickets_checked,
        conflicts: conflict_infos(&validation.conflicts),
    })
}

/// Lists conflicts persisted by validation sweeps.
///
/// # Errors
///
/// Returns `VALIDATION_FAILED` for an unknown severity string.
pub fn list_conflicts<S: ScheduleStore>(
    store: &mut S,
    period_id: Option<i64>,
    severity: Option<&str>,
    blocking_only: bool,
) -> Result<Vec<ConflictInfo>, ApiError> {
    let severity: Option<Severity> = severity
        .map(Severity::from_str)
        .transpose()
        .map_err(|e| ApiError::validation(&e.to_string()))?;
    let filter: ConflictFilter = ConflictFilter {
        period_id: period_id.map(PeriodId::new),
        severity,
        blocking_only,
    };
    let conflicts = store
        .list_conflicts(&filter)
        .map_err(|e| translate_store_error(e, ErrorSurface::Schedule))?;
    Ok(conflicts
        .iter()
        .map(|persisted| ConflictInfo::from_conflict(&persisted.conflict))
        .collect())
}

// --- Availability rules ---------------------------------------------------

/// Creates an availability rule for a staff member.
///
/// Staff may file rules for themselves; anyone else needs
/// `manage_schedule`.
///
/// # Errors
///
/// Returns `VALIDATION_FAILED` for a malformed rule shape (weekly rules
/// need a weekday and window, one-off rules need a date span).
pub fn create_availability_rule<S: ScheduleStore>(
    store: &mut S,
    request: &CreateAvailabilityRequest,
    request_id: &str,
    now: OffsetDateTime,
) -> Result<AvailabilityRuleInfo, ApiError> {
    let ctx: RequestContext = resolve_context(
        &request.actor_id,
        &request.roles,
        request.staff_id,
        request_id,
        now,
    )?;
    let availability: AvailabilityType = AvailabilityType::from_str(&request.availability_type)
        .map_err(|e| ApiError::validation(&e.to_string()))?;
    let kind: RuleKind = match request.rule_type.as_str() {
        "WEEKLY_RECURRING" => {
            let weekday: Weekday = match request.weekday {
                Some(1) => Weekday::Monday,
                Some(2) => Weekday::Tuesday,
                Some(3) => Weekday::Wednesday,
                Some(4) => Weekday::Thursday,
                Some(5) => Weekday::Friday,
                Some(6) => Weekday::Saturday,
                Some(7) => Weekday::Sunday,
                _ => {
                    return Err(ApiError::validation(
                        "Weekly rules need an ISO weekday between 1 and 7",
                    ));
                }
            };
            let (Some(start_min), Some(end_min)) = (request.start_min, request.end_min) else {
                return Err(ApiError::validation(
                    "Weekly rules need start_min and end_min",
                ));
            };
            let window: TimeWindow = TimeWindow::new(start_min, end_min)
                .map_err(|e| ApiError::validation(&e.to_string()))?;
            RuleKind::WeeklyRecurring { weekday, window }
        }
        "ONE_OFF" => {
            let (Some(from), Some(to)) = (&request.from_date, &request.to_date) else {
                return Err(ApiError::validation(
                    "One-off rules need from_date and to_date",
                ));
            };
            RuleKind::OneOff {
                from: parse_date("from_date", from)?,
                to: parse_date("to_date", to)?,
            }
        }
        other => {
            return Err(ApiError::validation(&format!(
                "Unknown rule type: {other}"
            )));
        }
    };
    let rule: NewRule = NewRule {
        staff_id: StaffId::new(request.rule_staff_id),
        kind,
        availability,
        notes: request.notes.clone(),
    };
    let created = fieldops::create_rule(store, &ctx, &rule)
        .map_err(|e| translate_core_error(e, ErrorSurface::Schedule))?;
    Ok(AvailabilityRuleInfo::from_rule(&created))
}

/// Lists the unarchived availability rules for a staff member.
///
/// # Errors
///
/// Returns `INTERNAL` on store failure.
pub fn list_availability_rules<S: ScheduleStore>(
    store: &mut S,
    staff_id: i64,
) -> Result<Vec<AvailabilityRuleInfo>, ApiError> {
    let rules = store
        .load_availability_rules(StaffId::new(staff_id))
        .map_err(|e| translate_store_error(e, ErrorSurface::Schedule))?;
    Ok(rules.iter().map(AvailabilityRuleInfo::from_rule).collect())
}

/// Soft-archives an availability rule.
///
/// # Errors
///
/// Returns `AUTH_FORBIDDEN` for an actor who neither owns the rule nor
/// holds `manage_schedule`, and `NOT_FOUND` for a missing or already
/// archived rule.
pub fn archive_availability_rule<S: ScheduleStore>(
    store: &mut S,
    rule_id: i64,
    request: &ArchiveRuleRequest,
    request_id: &str,
    now: OffsetDateTime,
) -> Result<AvailabilityRuleInfo, ApiError> {
    let ctx: RequestContext = resolve_context(
        &request.actor_id,
        &request.roles,
        request.staff_id,
        request_id,
        now,
    )?;
    let archived = fieldops::archive_rule(store, &ctx, RuleId::new(rule_id))
        .map_err(|e| translate_core_error(e, ErrorSurface::Schedule))?;
    Ok(AvailabilityRuleInfo::from_rule(&archived))
}

// --- Shift trades ---------------------------------------------------------

/// Requests a shift trade.
///
/// # Errors
///
/// Returns `AUTH_FORBIDDEN` for an actor who is neither the initiator
/// nor a schedule manager, and `VALIDATION_FAILED` for a self-trade or
/// an initiator who does not hold the ticket.
pub fn create_trade<S: ScheduleStore>(
    store: &mut S,
    request: &CreateTradeRequest,
    request_id: &str,
    now: OffsetDateTime,
) -> Result<TradeInfo, ApiError> {
    let ctx: RequestContext = resolve_context(
        &request.actor_id,
        &request.roles,
        request.staff_id,
        request_id,
        now,
    )?;
    let request_type: TradeRequestType = TradeRequestType::from_str(&request.request_type)
        .map_err(|e| ApiError::validation(&e.to_string()))?;
    let trade: NewTrade = NewTrade {
        ticket_id: TicketId::new(request.ticket_id),
        initiator_staff_id: StaffId::new(request.initiator_staff_id),
        target_staff_id: StaffId::new(request.target_staff_id),
        request_type,
        initiator_note: request.initiator_note.clone(),
    };
    let created = fieldops::request_trade(store, &ctx, &trade)
        .map_err(|e| translate_core_error(e, ErrorSurface::Trade))?;
    Ok(TradeInfo::from_trade(&created))
}

/// Lists trades, optionally filtered by ticket and status.
///
/// # Errors
///
/// Returns `VALIDATION_FAILED` for an unknown status string.
pub fn list_trades<S: ScheduleStore>(
    store: &mut S,
    ticket_id: Option<i64>,
    status: Option<&str>,
) -> Result<Vec<TradeInfo>, ApiError> {
    let status: Option<TradeStatus> = status
        .map(TradeStatus::from_str)
        .transpose()
        .map_err(|e| ApiError::validation(&e.to_string()))?;
    let filter: TradeFilter = TradeFilter {
        ticket_id: ticket_id.map(TicketId::new),
        status,
    };
    let trades = store
        .list_trades(&filter)
        .map_err(|e| translate_store_error(e, ErrorSurface::Trade))?;
    Ok(trades.iter().map(TradeInfo::from_trade).collect())
}

/// Fetches a single trade.
///
/// # Errors
///
/// Returns `NOT_FOUND` for a missing trade.
pub fn get_trade<S: ScheduleStore>(store: &mut S, trade_id: i64) -> Result<TradeInfo, ApiError> {
    let trade = store
        .load_trade(TradeId::new(trade_id))
        .map_err(|e| translate_store_error(e, ErrorSurface::Trade))?;
    Ok(TradeInfo::from_trade(&trade))
}

/// Accepts a trade as the target staff member.
///
/// # Errors
///
/// Returns `AUTH_FORBIDDEN` for an actor who is neither the target nor
/// a schedule manager, and `INVALID_TRANSITION` for a trade no longer
/// in `requested`.
pub fn accept_trade<S: ScheduleStore>(
    store: &mut S,
    trade_id: i64,
    request: &TradeActionRequest,
    request_id: &str,
    now: OffsetDateTime,
) -> Result<TradeInfo, ApiError> {
    let ctx: RequestContext = resolve_context(
        &request.actor_id,
        &request.roles,
        request.staff_id,
        request_id,
        now,
    )?;
    let trade = fieldops::accept_trade(store, &ctx, TradeId::new(trade_id))
        .map_err(|e| translate_core_error(e, ErrorSurface::Trade))?;
    Ok(TradeInfo::from_trade(&trade))
}

/// Cancels a trade as the initiator.
///
/// # Errors
///
/// Returns `AUTH_FORBIDDEN` for an actor who is neither the initiator
/// nor a schedule manager, and `INVALID_TRANSITION` for a terminal
/// trade.
pub fn cancel_trade<S: ScheduleStore>(
    store: &mut S,
    trade_id: i64,
    request: &TradeActionRequest,
    request_id: &str,
    now: OffsetDateTime,
) -> Result<TradeInfo, ApiError> {
    let ctx: RequestContext = resolve_context(
        &request.actor_id,
        &request.roles,
        request.staff_id,
        request_id,
        now,
    )?;
    let trade = fieldops::cancel_trade(store, &ctx, TradeId::new(trade_id))
        .map_err(|e| translate_core_error(e, ErrorSurface::Trade))?;
    Ok(TradeInfo::from_trade(&trade))
}

/// Denies a trade, recording the manager's note.
///
/// # Errors
///
/// Returns `AUTH_FORBIDDEN` without `approve_trade` and
/// `INVALID_TRANSITION` for a trade no longer in `requested`.
pub fn deny_trade<S: ScheduleStore>(
    store: &mut S,
    trade_id: i64,
    request: &TradeActionRequest,
    request_id: &str,
    now: OffsetDateTime,
) -> Result<TradeInfo, ApiError> {
    let ctx: RequestContext = resolve_context(
        &request.actor_id,
        &request.roles,
        request.staff_id,
        request_id,
        now,
    )?;
    let trade = fieldops::deny_trade(
        store,
        &ctx,
        TradeId::new(trade_id),
        request.manager_note.as_deref(),
    )
    .map_err(|e| translate_core_error(e, ErrorSurface::Trade))?;
    Ok(TradeInfo::from_trade(&trade))
}

/// Approves an accepted trade after re-running the conflict detector.
///
/// # Errors
///
/// Returns `TRADE_APPLY_BLOCKED` / `TRADE_ACK_REQUIRED` per the shared
/// conflict policy, plus `AUTH_FORBIDDEN` without `approve_trade`.
pub fn approve_trade<S: ScheduleStore>(
    store: &mut S,
    trade_id: i64,
    request: &TradeDecisionRequest,
    request_id: &str,
    now: OffsetDateTime,
) -> Result<TradeInfo, ApiError> {
    let ctx: RequestContext = resolve_context(
        &request.actor_id,
        &request.roles,
        request.staff_id,
        request_id,
        now,
    )?;
    let decision: TradeDecision = trade_decision(request)?;
    let trade = fieldops::approve_trade(store, &ctx, TradeId::new(trade_id), &decision)
        .map_err(|e| translate_core_error(e, ErrorSurface::Trade))?;
    Ok(TradeInfo::from_trade(&trade))
}

/// Commits an accepted or approved trade to the live schedule.
///
/// # Errors
///
/// Returns `TRADE_APPLY_BLOCKED` / `TRADE_ACK_REQUIRED` per the shared
/// conflict policy, `CONCURRENCY_CONFLICT` when the versioned ticket
/// write loses a race, and `AUTH_FORBIDDEN` without `approve_trade`.
pub fn apply_trade<S: ScheduleStore>(
    store: &mut S,
    trade_id: i64,
    request: &TradeDecisionRequest,
    request_id: &str,
    now: OffsetDateTime,
) -> Result<TradeApplyResponse, ApiError> {
    let ctx: RequestContext = resolve_context(
        &request.actor_id,
        &request.roles,
        request.staff_id,
        request_id,
        now,
    )?;
    let decision: TradeDecision = trade_decision(request)?;
    let applied = fieldops::apply_trade(store, &ctx, TradeId::new(trade_id), &decision)
        .map_err(|e| translate_core_error(e, ErrorSurface::Trade))?;
    Ok(TradeApplyResponse {
        trade: TradeInfo::from_trade(&applied.trade),
        ticket_id: applied.ticket.id.value(),
        new_assignment: applied.ticket.assignee.map_or(
            AssignmentInfo {
                staff_id: None,
                subcontractor_id: None,
            },
            AssignmentInfo::from_assignee,
        ),
        inconsistencies: applied.inconsistencies,
    })
}

fn trade_decision(request: &TradeDecisionRequest) -> Result<TradeDecision, ApiError> {
    if request.override_locked_period {
        OverridePolicy::default()
            .validate(request.override_reason.as_deref())
            .map_err(|e| ApiError::validation(&e.to_string()))?;
    }
    Ok(TradeDecision {
        acknowledged_warning_keys: request.acknowledged_warning_ids.clone(),
        override_locked_period: request.override_locked_period,
        override_reason: request.override_reason.clone(),
    })
}

// --- Audit + capabilities -------------------------------------------------

/// Lists the audit timeline for an entity, newest first.
///
/// # Errors
///
/// Returns `INTERNAL` on store failure.
pub fn get_audit_timeline<S: ScheduleStore>(
    store: &mut S,
    entity_type: &str,
    entity_id: &str,
) -> Result<Vec<AuditRecordInfo>, ApiError> {
    let records = store
        .list_audit_records(entity_type, entity_id)
        .map_err(|e| translate_store_error(e, ErrorSurface::Schedule))?;
    Ok(records
        .into_iter()
        .map(|stored| AuditRecordInfo {
            event_id: stored.event_id,
            action: stored.record.action.name,
            details: stored.record.action.details,
            before: stored.record.before.map(|s| s.data),
            after: stored.record.after.map(|s| s.data),
            actor_id: stored.record.actor.id,
            actor_type: stored.record.actor.actor_type,
            cause: stored.record.cause.description,
        })
        .collect())
}

/// Computes the schedule capabilities for an operator.
///
/// # Errors
///
/// Returns `VALIDATION_FAILED` for an unknown role string.
pub fn get_capabilities(
    actor_id: &str,
    roles: &[String],
    staff_id: Option<i64>,
) -> Result<ScheduleCapabilities, ApiError> {
    let actor: AuthenticatedActor = AuthenticatedActor::from_request(actor_id, roles, staff_id)?;
    Ok(compute_schedule_capabilities(&actor))
}
