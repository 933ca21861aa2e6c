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
    clippy::all
)]
#![allow(clippy::multiple_crate_versions)]

use axum::{
    Json, Router,
    extract::{Path, Query, State as AxumState},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use clap::Parser;
use serde::Deserialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use time::OffsetDateTime;
use tokio::sync::Mutex;
use tracing::info;

use fieldops_api::{
    ApiError, ApplyItemRequest, ApplyItemResponse, ArchiveRuleRequest, AuditRecordInfo,
    AvailabilityRuleInfo, BoardInfo, ConflictInfo, CreateAvailabilityRequest, CreateBoardRequest,
    CreateItemRequest, CreatePeriodRequest, CreateProposalRequest, CreateTradeRequest,
    DriftCheckRequest, DriftResponse, ItemInfo, PeriodActionRequest, PeriodInfo, ProposalInfo,
    ResolveDriftRequest, ScheduleCapabilities, TradeActionRequest, TradeApplyResponse,
    TradeDecisionRequest, TradeInfo, ValidatePeriodResponse,
};
use fieldops_persistence::SqliteStore;

/// fieldops server - HTTP surface for the scheduling sync engine
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the `SQLite` database file. If not provided, uses an
    /// in-memory database.
    #[arg(short, long)]
    database: Option<String>,

    /// Port to bind the server to
    #[arg(short, long, default_value_t = 3000)]
    port: u16,
}

/// Application state shared across handlers.
#[derive(Clone)]
struct AppState {
    /// The store wrapped in a Mutex for safe concurrent access.
    store: Arc<Mutex<SqliteStore>>,
}

/// Monotonic request correlation ids for the audit trail.
static REQUEST_COUNTER: AtomicU64 = AtomicU64::new(0);

fn next_request_id() -> String {
    let n: u64 = REQUEST_COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("req-{n}")
}

/// HTTP error wrapper that implements `IntoResponse`.
///
/// The body is the API error's own serialization: problem details, or
/// the conflict/acknowledgment payload for apply outcomes.
struct HttpError(ApiError);

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let status: StatusCode =
            StatusCode::from_u16(self.0.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.0.body)).into_response()
    }
}

impl From<ApiError> for HttpError {
    fn from(err: ApiError) -> Self {
        Self(err)
    }
}

// --- Planning -------------------------------------------------------------

async fn handle_create_board(
    AxumState(state): AxumState<AppState>,
    Json(request): Json<CreateBoardRequest>,
) -> Result<Json<BoardInfo>, HttpError> {
    let mut store = state.store.lock().await;
    let board: BoardInfo = fieldops_api::create_board(
        &mut *store,
        &request,
        &next_request_id(),
        OffsetDateTime::now_utc(),
    )?;
    Ok(Json(board))
}

async fn handle_list_boards(
    AxumState(state): AxumState<AppState>,
) -> Result<Json<Vec<BoardInfo>>, HttpError> {
    let mut store = state.store.lock().await;
    Ok(Json(fieldops_api::list_boards(&mut *store)?))
}

async fn handle_create_item(
    AxumState(state): AxumState<AppState>,
    Path(board_id): Path<i64>,
    Json(request): Json<CreateItemRequest>,
) -> Result<Json<ItemInfo>, HttpError> {
    let mut store = state.store.lock().await;
    let item: ItemInfo = fieldops_api::create_item(
        &mut *store,
        board_id,
        &request,
        &next_request_id(),
        OffsetDateTime::now_utc(),
    )?;
    Ok(Json(item))
}

async fn handle_list_items(
    AxumState(state): AxumState<AppState>,
    Path(board_id): Path<i64>,
) -> Result<Json<Vec<ItemInfo>>, HttpError> {
    let mut store = state.store.lock().await;
    Ok(Json(fieldops_api::list_items(&mut *store, board_id)?))
}

async fn handle_create_proposal(
    AxumState(state): AxumState<AppState>,
    Path(item_id): Path<i64>,
    Json(request): Json<CreateProposalRequest>,
) -> Result<Json<ProposalInfo>, HttpError> {
    let mut store = state.store.lock().await;
    let proposal: ProposalInfo = fieldops_api::create_proposal(
        &mut *store,
        item_id,
        &request,
        &next_request_id(),
        OffsetDateTime::now_utc(),
    )?;
    Ok(Json(proposal))
}

async fn handle_apply_item(
    AxumState(state): AxumState<AppState>,
    Path(item_id): Path<i64>,
    Json(request): Json<ApplyItemRequest>,
) -> Result<Json<ApplyItemResponse>, HttpError> {
    let mut store = state.store.lock().await;
    let response: ApplyItemResponse = fieldops_api::apply_item(
        &mut *store,
        item_id,
        &request,
        &next_request_id(),
        OffsetDateTime::now_utc(),
    )?;
    Ok(Json(response))
}

async fn handle_check_drift(
    AxumState(state): AxumState<AppState>,
    Path(item_id): Path<i64>,
    Json(request): Json<DriftCheckRequest>,
) -> Result<Json<DriftResponse>, HttpError> {
    let mut store = state.store.lock().await;
    let response: DriftResponse = fieldops_api::check_drift(
        &mut *store,
        item_id,
        &request,
        &next_request_id(),
        OffsetDateTime::now_utc(),
    )?;
    Ok(Json(response))
}

async fn handle_resolve_drift(
    AxumState(state): AxumState<AppState>,
    Path(item_id): Path<i64>,
    Json(request): Json<ResolveDriftRequest>,
) -> Result<Json<DriftResponse>, HttpError> {
    let mut store = state.store.lock().await;
    let response: DriftResponse = fieldops_api::resolve_drift(
        &mut *store,
        item_id,
        &request,
        &next_request_id(),
        OffsetDateTime::now_utc(),
    )?;
    Ok(Json(response))
}

// --- Schedule periods -----------------------------------------------------

async fn handle_create_period(
    AxumState(state): AxumState<AppState>,
    Json(request): Json<CreatePeriodRequest>,
) -> Result<Json<PeriodInfo>, HttpError> {
    let mut store = state.store.lock().await;
    let period: PeriodInfo = fieldops_api::create_period(
        &mut *store,
        &request,
        &next_request_id(),
        OffsetDateTime::now_utc(),
    )?;
    Ok(Json(period))
}

/// Query parameters for listing periods.
#[derive(Debug, Deserialize)]
struct ListPeriodsQuery {
    /// Restrict to one site.
    site_id: Option<i64>,
    /// Restrict to one status.
    status: Option<String>,
}

async fn handle_list_periods(
    AxumState(state): AxumState<AppState>,
    Query(query): Query<ListPeriodsQuery>,
) -> Result<Json<Vec<PeriodInfo>>, HttpError> {
    let mut store = state.store.lock().await;
    let periods: Vec<PeriodInfo> =
        fieldops_api::list_periods(&mut *store, query.site_id, query.status.as_deref())?;
    Ok(Json(periods))
}

async fn handle_publish_period(
    AxumState(state): AxumState<AppState>,
    Path(period_id): Path<i64>,
    Json(request): Json<PeriodActionRequest>,
) -> Result<Json<PeriodInfo>, HttpError> {
    let mut store = state.store.lock().await;
    let period: PeriodInfo = fieldops_api::publish_period(
        &mut *store,
        period_id,
        &request,
        &next_request_id(),
        OffsetDateTime::now_utc(),
    )?;
    Ok(Json(period))
}

async fn handle_lock_period(
    AxumState(state): AxumState<AppState>,
    Path(period_id): Path<i64>,
    Json(request): Json<PeriodActionRequest>,
) -> Result<Json<PeriodInfo>, HttpError> {
    let mut store = state.store.lock().await;
    let period: PeriodInfo = fieldops_api::lock_period(
        &mut *store,
        period_id,
        &request,
        &next_request_id(),
        OffsetDateTime::now_utc(),
    )?;
    Ok(Json(period))
}

async fn handle_archive_period(
    AxumState(state): AxumState<AppState>,
    Path(period_id): Path<i64>,
    Json(request): Json<PeriodActionRequest>,
) -> Result<Json<PeriodInfo>, HttpError> {
    let mut store = state.store.lock().await;
    let period: PeriodInfo = fieldops_api::archive_period(
        &mut *store,
        period_id,
        &request,
        &next_request_id(),
        OffsetDateTime::now_utc(),
    )?;
    Ok(Json(period))
}

async fn handle_validate_period(
    AxumState(state): AxumState<AppState>,
    Path(period_id): Path<i64>,
    Json(request): Json<PeriodActionRequest>,
) -> Result<Json<ValidatePeriodResponse>, HttpError> {
    let mut store = state.store.lock().await;
    let response: ValidatePeriodResponse = fieldops_api::validate_period(
        &mut *store,
        period_id,
        &request,
        &next_request_id(),
        OffsetDateTime::now_utc(),
    )?;
    Ok(Json(response))
}

/// Query parameters for listing persisted conflicts.
#[derive(Debug, Deserialize)]
struct ListConflictsQuery {
    /// Restrict to one period.
    period_id: Option<i64>,
    /// Restrict to one severity.
    severity: Option<String>,
    /// Only blocking conflicts.
    #[serde(default)]
    blocking_only: bool,
}

async fn handle_list_conflicts(
    AxumState(state): AxumState<AppState>,
    Query(query): Query<ListConflictsQuery>,
) -> Result<Json<Vec<ConflictInfo>>, HttpError> {
    let mut store = state.store.lock().await;
    let conflicts: Vec<ConflictInfo> = fieldops_api::list_conflicts(
        &mut *store,
        query.period_id,
        query.severity.as_deref(),
        query.blocking_only,
    )?;
    Ok(Json(conflicts))
}

// --- Availability ---------------------------------------------------------

async fn handle_create_availability(
    AxumState(state): AxumState<AppState>,
    Json(request): Json<CreateAvailabilityRequest>,
) -> Result<Json<AvailabilityRuleInfo>, HttpError> {
    let mut store = state.store.lock().await;
    let rule: AvailabilityRuleInfo = fieldops_api::create_availability_rule(
        &mut *store,
        &request,
        &next_request_id(),
        OffsetDateTime::now_utc(),
    )?;
    Ok(Json(rule))
}

/// Query parameters for listing availability rules.
#[derive(Debug, Deserialize)]
struct ListAvailabilityQuery {
    /// The staff member whose rules to list.
    staff_id: i64,
}

async fn handle_list_availability(
    AxumState(state): AxumState<AppState>,
    Query(query): Query<ListAvailabilityQuery>,
) -> Result<Json<Vec<AvailabilityRuleInfo>>, HttpError> {
    let mut store = state.store.lock().await;
    Ok(Json(fieldops_api::list_availability_rules(
        &mut *store,
        query.staff_id,
    )?))
}

async fn handle_archive_availability(
    AxumState(state): AxumState<AppState>,
    Path(rule_id): Path<i64>,
    Json(request): Json<ArchiveRuleRequest>,
) -> Result<Json<AvailabilityRuleInfo>, HttpError> {
    let mut store = state.store.lock().await;
    let rule: AvailabilityRuleInfo = fieldops_api::archive_availability_rule(
        &mut *store,
        rule_id,
        &request,
        &next_request_id(),
        OffsetDateTime::now_utc(),
    )?;
    Ok(Json(rule))
}

// --- Shift trades ---------------------------------------------------------

async fn handle_create_trade(
    AxumState(state): AxumState<AppState>,
    Json(request): Json<CreateTradeRequest>,
) -> Result<Json<TradeInfo>, HttpError> {
    let mut store = state.store.lock().await;
    let trade: TradeInfo = fieldops_api::create_trade(
        &mut *store,
        &request,
        &next_request_id(),
        OffsetDateTime::now_utc(),
    )?;
    Ok(Json(trade))
}

/// Query parameters for listing trades.
#[derive(Debug, Deserialize)]
struct ListTradesQuery {
    /// Restrict to one ticket.
    ticket_id: Option<i64>,
    /// Restrict to one status.
    status: Option<String>,
}

async fn handle_list_trades(
    AxumState(state): AxumState<AppState>,
    Query(query): Query<ListTradesQuery>,
) -> Result<Json<Vec<TradeInfo>>, HttpError> {
    let mut store = state.store.lock().await;
    let trades: Vec<TradeInfo> =
        fieldops_api::list_trades(&mut *store, query.ticket_id, query.status.as_deref())?;
    Ok(Json(trades))
}

async fn handle_get_trade(
    AxumState(state): AxumState<AppState>,
    Path(trade_id): Path<i64>,
) -> Result<Json<TradeInfo>, HttpError> {
    let mut store = state.store.lock().await;
    Ok(Json(fieldops_api::get_trade(&mut *store, trade_id)?))
}

async fn handle_accept_trade(
    AxumState(state): AxumState<AppState>,
    Path(trade_id): Path<i64>,
    Json(request): Json<TradeActionRequest>,
) -> Result<Json<TradeInfo>, HttpError> {
    let mut store = state.store.lock().await;
    let trade: TradeInfo = fieldops_api::accept_trade(
        &mut *store,
        trade_id,
        &request,
        &next_request_id(),
        OffsetDateTime::now_utc(),
    )?;
    Ok(Json(trade))
}

async fn handle_cancel_trade(
    AxumState(state): AxumState<AppState>,
    Path(trade_id): Path<i64>,
    Json(request): Json<TradeActionRequest>,
) -> Result<Json<TradeInfo>, HttpError> {
    let mut store = state.store.lock().await;
    let trade: TradeInfo = fieldops_api::cancel_trade(
        &mut *store,
        trade_id,
        &request,
        &next_request_id(),
        OffsetDateTime::now_utc(),
    )?;
    Ok(Json(trade))
}

async fn handle_deny_trade(
    AxumState(state): AxumState<AppState>,
    Path(trade_id): Path<i64>,
    Json(request): Json<TradeActionRequest>,
) -> Result<Json<TradeInfo>, HttpError> {
    let mut store = state.store.lock().await;
    let trade: TradeInfo = fieldops_api::deny_trade(
        &mut *store,
        trade_id,
        &request,
        &next_request_id(),
        OffsetDateTime::now_utc(),
    )?;
    Ok(Json(trade))
}

async fn handle_approve_trade(
    AxumState(state): AxumState<AppState>,
    Path(trade_id): Path<i64>,
    Json(request): Json<TradeDecisionRequest>,
) -> Result<Json<TradeInfo>, HttpError> {
    let mut store = state.store.lock().await;
    let trade: TradeInfo = fieldops_api::approve_trade(
        &mut *store,
        trade_id,
        &request,
        &next_request_id(),
        OffsetDateTime::now_utc(),
    )?;
    Ok(Json(trade))
}

async fn handle_apply_trade(
    AxumState(state): AxumState<AppState>,
    Path(trade_id): Path<i64>,
    Json(request): Json<TradeDecisionRequest>,
) -> Result<Json<TradeApplyResponse>, HttpError> {
    let mut store = state.store.lock().await;
    let response: TradeApplyResponse = fieldops_api::apply_trade(
        &mut *store,
        trade_id,
        &request,
        &next_request_id(),
        OffsetDateTime::now_utc(),
    )?;
    Ok(Json(response))
}

// --- Audit + capabilities -------------------------------------------------

async fn handle_get_audit_timeline(
    AxumState(state): AxumState<AppState>,
    Path((entity_type, entity_id)): Path<(String, String)>,
) -> Result<Json<Vec<AuditRecordInfo>>, HttpError> {
    let mut store = state.store.lock().await;
    Ok(Json(fieldops_api::get_audit_timeline(
        &mut *store,
        &entity_type,
        &entity_id,
    )?))
}

/// Query parameters for computing capabilities.
#[derive(Debug, Deserialize)]
struct CapabilitiesQuery {
    /// The acting operator.
    actor_id: String,
    /// Comma-separated role names.
    roles: String,
    /// The staff record the operator corresponds to, if any.
    staff_id: Option<i64>,
}

async fn handle_get_capabilities(
    Query(query): Query<CapabilitiesQuery>,
) -> Result<Json<ScheduleCapabilities>, HttpError> {
    let roles: Vec<String> = query
        .roles
        .split(',')
        .map(str::trim)
        .filter(|role| !role.is_empty())
        .map(ToString::to_string)
        .collect();
    let capabilities: ScheduleCapabilities =
        fieldops_api::get_capabilities(&query.actor_id, &roles, query.staff_id)?;
    Ok(Json(capabilities))
}

/// Builds the application router with all endpoints.
fn build_router(app_state: AppState) -> Router {
    Router::new()
        .route("/planning/boards", post(handle_create_board))
        .route("/planning/boards", get(handle_list_boards))
        .route("/planning/boards/{board_id}/items", post(handle_create_item))
        .route("/planning/boards/{board_id}/items", get(handle_list_items))
        .route(
            "/planning/items/{item_id}/proposals",
            post(handle_create_proposal),
        )
        .route("/planning/items/{item_id}/apply", post(handle_apply_item))
        .route(
            "/planning/items/{item_id}/check-drift",
            post(handle_check_drift),
        )
        .route(
            "/planning/items/{item_id}/resolve-drift",
            post(handle_resolve_drift),
        )
        .route("/schedule/periods", post(handle_create_period))
        .route("/schedule/periods", get(handle_list_periods))
        .route(
            "/schedule/periods/{period_id}/publish",
            post(handle_publish_period),
        )
        .route("/schedule/periods/{period_id}/lock", post(handle_lock_period))
        .route(
            "/schedule/periods/{period_id}/archive",
            post(handle_archive_period),
        )
        .route(
            "/schedule/periods/{period_id}/validate",
            post(handle_validate_period),
        )
        .route("/schedule/conflicts", get(handle_list_conflicts))
        .route("/schedule/availability", post(handle_create_availability))
        .route("/schedule/availability", get(handle_list_availability))
        .route(
            "/schedule/availability/{rule_id}/archive",
            post(handle_archive_availability),
        )
        .route("/schedule/trades", post(handle_create_trade))
        .route("/schedule/trades", get(handle_list_trades))
        .route("/schedule/trades/{trade_id}", get(handle_get_trade))
        .route("/schedule/trades/{trade_id}/accept", post(handle_accept_trade))
        .route("/schedule/trades/{trade_id}/cancel", post(handle_cancel_trade))
        .route("/schedule/trades/{trade_id}/deny", post(handle_deny_trade))
        .route(
            "/schedule/trades/{trade_id}/approve",
            post(handle_approve_trade),
        )
        .route("/schedule/trades/{trade_id}/apply", post(handle_apply_trade))
        .route(
            "/audit/{entity_type}/{entity_id}",
            get(handle_get_audit_timeline),
        )
        .route("/capabilities", get(handle_get_capabilities))
        .with_state(app_state)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("Initializing fieldops server");

    let store: SqliteStore = if let Some(db_path) = &args.database {
        info!("Using file-based database at: {}", db_path);
        SqliteStore::open(std::path::Path::new(db_path))?
    } else {
        info!("Using in-memory database");
        SqliteStore::new_in_memory()?
    };

    let app_state: AppState = AppState {
        store: Arc::new(Mutex::new(store)),
    };
    let app: Router = build_router(app_state);

    let addr: std::net::SocketAddr = format!("127.0.0.1:{}", args.port).parse()?;
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
