// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! API error shapes.
//!
//! Errors serialize as problem-details-like bodies with stable
//! machine-readable codes so callers branch on `code`, never on prose.
//! Conflict-policy outcomes carry their payloads (blocking conflicts,
//! unacknowledged warning ids) alongside the code, as the callers need
//! them to drive the acknowledgment round-trip.

use crate::request_response::ConflictInfo;
use fieldops::CoreError;
use fieldops_domain::{DomainError, ScheduleConflict};
use serde::{Deserialize, Serialize};

/// A problem-details body: `{code, title, status, detail}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProblemDetails {
    /// Stable machine-readable code.
    pub code: String,
    /// Short human-readable title.
    pub title: String,
    /// HTTP status.
    pub status: u16,
    /// Human-readable detail.
    pub detail: String,
}

/// The payload body of an API error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ErrorBody {
    /// A conflict-policy rejection carrying the blocking list.
    Blocked {
        /// `PLANNING_APPLY_BLOCKED` or `TRADE_APPLY_BLOCKED`.
        code: String,
        /// The full blocking conflict list, in detector order.
        blocking_conflicts: Vec<ConflictInfo>,
    },
    /// A conflict-policy rejection carrying the unacknowledged warnings.
    AckRequired {
        /// `PLANNING_ACK_REQUIRED` or `TRADE_ACK_REQUIRED`.
        code: String,
        /// Keys of the warnings still requiring acknowledgment.
        warning_conflict_ids: Vec<String>,
    },
    /// Everything else, as problem details.
    Problem(ProblemDetails),
}

/// An API error: an HTTP status plus a serializable body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    /// The HTTP status.
    pub status: u16,
    /// The response body.
    pub body: ErrorBody,
}

impl ApiError {
    /// The error's stable code.
    #[must_use]
    pub fn code(&self) -> &str {
        match &self.body {
            ErrorBody::Blocked { code, .. } | ErrorBody::AckRequired { code, .. } => code,
            ErrorBody::Problem(problem) => &problem.code,
        }
    }

    fn problem(code: &str, title: &str, status: u16, detail: String) -> Self {
        Self {
            status,
            body: ErrorBody::Problem(ProblemDetails {
                code: code.to_string(),
                title: title.to_string(),
                status,
                detail,
            }),
        }
    }

    /// A 400 validation failure.
    #[must_use]
    pub fn validation(detail: &str) -> Self {
        Self::problem("VALIDATION_FAILED", "Validation failed", 400, detail.to_string())
    }

    /// A 500 internal failure. The original message is preserved for
    /// operators; it is never swallowed.
    #[must_use]
    pub fn internal(detail: String) -> Self {
        Self::problem("INTERNAL", "Internal error", 500, detail)
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.body {
            ErrorBody::Blocked { code, blocking_conflicts } => {
                write!(f, "{code}: {} blocking conflict(s)", blocking_conflicts.len())
            }
            ErrorBody::AckRequired { code, warning_conflict_ids } => {
                write!(f, "{code}: {} unacknowledged warning(s)", warning_conflict_ids.len())
            }
            ErrorBody::Problem(problem) => {
                write!(f, "{}: {}", problem.code, problem.detail)
            }
        }
    }
}

impl std::error::Error for ApiError {}

/// Which front-end an orchestrated operation was invoked from.
///
/// Planning applies and trades share the conflict-resolution core but
/// surface distinct codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSurface {
    /// The planning-board apply workflow.
    Planning,
    /// The shift-trade workflow.
    Trade,
    /// Period and availability management.
    Schedule,
}

impl ErrorSurface {
    const fn blocked_code(self) -> &'static str {
        match self {
            Self::Trade => "TRADE_APPLY_BLOCKED",
            Self::Planning | Self::Schedule => "PLANNING_APPLY_BLOCKED",
        }
    }

    const fn ack_code(self) -> &'static str {
        match self {
            Self::Trade => "TRADE_ACK_REQUIRED",
            Self::Planning | Self::Schedule => "PLANNING_ACK_REQUIRED",
        }
    }

    const fn override_code(self) -> &'static str {
        match self {
            Self::Trade => "TRADE_OVERRIDE_REQUIRED",
            Self::Planning | Self::Schedule => "PLANNING_OVERRIDE_REQUIRED",
        }
    }
}

/// Translates a core error into its API shape.
///
/// This translation is explicit and total; core errors are never leaked
/// raw to callers.
#[must_use]
#[allow(clippy::too_many_lines)]
pub fn translate_core_error(err: CoreError, surface: ErrorSurface) -> ApiError {
    match err {
        CoreError::Forbidden { action, required } => ApiError::problem(
            "AUTH_FORBIDDEN",
            "Forbidden",
            403,
            format!("'{action}' requires {required} or above"),
        ),
        CoreError::NotFound { entity, id } => ApiError::problem(
            "NOT_FOUND",
            "Not found",
            404,
            format!("{entity} {id} not found"),
        ),
        CoreError::ApplyBlocked { blocking } => ApiError {
            status: 409,
            body: ErrorBody::Blocked {
                code: surface.blocked_code().to_string(),
                blocking_conflicts: blocking.iter().map(ConflictInfo::from_conflict).collect(),
            },
        },
        CoreError::AckRequired { warning_keys } => ApiError {
            status: 409,
            body: ErrorBody::AckRequired {
                code: surface.ack_code().to_string(),
                warning_conflict_ids: warning_keys,
            },
        },
        CoreError::OverrideRequired { ticket_id } => ApiError::problem(
            surface.override_code(),
            "Locked period override required",
            409,
            format!(
                "Ticket {ticket_id} is in a locked period; re-submit with override_locked_period and a reason"
            ),
        ),
        CoreError::OverrideReasonRequired => ApiError::problem(
            surface.override_code(),
            "Override reason required",
            400,
            String::from("Override reason is required for locked period applies"),
        ),
        CoreError::AlreadyApplied {
            proposal_id,
            apply_state,
        } => ApiError::problem(
            "PLANNING_ALREADY_APPLIED",
            "Already applied",
            409,
            format!("Proposal {proposal_id} is already {apply_state}"),
        ),
        CoreError::ItemNotLinked { item_id } => ApiError::problem(
            "VALIDATION_FAILED",
            "Invalid planning item",
            400,
            format!("Planning item {item_id} is not linked to a ticket"),
        ),
        CoreError::ConcurrencyConflict { entity, id } => ApiError::problem(
            "CONCURRENCY_CONFLICT",
            "Concurrent modification",
            409,
            format!("{entity} {id} was modified concurrently; re-read and retry"),
        ),
        CoreError::TradeRuleViolation { detail } => ApiError::problem(
            "VALIDATION_FAILED",
            "Trade rule violation",
            400,
            detail,
        ),
        CoreError::DomainViolation(domain) => translate_domain_error(&domain),
        CoreError::StoreFailure(store) => match store {
            fieldops::StoreError::Timeout { operation } => ApiError::problem(
                "STORE_TIMEOUT",
                "Store timeout",
                503,
                format!("Retryable store timeout: {operation}"),
            ),
            other => ApiError::internal(other.to_string()),
        },
    }
}

/// Translates a domain error into its API shape.
fn translate_domain_error(err: &DomainError) -> ApiError {
    match err {
        DomainError::InvalidSyncTransition { .. }
        | DomainError::InvalidPeriodTransition { .. }
        | DomainError::InvalidTradeTransition { .. }
        | DomainError::InvalidApplyStateTransition { .. } => ApiError::problem(
            "INVALID_TRANSITION",
            "Invalid transition",
            409,
            err.to_string(),
        ),
        other => ApiError::validation(&other.to_string()),
    }
}

/// Convenience used by tests and handlers that need conflict payloads.
pub(crate) fn conflict_infos(conflicts: &[ScheduleConflict]) -> Vec<ConflictInfo> {
    conflicts.iter().map(ConflictInfo::from_conflict).collect()
}
