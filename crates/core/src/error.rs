// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use fieldops_domain::{DomainError, ItemId, ProposalId, ScheduleConflict, TicketId};

/// Errors surfaced by the repository contracts.
///
/// Store implementations translate their backend failures into these
/// variants; the orchestrator branches on them without knowing the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The requested row does not exist or is archived.
    NotFound {
        /// The entity type.
        entity: &'static str,
        /// The entity identifier, stringified.
        id: String,
    },
    /// A conditional write matched zero rows: the stored version changed
    /// since it was read.
    VersionConflict {
        /// The entity type.
        entity: &'static str,
        /// The entity identifier, stringified.
        id: String,
    },
    /// A store call exceeded its bounded timeout. Retryable by the caller.
    Timeout {
        /// The operation that timed out.
        operation: String,
    },
    /// Any other backend failure, with the original message preserved.
    Backend(String),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound { entity, id } => write!(f, "{entity} {id} not found"),
            Self::VersionConflict { entity, id } => {
                write!(f, "Version conflict writing {entity} {id}")
            }
            Self::Timeout { operation } => write!(f, "Store operation timed out: {operation}"),
            Self::Backend(msg) => write!(f, "Store backend error: {msg}"),
        }
    }
}

impl std::error::Error for StoreError {}

/// Errors that can occur during orchestrated operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// The actor lacks the capability for this operation.
    ///
    /// Raised before any read of mutable state.
    Forbidden {
        /// The operation that was attempted.
        action: &'static str,
        /// The minimum role required.
        required: &'static str,
    },
    /// A referenced entity is absent or archived.
    NotFound {
        /// The entity type.
        entity: &'static str,
        /// The entity identifier, stringified.
        id: String,
    },
    /// One or more non-overridable blocking conflicts. No write occurred.
    ApplyBlocked {
        /// The full blocking conflict list, in detector order.
        blocking: Vec<ScheduleConflict>,
    },
    /// Warning conflicts are present and not all acknowledged.
    AckRequired {
        /// Keys of the warnings still requiring acknowledgment.
        warning_keys: Vec<String>,
    },
    /// The only blocking conflicts are the locked period and the caller is
    /// privileged; re-submit with the override flag and a reason.
    OverrideRequired {
        /// The ticket in the locked period.
        ticket_id: TicketId,
    },
    /// The override flag was set without a non-empty reason.
    OverrideReasonRequired,
    /// The proposal has already reached a terminal apply state.
    AlreadyApplied {
        /// The proposal.
        proposal_id: ProposalId,
        /// Its terminal apply state, stringified.
        apply_state: &'static str,
    },
    /// The planning item has no linked work ticket to apply against.
    ItemNotLinked {
        /// The item.
        item_id: ItemId,
    },
    /// The primary versioned write lost a race. The caller must re-read
    /// and re-decide; the classification may have changed.
    ConcurrencyConflict {
        /// The entity type.
        entity: &'static str,
        /// The entity identifier, stringified.
        id: String,
    },
    /// A trade request violates a trade rule.
    TradeRuleViolation {
        /// What was violated.
        detail: String,
    },
    /// A domain rule or state-machine edge was violated.
    DomainViolation(DomainError),
    /// A store failure that is not a version conflict or missing row.
    StoreFailure(StoreError),
}

impl std::fmt::Display for CoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Forbidden { action, required } => {
                write!(f, "Forbidden: '{action}' requires {required} or above")
            }
            Self::NotFound { entity, id } => write!(f, "{entity} {id} not found"),
            Self::ApplyBlocked { blocking } => {
                write!(f, "Apply blocked by {} blocking conflict(s)", blocking.len())
            }
            Self::AckRequired { warning_keys } => {
                write!(
                    f,
                    "{} warning conflict(s) require acknowledgment",
                    warning_keys.len()
                )
            }
            Self::OverrideRequired { ticket_id } => {
                write!(
                    f,
                    "Ticket {ticket_id} is in a locked period; re-submit with the override flag and a reason"
                )
            }
            Self::OverrideReasonRequired => {
                write!(f, "Override reason is required for locked-period applies")
            }
            Self::AlreadyApplied {
                proposal_id,
                apply_state,
            } => {
                write!(f, "Proposal {proposal_id} is already {apply_state}")
            }
            Self::ItemNotLinked { item_id } => {
                write!(f, "Planning item {item_id} is not linked to a ticket")
            }
            Self::ConcurrencyConflict { entity, id } => {
                write!(
                    f,
                    "Concurrent modification of {entity} {id}; re-read and retry"
                )
            }
            Self::TradeRuleViolation { detail } => write!(f, "Trade rule violation: {detail}"),
            Self::DomainViolation(err) => write!(f, "Domain violation: {err}"),
            Self::StoreFailure(err) => write!(f, "Store failure: {err}"),
        }
    }
}

impl std::error::Error for CoreError {}

impl From<DomainError> for CoreError {
    fn from(err: DomainError) -> Self {
        Self::DomainViolation(err)
    }
}

impl From<StoreError> for CoreError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { entity, id } => Self::NotFound { entity, id },
            StoreError::VersionConflict { entity, id } => Self::ConcurrencyConflict { entity, id },
            other => Self::StoreFailure(other),
        }
    }
}
