// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Shift-trade lifecycle and transition logic.
//!
//! Trades are staff-initiated; manager-gated transitions re-run conflict
//! detection before they succeed. The machine itself only enforces the
//! lifecycle graph.

use crate::error::DomainError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Lifecycle states for a shift-trade request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeStatus {
    /// Initiator has requested the trade; awaiting the target staff member.
    Requested,
    /// Target staff member has accepted; awaiting a manager.
    Accepted,
    /// Manager has approved; awaiting the schedule write.
    Approved,
    /// The reassignment has been committed to the live schedule.
    Applied,
    /// A manager denied the trade.
    Denied,
    /// The initiator withdrew the request.
    Canceled,
}

impl TradeStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Requested => "requested",
            Self::Accepted => "accepted",
            Self::Approved => "approved",
            Self::Applied => "applied",
            Self::Denied => "denied",
            Self::Canceled => "canceled",
        }
    }

    /// Returns true if this status is terminal.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Applied | Self::Denied | Self::Canceled)
    }

    /// Checks if a transition from this status to another is valid.
    ///
    /// Valid transitions are:
    /// - `requested` → `accepted` | `denied` | `canceled`
    /// - `accepted` → `approved` | `applied`
    /// - `approved` → `applied`
    #[must_use]
    pub const fn can_transition_to(&self, target: Self) -> bool {
        matches!(
            (self, target),
            (
                Self::Requested,
                Self::Accepted | Self::Denied | Self::Canceled
            ) | (Self::Accepted, Self::Approved | Self::Applied)
                | (Self::Approved, Self::Applied)
        )
    }

    /// Validates a transition from this status to another.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidTradeTransition` if the transition is
    /// not permitted.
    pub const fn validate_transition(&self, target: Self) -> Result<(), DomainError> {
        if self.can_transition_to(target) {
            Ok(())
        } else {
            Err(DomainError::InvalidTradeTransition {
                from: *self,
                to: target,
            })
        }
    }

    /// All statuses, in a stable order. Used by exhaustive tests.
    #[must_use]
    pub const fn all() -> [Self; 6] {
        [
            Self::Requested,
            Self::Accepted,
            Self::Approved,
            Self::Applied,
            Self::Denied,
            Self::Canceled,
        ]
    }
}

impl FromStr for TradeStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "requested" => Ok(Self::Requested),
            "accepted" => Ok(Self::Accepted),
            "approved" => Ok(Self::Approved),
            "applied" => Ok(Self::Applied),
            "denied" => Ok(Self::Denied),
            "canceled" => Ok(Self::Canceled),
            _ => Err(DomainError::InvalidTradeStatus(s.to_string())),
        }
    }
}

impl std::fmt::Display for TradeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The kind of reassignment a trade requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeRequestType {
    /// The initiator gives the shift to the target staff member.
    GiveAway,
    /// The initiator and target swap shifts.
    Swap,
}

impl TradeRequestType {
    /// Returns the string representation of the request type.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::GiveAway => "give_away",
            Self::Swap => "swap",
        }
    }
}

impl FromStr for TradeRequestType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "give_away" => Ok(Self::GiveAway),
            "swap" => Ok(Self::Swap),
            _ => Err(DomainError::InvalidTradeRequestType(s.to_string())),
        }
    }
}

impl std::fmt::Display for TradeRequestType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
