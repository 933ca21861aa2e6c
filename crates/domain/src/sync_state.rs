// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Planning-item sync state tracking and transition logic.
//!
//! The sync state describes whether a planning item's draft has been
//! committed to, conflicts with, or has drifted from the live schedule.
//! The machine enforces only the lifecycle graph; the reasons for a
//! transition live in the apply orchestrator.

use crate::error::DomainError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Sync states for a planning board item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncState {
    /// Item mirrors the live schedule; no draft change staged.
    Synced,
    /// A proposal is staged but not yet committed.
    DraftChange,
    /// The staged proposal has been committed to the live schedule.
    Applied,
    /// The item has diverged from the live schedule.
    Conflict,
    /// The item was resolved in favor of the live schedule and is inert.
    Dismissed,
}

impl SyncState {
    /// Returns the string representation of the state.
    ///
    /// This is used for persistence and API serialization.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Synced => "synced",
            Self::DraftChange => "draft_change",
            Self::Applied => "applied",
            Self::Conflict => "conflict",
            Self::Dismissed => "dismissed",
        }
    }

    /// Checks if a transition from this state to another is permitted.
    ///
    /// No transition is self-looping.
    #[must_use]
    pub const fn can_transition_to(&self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Synced, Self::DraftChange | Self::Conflict)
                | (
                    Self::DraftChange,
                    Self::Applied | Self::Conflict | Self::Synced | Self::Dismissed
                )
                | (Self::Applied, Self::Synced | Self::Conflict)
                | (
                    Self::Conflict,
                    Self::DraftChange | Self::Dismissed | Self::Synced
                )
                | (Self::Dismissed, Self::DraftChange | Self::Synced)
        )
    }

    /// Validates a transition from this state to another.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidSyncTransition` if the transition is not
    /// in the lifecycle graph. Callers must not coerce an illegal pair.
    pub const fn validate_transition(&self, target: Self) -> Result<(), DomainError> {
        if self.can_transition_to(target) {
            Ok(())
        } else {
            Err(DomainError::InvalidSyncTransition {
                from: *self,
                to: target,
            })
        }
    }

    /// All states, in a stable order. Used by exhaustive tests.
    #[must_use]
    pub const fn all() -> [Self; 5] {
        [
            Self::Synced,
            Self::DraftChange,
            Self::Applied,
            Self::Conflict,
            Self::Dismissed,
        ]
    }
}

impl FromStr for SyncState {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "synced" => Ok(Self::Synced),
            "draft_change" => Ok(Self::DraftChange),
            "applied" => Ok(Self::Applied),
            "conflict" => Ok(Self::Conflict),
            "dismissed" => Ok(Self::Dismissed),
            _ => Err(DomainError::InvalidSyncState(s.to_string())),
        }
    }
}

impl std::fmt::Display for SyncState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
