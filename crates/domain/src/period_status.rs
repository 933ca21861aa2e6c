// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Schedule-period lifecycle and transition logic.
//!
//! Periods only move toward stricter states. There is no un-publish and
//! no un-lock; the only path back to mutability is a new period, which
//! keeps published history tamper-evident.

use crate::error::DomainError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Lifecycle states for a schedule period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PeriodStatus {
    /// Initial state after creation. Assignments freely editable.
    #[default]
    Draft,
    /// Visible to staff. Assignment changes still permitted.
    Published,
    /// Assignment changes require an explicit recorded override.
    Locked,
    /// Terminal. The period is historical and read-only.
    Archived,
}

impl PeriodStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "DRAFT",
            Self::Published => "PUBLISHED",
            Self::Locked => "LOCKED",
            Self::Archived => "ARCHIVED",
        }
    }

    /// Returns true if this status is terminal.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Archived)
    }

    /// Checks if a transition from this status to another is valid.
    ///
    /// Valid transitions are:
    /// - `DRAFT` → `PUBLISHED` | `ARCHIVED`
    /// - `PUBLISHED` → `LOCKED` | `ARCHIVED`
    /// - `LOCKED` → `ARCHIVED`
    #[must_use]
    pub const fn can_transition_to(&self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Draft, Self::Published | Self::Archived)
                | (Self::Published, Self::Locked | Self::Archived)
                | (Self::Locked, Self::Archived)
        )
    }

    /// Validates a transition from this status to another.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidPeriodTransition` if the transition is
    /// not permitted.
    pub const fn validate_transition(&self, target: Self) -> Result<(), DomainError> {
        if self.can_transition_to(target) {
            Ok(())
        } else {
            Err(DomainError::InvalidPeriodTransition {
                from: *self,
                to: target,
            })
        }
    }

    /// All statuses, in lifecycle order. Used by exhaustive tests.
    #[must_use]
    pub const fn all() -> [Self; 4] {
        [Self::Draft, Self::Published, Self::Locked, Self::Archived]
    }
}

impl FromStr for PeriodStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DRAFT" => Ok(Self::Draft),
            "PUBLISHED" => Ok(Self::Published),
            "LOCKED" => Ok(Self::Locked),
            "ARCHIVED" => Ok(Self::Archived),
            _ => Err(DomainError::InvalidPeriodStatus(s.to_string())),
        }
    }
}

impl std::fmt::Display for PeriodStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
