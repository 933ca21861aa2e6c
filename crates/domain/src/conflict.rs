// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Schedule conflict classification.
//!
//! Conflicts are produced by the conflict detector and consumed by the
//! apply orchestrator and the trade workflow. The detector returns the
//! full classified list; policy decisions happen upstream.

use crate::error::DomainError;
use crate::types::{StaffId, TicketId};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// The kind of clash a conflict describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictType {
    /// The ticket belongs to a locked schedule period.
    LockedPeriod,
    /// The assignee already has a ticket in (or too close to) the window.
    DoubleBooking,
    /// An availability rule marks the assignee unavailable.
    Unavailable,
    /// The ticket requires a certification the assignee does not hold.
    CertificationMissing,
    /// An availability rule marks the window as not preferred.
    NotPreferred,
}

impl ConflictType {
    /// Returns the string representation of the conflict type.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::LockedPeriod => "locked_period",
            Self::DoubleBooking => "double_booking",
            Self::Unavailable => "unavailable",
            Self::CertificationMissing => "certification_missing",
            Self::NotPreferred => "not_preferred",
        }
    }

    /// Ordering priority. Lower sorts first.
    #[must_use]
    pub const fn priority(&self) -> u8 {
        match self {
            Self::LockedPeriod => 0,
            Self::DoubleBooking => 1,
            Self::Unavailable => 2,
            Self::CertificationMissing => 3,
            Self::NotPreferred => 4,
        }
    }
}

impl FromStr for ConflictType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "locked_period" => Ok(Self::LockedPeriod),
            "double_booking" => Ok(Self::DoubleBooking),
            "unavailable" => Ok(Self::Unavailable),
            "certification_missing" => Ok(Self::CertificationMissing),
            "not_preferred" => Ok(Self::NotPreferred),
            _ => Err(DomainError::InvalidConflictType(s.to_string())),
        }
    }
}

impl std::fmt::Display for ConflictType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How a conflict affects the apply decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Prevents commit unless explicitly overridden by a privileged actor.
    Blocking,
    /// Requires explicit acknowledgment but does not block commit.
    Warning,
}

impl Severity {
    /// Returns the string representation of the severity.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Blocking => "blocking",
            Self::Warning => "warning",
        }
    }

    /// Returns true for blocking severity.
    #[must_use]
    pub const fn is_blocking(&self) -> bool {
        matches!(self, Self::Blocking)
    }
}

impl FromStr for Severity {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "blocking" => Ok(Self::Blocking),
            "warning" => Ok(Self::Warning),
            _ => Err(DomainError::InvalidSeverity(s.to_string())),
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A detected clash between a proposed assignment and the live schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleConflict {
    /// The kind of clash.
    pub conflict_type: ConflictType,
    /// Blocking or warning.
    pub severity: Severity,
    /// Human-readable description.
    pub message: String,
    /// The ticket the conflict is about.
    pub ticket_id: TicketId,
    /// The staff member affected, when the clash is staff-scoped.
    pub staff_id: Option<StaffId>,
}

impl ScheduleConflict {
    /// Deterministic identity used for warning acknowledgment.
    ///
    /// The key is stable across repeated detector runs on the same
    /// schedule snapshot, which keeps the acknowledgment round-trip
    /// idempotent.
    #[must_use]
    pub fn key(&self) -> String {
        match self.staff_id {
            Some(staff) => format!("{}:{}:{}", self.conflict_type, self.ticket_id, staff),
            None => format!("{}:{}:-", self.conflict_type, self.ticket_id),
        }
    }

    /// Returns true for blocking conflicts.
    #[must_use]
    pub const fn is_blocking(&self) -> bool {
        self.severity.is_blocking()
    }
}

/// Sorts conflicts into the canonical deterministic order.
///
/// Ordering is by conflict-type priority, then ticket id, then staff id.
/// Detector output must be identical across repeated calls with the same
/// inputs; this ordering is part of that contract.
pub fn sort_conflicts(conflicts: &mut [ScheduleConflict]) {
    conflicts.sort_by_key(|c| {
        (
            c.conflict_type.priority(),
            c.ticket_id,
            c.staff_id.map_or(i64::MIN, |s| s.value()),
        )
    });
}
