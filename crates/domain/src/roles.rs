// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Actor roles and the capability gate.
//!
//! Roles apply to acting operators, never to the staff directory. All
//! capability decisions go through `RoleGate`; call sites never re-derive
//! role comparisons themselves.

use crate::error::DomainError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Actor roles, least to most privileged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// Field staff. May view their own schedule and trade their own shifts.
    Cleaner,
    /// Shift supervisor. May stage and apply planning changes.
    Supervisor,
    /// Operations coordinator. May additionally publish and lock periods.
    Operations,
    /// Manager. May additionally override locked periods with a reason.
    Manager,
    /// System administrator.
    Admin,
    /// Business owner; unrestricted.
    OwnerAdmin,
}

impl Role {
    /// Returns the string representation of the role.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Cleaner => "CLEANER",
            Self::Supervisor => "SUPERVISOR",
            Self::Operations => "OPERATIONS",
            Self::Manager => "MANAGER",
            Self::Admin => "ADMIN",
            Self::OwnerAdmin => "OWNER_ADMIN",
        }
    }

    /// Privilege rank; higher outranks lower.
    #[must_use]
    pub const fn rank(&self) -> u8 {
        match self {
            Self::Cleaner => 0,
            Self::Supervisor => 1,
            Self::Operations => 2,
            Self::Manager => 3,
            Self::Admin => 4,
            Self::OwnerAdmin => 5,
        }
    }
}

impl FromStr for Role {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CLEANER" => Ok(Self::Cleaner),
            "SUPERVISOR" => Ok(Self::Supervisor),
            "OPERATIONS" => Ok(Self::Operations),
            "MANAGER" => Ok(Self::Manager),
            "ADMIN" => Ok(Self::Admin),
            "OWNER_ADMIN" => Ok(Self::OwnerAdmin),
            _ => Err(DomainError::InvalidRole(s.to_string())),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Capability checks consulted by the orchestrator and workflows.
pub struct RoleGate;

impl RoleGate {
    /// Whether any held role meets or exceeds the required role.
    #[must_use]
    pub fn is_at_least(required: Role, roles: &[Role]) -> bool {
        roles.iter().any(|role| role.rank() >= required.rank())
    }

    /// Whether the actor may stage, apply and resolve planning changes.
    #[must_use]
    pub fn can_manage_schedule(roles: &[Role]) -> bool {
        Self::is_at_least(Role::Supervisor, roles)
    }

    /// Whether the actor may publish, lock and archive schedule periods.
    #[must_use]
    pub fn can_publish_schedule(roles: &[Role]) -> bool {
        Self::is_at_least(Role::Operations, roles)
    }

    /// Whether the actor may override a locked period with a recorded reason.
    #[must_use]
    pub fn can_override_locked_period(roles: &[Role]) -> bool {
        Self::is_at_least(Role::Manager, roles)
    }

    /// Whether the actor may approve, apply or deny shift trades.
    ///
    /// Named separately from `can_manage_schedule` so trade call sites read
    /// as the capability they exercise, even though the threshold matches.
    #[must_use]
    pub fn can_approve_trade(roles: &[Role]) -> bool {
        Self::can_manage_schedule(roles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_string_round_trip() {
        let roles = [
            Role::Cleaner,
            Role::Supervisor,
            Role::Operations,
            Role::Manager,
            Role::Admin,
            Role::OwnerAdmin,
        ];
        for role in roles {
            match Role::from_str(role.as_str()) {
                Ok(parsed) => assert_eq!(role, parsed),
                Err(e) => panic!("Failed to parse role {role}: {e}"),
            }
        }
    }

    #[test]
    fn test_invalid_role_string() {
        assert!(Role::from_str("JANITOR").is_err());
    }

    #[test]
    fn test_rank_ordering() {
        assert!(Role::OwnerAdmin.rank() > Role::Manager.rank());
        assert!(Role::Manager.rank() > Role::Operations.rank());
        assert!(Role::Operations.rank() > Role::Supervisor.rank());
        assert!(Role::Supervisor.rank() > Role::Cleaner.rank());
    }

    #[test]
    fn test_manage_schedule_threshold() {
        assert!(!RoleGate::can_manage_schedule(&[Role::Cleaner]));
        assert!(RoleGate::can_manage_schedule(&[Role::Supervisor]));
        assert!(RoleGate::can_manage_schedule(&[Role::Cleaner, Role::Manager]));
    }

    #[test]
    fn test_publish_schedule_threshold() {
        assert!(!RoleGate::can_publish_schedule(&[Role::Supervisor]));
        assert!(RoleGate::can_publish_schedule(&[Role::Operations]));
        assert!(RoleGate::can_publish_schedule(&[Role::OwnerAdmin]));
    }

    #[test]
    fn test_override_locked_threshold() {
        assert!(!RoleGate::can_override_locked_period(&[Role::Supervisor]));
        assert!(!RoleGate::can_override_locked_period(&[Role::Operations]));
        assert!(RoleGate::can_override_locked_period(&[Role::Manager]));
        assert!(RoleGate::can_override_locked_period(&[Role::Admin]));
    }

    #[test]
    fn test_approve_trade_matches_manage_schedule() {
        assert!(RoleGate::can_approve_trade(&[Role::Supervisor]));
        assert!(!RoleGate::can_approve_trade(&[Role::Cleaner]));
    }

    #[test]
    fn test_empty_role_set_has_no_capabilities() {
        assert!(!RoleGate::can_manage_schedule(&[]));
        assert!(!RoleGate::can_publish_schedule(&[]));
        assert!(!RoleGate::can_override_locked_period(&[]));
    }
}
