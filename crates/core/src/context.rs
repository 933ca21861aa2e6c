// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Request-scoped operation context.
//!
//! The acting operator, their roles and the request clock are passed
//! explicitly into every operation. There is no ambient tenant or user
//! state anywhere in the core.

use fieldops_audit::{Actor, Cause};
use fieldops_domain::{Role, StaffId};
use time::OffsetDateTime;

/// The context a single request-scoped operation runs under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    /// The acting operator's identifier.
    pub actor_id: String,
    /// Roles held by the acting operator.
    pub roles: Vec<Role>,
    /// The staff record the operator corresponds to, if any.
    ///
    /// Participant-gated trade and availability actions compare against
    /// this.
    pub staff_id: Option<StaffId>,
    /// Correlation identifier for the request.
    pub request_id: String,
    /// The wall clock captured at request entry.
    pub now: OffsetDateTime,
}

impl RequestContext {
    /// Creates a new request context.
    #[must_use]
    pub const fn new(
        actor_id: String,
        roles: Vec<Role>,
        staff_id: Option<StaffId>,
        request_id: String,
        now: OffsetDateTime,
    ) -> Self {
        Self {
            actor_id,
            roles,
            staff_id,
            request_id,
            now,
        }
    }

    /// The audit actor for this context.
    ///
    /// The actor type is the most privileged held role, lowercased.
    #[must_use]
    pub fn audit_actor(&self) -> Actor {
        let actor_type: String = self
            .roles
            .iter()
            .max()
            .map_or_else(|| String::from("unknown"), |r| r.as_str().to_lowercase());
        Actor::new(self.actor_id.clone(), actor_type)
    }

    /// The audit cause for one operation under this context.
    ///
    /// # Arguments
    ///
    /// * `operation` - The operation tag, e.g. "`planning_apply`"
    #[must_use]
    pub fn audit_cause(&self, operation: &str) -> Cause {
        Cause::new(self.request_id.clone(), operation.to_string())
    }

    /// Whether this context acts as the given staff member.
    #[must_use]
    pub fn is_staff(&self, staff_id: StaffId) -> bool {
        self.staff_id == Some(staff_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(roles: Vec<Role>) -> RequestContext {
        RequestContext::new(
            String::from("op-17"),
            roles,
            Some(StaffId::new(4)),
            String::from("req-1"),
            OffsetDateTime::UNIX_EPOCH,
        )
    }

    #[test]
    fn test_audit_actor_uses_highest_role() {
        let ctx = context(vec![Role::Cleaner, Role::Manager, Role::Supervisor]);
        let actor = ctx.audit_actor();
        assert_eq!(actor.id, "op-17");
        assert_eq!(actor.actor_type, "manager");
    }

    #[test]
    fn test_audit_actor_with_no_roles() {
        let ctx = context(vec![]);
        assert_eq!(ctx.audit_actor().actor_type, "unknown");
    }

    #[test]
    fn test_audit_cause_carries_request_id() {
        let ctx = context(vec![Role::Supervisor]);
        let cause = ctx.audit_cause("planning_apply");
        assert_eq!(cause.id, "req-1");
        assert_eq!(cause.description, "planning_apply");
    }

    #[test]
    fn test_is_staff() {
        let ctx = context(vec![Role::Cleaner]);
        assert!(ctx.is_staff(StaffId::new(4)));
        assert!(!ctx.is_staff(StaffId::new(5)));
    }
}
