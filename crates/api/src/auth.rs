// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Authenticated actor types.
//!
//! Authentication itself happens outside this system; requests arrive
//! carrying the acting operator's identity and roles. This module turns
//! those raw fields into a typed actor and an explicit request context.

use crate::error::ApiError;
use fieldops::RequestContext;
use fieldops_domain::{Role, StaffId};
use std::str::FromStr;
use time::OffsetDateTime;

/// An authenticated operator with resolved roles.
///
/// Roles apply to acting operators; the staff link is present when the
/// operator is also a field staff member (self-service trade and
/// availability actions compare against it).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedActor {
    /// The unique identifier for this actor.
    pub id: String,
    /// The roles held by this actor.
    pub roles: Vec<Role>,
    /// The staff record this actor corresponds to, if any.
    pub staff_id: Option<StaffId>,
}

impl AuthenticatedActor {
    /// Creates a new authenticated actor.
    #[must_use]
    pub const fn new(id: String, roles: Vec<Role>, staff_id: Option<StaffId>) -> Self {
        Self {
            id,
            roles,
            staff_id,
        }
    }

    /// Resolves raw actor fields from a request.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` with code `VALIDATION_FAILED` if the actor id
    /// is blank or any role string is unknown.
    pub fn from_request(
        actor_id: &str,
        roles: &[String],
        staff_id: Option<i64>,
    ) -> Result<Self, ApiError> {
        if actor_id.trim().is_empty() {
            return Err(ApiError::validation("actor_id cannot be empty"));
        }
        let mut resolved: Vec<Role> = Vec::with_capacity(roles.len());
        for role in roles {
            let role: Role = Role::from_str(role)
                .map_err(|e| ApiError::validation(&format!("Invalid role: {e}")))?;
            resolved.push(role);
        }
        Ok(Self::new(
            actor_id.to_string(),
            resolved,
            staff_id.map(StaffId::new),
        ))
    }

    /// Builds the explicit per-request context the engine runs under.
    #[must_use]
    pub fn into_context(self, request_id: &str, now: OffsetDateTime) -> RequestContext {
        RequestContext::new(
            self.id,
            self.roles,
            self.staff_id,
            request_id.to_string(),
            now,
        )
    }
}
