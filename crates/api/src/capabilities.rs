// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Capability computation for authorization-aware UI gating.
//!
//! Capabilities expose what actions an operator is permitted to perform
//! without leaking domain internals. They are advisory only and do not
//! replace the checks run by the engine itself.

use crate::auth::AuthenticatedActor;
use crate::request_response::{Capability, ScheduleCapabilities};
use fieldops_domain::RoleGate;

/// Computes schedule capabilities for an authenticated operator.
///
/// Each flag mirrors one named capability of the role gate; the engine
/// re-checks the same gate before every mutation, so a stale or forged
/// capability set can never authorize anything by itself.
#[must_use]
pub fn compute_schedule_capabilities(actor: &AuthenticatedActor) -> ScheduleCapabilities {
    ScheduleCapabilities {
        can_manage_schedule: Capability::from_bool(RoleGate::can_manage_schedule(&actor.roles)),
        can_publish_schedule: Capability::from_bool(RoleGate::can_publish_schedule(&actor.roles)),
        can_override_locked_period: Capability::from_bool(RoleGate::can_override_locked_period(
            &actor.roles,
        )),
        can_approve_trade: Capability::from_bool(RoleGate::can_approve_trade(&actor.roles)),
    }
}
