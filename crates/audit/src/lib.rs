// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all
)]

use serde::{Deserialize, Serialize};

/// Represents the entity performing an action.
///
/// An actor is any identifiable entity that initiates a state change.
/// This could be an operator, a system process, or an automated trigger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    /// The unique identifier for this actor.
    pub id: String,
    /// The type of actor (e.g., "supervisor", "manager", "system").
    pub actor_type: String,
}

impl Actor {
    /// Creates a new Actor.
    ///
    /// # Arguments
    ///
    /// * `id` - The unique identifier for this actor
    /// * `actor_type` - The type of actor
    #[must_use]
    pub const fn new(id: String, actor_type: String) -> Self {
        Self { id, actor_type }
    }
}

/// Represents the reason or trigger for an action.
///
/// A cause describes why a state change was initiated, and carries the
/// request-scoped context metadata (request id, source surface).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cause {
    /// A unique identifier for this cause (e.g., request ID).
    pub id: String,
    /// A description of the cause (e.g., "planning_apply").
    pub description: String,
}

impl Cause {
    /// Creates a new Cause.
    ///
    /// # Arguments
    ///
    /// * `id` - The unique identifier for this cause
    /// * `description` - A description of what triggered this action
    #[must_use]
    pub const fn new(id: String, description: String) -> Self {
        Self { id, description }
    }
}

/// Represents the specific action performed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    /// The name of the action (e.g., "`APPLY`", "`LOCK`", "`DENY`").
    pub name: String,
    /// Optional additional details about the action.
    pub details: Option<String>,
}

impl Action {
    /// Creates a new Action.
    ///
    /// # Arguments
    ///
    /// * `name` - The name of the action
    /// * `details` - Optional additional details
    #[must_use]
    pub const fn new(name: String, details: Option<String>) -> Self {
        Self { name, details }
    }
}

/// The entity an audit record is about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRef {
    /// The entity table/type name (e.g., "`planning_board_items`").
    pub entity_type: String,
    /// The entity identifier, stringified.
    pub entity_id: String,
}

impl EntityRef {
    /// Creates a new entity reference.
    ///
    /// # Arguments
    ///
    /// * `entity_type` - The entity table/type name
    /// * `entity_id` - The entity identifier
    #[must_use]
    pub const fn new(entity_type: String, entity_id: String) -> Self {
        Self {
            entity_type,
            entity_id,
        }
    }
}

/// A snapshot of an entity's relevant state at a point in time.
///
/// Snapshots are structured JSON so operators can diff before/after
/// without parsing prose.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// The captured state.
    pub data: serde_json::Value,
}

impl Snapshot {
    /// Creates a new `Snapshot`.
    ///
    /// # Arguments
    ///
    /// * `data` - The captured state
    #[must_use]
    pub const fn new(data: serde_json::Value) -> Self {
        Self { data }
    }
}

/// An immutable audit record for one mutating operation.
///
/// Every successful mutation must produce exactly one audit record.
/// Records are immutable once created and capture:
/// - What entity was changed (entity)
/// - What action was performed (action)
/// - The state before the change (before; `None` for creations)
/// - The state after the change (after; `None` for pure deletions)
/// - Who performed the action (actor)
/// - Why it was performed (cause)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditRecord {
    /// The entity this record is about.
    pub entity: EntityRef,
    /// The action that was performed.
    pub action: Action,
    /// The state before the change.
    pub before: Option<Snapshot>,
    /// The state after the change.
    pub after: Option<Snapshot>,
    /// The actor who initiated this change.
    pub actor: Actor,
    /// The cause or reason for this change.
    pub cause: Cause,
}

impl AuditRecord {
    /// Creates a new `AuditRecord`.
    ///
    /// Once created, an audit record is immutable.
    ///
    /// # Arguments
    ///
    /// * `entity` - The entity the record is about
    /// * `action` - The action that was performed
    /// * `before` - The state before the change
    /// * `after` - The state after the change
    /// * `actor` - The actor who initiated the change
    /// * `cause` - The reason for the change
    #[must_use]
    pub const fn new(
        entity: EntityRef,
        action: Action,
        before: Option<Snapshot>,
        after: Option<Snapshot>,
        actor: Actor,
        cause: Cause,
    ) -> Self {
        Self {
            entity,
            action,
            before,
            after,
            actor,
            cause,
        }
    }
}
