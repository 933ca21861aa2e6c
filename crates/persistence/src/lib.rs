// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! SQLite persistence for the fieldops scheduling system.
//!
//! This crate implements the engine's `ScheduleStore` contract over
//! rusqlite. It is the only store this system ships: development, tests
//! and production all run on SQLite, with in-memory databases for fast,
//! deterministic testing.
//!
//! ## Concurrency model
//!
//! There is no cross-table transaction spanning an orchestrated commit;
//! the engine sequences its writes and this crate guarantees only the
//! per-row contract: every mutable row carries a `version` column, and
//! versioned updates are conditional (`WHERE version = ?`). A write that
//! matches zero rows reports `VersionConflict` (or `NotFound` when the
//! row is gone) and mutates nothing.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all,
    clippy::suspicious,
    clippy::complexity,
    clippy::perf,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(clippy::multiple_crate_versions)]

mod encode;
mod error;
mod schema;
mod store;

#[cfg(test)]
mod tests;

pub use error::PersistenceError;
pub use schema::initialize_schema;
pub use store::{NewTicket, SqliteStore};
