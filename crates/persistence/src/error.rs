// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use fieldops::StoreError;

/// Errors raised while opening or preparing a database.
///
/// Operational errors after initialization surface as
/// [`fieldops::StoreError`] through the store trait.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistenceError {
    /// The database file could not be opened.
    OpenFailed(String),
    /// Schema initialization failed.
    SchemaFailed(String),
}

impl std::fmt::Display for PersistenceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OpenFailed(msg) => write!(f, "Failed to open database: {msg}"),
            Self::SchemaFailed(msg) => write!(f, "Failed to initialize schema: {msg}"),
        }
    }
}

impl std::error::Error for PersistenceError {}

/// Translates a rusqlite error into a store error.
///
/// Busy/locked failures become `Timeout` so the orchestrator can surface
/// them as retryable; everything else is an opaque backend failure.
pub(crate) fn db_err(err: &rusqlite::Error) -> StoreError {
    match err {
        rusqlite::Error::SqliteFailure(code, _)
            if code.code == rusqlite::ErrorCode::DatabaseBusy
                || code.code == rusqlite::ErrorCode::DatabaseLocked =>
        {
            StoreError::Timeout {
                operation: err.to_string(),
            }
        }
        other => StoreError::Backend(other.to_string()),
    }
}
