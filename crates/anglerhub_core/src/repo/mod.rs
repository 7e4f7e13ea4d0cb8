//! Local persistence implementations of the storage capabilities.
//!
//! # Responsibility
//! - Keep SQL details inside the core persistence boundary.
//! - Enforce the one-row-per-identity invariant with the table's primary key.
//! - Enforce that every catch references a known lake.
//!
//! # Invariants
//! - Connection mutexes are held only for synchronous SQL, never across `.await`.

use crate::capability::storage::{StoreError, StoreResult};
use crate::db::DbError;
use rusqlite::{Connection, ErrorCode};
use std::sync::Mutex;

pub mod catch_repo;
pub mod profile_repo;

fn with_locked<T>(
    conn: &Mutex<Connection>,
    label: &str,
    f: impl FnOnce(&Connection) -> StoreResult<T>,
) -> StoreResult<T> {
    let conn = conn
        .lock()
        .map_err(|_| StoreError::Unavailable(format!("{label} connection lock poisoned")))?;
    f(&conn)
}

/// True when `err` is a constraint failure with one of the extended codes.
fn is_constraint(err: &rusqlite::Error, extended_codes: &[std::os::raw::c_int]) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(failure, _) => {
            failure.code == ErrorCode::ConstraintViolation
                && extended_codes.contains(&failure.extended_code)
        }
        _ => false,
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Unavailable(value.to_string())
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Unavailable(value.to_string())
    }
}
