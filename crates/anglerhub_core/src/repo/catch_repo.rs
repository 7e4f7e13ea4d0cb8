//! SQLite-backed lake catalogue and catch log.
//!
//! # Responsibility
//! - Implement `CatchStore` over the local `lakes` and `catches` tables.
//! - Translate a dangling lake reference into `StoreError::InvalidReference`.
//!
//! # Invariants
//! - Write paths call `Catch::validate()` before SQL mutations.
//! - Lakes are listed by name; catches newest first.

use crate::capability::storage::{CatchStore, StoreError, StoreResult};
use crate::db::{open_db, open_db_in_memory, DbResult};
use crate::model::catch::{Catch, Lake};
use crate::repo::{is_constraint, with_locked};
use async_trait::async_trait;
use rusqlite::{ffi, params, Connection, Row};
use std::path::Path;
use std::sync::Mutex;

pub struct SqliteCatchStore {
    conn: Mutex<Connection>,
}

impl SqliteCatchStore {
    /// Wraps an already migrated connection.
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    pub fn open(path: impl AsRef<Path>) -> DbResult<Self> {
        open_db(path).map(Self::new)
    }

    pub fn open_in_memory() -> DbResult<Self> {
        open_db_in_memory().map(Self::new)
    }

    /// Adds a lake to the catalogue, or renames it when the id exists.
    pub fn upsert_lake(&self, lake: &Lake) -> StoreResult<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO lakes (id, name) VALUES (?1, ?2)
                 ON CONFLICT(id) DO UPDATE SET name = excluded.name;",
                params![lake.id.as_str(), lake.name.trim()],
            )?;
            Ok(())
        })
    }

    fn with_conn<T>(&self, f: impl FnOnce(&Connection) -> StoreResult<T>) -> StoreResult<T> {
        with_locked(&self.conn, "catch", f)
    }

    fn list_lakes_sync(&self) -> StoreResult<Vec<Lake>> {
        self.with_conn(|conn| {
            let mut stmt =
                conn.prepare("SELECT id, name FROM lakes ORDER BY name COLLATE NOCASE, id;")?;
            let lakes = stmt
                .query_map([], |row| {
                    Ok(Lake::new(
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                    ))
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(lakes)
        })
    }

    fn insert_sync(&self, record: &Catch) -> StoreResult<()> {
        record.validate()?;

        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO catches (id, angler_id, lake_id, description, fish_type, weight_kg, image_url)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
                params![
                    record.id.as_str(),
                    record.angler_id.as_str(),
                    record.lake_id.as_str(),
                    record.description.as_str(),
                    record.fish_type.trim(),
                    record.weight_kg,
                    record.image_url.as_str(),
                ],
            )
            .map_err(|err| map_insert_error(err, record))?;
            Ok(())
        })
    }

    fn list_catches_sync(&self, lake_id: &str) -> StoreResult<Vec<Catch>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, angler_id, lake_id, description, fish_type, weight_kg, image_url
                 FROM catches
                 WHERE lake_id = ?1
                 ORDER BY created_at DESC, rowid DESC;",
            )?;
            let catches = stmt
                .query_map([lake_id], catch_from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(catches)
        })
    }
}

#[async_trait]
impl CatchStore for SqliteCatchStore {
    async fn list_lakes(&self) -> StoreResult<Vec<Lake>> {
        self.list_lakes_sync()
    }

    async fn insert_catch(&self, record: &Catch) -> StoreResult<()> {
        self.insert_sync(record)
    }

    async fn list_catches(&self, lake_id: &str) -> StoreResult<Vec<Catch>> {
        self.list_catches_sync(lake_id)
    }
}

fn catch_from_row(row: &Row<'_>) -> rusqlite::Result<Catch> {
    Ok(Catch {
        id: row.get("id")?,
        angler_id: row.get("angler_id")?,
        lake_id: row.get("lake_id")?,
        description: row.get("description")?,
        fish_type: row.get("fish_type")?,
        weight_kg: row.get("weight_kg")?,
        image_url: row.get("image_url")?,
    })
}

fn map_insert_error(err: rusqlite::Error, record: &Catch) -> StoreError {
    if is_constraint(&err, &[ffi::SQLITE_CONSTRAINT_FOREIGNKEY]) {
        return StoreError::InvalidReference(format!("lake {}", record.lake_id));
    }
    err.into()
}
