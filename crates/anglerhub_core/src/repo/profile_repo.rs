//! SQLite-backed profile store.
//!
//! # Responsibility
//! - Implement `ProfileStore` over the local `profiles` table.
//! - Translate primary-key collisions into `StoreError::UniqueViolation`.
//!
//! # Invariants
//! - Write paths call `Profile::validate()` before SQL mutations.
//! - Insert never overwrites an existing row.
//! - Read paths reject undecodable badge payloads instead of masking them.

use crate::capability::storage::{ProfileStore, StoreError, StoreResult};
use crate::db::{open_db, open_db_in_memory, DbResult};
use crate::repo::{is_constraint, with_locked};
use crate::model::profile::{Profile, ProfilePatch};
use async_trait::async_trait;
use rusqlite::{ffi, params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::Mutex;

const PROFILE_SELECT_SQL: &str = "SELECT id, username, profile_pic, rank, badges FROM profiles";

/// Profile store over one SQLite connection.
///
/// The connection is guarded by a mutex that is never held across an
/// `.await`; every trait method runs its SQL synchronously.
pub struct SqliteProfileStore {
    conn: Mutex<Connection>,
}

impl SqliteProfileStore {
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

    /// Returns the number of stored profiles.
    pub fn count_profiles(&self) -> StoreResult<u64> {
        self.with_conn(|conn| {
            let count = conn.query_row("SELECT COUNT(*) FROM profiles", [], |row| {
                row.get::<_, i64>(0)
            })?;
            u64::try_from(count)
                .map_err(|_| StoreError::InvalidData(format!("negative profile count {count}")))
        })
    }

    fn with_conn<T>(&self, f: impl FnOnce(&Connection) -> StoreResult<T>) -> StoreResult<T> {
        with_locked(&self.conn, "profile", f)
    }

    fn read_sync(&self, id: &str) -> StoreResult<Option<Profile>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!("{PROFILE_SELECT_SQL} WHERE id = ?1"))?;
            let raw = stmt.query_row([id], RawProfileRow::from_row).optional()?;
            raw.map(RawProfileRow::into_profile).transpose()
        })
    }

    fn insert_sync(&self, profile: &Profile) -> StoreResult<()> {
        profile.validate()?;
        let badges = encode_badges(&profile.badges)?;

        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO profiles (id, username, profile_pic, rank, badges)
                 VALUES (?1, ?2, ?3, ?4, ?5);",
                params![
                    profile.id.as_str(),
                    profile.username.as_str(),
                    profile.profile_pic.as_deref(),
                    profile.rank.as_str(),
                    badges,
                ],
            )
            .map_err(|err| map_insert_error(err, &profile.id))?;
            Ok(())
        })
    }

    fn update_sync(&self, id: &str, patch: &ProfilePatch) -> StoreResult<()> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE profiles
                 SET
                    username = COALESCE(?1, username),
                    profile_pic = COALESCE(?2, profile_pic),
                    updated_at = (CAST(strftime('%s', 'now') AS INTEGER) * 1000)
                 WHERE id = ?3;",
                params![patch.username.as_deref(), patch.profile_pic.as_deref(), id],
            )?;
            if changed == 0 {
                return Err(StoreError::NotFound(id.to_string()));
            }
            Ok(())
        })
    }
}

#[async_trait]
impl ProfileStore for SqliteProfileStore {
    async fn read_profile(&self, id: &str) -> StoreResult<Option<Profile>> {
        self.read_sync(id)
    }

    async fn insert_profile(&self, profile: &Profile) -> StoreResult<()> {
        self.insert_sync(profile)
    }

    async fn update_profile(&self, id: &str, patch: &ProfilePatch) -> StoreResult<()> {
        self.update_sync(id, patch)
    }
}

struct RawProfileRow {
    id: String,
    username: String,
    profile_pic: Option<String>,
    rank: String,
    badges: String,
}

impl RawProfileRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            username: row.get("username")?,
            profile_pic: row.get("profile_pic")?,
            rank: row.get("rank")?,
            badges: row.get("badges")?,
        })
    }

    fn into_profile(self) -> StoreResult<Profile> {
        let badges = serde_json::from_str::<Vec<String>>(&self.badges).map_err(|err| {
            StoreError::InvalidData(format!(
                "invalid badges `{}` for profile {}: {err}",
                self.badges, self.id
            ))
        })?;
        Ok(Profile {
            id: self.id,
            username: self.username,
            profile_pic: self.profile_pic,
            rank: self.rank,
            badges,
        })
    }
}

fn encode_badges(badges: &[String]) -> StoreResult<String> {
    serde_json::to_string(badges)
        .map_err(|err| StoreError::InvalidData(format!("badges are not encodable: {err}")))
}

fn map_insert_error(err: rusqlite::Error, id: &str) -> StoreError {
    if is_constraint(
        &err,
        &[ffi::SQLITE_CONSTRAINT_PRIMARYKEY, ffi::SQLITE_CONSTRAINT_UNIQUE],
    ) {
        return StoreError::UniqueViolation(id.to_string());
    }
    err.into()
}
