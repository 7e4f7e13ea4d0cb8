//! Row and object storage contracts consumed by the identity core.

use crate::model::catch::{Catch, CatchValidationError, Lake};
use crate::model::identity::IdentityId;
use crate::model::profile::{Profile, ProfilePatch, ProfileValidationError};
use async_trait::async_trait;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type StoreResult<T> = Result<T, StoreError>;

/// Profile table keyed uniquely by identity id.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn read_profile(&self, id: &str) -> StoreResult<Option<Profile>>;

    /// Inserts one row. Fails with `UniqueViolation` when the id exists.
    async fn insert_profile(&self, profile: &Profile) -> StoreResult<()>;

    /// Applies a partial update. Fails with `NotFound` when the id is absent.
    async fn update_profile(&self, id: &str, patch: &ProfilePatch) -> StoreResult<()>;
}

/// Object storage that returns a retrievable locator for each stored blob.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn store_blob(&self, bucket: &str, path: &str, bytes: Vec<u8>) -> StoreResult<String>;
}

/// Lake catalogue and catch log.
#[async_trait]
pub trait CatchStore: Send + Sync {
    /// Returns all lakes ordered by name.
    async fn list_lakes(&self) -> StoreResult<Vec<Lake>>;

    /// Inserts one catch. Fails with `InvalidReference` when the lake is unknown.
    async fn insert_catch(&self, record: &Catch) -> StoreResult<()>;

    /// Returns the catches logged at one lake, newest first.
    async fn list_catches(&self, lake_id: &str) -> StoreResult<Vec<Catch>>;
}

/// Storage failures.
#[derive(Debug)]
pub enum StoreError {
    /// Transport/backend failure; the operation may succeed later.
    Unavailable(String),
    /// A row with the same primary key already exists.
    UniqueViolation(IdentityId),
    NotFound(IdentityId),
    Validation(ProfileValidationError),
    InvalidCatch(CatchValidationError),
    /// A row points at a parent row that does not exist.
    InvalidReference(String),
    /// Persisted data could not be decoded.
    InvalidData(String),
}

impl StoreError {
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, Self::UniqueViolation(_))
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unavailable(message) => write!(f, "store unavailable: {message}"),
            Self::UniqueViolation(id) => write!(f, "profile already exists: {id}"),
            Self::NotFound(id) => write!(f, "profile not found: {id}"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::InvalidCatch(err) => write!(f, "{err}"),
            Self::InvalidReference(message) => write!(f, "unknown reference: {message}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::InvalidCatch(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ProfileValidationError> for StoreError {
    fn from(value: ProfileValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<CatchValidationError> for StoreError {
    fn from(value: CatchValidationError) -> Self {
        Self::InvalidCatch(value)
    }
}
