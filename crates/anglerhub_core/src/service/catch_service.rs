//! Catch upload use-cases: lake lookup and catch recording.
//!
//! # Responsibility
//! - List and filter lakes for the upload form.
//! - Store the catch photo and then record the catch row pointing at it.
//!
//! # Invariants
//! - An invalid draft touches neither blob storage nor the catch log.
//! - The photo blob is written before the catch row; a failed upload records
//!   nothing.

use crate::capability::storage::{BlobStore, CatchStore, StoreError};
use crate::model::catch::{Catch, CatchDraft, CatchValidationError, Lake};
use crate::model::identity::Identity;
use crate::service::blob_file_name;
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use uuid::Uuid;

/// Object-storage bucket holding catch photos.
pub const CATCH_BUCKET: &str = "catches";

pub type CatchServiceResult<T> = Result<T, CatchServiceError>;

#[derive(Debug)]
pub enum CatchServiceError {
    Invalid(CatchValidationError),
    Store(StoreError),
    /// Storing the photo failed; no catch was recorded.
    Upload(StoreError),
    InvalidFileName(String),
}

impl Display for CatchServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Invalid(err) => write!(f, "{err}"),
            Self::Store(err) => write!(f, "{err}"),
            Self::Upload(err) => write!(f, "catch photo upload failed: {err}"),
            Self::InvalidFileName(value) => write!(f, "invalid catch photo file name: `{value}`"),
        }
    }
}

impl Error for CatchServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Invalid(err) => Some(err),
            Self::Store(err) | Self::Upload(err) => Some(err),
            Self::InvalidFileName(_) => None,
        }
    }
}

impl From<CatchValidationError> for CatchServiceError {
    fn from(value: CatchValidationError) -> Self {
        Self::Invalid(value)
    }
}

impl From<StoreError> for CatchServiceError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

pub struct CatchService {
    store: Arc<dyn CatchStore>,
    blobs: Arc<dyn BlobStore>,
}

impl CatchService {
    pub fn new(store: Arc<dyn CatchStore>, blobs: Arc<dyn BlobStore>) -> Self {
        Self { store, blobs }
    }

    pub async fn list_lakes(&self) -> CatchServiceResult<Vec<Lake>> {
        Ok(self.store.list_lakes().await?)
    }

    /// Lakes whose name contains `query`, ignoring case.
    pub async fn search_lakes(&self, query: &str) -> CatchServiceResult<Vec<Lake>> {
        let mut lakes = self.list_lakes().await?;
        lakes.retain(|lake| lake.matches_search(query));
        Ok(lakes)
    }

    pub async fn catches_at(&self, lake_id: &str) -> CatchServiceResult<Vec<Catch>> {
        Ok(self.store.list_catches(lake_id).await?)
    }

    /// Uploads the draft's photo and records the catch for `angler`.
    ///
    /// The blob path is `catches/<angler id>-<uuid>-<file name>`.
    pub async fn record_catch(
        &self,
        angler: &Identity,
        draft: CatchDraft,
    ) -> CatchServiceResult<Catch> {
        draft.validate()?;
        let CatchDraft {
            lake_id,
            fish_type,
            weight_kg,
            description,
            photo,
        } = draft;
        let photo = photo.ok_or(CatchValidationError::MissingPhoto)?;
        let base_name = blob_file_name(&photo.file_name)
            .ok_or_else(|| CatchServiceError::InvalidFileName(photo.file_name.clone()))?;
        let path = catch_photo_path(&angler.id, Uuid::new_v4(), base_name);

        let image_url = match self.blobs.store_blob(CATCH_BUCKET, &path, photo.bytes).await {
            Ok(locator) => locator,
            Err(err) => {
                warn!(
                    "event=catch_upload module=catch_service status=error identity_id={} error={}",
                    angler.id, err
                );
                return Err(CatchServiceError::Upload(err));
            }
        };

        let record = Catch {
            id: Uuid::new_v4().to_string(),
            angler_id: angler.id.clone(),
            lake_id,
            description: description.trim().to_string(),
            fish_type: fish_type.trim().to_string(),
            weight_kg,
            image_url,
        };
        if let Err(err) = self.store.insert_catch(&record).await {
            warn!(
                "event=catch_record module=catch_service status=error identity_id={} orphan_blob={} error={}",
                angler.id, record.image_url, err
            );
            return Err(err.into());
        }
        info!(
            "event=catch_record module=catch_service status=ok identity_id={} lake_id={} catch_id={}",
            angler.id, record.lake_id, record.id
        );
        Ok(record)
    }
}

/// Object path for one catch photo upload.
pub fn catch_photo_path(angler_id: &str, nonce: Uuid, file_name: &str) -> String {
    format!("{CATCH_BUCKET}/{angler_id}-{nonce}-{file_name}")
}
