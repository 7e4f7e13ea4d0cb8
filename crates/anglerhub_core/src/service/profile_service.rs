//! Profile page use-cases: load, rename, and avatar upload.
//!
//! # Responsibility
//! - Read the signed-in user's profile for display.
//! - Apply username and profile-picture edits.
//!
//! # Invariants
//! - Every call first awaits `ProfileProvisioner::ensure` for the identity, so
//!   edits are ordered after the default-row insert. Provisioning only
//!   inserts, so it can never overwrite an edit that landed first.
//! - Avatar blobs are written before the profile points at them.

use crate::capability::storage::{BlobStore, ProfileStore, StoreError};
use crate::model::identity::{Identity, IdentityId};
use crate::model::profile::{Profile, ProfilePatch};
use crate::service::blob_file_name;
use crate::service::provisioner::{ProfileProvisioner, ProvisionError};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use uuid::Uuid;

/// Object-storage bucket holding profile pictures.
pub const AVATAR_BUCKET: &str = "avatars";

pub type ProfileServiceResult<T> = Result<T, ProfileServiceError>;

#[derive(Debug)]
pub enum ProfileServiceError {
    Provision(ProvisionError),
    Store(StoreError),
    /// Storing the avatar blob failed; the profile was not touched.
    Upload(StoreError),
    /// The row vanished between the write and the read-back.
    Missing(IdentityId),
    InvalidFileName(String),
}

impl Display for ProfileServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Provision(err) => write!(f, "{err}"),
            Self::Store(err) => write!(f, "{err}"),
            Self::Upload(err) => write!(f, "avatar upload failed: {err}"),
            Self::Missing(id) => write!(f, "profile missing after provisioning: {id}"),
            Self::InvalidFileName(value) => write!(f, "invalid avatar file name: `{value}`"),
        }
    }
}

impl Error for ProfileServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Provision(err) => Some(err),
            Self::Store(err) | Self::Upload(err) => Some(err),
            Self::Missing(_) | Self::InvalidFileName(_) => None,
        }
    }
}

impl From<ProvisionError> for ProfileServiceError {
    fn from(value: ProvisionError) -> Self {
        Self::Provision(value)
    }
}

impl From<StoreError> for ProfileServiceError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

pub struct ProfileService {
    store: Arc<dyn ProfileStore>,
    blobs: Arc<dyn BlobStore>,
    provisioner: ProfileProvisioner,
}

impl ProfileService {
    pub fn new(store: Arc<dyn ProfileStore>, blobs: Arc<dyn BlobStore>) -> Self {
        let provisioner = ProfileProvisioner::new(Arc::clone(&store));
        Self {
            store,
            blobs,
            provisioner,
        }
    }

    /// Loads the profile, provisioning the default row when missing.
    pub async fn load(&self, identity: &Identity) -> ProfileServiceResult<Profile> {
        self.provisioner.ensure(identity).await?;
        self.read_back(identity).await
    }

    /// Replaces the username and returns the stored profile.
    pub async fn update_username(
        &self,
        identity: &Identity,
        username: &str,
    ) -> ProfileServiceResult<Profile> {
        self.apply_patch(identity, ProfilePatch::username(username.trim()))
            .await
    }

    /// Uploads an avatar and points the profile at its locator.
    ///
    /// The blob path is `avatars/<id>-<uuid>-<file name>`; only the last path
    /// component of `file_name` is kept.
    pub async fn upload_profile_picture(
        &self,
        identity: &Identity,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> ProfileServiceResult<Profile> {
        let base_name = blob_file_name(file_name)
            .ok_or_else(|| ProfileServiceError::InvalidFileName(file_name.to_string()))?;
        let path = avatar_path(&identity.id, Uuid::new_v4(), base_name);

        let locator = match self.blobs.store_blob(AVATAR_BUCKET, &path, bytes).await {
            Ok(locator) => locator,
            Err(err) => {
                warn!(
                    "event=avatar_upload module=profile_service status=error identity_id={} error={}",
                    identity.id, err
                );
                return Err(ProfileServiceError::Upload(err));
            }
        };
        info!(
            "event=avatar_upload module=profile_service status=ok identity_id={}",
            identity.id
        );

        self.apply_patch(identity, ProfilePatch::profile_pic(locator))
            .await
    }

    async fn apply_patch(
        &self,
        identity: &Identity,
        patch: ProfilePatch,
    ) -> ProfileServiceResult<Profile> {
        self.provisioner.ensure(identity).await?;
        self.store.update_profile(&identity.id, &patch).await?;
        self.read_back(identity).await
    }

    async fn read_back(&self, identity: &Identity) -> ProfileServiceResult<Profile> {
        self.store
            .read_profile(&identity.id)
            .await?
            .ok_or_else(|| ProfileServiceError::Missing(identity.id.clone()))
    }
}

/// Object path for one avatar upload.
pub fn avatar_path(identity_id: &str, nonce: Uuid, file_name: &str) -> String {
    format!("{AVATAR_BUCKET}/{identity_id}-{nonce}-{file_name}")
}
