//! Profile provisioning for authenticated identities.
//!
//! # Responsibility
//! - Guarantee exactly one profile row per identity id, created lazily.
//!
//! # Invariants
//! - `ensure` never writes when a row already exists.
//! - The store's uniqueness constraint is the final arbiter; the read before
//!   the insert only skips a write, it never proves the insert is race-free.
//! - A `UniqueViolation` on insert is a successful outcome and is never
//!   surfaced to callers.

use crate::capability::storage::{ProfileStore, StoreError};
use crate::model::identity::Identity;
use crate::model::profile::Profile;
use log::{debug, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// Successful provisioning outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvisionOutcome {
    /// A row already existed; nothing was written.
    AlreadyProvisioned,
    /// This call inserted the default row.
    Created,
    /// The row was inserted by a concurrent caller between our read and insert.
    CreatedConcurrently,
}

/// Provisioning failures. The operation is abandoned; the next trigger retries.
#[derive(Debug)]
pub enum ProvisionError {
    Read(StoreError),
    Insert(StoreError),
}

impl Display for ProvisionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Read(err) => write!(f, "profile lookup failed: {err}"),
            Self::Insert(err) => write!(f, "profile insert failed: {err}"),
        }
    }
}

impl Error for ProvisionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Read(err) | Self::Insert(err) => Some(err),
        }
    }
}

/// Stateless, idempotent `identity -> ensured profile` operation.
#[derive(Clone)]
pub struct ProfileProvisioner {
    store: Arc<dyn ProfileStore>,
}

impl ProfileProvisioner {
    pub fn new(store: Arc<dyn ProfileStore>) -> Self {
        Self { store }
    }

    /// Ensures a profile row exists for `identity`.
    ///
    /// Safe to call any number of times, concurrently, for the same id.
    ///
    /// # Errors
    /// - `ProvisionError::Read` when the existence check fails; no insert is
    ///   attempted and nothing is retried.
    /// - `ProvisionError::Insert` for insert failures other than a duplicate key.
    pub async fn ensure(&self, identity: &Identity) -> Result<ProvisionOutcome, ProvisionError> {
        let existing = match self.store.read_profile(&identity.id).await {
            Ok(existing) => existing,
            Err(err) => {
                warn!(
                    "event=profile_provision module=provisioner status=abandoned stage=read identity_id={} error={}",
                    identity.id, err
                );
                return Err(ProvisionError::Read(err));
            }
        };

        if existing.is_some() {
            debug!(
                "event=profile_provision module=provisioner status=ok outcome=already_provisioned identity_id={}",
                identity.id
            );
            return Ok(ProvisionOutcome::AlreadyProvisioned);
        }

        let profile = Profile::default_for(identity);
        match self.store.insert_profile(&profile).await {
            Ok(()) => {
                info!(
                    "event=profile_provision module=provisioner status=ok outcome=created identity_id={}",
                    identity.id
                );
                Ok(ProvisionOutcome::Created)
            }
            Err(err) if err.is_unique_violation() => {
                debug!(
                    "event=profile_provision module=provisioner status=ok outcome=created_concurrently identity_id={}",
                    identity.id
                );
                Ok(ProvisionOutcome::CreatedConcurrently)
            }
            Err(err) => {
                warn!(
                    "event=profile_provision module=provisioner status=abandoned stage=insert identity_id={} error={}",
                    identity.id, err
                );
                Err(ProvisionError::Insert(err))
            }
        }
    }
}
