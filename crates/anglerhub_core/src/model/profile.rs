//! Profile domain model.
//!
//! # Responsibility
//! - Define the durable per-identity record (username, avatar, rank, badges).
//! - Build the default row created on first sign-in.
//!
//! # Invariants
//! - `id` equals the owning identity id and is never reassigned.
//! - A default profile has no picture, the starting rank and no badges.

use crate::model::identity::{Identity, IdentityId};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Rank assigned to every freshly provisioned profile.
pub const STARTING_RANK: &str = "Rookie Silver Fish";

/// Durable gamified profile keyed by identity id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: IdentityId,
    pub username: String,
    /// Retrievable locator of the uploaded avatar, if any.
    pub profile_pic: Option<String>,
    pub rank: String,
    /// Ordered badge names; mutated by flows outside the identity core.
    pub badges: Vec<String>,
}

impl Profile {
    /// Builds the default row for a newly observed identity.
    pub fn default_for(identity: &Identity) -> Self {
        Self {
            id: identity.id.clone(),
            username: username_from_email(&identity.email).to_string(),
            profile_pic: None,
            rank: STARTING_RANK.to_string(),
            badges: Vec::new(),
        }
    }

    /// Validates record-level invariants before persistence.
    pub fn validate(&self) -> Result<(), ProfileValidationError> {
        if self.id.trim().is_empty() {
            return Err(ProfileValidationError::EmptyId);
        }
        if self.rank.trim().is_empty() {
            return Err(ProfileValidationError::EmptyRank);
        }
        if let Some(index) = self.badges.iter().position(|badge| badge.trim().is_empty()) {
            return Err(ProfileValidationError::BlankBadge { index });
        }
        Ok(())
    }
}

/// Partial update for profile edit flows. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfilePatch {
    pub username: Option<String>,
    pub profile_pic: Option<String>,
}

impl ProfilePatch {
    pub fn username(value: impl Into<String>) -> Self {
        Self {
            username: Some(value.into()),
            ..Self::default()
        }
    }

    pub fn profile_pic(locator: impl Into<String>) -> Self {
        Self {
            profile_pic: Some(locator.into()),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.username.is_none() && self.profile_pic.is_none()
    }
}

/// Returns the email local part, split at the first `@`.
///
/// An email without `@` is returned whole.
pub fn username_from_email(email: &str) -> &str {
    email.split_once('@').map_or(email, |(local, _)| local)
}

/// Profile record validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileValidationError {
    EmptyId,
    EmptyRank,
    BlankBadge { index: usize },
}

impl Display for ProfileValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyId => write!(f, "profile id must not be empty"),
            Self::EmptyRank => write!(f, "profile rank must not be empty"),
            Self::BlankBadge { index } => write!(f, "profile badge #{index} is blank"),
        }
    }
}

impl Error for ProfileValidationError {}
