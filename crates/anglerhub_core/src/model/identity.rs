//! Identity and session value types.
//!
//! # Responsibility
//! - Define the authenticated identity shape handed out by the auth capability.
//! - Define the process-local session state published by the session monitor.
//!
//! # Invariants
//! - `Identity` is immutable once obtained for a session lifetime.
//! - `SessionState` has exactly one writer (`SessionMonitor`).

use serde::{Deserialize, Serialize};

/// Opaque identity id issued by the external auth capability.
///
/// Also the primary key of the matching profile row.
pub type IdentityId = String;

/// Stable (id, email) pair identifying an authenticated user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identity {
    pub id: IdentityId,
    pub email: String,
}

impl Identity {
    pub fn new(id: impl Into<IdentityId>, email: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: email.into(),
        }
    }

    /// Returns whether both values point at the same identity id.
    ///
    /// Email changes for the same id are a refresh, not a new identity.
    pub fn same_id(&self, other: &Identity) -> bool {
        self.id == other.id
    }
}

/// Local belief about whether a user is authenticated, and as whom.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    /// The first snapshot has not resolved and no notification arrived yet.
    #[default]
    Initializing,
    /// No live session.
    SignedOut,
    /// A live session for the given identity.
    SignedIn(Identity),
}

impl SessionState {
    pub fn from_identity(identity: Option<Identity>) -> Self {
        match identity {
            Some(identity) => Self::SignedIn(identity),
            None => Self::SignedOut,
        }
    }

    pub fn identity(&self) -> Option<&Identity> {
        match self {
            Self::SignedIn(identity) => Some(identity),
            Self::Initializing | Self::SignedOut => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        !matches!(self, Self::Initializing)
    }

    /// Short label used in log events.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Initializing => "initializing",
            Self::SignedOut => "signed_out",
            Self::SignedIn(_) => "signed_in",
        }
    }
}
