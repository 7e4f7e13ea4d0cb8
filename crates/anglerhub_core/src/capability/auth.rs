//! Authentication capability contract consumed by the identity core.
//!
//! The concrete provider belongs to the external backend. Core code only reads
//! snapshots, listens for changes and forwards explicit credential actions.

use crate::model::identity::Identity;
use async_trait::async_trait;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// Callback invoked with the new session identity on every auth change.
///
/// `None` means the session ended (sign-out or expiry).
pub type SessionCallback = Arc<dyn Fn(Option<Identity>) + Send + Sync>;

/// Handle for one live change registration.
pub trait SessionSubscription: Send + Sync {
    /// Stops delivery. Must be safe to call more than once.
    fn release(&self);
}

/// Acknowledgement for a sign-up request. No session exists yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignUpAck {
    pub email: String,
}

/// External auth provider.
#[async_trait]
pub trait AuthCapability: Send + Sync {
    /// Point-in-time read of the current session.
    async fn session_snapshot(&self) -> Result<Option<Identity>, AuthError>;

    /// Registers for live session changes.
    fn subscribe(&self, on_change: SessionCallback) -> Box<dyn SessionSubscription>;

    async fn sign_in(&self, email: &str, password: &str) -> Result<Identity, AuthError>;

    async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpAck, AuthError>;
}

/// Auth capability failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Network/timeout style failure; safe to retry later.
    Unavailable(String),
    /// Provider refused the credentials or the request (bad password,
    /// unknown account, rate limit). Carries the provider text verbatim.
    Rejected(String),
}

impl AuthError {
    /// Provider-level message, unchanged.
    pub fn message(&self) -> &str {
        match self {
            Self::Unavailable(message) | Self::Rejected(message) => message,
        }
    }

    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

impl Display for AuthError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

impl Error for AuthError {}
