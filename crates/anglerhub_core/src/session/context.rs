//! Scoped, read-only distribution of the current identity.
//!
//! An `IdentityContext` is a live view over the monitor's session channel, not
//! a copy: once the monitor publishes a sign-out, every context observes it on
//! the next read.

use crate::model::identity::{Identity, SessionState};
use std::error::Error;
use std::fmt::{Display, Formatter};
use tokio::sync::watch;

/// Programming-time misuse of the identity context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityContextError {
    /// The identity was requested while no authenticated session exists.
    OutsideAuthenticatedScope,
}

impl Display for IdentityContextError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OutsideAuthenticatedScope => write!(
                f,
                "identity context used outside an authenticated scope"
            ),
        }
    }
}

impl Error for IdentityContextError {}

/// Read-only handle to the identity of the authenticated tree.
#[derive(Debug, Clone)]
pub struct IdentityContext {
    receiver: watch::Receiver<SessionState>,
}

impl IdentityContext {
    pub(crate) fn new(receiver: watch::Receiver<SessionState>) -> Self {
        Self { receiver }
    }

    /// Returns the current identity.
    ///
    /// # Panics
    /// Panics when no authenticated session exists. Consumers are only
    /// rendered under a signed-in root, so reaching this is a wiring bug.
    #[track_caller]
    pub fn current(&self) -> Identity {
        match self.try_current() {
            Ok(identity) => identity,
            Err(err) => panic!("{err}"),
        }
    }

    /// Non-panicking variant of [`IdentityContext::current`].
    pub fn try_current(&self) -> Result<Identity, IdentityContextError> {
        self.receiver
            .borrow()
            .identity()
            .cloned()
            .ok_or(IdentityContextError::OutsideAuthenticatedScope)
    }

    pub fn is_authenticated(&self) -> bool {
        self.receiver.borrow().identity().is_some()
    }

    /// Waits for the next published session change.
    ///
    /// Returns `false` once the owning monitor is gone.
    pub async fn changed(&mut self) -> bool {
        self.receiver.changed().await.is_ok()
    }
}
