//! Unauthenticated root: sign-in and sign-up flow.
//!
//! # Responsibility
//! - Delegate credential actions to the auth capability.
//! - Translate provider failures into user-facing text.
//!
//! # Invariants
//! - Only one submission is outstanding at a time; others get `Busy`.
//! - A failed submission returns to `Idle`, keeping its error until the next
//!   submission starts.
//! - Sign-up success never establishes a session.
//! - A sign-in result is handed to the monitor only if no session transition
//!   was applied while the request was in flight.
//! - Submissions and completions after `dispose()` return `Detached` and
//!   change nothing.

use crate::capability::auth::{AuthCapability, AuthError};
use crate::model::identity::Identity;
use crate::session::lock;
use crate::session::monitor::SessionHandoff;
use log::{debug, info, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Provider error code for e-mail rate limiting.
pub const RATE_LIMIT_ERROR_CODE: &str = "over_email_send_rate_limit";
/// Replaces raw provider text for rate-limited sign-ups.
pub const RATE_LIMIT_MESSAGE: &str =
    "Too many sign-up attempts. Please wait 49 seconds before trying again.";
pub const EMPTY_EMAIL_MESSAGE: &str = "Enter your email address to sign up.";
pub const CONFIRMATION_PENDING_MESSAGE: &str = "Check your email to confirm your account.";

/// Returns whether a provider message carries a known rate-limit signature.
pub fn is_rate_limited(message: &str) -> bool {
    message.contains(RATE_LIMIT_ERROR_CODE)
        || (message.contains("after") && message.contains("seconds"))
}

/// User-facing text for a failed sign-up.
pub fn sign_up_failure_message(err: &AuthError) -> String {
    if is_rate_limited(err.message()) {
        RATE_LIMIT_MESSAGE.to_string()
    } else {
        err.message().to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatePhase {
    Idle,
    Submitting,
    Succeeded,
}

/// Render model of the gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateView {
    pub phase: GatePhase,
    /// User-facing error of the last failed submission.
    pub error: Option<String>,
    /// User-facing informational notice (e.g. confirmation pending).
    pub notice: Option<String>,
}

impl Default for GateView {
    fn default() -> Self {
        Self {
            phase: GatePhase::Idle,
            error: None,
            notice: None,
        }
    }
}

/// Result of one gate submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateOutcome {
    SignedIn(Identity),
    ConfirmationPending,
    /// Carries the user-facing message also stored in `GateView::error`.
    Failed(String),
    /// Another submission is still outstanding.
    Busy,
    /// The gate was disposed before or during the request.
    Detached,
}

pub struct CredentialGate {
    auth: Arc<dyn AuthCapability>,
    handoff: Option<SessionHandoff>,
    live: AtomicBool,
    view: Mutex<GateView>,
}

impl CredentialGate {
    /// `handoff`, when present, receives successful sign-ins directly so the
    /// root switches without waiting for the change notification.
    pub fn new(auth: Arc<dyn AuthCapability>, handoff: Option<SessionHandoff>) -> Self {
        Self {
            auth,
            handoff,
            live: AtomicBool::new(true),
            view: Mutex::new(GateView::default()),
        }
    }

    pub fn view(&self) -> GateView {
        lock(&self.view).clone()
    }

    pub fn is_live(&self) -> bool {
        self.live.load(Ordering::SeqCst)
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> GateOutcome {
        if !self.is_live() {
            return GateOutcome::Detached;
        }
        if !self.begin_submission() {
            return GateOutcome::Busy;
        }

        let ticket = self.handoff.as_ref().and_then(SessionHandoff::ticket);
        let result = self.auth.sign_in(email, password).await;
        if !self.is_live() {
            return GateOutcome::Detached;
        }

        match result {
            Ok(identity) => {
                info!(
                    "event=auth_sign_in module=gate status=ok identity_id={}",
                    identity.id
                );
                if let (Some(handoff), Some(ticket)) = (&self.handoff, ticket) {
                    if !handoff.adopt(ticket, identity.clone()) {
                        debug!(
                            "event=auth_sign_in module=gate status=handoff_skipped identity_id={}",
                            identity.id
                        );
                    }
                }
                self.finish(GatePhase::Succeeded, None, None);
                GateOutcome::SignedIn(identity)
            }
            Err(err) => {
                warn!(
                    "event=auth_sign_in module=gate status=error transient={}",
                    err.is_transient()
                );
                self.fail(err.message().to_string())
            }
        }
    }

    pub async fn sign_up(&self, email: &str, password: &str) -> GateOutcome {
        if !self.is_live() {
            return GateOutcome::Detached;
        }
        if !self.begin_submission() {
            return GateOutcome::Busy;
        }
        if email.trim().is_empty() {
            return self.fail(EMPTY_EMAIL_MESSAGE.to_string());
        }

        let result = self.auth.sign_up(email, password).await;
        if !self.is_live() {
            return GateOutcome::Detached;
        }

        match result {
            Ok(_) => {
                info!("event=auth_sign_up module=gate status=ok confirmation=pending");
                self.finish(
                    GatePhase::Succeeded,
                    None,
                    Some(CONFIRMATION_PENDING_MESSAGE.to_string()),
                );
                GateOutcome::ConfirmationPending
            }
            Err(err) => {
                let rate_limited = is_rate_limited(err.message());
                warn!(
                    "event=auth_sign_up module=gate status=error rate_limited={} transient={}",
                    rate_limited,
                    err.is_transient()
                );
                self.fail(sign_up_failure_message(&err))
            }
        }
    }

    /// Detaches the gate; in-flight completions will no longer touch it.
    pub fn dispose(&self) {
        self.live.store(false, Ordering::SeqCst);
    }

    fn begin_submission(&self) -> bool {
        let mut view = lock(&self.view);
        if view.phase == GatePhase::Submitting {
            return false;
        }
        *view = GateView {
            phase: GatePhase::Submitting,
            error: None,
            notice: None,
        };
        true
    }

    fn finish(&self, phase: GatePhase, error: Option<String>, notice: Option<String>) {
        *lock(&self.view) = GateView {
            phase,
            error,
            notice,
        };
    }

    fn fail(&self, message: String) -> GateOutcome {
        self.finish(GatePhase::Idle, Some(message.clone()), None);
        GateOutcome::Failed(message)
    }
}
