//! Root composition: loading, credential gate, or the authenticated tree.

use crate::capability::auth::AuthCapability;
use crate::capability::storage::ProfileStore;
use crate::model::identity::SessionState;
use crate::service::provisioner::ProfileProvisioner;
use crate::session::context::IdentityContext;
use crate::session::gate::CredentialGate;
use crate::session::monitor::SessionMonitor;
use std::sync::Arc;

/// What the application root renders right now.
#[derive(Debug, Clone)]
pub enum RootView {
    /// First snapshot still in flight.
    Loading,
    /// No session; render the sign-in/sign-up gate.
    CredentialGate,
    /// Render the authenticated tree under this context.
    Authenticated(IdentityContext),
}

/// Owns the session monitor and the credential gate for one client lifetime.
pub struct AppRoot {
    monitor: SessionMonitor,
    gate: CredentialGate,
}

impl AppRoot {
    /// Wires monitor, provisioner and gate over the backend capabilities.
    ///
    /// # Panics
    /// Panics when called outside a Tokio runtime (see [`SessionMonitor::new`]).
    pub fn new(auth: Arc<dyn AuthCapability>, store: Arc<dyn ProfileStore>) -> Self {
        let monitor = SessionMonitor::new(Arc::clone(&auth), ProfileProvisioner::new(store));
        let gate = CredentialGate::new(auth, Some(monitor.handoff()));
        Self { monitor, gate }
    }

    /// Subscribes to live changes, then resolves the first snapshot.
    ///
    /// Subscribing first means no change is missed while the snapshot is in
    /// flight; the monitor drops the snapshot if a change lands before it.
    pub async fn start(&self) {
        self.monitor.subscribe();
        self.monitor.initialize().await;
    }

    pub fn render(&self) -> RootView {
        match self.monitor.state() {
            SessionState::Initializing => RootView::Loading,
            SessionState::SignedOut => RootView::CredentialGate,
            SessionState::SignedIn(_) => RootView::Authenticated(self.monitor.context()),
        }
    }

    pub fn monitor(&self) -> &SessionMonitor {
        &self.monitor
    }

    pub fn gate(&self) -> &CredentialGate {
        &self.gate
    }

    /// Tears down the root; later completions become no-ops.
    pub fn shutdown(&self) {
        self.gate.dispose();
        self.monitor.release();
    }
}
