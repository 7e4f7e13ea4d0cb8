//! Authoritative local view of the auth session.
//!
//! # Responsibility
//! - Resolve the initial session from one snapshot fetch.
//! - Apply live change notifications in delivery order.
//! - Trigger profile provisioning whenever a new identity becomes present.
//!
//! # Invariants
//! - This is the only writer of `SessionState`; readers get `watch` receivers.
//! - Every applied transition bumps `sequence`. A snapshot or sign-in result
//!   started at sequence `n` is discarded if anything was applied after `n`.
//! - Of overlapping snapshot fetches only the latest-started one may apply.
//! - Provisioning runs on absent -> present(A) and present(A) -> present(B),
//!   never on present -> absent or present(A) -> present(A).
//! - After `release()` no callback, snapshot or sign-in completion mutates state.

use crate::capability::auth::{AuthCapability, SessionCallback, SessionSubscription};
use crate::model::identity::{Identity, SessionState};
use crate::service::provisioner::ProfileProvisioner;
use crate::session::context::IdentityContext;
use crate::session::lock;
use log::{debug, info, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Weak};
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TransitionSource {
    Snapshot,
    Notification,
    SignIn,
}

impl TransitionSource {
    fn as_str(self) -> &'static str {
        match self {
            Self::Snapshot => "snapshot",
            Self::Notification => "notification",
            Self::SignIn => "sign_in",
        }
    }
}

#[derive(Debug, Default)]
struct MonitorState {
    sequence: u64,
    fetches_started: u64,
    resolved: bool,
    identity: Option<Identity>,
}

#[derive(Debug, Clone, Copy)]
struct SnapshotTicket {
    sequence: u64,
    fetch: u64,
}

/// Position in the transition sequence captured before a sign-in request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandoffTicket {
    sequence: u64,
}

struct MonitorShared {
    auth: Arc<dyn AuthCapability>,
    provisioner: ProfileProvisioner,
    runtime: Handle,
    live: AtomicBool,
    state: Mutex<MonitorState>,
    publisher: watch::Sender<SessionState>,
    subscription: Mutex<Option<Box<dyn SessionSubscription>>>,
    provisioning: Mutex<Vec<JoinHandle<()>>>,
}

impl MonitorShared {
    fn is_live(&self) -> bool {
        self.live.load(Ordering::SeqCst)
    }

    fn on_notification(self: &Arc<Self>, identity: Option<Identity>) {
        if !self.is_live() {
            debug!("event=session_notification module=monitor status=ignored reason=released");
            return;
        }
        self.apply(identity, TransitionSource::Notification);
    }

    fn apply(self: &Arc<Self>, next: Option<Identity>, source: TransitionSource) {
        let to_provision = {
            let mut state = lock(&self.state);
            self.apply_locked(&mut state, next, source)
        };
        if let Some(identity) = to_provision {
            self.spawn_provisioning(identity);
        }
    }

    /// Applies `next` only if nothing was applied after `sequence`.
    fn apply_if_current(
        self: &Arc<Self>,
        sequence: u64,
        next: Option<Identity>,
        source: TransitionSource,
    ) -> bool {
        let to_provision = {
            let mut state = lock(&self.state);
            if state.sequence != sequence {
                debug!(
                    "event=session_transition module=monitor status=discarded reason=stale source={} ticket={} sequence={}",
                    source.as_str(),
                    sequence,
                    state.sequence
                );
                return false;
            }
            self.apply_locked(&mut state, next, source)
        };
        if let Some(identity) = to_provision {
            self.spawn_provisioning(identity);
        }
        true
    }

    /// Applies a snapshot result only if it is the latest fetch and nothing
    /// newer was applied since it started.
    fn apply_snapshot(
        self: &Arc<Self>,
        ticket: SnapshotTicket,
        next: Option<Identity>,
        fetch_failed: bool,
    ) {
        let to_provision = {
            let mut state = lock(&self.state);
            if state.fetches_started != ticket.fetch {
                debug!(
                    "event=session_snapshot module=monitor status=discarded reason=superseded fetch={} latest_fetch={}",
                    ticket.fetch, state.fetches_started
                );
                return;
            }
            if state.sequence != ticket.sequence {
                debug!(
                    "event=session_snapshot module=monitor status=discarded reason=stale ticket={} sequence={}",
                    ticket.sequence, state.sequence
                );
                return;
            }
            if fetch_failed && state.resolved {
                // A failed re-fetch keeps the already resolved session.
                return;
            }
            self.apply_locked(&mut state, next, TransitionSource::Snapshot)
        };
        if let Some(identity) = to_provision {
            self.spawn_provisioning(identity);
        }
    }

    fn apply_locked(
        &self,
        state: &mut MonitorState,
        next: Option<Identity>,
        source: TransitionSource,
    ) -> Option<Identity> {
        let identity_changed = match (&state.identity, &next) {
            (_, None) => false,
            (None, Some(_)) => true,
            (Some(previous), Some(next)) => !previous.same_id(next),
        };

        state.sequence += 1;
        state.resolved = true;
        state.identity = next.clone();

        let published = SessionState::from_identity(next.clone());
        info!(
            "event=session_transition module=monitor status=ok source={} state={} sequence={} identity_id={}",
            source.as_str(),
            published.label(),
            state.sequence,
            next.as_ref().map_or("-", |identity| identity.id.as_str())
        );
        self.publisher.send_replace(published);

        if identity_changed {
            next
        } else {
            None
        }
    }

    fn spawn_provisioning(self: &Arc<Self>, identity: Identity) {
        let provisioner = self.provisioner.clone();
        let owner = Arc::downgrade(self);
        let handle = self.runtime.spawn(async move {
            let result = provisioner.ensure(&identity).await;
            let owner_live = owner.upgrade().is_some_and(|shared| shared.is_live());
            match result {
                Ok(outcome) => debug!(
                    "event=session_provision module=monitor status=ok outcome={:?} owner_live={} identity_id={}",
                    outcome, owner_live, identity.id
                ),
                Err(err) => warn!(
                    "event=session_provision module=monitor status=error owner_live={} identity_id={} error={}",
                    owner_live, identity.id, err
                ),
            }
        });

        let mut in_flight = lock(&self.provisioning);
        in_flight.retain(|pending| !pending.is_finished());
        in_flight.push(handle);
    }
}

/// Single writer of the process-local session value.
pub struct SessionMonitor {
    shared: Arc<MonitorShared>,
}

impl SessionMonitor {
    /// Creates a monitor in the `Initializing` state.
    ///
    /// # Panics
    /// Panics when called outside a Tokio runtime; provisioning triggered by
    /// change callbacks is spawned on the runtime captured here.
    pub fn new(auth: Arc<dyn AuthCapability>, provisioner: ProfileProvisioner) -> Self {
        let (publisher, _) = watch::channel(SessionState::Initializing);
        Self {
            shared: Arc::new(MonitorShared {
                auth,
                provisioner,
                runtime: Handle::current(),
                live: AtomicBool::new(true),
                state: Mutex::new(MonitorState::default()),
                publisher,
                subscription: Mutex::new(None),
                provisioning: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Fetches one session snapshot and applies it.
    ///
    /// Calling again re-fetches and replaces state. A result is dropped when a
    /// newer transition was applied while the fetch was in flight, or when a
    /// later `initialize` call started another fetch. A failed first fetch
    /// settles into `SignedOut` without retrying.
    pub async fn initialize(&self) {
        let ticket = {
            let mut state = lock(&self.shared.state);
            state.fetches_started += 1;
            SnapshotTicket {
                sequence: state.sequence,
                fetch: state.fetches_started,
            }
        };
        let result = self.shared.auth.session_snapshot().await;

        if !self.shared.is_live() {
            debug!("event=session_snapshot module=monitor status=ignored reason=released");
            return;
        }

        match result {
            Ok(identity) => self.shared.apply_snapshot(ticket, identity, false),
            Err(err) => {
                warn!(
                    "event=session_snapshot module=monitor status=error transient={} error={}",
                    err.is_transient(),
                    err
                );
                self.shared.apply_snapshot(ticket, None, true);
            }
        }
    }

    /// Registers for live session changes. Repeated calls keep one registration.
    pub fn subscribe(&self) {
        let mut slot = lock(&self.shared.subscription);
        if slot.is_some() || !self.shared.is_live() {
            return;
        }

        let owner: Weak<MonitorShared> = Arc::downgrade(&self.shared);
        let callback: SessionCallback = Arc::new(move |identity| {
            if let Some(shared) = owner.upgrade() {
                shared.on_notification(identity);
            }
        });
        *slot = Some(self.shared.auth.subscribe(callback));
        info!("event=session_subscribe module=monitor status=ok");
    }

    /// Releases the change subscription and stops all further state mutation.
    pub fn release(&self) {
        if !self.shared.live.swap(false, Ordering::SeqCst) {
            return;
        }
        if let Some(subscription) = lock(&self.shared.subscription).take() {
            subscription.release();
        }
        info!("event=session_release module=monitor status=ok");
    }

    pub fn is_live(&self) -> bool {
        self.shared.is_live()
    }

    pub fn state(&self) -> SessionState {
        self.shared.publisher.borrow().clone()
    }

    pub fn current_identity(&self) -> Option<Identity> {
        self.shared.publisher.borrow().identity().cloned()
    }

    /// Returns a receiver that observes every published transition.
    pub fn watch(&self) -> watch::Receiver<SessionState> {
        self.shared.publisher.subscribe()
    }

    /// Returns a live identity view bound to this monitor.
    pub fn context(&self) -> IdentityContext {
        IdentityContext::new(self.watch())
    }

    /// Returns the channel the credential gate uses to hand over a sign-in.
    pub fn handoff(&self) -> SessionHandoff {
        SessionHandoff {
            owner: Arc::downgrade(&self.shared),
        }
    }

    /// Waits for every provisioning task spawned so far, including ones spawned
    /// while waiting.
    pub async fn wait_for_provisioning(&self) {
        loop {
            let pending = std::mem::take(&mut *lock(&self.shared.provisioning));
            if pending.is_empty() {
                return;
            }
            for handle in pending {
                if let Err(err) = handle.await {
                    warn!("event=session_provision module=monitor status=error error={err}");
                }
            }
        }
    }
}

impl Drop for SessionMonitor {
    fn drop(&mut self) {
        self.release();
    }
}

/// Weak entry point for pushing a sign-in result into the monitor.
#[derive(Clone)]
pub struct SessionHandoff {
    owner: Weak<MonitorShared>,
}

impl SessionHandoff {
    /// Captures the current transition position. Take it before the sign-in
    /// request starts. Returns `None` when the monitor is gone.
    pub fn ticket(&self) -> Option<HandoffTicket> {
        self.owner.upgrade().map(|shared| HandoffTicket {
            sequence: lock(&shared.state).sequence,
        })
    }

    /// Applies `identity` as the current session if no transition was applied
    /// since `ticket` was taken.
    ///
    /// Uses the same transition rules as a notification, so a later change
    /// event for the same id does not provision again. Returns `false` when the
    /// monitor is gone or released, or when the result is stale.
    pub fn adopt(&self, ticket: HandoffTicket, identity: Identity) -> bool {
        match self.owner.upgrade() {
            Some(shared) if shared.is_live() => shared.apply_if_current(
                ticket.sequence,
                Some(identity),
                TransitionSource::SignIn,
            ),
            _ => false,
        }
    }
}
