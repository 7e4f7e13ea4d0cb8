#![allow(dead_code)]

use anglerhub_core::{
    AuthCapability, AuthError, BlobStore, Catch, CatchStore, Identity, Lake, Profile,
    ProfilePatch, ProfileStore, SessionCallback, SessionSubscription, SignUpAck, StoreError,
    StoreResult,
};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{oneshot, Barrier};

pub const INVALID_CREDENTIALS: &str = "Invalid login credentials";

pub fn identity(id: &str, email: &str) -> Identity {
    Identity::new(id, email)
}

type SnapshotResult = Result<Option<Identity>, AuthError>;

struct Registration {
    callback: SessionCallback,
    active: Arc<AtomicBool>,
}

/// Scriptable in-process auth provider.
#[derive(Default)]
pub struct FakeAuth {
    snapshot: Mutex<Option<SnapshotResult>>,
    snapshot_gates: Mutex<VecDeque<oneshot::Receiver<SnapshotResult>>>,
    sign_in_gate: Mutex<Option<oneshot::Receiver<()>>>,
    registrations: Mutex<Vec<Registration>>,
    accounts: Mutex<HashMap<String, (String, Identity)>>,
    sign_up_result: Mutex<Option<Result<SignUpAck, AuthError>>>,
    emit_on_sign_in: AtomicBool,
    sign_in_emissions: Mutex<Vec<Option<Identity>>>,
    leaky_release: AtomicBool,
    snapshot_calls: AtomicUsize,
    sign_in_calls: AtomicUsize,
    sign_up_calls: AtomicUsize,
    subscribe_calls: AtomicUsize,
    release_calls: Arc<AtomicUsize>,
}

impl FakeAuth {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Snapshot answers `Ok(identity)` from now on.
    pub fn set_snapshot(&self, identity: Option<Identity>) {
        *self.snapshot.lock().unwrap() = Some(Ok(identity));
    }

    pub fn fail_snapshot(&self, err: AuthError) {
        *self.snapshot.lock().unwrap() = Some(Err(err));
    }

    /// The next ungated snapshot call waits until the returned sender fires.
    /// Gates are handed out to calls in creation order.
    pub fn gate_snapshot(&self) -> oneshot::Sender<SnapshotResult> {
        let (tx, rx) = oneshot::channel();
        self.snapshot_gates.lock().unwrap().push_back(rx);
        tx
    }

    /// The next sign-in call waits until the returned sender fires.
    pub fn gate_sign_in(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        *self.sign_in_gate.lock().unwrap() = Some(rx);
        tx
    }

    pub fn add_account(&self, email: &str, password: &str, identity: Identity) {
        self.accounts
            .lock()
            .unwrap()
            .insert(email.to_string(), (password.to_string(), identity));
    }

    /// Successful sign-ins also deliver a change notification, like a real
    /// provider does.
    pub fn emit_on_sign_in(&self, enabled: bool) {
        self.emit_on_sign_in.store(enabled, Ordering::SeqCst);
    }

    /// The next successful sign-in delivers these change events, in order,
    /// before it returns.
    pub fn emit_during_sign_in(&self, events: Vec<Option<Identity>>) {
        *self.sign_in_emissions.lock().unwrap() = events;
    }

    pub fn script_sign_up(&self, result: Result<SignUpAck, AuthError>) {
        *self.sign_up_result.lock().unwrap() = Some(result);
    }

    /// Released subscriptions keep receiving events.
    pub fn leak_released_subscriptions(&self) {
        self.leaky_release.store(true, Ordering::SeqCst);
    }

    /// Delivers one change event to every active registration.
    pub fn emit(&self, identity: Option<Identity>) {
        let callbacks: Vec<SessionCallback> = self
            .registrations
            .lock()
            .unwrap()
            .iter()
            .filter(|registration| registration.active.load(Ordering::SeqCst))
            .map(|registration| Arc::clone(&registration.callback))
            .collect();
        for callback in callbacks {
            callback(identity.clone());
        }
    }

    pub fn snapshot_calls(&self) -> usize {
        self.snapshot_calls.load(Ordering::SeqCst)
    }

    pub fn sign_in_calls(&self) -> usize {
        self.sign_in_calls.load(Ordering::SeqCst)
    }

    pub fn sign_up_calls(&self) -> usize {
        self.sign_up_calls.load(Ordering::SeqCst)
    }

    pub fn subscribe_calls(&self) -> usize {
        self.subscribe_calls.load(Ordering::SeqCst)
    }

    pub fn release_calls(&self) -> usize {
        self.release_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AuthCapability for FakeAuth {
    async fn session_snapshot(&self) -> Result<Option<Identity>, AuthError> {
        self.snapshot_calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.snapshot_gates.lock().unwrap().pop_front();
        if let Some(gate) = gate {
            return gate.await.unwrap_or(Ok(None));
        }
        let scripted = self.snapshot.lock().unwrap().clone();
        scripted.unwrap_or(Ok(None))
    }

    fn subscribe(&self, on_change: SessionCallback) -> Box<dyn SessionSubscription> {
        self.subscribe_calls.fetch_add(1, Ordering::SeqCst);
        let active = Arc::new(AtomicBool::new(true));
        self.registrations.lock().unwrap().push(Registration {
            callback: on_change,
            active: Arc::clone(&active),
        });
        Box::new(FakeSubscription {
            active,
            leaky: self.leaky_release.load(Ordering::SeqCst),
            releases: Arc::clone(&self.release_calls),
        })
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Identity, AuthError> {
        self.sign_in_calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.sign_in_gate.lock().unwrap().take();
        if let Some(gate) = gate {
            let _ = gate.await;
        }

        let account = self.accounts.lock().unwrap().get(email).cloned();
        match account {
            Some((expected, identity)) if expected == password => {
                let scripted = std::mem::take(&mut *self.sign_in_emissions.lock().unwrap());
                if !scripted.is_empty() {
                    for event in scripted {
                        self.emit(event);
                        tokio::task::yield_now().await;
                    }
                } else if self.emit_on_sign_in.load(Ordering::SeqCst) {
                    self.emit(Some(identity.clone()));
                }
                Ok(identity)
            }
            _ => Err(AuthError::Rejected(INVALID_CREDENTIALS.to_string())),
        }
    }

    async fn sign_up(&self, email: &str, _password: &str) -> Result<SignUpAck, AuthError> {
        self.sign_up_calls.fetch_add(1, Ordering::SeqCst);
        let scripted = self.sign_up_result.lock().unwrap().clone();
        scripted.unwrap_or_else(|| {
            Ok(SignUpAck {
                email: email.to_string(),
            })
        })
    }
}

struct FakeSubscription {
    active: Arc<AtomicBool>,
    leaky: bool,
    releases: Arc<AtomicUsize>,
}

impl SessionSubscription for FakeSubscription {
    fn release(&self) {
        self.releases.fetch_add(1, Ordering::SeqCst);
        if !self.leaky {
            self.active.store(false, Ordering::SeqCst);
        }
    }
}

/// In-memory profile table with a primary key on `id`.
#[derive(Default)]
pub struct MemoryProfileStore {
    rows: Mutex<HashMap<String, Profile>>,
    read_barrier: Option<Arc<Barrier>>,
    barrier_reads_left: AtomicUsize,
    fail_reads: AtomicBool,
    fail_inserts: AtomicBool,
    reads: AtomicUsize,
    inserts: AtomicUsize,
    updates: AtomicUsize,
}

impl MemoryProfileStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// The first `parties` reads wait for each other before looking at the
    /// table, so they all observe the same (usually empty) state.
    pub fn with_read_barrier(parties: usize) -> Arc<Self> {
        Arc::new(Self {
            read_barrier: Some(Arc::new(Barrier::new(parties))),
            barrier_reads_left: AtomicUsize::new(parties),
            ..Self::default()
        })
    }

    pub fn seed(&self, profile: Profile) {
        self.rows
            .lock()
            .unwrap()
            .insert(profile.id.clone(), profile);
    }

    pub fn profile(&self, id: &str) -> Option<Profile> {
        self.rows.lock().unwrap().get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.rows.lock().unwrap().len()
    }

    pub fn fail_reads(&self, enabled: bool) {
        self.fail_reads.store(enabled, Ordering::SeqCst);
    }

    pub fn fail_inserts(&self, enabled: bool) {
        self.fail_inserts.store(enabled, Ordering::SeqCst);
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// Insert attempts, including ones rejected as duplicates.
    pub fn inserts(&self) -> usize {
        self.inserts.load(Ordering::SeqCst)
    }

    pub fn updates(&self) -> usize {
        self.updates.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProfileStore for MemoryProfileStore {
    async fn read_profile(&self, id: &str) -> StoreResult<Option<Profile>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("read timed out".to_string()));
        }

        let take_barrier = self
            .barrier_reads_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok();
        if let (true, Some(barrier)) = (take_barrier, &self.read_barrier) {
            barrier.wait().await;
        }

        Ok(self.rows.lock().unwrap().get(id).cloned())
    }

    async fn insert_profile(&self, profile: &Profile) -> StoreResult<()> {
        self.inserts.fetch_add(1, Ordering::SeqCst);
        if self.fail_inserts.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("insert timed out".to_string()));
        }
        profile.validate()?;

        let mut rows = self.rows.lock().unwrap();
        if rows.contains_key(&profile.id) {
            return Err(StoreError::UniqueViolation(profile.id.clone()));
        }
        rows.insert(profile.id.clone(), profile.clone());
        Ok(())
    }

    async fn update_profile(&self, id: &str, patch: &ProfilePatch) -> StoreResult<()> {
        self.updates.fetch_add(1, Ordering::SeqCst);
        let mut rows = self.rows.lock().unwrap();
        let row = rows
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        if let Some(username) = &patch.username {
            row.username = username.clone();
        }
        if let Some(profile_pic) = &patch.profile_pic {
            row.profile_pic = Some(profile_pic.clone());
        }
        Ok(())
    }
}

/// In-memory object storage returning `memory://<bucket>/<path>` locators.
#[derive(Default)]
pub struct MemoryBlobStore {
    objects: Mutex<HashMap<String, Vec<u8>>>,
    fail: AtomicBool,
}

impl MemoryBlobStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn fail_uploads(&self, enabled: bool) {
        self.fail.store(enabled, Ordering::SeqCst);
    }

    pub fn paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.objects.lock().unwrap().keys().cloned().collect();
        paths.sort();
        paths
    }

    pub fn object(&self, path: &str) -> Option<Vec<u8>> {
        self.objects.lock().unwrap().get(path).cloned()
    }

    pub fn holds_locator(&self, locator: &str) -> bool {
        self.objects
            .lock()
            .unwrap()
            .keys()
            .any(|path| locator.ends_with(&format!("/{path}")))
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn store_blob(&self, bucket: &str, path: &str, bytes: Vec<u8>) -> StoreResult<String> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("upload rejected".to_string()));
        }
        self.objects.lock().unwrap().insert(path.to_string(), bytes);
        Ok(format!("memory://{bucket}/{path}"))
    }
}

/// In-memory lake catalogue and catch log.
///
/// When built with `witnessing`, every insert records whether the photo it
/// points at was already stored.
#[derive(Default)]
pub struct MemoryCatchStore {
    lakes: Mutex<Vec<Lake>>,
    catches: Mutex<Vec<Catch>>,
    blobs: Option<Arc<MemoryBlobStore>>,
    photo_present_at_insert: Mutex<Vec<bool>>,
    fail_inserts: AtomicBool,
    inserts: AtomicUsize,
}

impl MemoryCatchStore {
    pub fn new(lakes: Vec<Lake>) -> Arc<Self> {
        Arc::new(Self {
            lakes: Mutex::new(lakes),
            ..Self::default()
        })
    }

    pub fn witnessing(lakes: Vec<Lake>, blobs: Arc<MemoryBlobStore>) -> Arc<Self> {
        Arc::new(Self {
            lakes: Mutex::new(lakes),
            blobs: Some(blobs),
            ..Self::default()
        })
    }

    pub fn fail_inserts(&self, enabled: bool) {
        self.fail_inserts.store(enabled, Ordering::SeqCst);
    }

    pub fn inserts(&self) -> usize {
        self.inserts.load(Ordering::SeqCst)
    }

    pub fn catches(&self) -> Vec<Catch> {
        self.catches.lock().unwrap().clone()
    }

    pub fn photo_present_at_insert(&self) -> Vec<bool> {
        self.photo_present_at_insert.lock().unwrap().clone()
    }
}

#[async_trait]
impl CatchStore for MemoryCatchStore {
    async fn list_lakes(&self) -> StoreResult<Vec<Lake>> {
        Ok(self.lakes.lock().unwrap().clone())
    }

    async fn insert_catch(&self, record: &Catch) -> StoreResult<()> {
        self.inserts.fetch_add(1, Ordering::SeqCst);
        if let Some(blobs) = &self.blobs {
            self.photo_present_at_insert
                .lock()
                .unwrap()
                .push(blobs.holds_locator(&record.image_url));
        }
        if self.fail_inserts.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("insert rejected".to_string()));
        }
        if !self.lakes.lock().unwrap().iter().any(|lake| lake.id == record.lake_id) {
            return Err(StoreError::InvalidReference(format!("lake {}", record.lake_id)));
        }
        record.validate()?;
        self.catches.lock().unwrap().push(record.clone());
        Ok(())
    }

    async fn list_catches(&self, lake_id: &str) -> StoreResult<Vec<Catch>> {
        Ok(self
            .catches
            .lock()
            .unwrap()
            .iter()
            .rev()
            .filter(|record| record.lake_id == lake_id)
            .cloned()
            .collect())
    }
}
