//! Identity and session core for AnglerHub.
//! This crate is the single source of truth for who is signed in and for the
//! guarantee that every signed-in identity has a profile row. It also records
//! the catches signed-in anglers upload.

pub mod capability;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod session;

pub use capability::auth::{
    AuthCapability, AuthError, SessionCallback, SessionSubscription, SignUpAck,
};
pub use capability::storage::{BlobStore, CatchStore, ProfileStore, StoreError, StoreResult};
pub use config::CoreConfig;
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::catch::{Catch, CatchDraft, CatchPhoto, CatchValidationError, Lake, LakeId};
pub use model::identity::{Identity, IdentityId, SessionState};
pub use model::profile::{Profile, ProfilePatch, ProfileValidationError, STARTING_RANK};
pub use repo::catch_repo::SqliteCatchStore;
pub use repo::profile_repo::SqliteProfileStore;
pub use service::catch_service::{CatchService, CatchServiceError};
pub use service::profile_service::{ProfileService, ProfileServiceError};
pub use service::provisioner::{ProfileProvisioner, ProvisionError, ProvisionOutcome};
pub use session::context::{IdentityContext, IdentityContextError};
pub use session::gate::{CredentialGate, GateOutcome, GatePhase, GateView};
pub use session::monitor::{HandoffTicket, SessionHandoff, SessionMonitor};
pub use session::root::{AppRoot, RootView};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
