//! Runtime configuration resolved from the process environment.
//!
//! # Invariants
//! - Blank environment values behave as unset.
//! - Resolution never fails; every field has a fallback except `log_dir`,
//!   whose absence means "do not initialize file logging".

use crate::logging::default_log_level;
use std::path::PathBuf;

pub const ENV_LOG_LEVEL: &str = "ANGLERHUB_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "ANGLERHUB_LOG_DIR";
pub const ENV_PROFILE_DB: &str = "ANGLERHUB_PROFILE_DB";

const DEFAULT_PROFILE_DB_FILE_NAME: &str = "anglerhub_profiles.sqlite3";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    /// One of `trace|debug|info|warn|error`; validated by `init_logging`.
    pub log_level: String,
    pub log_dir: Option<PathBuf>,
    /// Local SQLite profile store location.
    pub profile_db_path: PathBuf,
}

impl CoreConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolves configuration through `lookup`, used by tests.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let value = |key: &str| {
            lookup(key)
                .map(|raw| raw.trim().to_string())
                .filter(|trimmed| !trimmed.is_empty())
        };

        Self {
            log_level: value(ENV_LOG_LEVEL).unwrap_or_else(|| default_log_level().to_string()),
            log_dir: value(ENV_LOG_DIR).map(PathBuf::from),
            profile_db_path: value(ENV_PROFILE_DB)
                .map(PathBuf::from)
                .unwrap_or_else(|| std::env::temp_dir().join(DEFAULT_PROFILE_DB_FILE_NAME)),
        }
    }
}
