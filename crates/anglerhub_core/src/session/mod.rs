//! Session bootstrap: who is signed in, and what the root should render.
//!
//! # Responsibility
//! - Own the single writable session value (`SessionMonitor`).
//! - Distribute read-only identity views to the rendered tree (`IdentityContext`).
//! - Drive the unauthenticated sign-in/sign-up flow (`CredentialGate`).
//! - Compose both into the root render decision (`AppRoot`).
//!
//! # Invariants
//! - Session transitions are applied in delivery order; stale snapshot
//!   completions are discarded by sequence number.
//! - Completions that arrive after their owner was torn down never mutate state.

pub mod context;
pub mod gate;
pub mod monitor;
pub mod root;

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Locks a short critical section, recovering the data of a poisoned mutex.
///
/// Guarded values here are plain state snapshots that stay consistent even if
/// a holder panicked mid-section.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
