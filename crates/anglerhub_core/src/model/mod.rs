//! Domain model for the identity bootstrap core.
//!
//! # Responsibility
//! - Define identity/session values distributed to the view tree.
//! - Define the durable profile record provisioned per identity.
//! - Define lakes and the catches anglers record against them.
//!
//! # Invariants
//! - Every profile is identified by the identity id that owns it.
//! - Profiles are never deleted by core code.

pub mod catch;
pub mod identity;
pub mod profile;
