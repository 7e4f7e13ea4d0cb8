//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate profile and catch store calls into use-case level APIs.
//! - Keep view/session layers decoupled from storage details.

pub mod catch_service;
pub mod profile_service;
pub mod provisioner;

/// Last path component of an uploaded file name, or `None` when nothing
/// usable remains.
pub(crate) fn blob_file_name(raw: &str) -> Option<&str> {
    let base = raw
        .rsplit(|c: char| c == '/' || c == '\\')
        .next()
        .unwrap_or(raw)
        .trim();
    if base.is_empty() || base == "." || base == ".." {
        None
    } else {
        Some(base)
    }
}
