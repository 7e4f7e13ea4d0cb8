//! External capability contracts.
//!
//! The managed backend owns authentication, the profile table and object
//! storage. Core code consumes them only through these traits so the same
//! logic runs against the hosted backend, the local SQLite store and test
//! fakes.

pub mod auth;
pub mod storage;
