//! Identity and credential handling.
//!
//! # Modules
//!
//! - [`identity`]: The [`identity::IdentityStore`] capability and its SQLite-backed
//!   implementation, [`identity::UserManager`]
//! - [`password`]: Password hashing and verification using Argon2id
//!
//! Token issuance and sessions are not part of this crate.

pub mod identity;
pub mod password;

pub use identity::{IdentityStore, UserCreate, UserManager, UserUpdate};
