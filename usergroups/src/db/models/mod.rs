//! Database record models matching table schemas.
//!
//! These models are used by repositories to return query results and accept
//! insertion data. Row structs that derive `sqlx::FromRow` stay private to the
//! repositories; the types here are what the rest of the crate sees.
//!
//! - [`users`]: User accounts and credentials
//! - [`groups`]: Group definitions

pub mod groups;
pub mod users;
