//! Repository implementations for database access.
//!
//! Each repository:
//! - Wraps a SQLx connection or transaction
//! - Provides strongly-typed operations
//! - Handles query construction and parameter binding
//! - Returns domain models from [`crate::db::models`]
//!
//! # Available Repositories
//!
//! - [`Users`]: User accounts, lookup by email and group assignment
//! - [`Groups`]: Group definitions and group membership listing
//!
//! # Common Pattern
//!
//! ```ignore
//! use usergroups::db::handlers::{Groups, Repository};
//!
//! async fn example(pool: &sqlx::SqlitePool) -> Result<(), Box<dyn std::error::Error>> {
//!     let mut tx = pool.begin().await?;
//!     let mut repo = Groups::new(&mut tx);
//!     let admins = repo.get_by_name("Admin").await?;
//!     tx.commit().await?;
//!     Ok(())
//! }
//! ```

pub mod groups;
pub mod repository;
pub mod users;

pub use groups::Groups;
pub use repository::Repository;
pub use users::Users;
