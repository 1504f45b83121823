//! Common type definitions.
//!
//! # ID Types
//!
//! - [`UserId`]: User account identifier, a UUID assigned when the identity is created
//! - [`GroupId`]: Group identifier, a surrogate integer assigned by the database
//!
//! # Utility Functions
//!
//! - [`abbrev_uuid`]: Abbreviate UUIDs to first 8 chars for logging

use uuid::Uuid;

// Type aliases for IDs
pub type UserId = Uuid;
pub type GroupId = i64;

/// Abbreviate a UUID to its first 8 characters for more readable logs and traces
/// Example: "550e8400-e29b-41d4-a716-446655440000" -> "550e8400"
pub fn abbrev_uuid(uuid: &Uuid) -> String {
    uuid.to_string().chars().take(8).collect()
}
