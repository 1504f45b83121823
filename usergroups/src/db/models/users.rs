//! Database models for users.

use crate::types::{GroupId, UserId};
use chrono::{DateTime, Utc};

/// Database request for creating a new user
///
/// The credential must already be hashed; see [`crate::auth::password`].
#[derive(Debug, Clone)]
pub struct UserCreateDBRequest {
    pub email: String,
    pub hashed_password: String,
    pub is_active: bool,
    pub is_superuser: bool,
    pub is_verified: bool,
    pub group_id: Option<GroupId>,
}

/// Database response for a user
#[derive(Debug, Clone)]
pub struct UserDBResponse {
    pub id: UserId,
    pub email: String,
    pub hashed_password: String,
    pub is_active: bool,
    pub is_superuser: bool,
    pub is_verified: bool,
    pub group_id: Option<GroupId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Database request for updating a user. `None` leaves the column unchanged.
///
/// A new credential must already be hashed.
#[derive(Debug, Clone, Default)]
pub struct UserUpdateDBRequest {
    pub email: Option<String>,
    pub hashed_password: Option<String>,
    pub is_active: Option<bool>,
    pub is_superuser: Option<bool>,
    pub is_verified: Option<bool>,
}
