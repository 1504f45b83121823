//! Database models for groups.

use crate::types::GroupId;

/// Database request for creating a new group
#[derive(Debug, Clone)]
pub struct GroupCreateDBRequest {
    pub name: String,
}

impl GroupCreateDBRequest {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Database response for a group
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupDBResponse {
    pub id: GroupId,
    pub name: String,
}
