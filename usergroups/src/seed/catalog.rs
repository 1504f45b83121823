//! The catalog of groups and users the seeder ensures.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::SeedError;

/// One user the seeder should make sure exists.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SeedUser {
    pub email: String,
    /// Plaintext initial credential; hashed by the identity store on creation
    pub password: String,
    /// Name of the group to link the user to. A name missing from the catalog leaves the user
    /// without a group.
    pub group: String,
    #[serde(default)]
    pub is_superuser: bool,
}

impl SeedUser {
    pub fn new(email: &str, password: &str, group: &str) -> Self {
        Self {
            email: email.to_string(),
            password: password.to_string(),
            group: group.to_string(),
            is_superuser: false,
        }
    }

    pub fn superuser(mut self) -> Self {
        self.is_superuser = true;
        self
    }
}

/// Ordered groups and users to seed.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct SeedCatalog {
    pub groups: Vec<String>,
    pub users: Vec<SeedUser>,
}

impl Default for SeedCatalog {
    /// The sample data: three groups and six users.
    fn default() -> Self {
        Self {
            groups: vec!["Admin".to_string(), "Developer".to_string(), "Guest".to_string()],
            users: vec![
                SeedUser::new("admin@example.com", "admin123", "Admin").superuser(),
                SeedUser::new("dev1@example.com", "dev123", "Developer"),
                SeedUser::new("dev2@example.com", "dev456", "Developer"),
                SeedUser::new("guest1@example.com", "guest123", "Guest"),
                SeedUser::new("guest2@example.com", "guest456", "Guest"),
                SeedUser::new("guest3@example.com", "guest789", "Guest"),
            ],
        }
    }
}

impl SeedCatalog {
    /// Group names and user emails must each be distinct and non-empty. Emails are compared
    /// case-insensitively, as the store does.
    pub fn validate(&self) -> Result<(), SeedError> {
        let mut names = HashSet::new();
        for name in &self.groups {
            if name.trim().is_empty() {
                return Err(SeedError::InvalidCatalog("group names must not be empty".to_string()));
            }
            if !names.insert(name.as_str()) {
                return Err(SeedError::InvalidCatalog(format!("duplicate group '{name}'")));
            }
        }

        let mut emails = HashSet::new();
        for user in &self.users {
            if user.email.trim().is_empty() {
                return Err(SeedError::InvalidCatalog("user emails must not be empty".to_string()));
            }
            if !emails.insert(user.email.to_lowercase()) {
                return Err(SeedError::InvalidCatalog(format!("duplicate user '{}'", user.email)));
            }
        }

        Ok(())
    }
}
