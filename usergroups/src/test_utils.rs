//! Test utilities shared by the unit tests.

use crate::auth::identity::{IdentityStore, UserCreate, UserManager, UserUpdate};
use crate::auth::password::Argon2Params;
use crate::config::PasswordConfig;
use crate::db::{
    errors::DbError,
    handlers::{Repository, Users},
    models::users::{UserCreateDBRequest, UserDBResponse},
};
use crate::errors::Error;
use crate::types::UserId;
use sqlx::SqliteConnection;
use std::collections::HashSet;

/// Argon2 parameters cheap enough to hash many passwords per test.
pub fn fast_argon2_params() -> Argon2Params {
    Argon2Params {
        memory_kib: 1024,
        iterations: 1,
        parallelism: 1,
    }
}

pub fn test_password_config() -> PasswordConfig {
    let params = fast_argon2_params();
    PasswordConfig {
        argon2_memory_kib: params.memory_kib,
        argon2_iterations: params.iterations,
        argon2_parallelism: params.parallelism,
        ..Default::default()
    }
}

pub fn test_user_manager() -> UserManager {
    UserManager::new(test_password_config())
}

/// Insert a user directly through the repository, bypassing the identity store.
pub async fn create_test_user(conn: &mut SqliteConnection, email: &str) -> UserDBResponse {
    Users::new(conn)
        .create(&UserCreateDBRequest {
            email: email.to_string(),
            hashed_password: "not-a-real-hash".to_string(),
            is_active: true,
            is_superuser: false,
            is_verified: false,
            group_id: None,
        })
        .await
        .expect("Failed to create test user")
}

/// Identity store that rejects creation of selected emails.
pub struct FailingIdentityStore {
    inner: UserManager,
    reject: HashSet<String>,
}

impl FailingIdentityStore {
    pub fn new<'a>(inner: UserManager, reject: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            inner,
            reject: reject.into_iter().map(str::to_string).collect(),
        }
    }
}

#[async_trait::async_trait]
impl IdentityStore for FailingIdentityStore {
    async fn find_by_email(&self, conn: &mut SqliteConnection, email: &str) -> Result<Option<UserDBResponse>, Error> {
        self.inner.find_by_email(conn, email).await
    }

    async fn create(&self, conn: &mut SqliteConnection, request: &UserCreate) -> Result<UserDBResponse, Error> {
        if self.reject.contains(&request.email) {
            return Err(Error::Internal {
                operation: format!("create user {}: simulated store rejection", request.email),
            });
        }
        self.inner.create(conn, request).await
    }

    async fn update(&self, conn: &mut SqliteConnection, id: UserId, request: &UserUpdate) -> Result<UserDBResponse, Error> {
        self.inner.update(conn, id, request).await
    }
}

/// Identity store that reports a missing user as a not-found error instead of `Ok(None)`.
pub struct NotFoundAsErrorIdentityStore {
    inner: UserManager,
}

impl NotFoundAsErrorIdentityStore {
    pub fn new(inner: UserManager) -> Self {
        Self { inner }
    }
}

#[async_trait::async_trait]
impl IdentityStore for NotFoundAsErrorIdentityStore {
    async fn find_by_email(&self, conn: &mut SqliteConnection, email: &str) -> Result<Option<UserDBResponse>, Error> {
        match self.inner.find_by_email(conn, email).await? {
            Some(user) => Ok(Some(user)),
            None => Err(Error::Database(DbError::NotFound)),
        }
    }

    async fn create(&self, conn: &mut SqliteConnection, request: &UserCreate) -> Result<UserDBResponse, Error> {
        self.inner.create(conn, request).await
    }

    async fn update(&self, conn: &mut SqliteConnection, id: UserId, request: &UserUpdate) -> Result<UserDBResponse, Error> {
        self.inner.update(conn, id, request).await
    }
}
