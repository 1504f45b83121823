//! Identity store: the capability the seeder uses to look up and register users.
//!
//! [`UserManager`] is the SQLite-backed implementation: it validates the request, hashes
//! the credential with Argon2id and writes through the [`Users`] repository.

use crate::auth::password::{self, Argon2Params};
use crate::config::PasswordConfig;
use crate::db::{
    handlers::{Repository, Users},
    models::users::{UserCreateDBRequest, UserDBResponse, UserUpdateDBRequest},
};
use crate::db::errors::DbError;
use crate::errors::Error;
use crate::types::UserId;
use sqlx::SqliteConnection;
use tracing::{debug, instrument};

/// Registration request carrying a plaintext credential.
#[derive(Debug, Clone)]
pub struct UserCreate {
    pub email: String,
    pub password: String,
    pub is_active: bool,
    pub is_superuser: bool,
    pub is_verified: bool,
}

impl UserCreate {
    /// An active, unverified, non-superuser account.
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
            is_active: true,
            is_superuser: false,
            is_verified: false,
        }
    }

    pub fn with_superuser(mut self, is_superuser: bool) -> Self {
        self.is_superuser = is_superuser;
        self
    }
}

/// Partial update of an identity. `None` leaves the field unchanged; a new password is hashed
/// before it is stored.
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    pub email: Option<String>,
    pub password: Option<String>,
    pub is_active: Option<bool>,
    pub is_superuser: Option<bool>,
    pub is_verified: Option<bool>,
}

/// Lookup, registration and update of identities.
///
/// Every call runs on the connection the caller passes in, so the caller decides the
/// transaction boundaries. A user returned from [`IdentityStore::create`] is visible on that
/// same connection and can be modified further before the caller commits.
#[async_trait::async_trait]
pub trait IdentityStore: Send + Sync {
    /// `Ok(None)` for an unknown email. Implementations may instead report absence as an
    /// error for which [`Error::is_not_found`] holds; callers must accept both.
    async fn find_by_email(&self, conn: &mut SqliteConnection, email: &str) -> Result<Option<UserDBResponse>, Error>;

    /// Register a new identity.
    async fn create(&self, conn: &mut SqliteConnection, request: &UserCreate) -> Result<UserDBResponse, Error>;

    /// Update an existing identity. Taking an email that belongs to another user is a conflict.
    async fn update(&self, conn: &mut SqliteConnection, id: UserId, request: &UserUpdate) -> Result<UserDBResponse, Error>;
}

/// SQLite-backed identity store.
#[derive(Debug, Clone)]
pub struct UserManager {
    password: PasswordConfig,
}

impl UserManager {
    pub fn new(password: PasswordConfig) -> Self {
        Self { password }
    }

    fn argon2_params(&self) -> Argon2Params {
        Argon2Params {
            memory_kib: self.password.argon2_memory_kib,
            iterations: self.password.argon2_iterations,
            parallelism: self.password.argon2_parallelism,
        }
    }

    fn validate_email(&self, email: &str) -> Result<(), Error> {
        let trimmed = email.trim();
        if trimmed.is_empty() || !trimmed.contains('@') {
            return Err(Error::BadRequest {
                message: format!("Invalid email address: '{email}'"),
            });
        }
        Ok(())
    }

    fn validate_password(&self, password: &str) -> Result<(), Error> {
        let len = password.chars().count();
        if len < self.password.min_length {
            return Err(Error::BadRequest {
                message: format!("Password must be at least {} characters", self.password.min_length),
            });
        }
        if len > self.password.max_length {
            return Err(Error::BadRequest {
                message: format!("Password must be at most {} characters", self.password.max_length),
            });
        }
        Ok(())
    }

    /// Check a credential. Returns the user only if it exists, is active and the password matches.
    #[instrument(skip(self, conn, password), err)]
    pub async fn authenticate(&self, conn: &mut SqliteConnection, email: &str, password: &str) -> Result<Option<UserDBResponse>, Error> {
        let Some(user) = self.find_by_email(conn, email).await? else {
            return Ok(None);
        };

        if !user.is_active {
            debug!("Rejecting login for inactive user");
            return Ok(None);
        }

        if password::verify_string(password, &user.hashed_password)? {
            Ok(Some(user))
        } else {
            Ok(None)
        }
    }
}

#[async_trait::async_trait]
impl IdentityStore for UserManager {
    async fn find_by_email(&self, conn: &mut SqliteConnection, email: &str) -> Result<Option<UserDBResponse>, Error> {
        let mut users = Users::new(conn);
        Ok(users.get_user_by_email(email).await?)
    }

    #[instrument(skip(self, conn, request), fields(email = %request.email), err)]
    async fn create(&self, conn: &mut SqliteConnection, request: &UserCreate) -> Result<UserDBResponse, Error> {
        self.validate_email(&request.email)?;
        self.validate_password(&request.password)?;

        if self.find_by_email(conn, &request.email).await?.is_some() {
            return Err(Error::Conflict {
                message: format!("User '{}' already exists", request.email),
            });
        }

        let hashed_password = password::hash_string_with_params(&request.password, self.argon2_params())?;

        let mut users = Users::new(conn);
        let user = users
            .create(&UserCreateDBRequest {
                email: request.email.clone(),
                hashed_password,
                is_active: request.is_active,
                is_superuser: request.is_superuser,
                is_verified: request.is_verified,
                group_id: None,
            })
            .await?;

        Ok(user)
    }

    #[instrument(skip(self, conn, request), fields(user_id = %crate::types::abbrev_uuid(&id)), err)]
    async fn update(&self, conn: &mut SqliteConnection, id: UserId, request: &UserUpdate) -> Result<UserDBResponse, Error> {
        if let Some(email) = &request.email {
            self.validate_email(email)?;
            if let Some(other) = self.find_by_email(conn, email).await?
                && other.id != id
            {
                return Err(Error::Conflict {
                    message: format!("User '{email}' already exists"),
                });
            }
        }

        let hashed_password = match &request.password {
            Some(password) => {
                self.validate_password(password)?;
                Some(password::hash_string_with_params(password, self.argon2_params())?)
            }
            None => None,
        };

        let mut users = Users::new(conn);
        let result = users
            .update(
                id,
                &UserUpdateDBRequest {
                    email: request.email.clone(),
                    hashed_password,
                    is_active: request.is_active,
                    is_superuser: request.is_superuser,
                    is_verified: request.is_verified,
                },
            )
            .await;

        match result {
            Ok(user) => Ok(user),
            Err(DbError::UniqueViolation { .. }) => Err(Error::Conflict {
                message: format!("User '{}' already exists", request.email.as_deref().unwrap_or_default()),
            }),
            Err(e) => Err(e.into()),
        }
    }
}
