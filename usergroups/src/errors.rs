use crate::db::errors::DbError;
use thiserror::Error as ThisError;

#[derive(ThisError, Debug)]
pub enum Error {
    /// Invalid request data or business rule violation
    #[error("{message}")]
    BadRequest { message: String },

    /// Conflict error, e.g. registering an email that already has an account
    #[error("Conflict: {message}")]
    Conflict { message: String },

    /// Generic internal service error
    #[error("Failed to {operation}")]
    Internal { operation: String },

    /// Database operation error
    #[error(transparent)]
    Database(#[from] DbError),
}

impl Error {
    /// True when the underlying cause is a missing row.
    ///
    /// Identity lookups may surface absence this way instead of returning `Ok(None)`;
    /// callers treat both the same.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::Database(DbError::NotFound))
    }
}
