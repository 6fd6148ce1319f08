//! Error types for database operations.

use thiserror::Error;

/// Errors surfaced by a [`Backend`](crate::backend::Backend).
#[derive(Error, Debug)]
pub enum DbError {
    /// The client could not be created from the configured connection string.
    #[error("Initialization error: {0}")]
    Initialization(String),
    /// A document with the given id already exists in the collection.
    #[error("Document {0} already exists in collection {1}")]
    DuplicateKey(String, String),
    /// An error reported by the underlying storage engine.
    #[error("Backend error: {0}")]
    Backend(String),
}

pub type DbResult<T> = Result<T, DbError>;

impl From<mongodb::error::Error> for DbError {
    fn from(err: mongodb::error::Error) -> Self {
        DbError::Backend(err.to_string())
    }
}
