//! The single failure kind stores report to their callers.

use shelf_db::DbError;
use thiserror::Error;

/// Anything that stops a store operation from completing.
///
/// Every variant is answered with HTTP 500 and a fixed per-route message;
/// the variant only matters for the server-side log.
#[derive(Error, Debug)]
pub enum StoreError {
    /// An identifier that is not a valid ObjectId.
    #[error("Cast to ObjectId failed for value \"{0}\"")]
    InvalidId(String),
    /// A field failed type coercion or a schema constraint.
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error(transparent)]
    Database(#[from] DbError),
    /// A stored document did not match the record shape.
    #[error("Document mapping failed: {0}")]
    Bson(#[from] bson::error::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;
