//! The storage seam every database handle delegates to.

use std::fmt::Debug;

use async_trait::async_trait;
use bson::{oid::ObjectId, Document};

use crate::error::DbResult;

/// A document store addressed by collection name.
///
/// Documents are raw BSON and carry their identifier under `_id`. All
/// operations are attempted exactly once; nothing here retries.
#[async_trait]
pub trait Backend: Send + Sync + Debug {
    /// Persist a new document. The document must already contain `_id`.
    async fn insert_one(&self, collection: &str, document: Document) -> DbResult<()>;

    /// Every document in the collection, ordered by `_id`.
    async fn find_all(&self, collection: &str) -> DbResult<Vec<Document>>;

    async fn find_by_id(&self, collection: &str, id: ObjectId) -> DbResult<Option<Document>>;

    /// Documents whose `_id` is in `ids`. Missing ids are skipped silently.
    async fn find_by_ids(&self, collection: &str, ids: &[ObjectId]) -> DbResult<Vec<Document>>;

    /// Apply `set` as a field-level `$set` and return the post-update
    /// document, or `None` when no document matches `id`.
    async fn update_by_id(
        &self,
        collection: &str,
        id: ObjectId,
        set: Document,
    ) -> DbResult<Option<Document>>;

    /// Remove a document, returning it if it existed.
    async fn delete_by_id(&self, collection: &str, id: ObjectId) -> DbResult<Option<Document>>;

    async fn create_index(&self, collection: &str, field: &str, unique: bool) -> DbResult<()>;

    /// Round-trip to the server to check connectivity.
    async fn ping(&self) -> DbResult<()>;

    async fn shutdown(&self) -> DbResult<()>;
}
