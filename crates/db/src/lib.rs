//! Database handle for shelf.
//!
//! A [`Database`] is created once at process start and passed explicitly to
//! every store that needs it. It wraps one of two [`Backend`]s:
//!
//! - [`MongoBackend`] talks to a MongoDB deployment through the official
//!   async driver.
//! - [`MemoryBackend`] keeps collections in process memory and is what the
//!   test suites run against.
//!
//! ```ignore
//! let db = Database::connect(BackendKind::MongoDb, "mongodb://127.0.0.1:27017", "shelf-dev").await?;
//! let books = db.collection("books");
//! let all = books.find_all().await?;
//! db.shutdown().await?;
//! ```

use std::sync::Arc;

use bson::{oid::ObjectId, Document};
use serde::Deserialize;

pub mod backend;
pub mod error;
pub mod memory;
pub mod mongo;

pub use backend::Backend;
pub use error::{DbError, DbResult};
pub use memory::MemoryBackend;
pub use mongo::MongoBackend;

/// Which backend a [`Database`] should be opened with.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    MongoDb,
    Memory,
}

/// Shared, cheaply cloneable handle to the document store.
#[derive(Debug, Clone)]
pub struct Database {
    name: String,
    backend: Arc<dyn Backend>,
}

impl Database {
    /// Open a database using the given backend.
    ///
    /// For MongoDB this only parses the connection string and builds the
    /// client; the driver connects lazily, so call [`Database::ping`] to
    /// find out whether the server is actually reachable.
    pub async fn connect(kind: BackendKind, uri: &str, name: &str) -> DbResult<Self> {
        let backend: Arc<dyn Backend> = match kind {
            BackendKind::MongoDb => Arc::new(MongoBackend::connect(uri, name).await?),
            BackendKind::Memory => Arc::new(MemoryBackend::new()),
        };

        tracing::debug!(target: "shelf-db", backend = ?kind, database = name, "database handle created");

        Ok(Self {
            name: name.to_string(),
            backend,
        })
    }

    /// A fresh, empty in-memory database.
    pub fn in_memory() -> Self {
        Self::with_backend("memory", Arc::new(MemoryBackend::new()))
    }

    pub fn with_backend(name: &str, backend: Arc<dyn Backend>) -> Self {
        Self {
            name: name.to_string(),
            backend,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Handle scoped to a single collection.
    pub fn collection(&self, name: &'static str) -> Collection {
        Collection {
            name,
            backend: Arc::clone(&self.backend),
        }
    }

    pub async fn ping(&self) -> DbResult<()> {
        self.backend.ping().await
    }

    pub async fn create_index(&self, collection: &str, field: &str, unique: bool) -> DbResult<()> {
        self.backend.create_index(collection, field, unique).await
    }

    /// Release the underlying client. The handle must not be used afterwards.
    pub async fn shutdown(&self) -> DbResult<()> {
        tracing::info!(target: "shelf-db", database = %self.name, "shutting down database handle");
        self.backend.shutdown().await
    }
}

/// A [`Database`] narrowed to one named collection.
#[derive(Debug, Clone)]
pub struct Collection {
    name: &'static str,
    backend: Arc<dyn Backend>,
}

impl Collection {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub async fn insert_one(&self, document: Document) -> DbResult<()> {
        self.backend.insert_one(self.name, document).await
    }

    pub async fn find_all(&self) -> DbResult<Vec<Document>> {
        self.backend.find_all(self.name).await
    }

    pub async fn find_by_id(&self, id: ObjectId) -> DbResult<Option<Document>> {
        self.backend.find_by_id(self.name, id).await
    }

    pub async fn find_by_ids(&self, ids: &[ObjectId]) -> DbResult<Vec<Document>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        self.backend.find_by_ids(self.name, ids).await
    }

    pub async fn update_by_id(&self, id: ObjectId, set: Document) -> DbResult<Option<Document>> {
        self.backend.update_by_id(self.name, id, set).await
    }

    pub async fn delete_by_id(&self, id: ObjectId) -> DbResult<Option<Document>> {
        self.backend.delete_by_id(self.name, id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    #[tokio::test]
    async fn collections_share_the_same_backend() {
        let db = Database::in_memory();
        let id = ObjectId::new();

        db.collection("books")
            .insert_one(doc! { "_id": id, "title": "Dune" })
            .await
            .unwrap();

        let found = db.collection("books").find_by_id(id).await.unwrap();
        assert_eq!(found.unwrap().get_str("title").unwrap(), "Dune");
        assert!(db.collection("authors").find_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn memory_kind_connects_without_a_server() {
        let db = Database::connect(BackendKind::Memory, "", "test")
            .await
            .unwrap();
        assert_eq!(db.name(), "test");
        db.ping().await.unwrap();
        db.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn find_by_ids_with_no_ids_is_empty() {
        let db = Database::in_memory();
        let found = db.collection("authors").find_by_ids(&[]).await.unwrap();
        assert!(found.is_empty());
    }

    #[test]
    fn backend_kind_deserializes_lowercase() {
        #[derive(Deserialize)]
        struct Wrapper {
            backend: BackendKind,
        }

        let parsed: Wrapper =
            bson::de::deserialize_from_document(doc! { "backend": "memory" }).unwrap();
        assert_eq!(parsed.backend, BackendKind::Memory);

        let parsed: Wrapper =
            bson::de::deserialize_from_document(doc! { "backend": "mongodb" }).unwrap();
        assert_eq!(parsed.backend, BackendKind::MongoDb);
    }
}
