//! In-memory backend.
//!
//! Collections are ordered maps keyed by `ObjectId`, so iteration follows
//! creation order the same way a MongoDB natural scan of freshly inserted
//! documents does.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use bson::{oid::ObjectId, Document};
use tokio::sync::RwLock;

use crate::{
    backend::Backend,
    error::{DbError, DbResult},
};

type CollectionMap = BTreeMap<ObjectId, Document>;
type StoreMap = HashMap<String, CollectionMap>;

/// Process-local document store. Clones share the same data.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    store: Arc<RwLock<StoreMap>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Backend for MemoryBackend {
    async fn insert_one(&self, collection: &str, document: Document) -> DbResult<()> {
        let id = document
            .get_object_id("_id")
            .map_err(|e| DbError::Backend(format!("document is missing an ObjectId _id: {e}")))?;

        let mut store = self.store.write().await;
        let collection_map = store.entry(collection.to_string()).or_default();

        if collection_map.contains_key(&id) {
            return Err(DbError::DuplicateKey(id.to_hex(), collection.to_string()));
        }

        collection_map.insert(id, document);
        Ok(())
    }

    async fn find_all(&self, collection: &str) -> DbResult<Vec<Document>> {
        Ok(self
            .store
            .read()
            .await
            .get(collection)
            .map(|documents| documents.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn find_by_id(&self, collection: &str, id: ObjectId) -> DbResult<Option<Document>> {
        Ok(self
            .store
            .read()
            .await
            .get(collection)
            .and_then(|documents| documents.get(&id))
            .cloned())
    }

    async fn find_by_ids(&self, collection: &str, ids: &[ObjectId]) -> DbResult<Vec<Document>> {
        let store = self.store.read().await;
        let Some(documents) = store.get(collection) else {
            return Ok(Vec::new());
        };

        Ok(ids
            .iter()
            .filter_map(|id| documents.get(id))
            .cloned()
            .collect())
    }

    async fn update_by_id(
        &self,
        collection: &str,
        id: ObjectId,
        set: Document,
    ) -> DbResult<Option<Document>> {
        let mut store = self.store.write().await;
        let Some(document) = store
            .get_mut(collection)
            .and_then(|documents| documents.get_mut(&id))
        else {
            return Ok(None);
        };

        for (field, value) in set {
            if field == "_id" {
                continue;
            }
            document.insert(field, value);
        }

        Ok(Some(document.clone()))
    }

    async fn delete_by_id(&self, collection: &str, id: ObjectId) -> DbResult<Option<Document>> {
        Ok(self
            .store
            .write()
            .await
            .get_mut(collection)
            .and_then(|documents| documents.remove(&id)))
    }

    async fn create_index(&self, _collection: &str, _field: &str, _unique: bool) -> DbResult<()> {
        // Lookups scan the collection; indexes are a no-op here.
        Ok(())
    }

    async fn ping(&self) -> DbResult<()> {
        Ok(())
    }

    async fn shutdown(&self) -> DbResult<()> {
        self.store.write().await.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    fn book(id: ObjectId, title: &str) -> Document {
        doc! { "_id": id, "title": title, "quantity": 0_i64 }
    }

    #[tokio::test]
    async fn insert_then_find_all_keeps_creation_order() {
        let backend = MemoryBackend::new();
        let first = ObjectId::new();
        let second = ObjectId::new();

        backend.insert_one("books", book(first, "A")).await.unwrap();
        backend.insert_one("books", book(second, "B")).await.unwrap();

        let all = backend.find_all("books").await.unwrap();
        let titles: Vec<_> = all.iter().map(|d| d.get_str("title").unwrap()).collect();
        assert_eq!(titles, vec!["A", "B"]);
    }

    #[tokio::test]
    async fn insert_rejects_duplicate_ids() {
        let backend = MemoryBackend::new();
        let id = ObjectId::new();

        backend.insert_one("books", book(id, "A")).await.unwrap();
        let err = backend.insert_one("books", book(id, "B")).await.unwrap_err();
        assert!(matches!(err, DbError::DuplicateKey(_, _)));
    }

    #[tokio::test]
    async fn insert_requires_an_object_id() {
        let backend = MemoryBackend::new();
        let err = backend
            .insert_one("books", doc! { "title": "no id" })
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Backend(_)));
    }

    #[tokio::test]
    async fn update_sets_only_given_fields() {
        let backend = MemoryBackend::new();
        let id = ObjectId::new();
        backend.insert_one("books", book(id, "A")).await.unwrap();

        let updated = backend
            .update_by_id("books", id, doc! { "quantity": 7_i64 })
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated.get_str("title").unwrap(), "A");
        assert_eq!(updated.get_i64("quantity").unwrap(), 7);
    }

    #[tokio::test]
    async fn update_of_missing_document_returns_none() {
        let backend = MemoryBackend::new();
        let updated = backend
            .update_by_id("books", ObjectId::new(), doc! { "title": "x" })
            .await
            .unwrap();
        assert!(updated.is_none());
    }

    #[tokio::test]
    async fn update_never_rewrites_the_id() {
        let backend = MemoryBackend::new();
        let id = ObjectId::new();
        backend.insert_one("books", book(id, "A")).await.unwrap();

        let updated = backend
            .update_by_id("books", id, doc! { "_id": ObjectId::new() })
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.get_object_id("_id").unwrap(), id);
    }

    #[tokio::test]
    async fn delete_returns_removed_document_once() {
        let backend = MemoryBackend::new();
        let id = ObjectId::new();
        backend.insert_one("books", book(id, "A")).await.unwrap();

        assert!(backend.delete_by_id("books", id).await.unwrap().is_some());
        assert!(backend.delete_by_id("books", id).await.unwrap().is_none());
        assert!(backend.find_by_id("books", id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn find_by_ids_skips_unknown_ids() {
        let backend = MemoryBackend::new();
        let known = ObjectId::new();
        backend.insert_one("authors", book(known, "x")).await.unwrap();

        let found = backend
            .find_by_ids("authors", &[known, ObjectId::new()])
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
    }
}
