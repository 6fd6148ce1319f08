use std::collections::HashMap;

use bson::oid::ObjectId;
use shelf_db::{Collection, Database};

use super::models::{Author, NewAuthor, COLLECTION};
use crate::error::StoreResult;

/// Persistence for authors.
///
/// Only creation is exposed over HTTP. `find_by_ids` backs the author
/// expansion done when books are listed.
#[derive(Debug, Clone)]
pub struct AuthorStore {
    authors: Collection,
}

impl AuthorStore {
    pub fn new(db: &Database) -> Self {
        Self {
            authors: db.collection(COLLECTION),
        }
    }

    pub async fn create(&self, new_author: NewAuthor) -> StoreResult<Author> {
        let author = new_author.into_author();
        self.authors
            .insert_one(bson::ser::serialize_to_document(&author)?)
            .await?;

        tracing::info!(author_id = %author.id, "author created");
        Ok(author)
    }

    /// Authors keyed by id. Ids with no stored author are absent from the map.
    pub async fn find_by_ids(&self, ids: &[ObjectId]) -> StoreResult<HashMap<ObjectId, Author>> {
        self.authors
            .find_by_ids(ids)
            .await?
            .into_iter()
            .map(|document| -> StoreResult<(ObjectId, Author)> {
                let author: Author = bson::de::deserialize_from_document(document)?;
                Ok((author.id, author))
            })
            .collect()
    }
}
