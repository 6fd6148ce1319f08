use std::collections::BTreeSet;

use bson::oid::ObjectId;
use chrono::Utc;
use shelf_db::{Collection, Database};

use super::models::{Book, BookPatch, NewBook, PopulatedBook, COLLECTION};
use crate::{
    error::StoreResult,
    modules::authors::store::AuthorStore,
    utils::coerce,
};

/// Persistence for books. Each operation is a single database call, plus
/// one batched author lookup when listing.
#[derive(Debug, Clone)]
pub struct BookStore {
    books: Collection,
    authors: AuthorStore,
}

impl BookStore {
    pub fn new(db: &Database, authors: AuthorStore) -> Self {
        Self {
            books: db.collection(COLLECTION),
            authors,
        }
    }

    pub async fn create(&self, new_book: NewBook) -> StoreResult<Book> {
        new_book.validate()?;

        let book = new_book.into_book(Utc::now());
        self.books
            .insert_one(bson::ser::serialize_to_document(&book)?)
            .await?;

        tracing::info!(book_id = %book.id, author_id = ?book.author, "book created");
        Ok(book)
    }

    /// Every book in creation order, with author references resolved where
    /// the referenced author exists.
    pub async fn list_all(&self) -> StoreResult<Vec<PopulatedBook>> {
        let books = self
            .books
            .find_all()
            .await?
            .into_iter()
            .map(bson::de::deserialize_from_document::<Book>)
            .collect::<Result<Vec<_>, _>>()?;

        let author_ids: Vec<ObjectId> = books
            .iter()
            .filter_map(|book| book.author)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let authors = self.authors.find_by_ids(&author_ids).await?;

        tracing::debug!(
            books = books.len(),
            referenced_authors = author_ids.len(),
            resolved_authors = authors.len(),
            "books retrieved"
        );

        Ok(books
            .into_iter()
            .map(|book| {
                let author = book.author.and_then(|id| authors.get(&id).cloned());
                PopulatedBook { book, author }
            })
            .collect())
    }

    /// Apply `patch` to the book with `id` and return the result, or `None`
    /// when no book has that id.
    pub async fn update_by_id(&self, id: &str, patch: BookPatch) -> StoreResult<Option<Book>> {
        let id = coerce::path_id(id)?;
        patch.validate()?;

        let set = patch.to_set_document();
        let document = if set.is_empty() {
            self.books.find_by_id(id).await?
        } else {
            self.books.update_by_id(id, set).await?
        };

        let updated = document
            .map(bson::de::deserialize_from_document::<Book>)
            .transpose()?;

        match &updated {
            Some(book) => tracing::info!(book_id = %book.id, "book updated"),
            None => tracing::info!(book_id = %id, "book to update not found"),
        }

        Ok(updated)
    }

    /// Remove the book with `id`. Returns whether one existed; callers treat
    /// both outcomes as success.
    pub async fn delete_by_id(&self, id: &str) -> StoreResult<bool> {
        let id = coerce::path_id(id)?;
        let existed = self.books.delete_by_id(id).await?.is_some();

        tracing::info!(book_id = %id, existed, "book deleted");
        Ok(existed)
    }
}
