use bson::{oid::ObjectId, Bson, Document};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::{
    error::{StoreError, StoreResult},
    modules::authors::models::{Author, AuthorView},
    utils::coerce,
};

pub const COLLECTION: &str = "books";

/// Longest accepted `description`, in characters.
pub const DESCRIPTION_MAX_CHARS: usize = 1000;

/// A book as stored in the `books` collection.
///
/// `author` is a plain lookup key into `authors`; nothing checks that it
/// points at an existing author and deleting an author leaves it dangling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_published: Option<bson::DateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<ObjectId>,
}

/// Request body for creating a book.
///
/// Only these five fields are read; `lastPublished` is always the insertion
/// time. `quantity` keeps absent (`None`, defaults to 0) apart from an
/// explicit `null` (`Some(None)`, stored without a quantity).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBook {
    #[serde(default, deserialize_with = "coerce::lenient_text")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "coerce::lenient_number")]
    pub year: Option<f64>,
    #[serde(default, deserialize_with = "coerce::lenient_text")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "coerce::patch_number")]
    pub quantity: Option<Option<f64>>,
    #[serde(default, deserialize_with = "coerce::lenient_object_id")]
    pub author: Option<ObjectId>,
}

impl NewBook {
    pub fn from_json(value: Value) -> StoreResult<Self> {
        coerce::body(value)
    }

    pub fn validate(&self) -> StoreResult<()> {
        check_description(self.description.as_deref())?;
        check_quantity(self.quantity.flatten())
    }

    /// Fill in defaults: a fresh id, `quantity` 0 when absent and `lastPublished` = `now`.
    pub fn into_book(self, now: DateTime<Utc>) -> Book {
        Book {
            id: ObjectId::new(),
            title: self.title,
            year: self.year,
            description: self.description,
            quantity: self.quantity.unwrap_or(Some(0.0)),
            last_published: Some(bson::DateTime::from_chrono(now)),
            author: self.author,
        }
    }
}

/// Partial update of a book.
///
/// The outer `Option` says whether the field was sent at all, the inner one
/// whether it was sent as `null` (which clears the stored value).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookPatch {
    #[serde(default, deserialize_with = "coerce::patch_text")]
    pub title: Option<Option<String>>,
    #[serde(default, deserialize_with = "coerce::patch_number")]
    pub year: Option<Option<f64>>,
    #[serde(default, deserialize_with = "coerce::patch_text")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "coerce::patch_number")]
    pub quantity: Option<Option<f64>>,
    #[serde(default, deserialize_with = "coerce::patch_timestamp")]
    pub last_published: Option<Option<DateTime<Utc>>>,
    #[serde(default, deserialize_with = "coerce::patch_object_id")]
    pub author: Option<Option<ObjectId>>,
}

impl BookPatch {
    pub fn from_json(value: Value) -> StoreResult<Self> {
        coerce::body(value)
    }

    pub fn validate(&self) -> StoreResult<()> {
        check_description(self.description.as_ref().and_then(|d| d.as_deref()))?;
        check_quantity(self.quantity.flatten())
    }

    /// The `$set` document for this patch; empty when nothing was sent.
    pub fn to_set_document(&self) -> Document {
        let mut set = Document::new();
        put(&mut set, "title", self.title.clone());
        put(&mut set, "year", self.year);
        put(&mut set, "description", self.description.clone());
        put(&mut set, "quantity", self.quantity);
        put(
            &mut set,
            "lastPublished",
            self.last_published
                .map(|value| value.map(bson::DateTime::from_chrono)),
        );
        put(&mut set, "author", self.author);
        set
    }
}

fn put<T: Into<Bson>>(set: &mut Document, field: &str, value: Option<Option<T>>) {
    if let Some(value) = value {
        set.insert(field, value.map_or(Bson::Null, Into::into));
    }
}

/// Length is counted in UTF-16 code units, so an emoji counts twice.
fn check_description(description: Option<&str>) -> StoreResult<()> {
    match description {
        Some(text) if text.encode_utf16().count() > DESCRIPTION_MAX_CHARS => {
            Err(StoreError::Validation(format!(
                "description is longer than the maximum allowed length ({})",
                DESCRIPTION_MAX_CHARS
            )))
        }
        _ => Ok(()),
    }
}

fn check_quantity(quantity: Option<f64>) -> StoreResult<()> {
    match quantity {
        Some(value) if value < 0.0 => Err(StoreError::Validation(format!(
            "quantity ({}) is less than minimum allowed value (0)",
            value
        ))),
        _ => Ok(()),
    }
}

/// A listed book together with the author its reference resolved to.
#[derive(Debug, Clone, PartialEq)]
pub struct PopulatedBook {
    pub book: Book,
    pub author: Option<Author>,
}

/// The `author` field on the wire: the full author when it could be
/// resolved, otherwise the raw id.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(untagged)]
pub enum AuthorRef {
    Populated(AuthorView),
    Id(String),
}

/// JSON shape of a book on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookView {
    /// 24-hex ObjectId
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<f64>)]
    pub year: Option<serde_json::Number>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<f64>)]
    pub quantity: Option<serde_json::Number>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_published: Option<DateTime<Utc>>,
    pub author: Option<AuthorRef>,
}

impl BookView {
    fn with_author(book: Book, author: Option<AuthorRef>) -> Self {
        Self {
            id: book.id.to_hex(),
            title: book.title,
            year: book.year.and_then(coerce::json_number),
            description: book.description,
            quantity: book.quantity.and_then(coerce::json_number),
            last_published: book.last_published.map(|value| value.to_chrono()),
            author,
        }
    }
}

impl From<Book> for BookView {
    fn from(book: Book) -> Self {
        let author = book.author.map(|id| AuthorRef::Id(id.to_hex()));
        Self::with_author(book, author)
    }
}

impl From<PopulatedBook> for BookView {
    fn from(populated: PopulatedBook) -> Self {
        match populated.author {
            Some(author) => Self::with_author(
                populated.book,
                Some(AuthorRef::Populated(author.into())),
            ),
            None => populated.book.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn new_book_defaults_quantity_and_last_published() {
        let book = NewBook::from_json(json!({ "title": "Dune" }))
            .unwrap()
            .into_book(now());

        assert_eq!(book.quantity, Some(0.0));
        assert_eq!(book.last_published.unwrap().to_chrono(), now());
        assert!(book.author.is_none());
    }

    #[test]
    fn new_book_ignores_client_last_published() {
        let book = NewBook::from_json(json!({
            "title": "Dune",
            "lastPublished": "2000-01-01"
        }))
        .unwrap()
        .into_book(now());

        assert_eq!(book.last_published.unwrap().to_chrono(), now());
    }

    #[test]
    fn new_book_with_null_quantity_stores_none() {
        let book = NewBook::from_json(json!({ "quantity": null }))
            .unwrap()
            .into_book(now());

        assert_eq!(book.quantity, None);
    }

    #[test]
    fn new_book_accepts_fractional_numbers() {
        let new_book = NewBook::from_json(json!({ "year": 1999.5, "quantity": 2.5 })).unwrap();
        assert!(new_book.validate().is_ok());

        let book = new_book.into_book(now());
        assert_eq!(book.year, Some(1999.5));
        assert_eq!(book.quantity, Some(2.5));
    }

    #[test]
    fn new_book_coerces_loose_types() {
        let new_book = NewBook::from_json(json!({
            "title": 1984,
            "year": "1949",
            "quantity": "3",
            "publisher": "Secker & Warburg"
        }))
        .unwrap();

        assert_eq!(new_book.title.as_deref(), Some("1984"));
        assert_eq!(new_book.year, Some(1949.0));
        assert_eq!(new_book.quantity, Some(Some(3.0)));
    }

    #[test]
    fn new_book_rejects_uncastable_values() {
        let err = NewBook::from_json(json!({ "year": "soon" })).unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));

        let err = NewBook::from_json(json!({ "author": "nobody" })).unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
    }

    #[test]
    fn validation_limits_description_and_quantity() {
        let long = NewBook {
            description: Some("x".repeat(DESCRIPTION_MAX_CHARS + 1)),
            ..NewBook::default()
        };
        assert!(long.validate().is_err());

        let at_limit = NewBook {
            description: Some("é".repeat(DESCRIPTION_MAX_CHARS)),
            ..NewBook::default()
        };
        assert!(at_limit.validate().is_ok());

        // 600 emoji are 1200 UTF-16 code units
        let emoji = NewBook {
            description: Some("\u{1F600}".repeat(600)),
            ..NewBook::default()
        };
        assert!(emoji.validate().is_err());

        let negative = NewBook {
            quantity: Some(Some(-1.0)),
            ..NewBook::default()
        };
        assert!(negative.validate().is_err());
    }

    #[test]
    fn patch_distinguishes_absent_from_null() {
        let patch = BookPatch::from_json(json!({ "title": null, "year": 2001 })).unwrap();

        assert_eq!(patch.title, Some(None));
        assert_eq!(patch.year, Some(Some(2001.0)));
        assert_eq!(patch.description, None);

        let set = patch.to_set_document();
        assert_eq!(set.len(), 2);
        assert_eq!(set.get("title"), Some(&Bson::Null));
        assert_eq!(set.get_f64("year").unwrap(), 2001.0);
    }

    #[test]
    fn patch_ignores_id_and_unknown_fields() {
        let patch = BookPatch::from_json(json!({
            "_id": ObjectId::new().to_hex(),
            "__v": 0
        }))
        .unwrap();

        assert!(patch.to_set_document().is_empty());
    }

    #[test]
    fn patch_validation_applies_to_sent_values_only() {
        let patch = BookPatch::from_json(json!({ "quantity": -4 })).unwrap();
        assert!(patch.validate().is_err());

        let cleared = BookPatch::from_json(json!({ "quantity": null })).unwrap();
        assert!(cleared.validate().is_ok());
    }

    #[test]
    fn view_keeps_unresolved_author_as_raw_id() {
        let author_id = ObjectId::new();
        let book = NewBook {
            author: Some(author_id),
            ..NewBook::default()
        }
        .into_book(now());

        let view = BookView::from(PopulatedBook { book, author: None });
        assert_eq!(view.author, Some(AuthorRef::Id(author_id.to_hex())));
    }

    #[test]
    fn view_serializes_populated_author_inline() {
        let author = Author {
            id: ObjectId::new(),
            first_name: Some("Jane".into()),
            last_name: Some("Doe".into()),
            bio: None,
        };
        let book = NewBook {
            title: Some("X".into()),
            author: Some(author.id),
            ..NewBook::default()
        }
        .into_book(now());

        let json = serde_json::to_value(BookView::from(PopulatedBook {
            book,
            author: Some(author),
        }))
        .unwrap();

        assert_eq!(json["author"]["firstName"], "Jane");
        assert_eq!(json["quantity"], json!(0));
        assert_eq!(json["lastPublished"], "2024-03-01T12:00:00Z");
    }

    #[test]
    fn view_without_author_serializes_null() {
        let book = NewBook::default().into_book(now());
        let json = serde_json::to_value(BookView::from(book)).unwrap();

        assert!(json["author"].is_null());
        assert!(json.get("title").is_none());
    }
}
