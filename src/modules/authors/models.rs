use bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::{error::StoreResult, utils::coerce};

pub const COLLECTION: &str = "authors";

/// An author as stored in the `authors` collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Author {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
}

/// Request body for creating an author. Unknown fields are dropped.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAuthor {
    #[serde(default, deserialize_with = "coerce::lenient_text")]
    pub first_name: Option<String>,
    #[serde(default, deserialize_with = "coerce::lenient_text")]
    pub last_name: Option<String>,
    #[serde(default, deserialize_with = "coerce::lenient_text")]
    pub bio: Option<String>,
}

impl NewAuthor {
    pub fn from_json(value: Value) -> StoreResult<Self> {
        coerce::body(value)
    }

    pub fn into_author(self) -> Author {
        Author {
            id: ObjectId::new(),
            first_name: self.first_name,
            last_name: self.last_name,
            bio: self.bio,
        }
    }
}

/// JSON shape of an author on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthorView {
    /// 24-hex ObjectId
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
}

impl From<Author> for AuthorView {
    fn from(author: Author) -> Self {
        Self {
            id: author.id.to_hex(),
            first_name: author.first_name,
            last_name: author.last_name,
            bio: author.bio,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn new_author_drops_unknown_fields() {
        let new_author = NewAuthor::from_json(json!({
            "firstName": "Jane",
            "lastName": "Doe",
            "age": 44
        }))
        .unwrap();

        assert_eq!(new_author.first_name.as_deref(), Some("Jane"));
        assert_eq!(new_author.last_name.as_deref(), Some("Doe"));
        assert!(new_author.bio.is_none());
    }

    #[test]
    fn view_uses_mongo_style_id_and_camel_case() {
        let author = NewAuthor {
            first_name: Some("Jane".into()),
            ..NewAuthor::default()
        }
        .into_author();
        let id = author.id.to_hex();

        let json = serde_json::to_value(AuthorView::from(author)).unwrap();
        assert_eq!(json, json!({ "_id": id, "firstName": "Jane" }));
    }

    #[test]
    fn stored_shape_omits_missing_fields() {
        let author = NewAuthor::default().into_author();
        let document = bson::ser::serialize_to_document(&author).unwrap();

        assert_eq!(document.len(), 1);
        assert_eq!(document.get_object_id("_id").unwrap(), author.id);
    }
}
