//! MongoDB backend built on the official async driver.

use async_trait::async_trait;
use bson::{doc, oid::ObjectId, Document};
use futures::TryStreamExt;
use mongodb::{
    error::{ErrorKind, WriteFailure},
    options::{ClientOptions, IndexOptions, ReturnDocument},
    Client, Collection as MongoCollection, IndexModel,
};

use crate::{
    backend::Backend,
    error::{DbError, DbResult},
};

const DUPLICATE_KEY_CODE: i32 = 11000;

#[derive(Debug, Clone)]
pub struct MongoBackend {
    client: Client,
    database: String,
}

impl MongoBackend {
    pub fn new(client: Client, database: String) -> Self {
        Self { client, database }
    }

    /// Parse `uri` and build a client for `database`. No network round trip
    /// happens until the first operation.
    pub async fn connect(uri: &str, database: &str) -> DbResult<Self> {
        let options = ClientOptions::parse(uri)
            .await
            .map_err(|e| DbError::Initialization(e.to_string()))?;
        let client =
            Client::with_options(options).map_err(|e| DbError::Initialization(e.to_string()))?;

        Ok(Self::new(client, database.to_string()))
    }

    fn get_collection(&self, name: &str) -> MongoCollection<Document> {
        self.client.database(&self.database).collection(name)
    }
}

#[async_trait]
impl Backend for MongoBackend {
    async fn insert_one(&self, collection: &str, document: Document) -> DbResult<()> {
        self.get_collection(collection)
            .insert_one(document)
            .await
            .map_err(|e| {
                if let ErrorKind::Write(WriteFailure::WriteError(write_error)) = e.kind.as_ref() {
                    if write_error.code == DUPLICATE_KEY_CODE {
                        return DbError::DuplicateKey(
                            write_error.message.clone(),
                            collection.to_string(),
                        );
                    }
                }
                DbError::from(e)
            })?;

        Ok(())
    }

    async fn find_all(&self, collection: &str) -> DbResult<Vec<Document>> {
        Ok(self
            .get_collection(collection)
            .find(doc! {})
            .sort(doc! { "_id": 1 })
            .await?
            .try_collect::<Vec<Document>>()
            .await?)
    }

    async fn find_by_id(&self, collection: &str, id: ObjectId) -> DbResult<Option<Document>> {
        Ok(self
            .get_collection(collection)
            .find_one(doc! { "_id": id })
            .await?)
    }

    async fn find_by_ids(&self, collection: &str, ids: &[ObjectId]) -> DbResult<Vec<Document>> {
        Ok(self
            .get_collection(collection)
            .find(doc! { "_id": { "$in": ids.to_vec() } })
            .await?
            .try_collect::<Vec<Document>>()
            .await?)
    }

    async fn update_by_id(
        &self,
        collection: &str,
        id: ObjectId,
        set: Document,
    ) -> DbResult<Option<Document>> {
        Ok(self
            .get_collection(collection)
            .find_one_and_update(doc! { "_id": id }, doc! { "$set": set })
            .return_document(ReturnDocument::After)
            .await?)
    }

    async fn delete_by_id(&self, collection: &str, id: ObjectId) -> DbResult<Option<Document>> {
        Ok(self
            .get_collection(collection)
            .find_one_and_delete(doc! { "_id": id })
            .await?)
    }

    async fn create_index(&self, collection: &str, field: &str, unique: bool) -> DbResult<()> {
        self.get_collection(collection)
            .create_index(
                IndexModel::builder()
                    .keys(doc! { field: 1 })
                    .options(IndexOptions::builder().unique(unique).build())
                    .build(),
            )
            .await?;

        Ok(())
    }

    async fn ping(&self) -> DbResult<()> {
        self.client
            .database(&self.database)
            .run_command(doc! { "ping": 1 })
            .await?;

        Ok(())
    }

    async fn shutdown(&self) -> DbResult<()> {
        self.client.clone().shutdown().await;

        Ok(())
    }
}
