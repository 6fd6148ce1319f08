pub mod models;
mod routes;
pub mod store;

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    routing::{get, put},
    Router,
};
use serde_json::json;
use shelf_db::Database;
use shelf_kernel::{IndexSpec, InitCtx, Module};

use crate::modules::authors::store::AuthorStore;
use crate::utils::openapi::{self, schema_ref};
use store::BookStore;

/// Books module: create, list, update and delete books
pub struct BooksModule {
    store: BookStore,
}

impl BooksModule {
    pub fn new(store: BookStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Module for BooksModule {
    fn name(&self) -> &'static str {
        "books"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            database = %ctx.db.name(),
            "books module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        Router::new()
            .route("/", get(routes::list_books).post(routes::create_book))
            .route("/{id}", put(routes::update_book).delete(routes::delete_book))
            .with_state(self.store.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        let mut schemas = serde_json::Map::new();
        openapi::add_schema::<models::BookView>(&mut schemas);
        schemas.insert(
            "BookInput".to_string(),
            json!({
                "type": "object",
                "properties": {
                    "title": { "type": "string" },
                    "year": { "type": "number" },
                    "description": {
                        "type": "string",
                        "maxLength": models::DESCRIPTION_MAX_CHARS
                    },
                    "quantity": { "type": "number", "minimum": 0, "default": 0 },
                    "lastPublished": {
                        "type": "string",
                        "format": "date-time",
                        "description": "Honored on update; creation always uses the current time"
                    },
                    "author": {
                        "type": "string",
                        "description": "Id of an existing author"
                    }
                }
            }),
        );

        let id_parameter = json!({
            "name": "id",
            "in": "path",
            "required": true,
            "schema": { "type": "string" }
        });
        let book_input = json!({
            "required": true,
            "content": {
                "application/json": {
                    "schema": schema_ref("BookInput")
                }
            }
        });

        Some(json!({
            "paths": {
                "/": {
                    "get": {
                        "summary": "List books with their authors expanded",
                        "tags": ["Books"],
                        "responses": {
                            "200": openapi::json_content(
                                "List of books",
                                json!({ "type": "array", "items": schema_ref("BookView") })
                            ),
                            "500": openapi::error_response()
                        }
                    },
                    "post": {
                        "summary": "Create a book",
                        "tags": ["Books"],
                        "requestBody": book_input.clone(),
                        "responses": {
                            "201": openapi::json_content("Created book", schema_ref("BookView")),
                            "500": openapi::error_response()
                        }
                    }
                },
                "/{id}": {
                    "put": {
                        "summary": "Update the fields sent for a book",
                        "tags": ["Books"],
                        "parameters": [id_parameter.clone()],
                        "requestBody": book_input,
                        "responses": {
                            "200": openapi::json_content(
                                "Updated book, or null when no book has this id",
                                schema_ref("BookView")
                            ),
                            "500": openapi::error_response()
                        }
                    },
                    "delete": {
                        "summary": "Delete a book",
                        "tags": ["Books"],
                        "parameters": [id_parameter],
                        "responses": {
                            "200": openapi::json_content(
                                "Deleted, or nothing to delete",
                                json!({
                                    "type": "object",
                                    "properties": { "message": { "type": "string" } }
                                })
                            ),
                            "500": openapi::error_response()
                        }
                    }
                }
            },
            "components": {
                "schemas": schemas
            }
        }))
    }

    fn indexes(&self) -> Vec<IndexSpec> {
        vec![IndexSpec {
            collection: models::COLLECTION,
            field: "author",
            unique: false,
        }]
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module started");
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module stopped");
        Ok(())
    }
}

/// Create a new instance of the books module
pub fn create_module(db: &Database) -> Arc<dyn Module> {
    Arc::new(BooksModule::new(BookStore::new(db, AuthorStore::new(db))))
}
