pub mod models;
mod routes;
pub mod store;

use std::sync::Arc;

use async_trait::async_trait;
use axum::{routing::post, Router};
use serde_json::json;
use shelf_db::Database;
use shelf_kernel::{InitCtx, Module};

use crate::utils::openapi;
use store::AuthorStore;

/// Authors module: creation only
pub struct AuthorsModule {
    store: AuthorStore,
}

impl AuthorsModule {
    pub fn new(store: AuthorStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Module for AuthorsModule {
    fn name(&self) -> &'static str {
        "authors"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            database = %ctx.db.name(),
            "authors module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        Router::new()
            .route("/", post(routes::create_author))
            .with_state(self.store.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        let mut schemas = serde_json::Map::new();
        openapi::add_schema::<models::AuthorView>(&mut schemas);
        schemas.insert(
            "AuthorInput".to_string(),
            json!({
                "type": "object",
                "properties": {
                    "firstName": { "type": "string" },
                    "lastName": { "type": "string" },
                    "bio": { "type": "string" }
                }
            }),
        );

        Some(json!({
            "paths": {
                "/": {
                    "post": {
                        "summary": "Create an author",
                        "tags": ["Authors"],
                        "requestBody": {
                            "required": true,
                            "content": {
                                "application/json": {
                                    "schema": openapi::schema_ref("AuthorInput")
                                }
                            }
                        },
                        "responses": {
                            "201": openapi::json_content("Created author", openapi::schema_ref("AuthorView")),
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
}

/// Create a new instance of the authors module
pub fn create_module(db: &Database) -> Arc<dyn Module> {
    Arc::new(AuthorsModule::new(AuthorStore::new(db)))
}
