use async_trait::async_trait;
use axum::Router;
use shelf_db::Database;

/// Context provided to modules during initialization
pub struct InitCtx<'a> {
    pub settings: &'a crate::settings::Settings,
    pub db: &'a Database,
}

/// Secondary index a module needs on one of its collections
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexSpec {
    pub collection: &'static str,
    pub field: &'static str,
    pub unique: bool,
}

/// Core module trait that all shelf modules must implement
#[async_trait]
pub trait Module: Sync + Send {
    /// Unique name for this module, also its URL segment
    fn name(&self) -> &'static str;

    /// Initialize the module with the provided context
    /// Called during application startup before indexes are applied
    async fn init(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        Ok(())
    }

    /// Return the Axum router for this module's routes
    /// Routes will be mounted under `{base_path}/{module_name}`
    fn routes(&self) -> Router {
        Router::new()
    }

    /// Return OpenAPI specification fragment for this module as JSON
    /// Will be merged with other modules' specs
    fn openapi(&self) -> Option<serde_json::Value> {
        None
    }

    /// Indexes this module relies on
    fn indexes(&self) -> Vec<IndexSpec> {
        vec![]
    }

    /// Start background tasks for this module
    /// Called after indexes are applied
    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        Ok(())
    }

    /// Stop the module and clean up resources
    /// Called during application shutdown, before the database is torn down
    async fn stop(&self) -> anyhow::Result<()> {
        Ok(())
    }
}
