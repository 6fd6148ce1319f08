use anyhow::Context;
use std::sync::Arc;

use crate::module::{IndexSpec, InitCtx, Module};

/// Module registry managing module lifecycle in registration order
pub struct ModuleRegistry {
    modules: Vec<Arc<dyn Module>>,
}

impl ModuleRegistry {
    /// Create a new module registry
    pub fn new() -> Self {
        Self {
            modules: Vec::new(),
        }
    }

    /// Register a module with the registry
    pub fn register(&mut self, module: Arc<dyn Module>) {
        tracing::debug!(module = module.name(), "registering module");
        self.modules.push(module);
    }

    /// Get all registered modules
    pub fn modules(&self) -> &[Arc<dyn Module>] {
        &self.modules
    }

    /// Initialize modules in registration order
    pub async fn init_modules(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!("initializing {} modules", self.modules.len());

        for module in &self.modules {
            tracing::info!(module = module.name(), "initializing module");

            module
                .init(ctx)
                .await
                .with_context(|| format!("failed to initialize module '{}'", module.name()))?;
        }

        Ok(())
    }

    /// Create every index the modules declared
    pub async fn apply_indexes(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        for (module, index) in self.collect_indexes() {
            tracing::info!(
                module = %module,
                collection = index.collection,
                field = index.field,
                unique = index.unique,
                "ensuring index"
            );

            ctx.db
                .create_index(index.collection, index.field, index.unique)
                .await
                .with_context(|| {
                    format!(
                        "failed to create index on {}.{} for module '{}'",
                        index.collection, index.field, module
                    )
                })?;
        }

        Ok(())
    }

    /// Start modules in registration order
    pub async fn start_modules(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!("starting {} modules", self.modules.len());

        for module in &self.modules {
            tracing::info!(module = module.name(), "starting module");

            module
                .start(ctx)
                .await
                .with_context(|| format!("failed to start module '{}'", module.name()))?;
        }

        Ok(())
    }

    /// Stop modules in reverse registration order
    pub async fn stop_modules(&self) -> anyhow::Result<()> {
        tracing::info!("stopping {} modules", self.modules.len());

        for module in self.modules.iter().rev() {
            tracing::info!(module = module.name(), "stopping module");

            module
                .stop()
                .await
                .with_context(|| format!("failed to stop module '{}'", module.name()))?;
        }

        Ok(())
    }

    /// Collect all index definitions, sorted by module name for deterministic ordering
    pub fn collect_indexes(&self) -> Vec<(String, IndexSpec)> {
        let mut indexes = Vec::new();

        for module in &self.modules {
            for index in module.indexes() {
                indexes.push((module.name().to_string(), index));
            }
        }

        indexes.sort_by(|a, b| {
            a.0.cmp(&b.0)
                .then_with(|| a.1.collection.cmp(b.1.collection))
                .then_with(|| a.1.field.cmp(b.1.field))
        });

        indexes
    }
}

impl Default for ModuleRegistry {
    fn default() -> Self {
        Self::new()
    }
}
