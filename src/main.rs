use anyhow::Context;
use shelf_db::Database;
use shelf_kernel::{settings::Settings, InitCtx, ModuleRegistry};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().with_context(|| "failed to load shelf settings")?;
    shelf_telemetry::init(&settings.telemetry)?;

    tracing::info!(
        env = ?settings.environment,
        backend = ?settings.database.backend,
        db = %settings.database.uri,
        "shelf-app bootstrap starting"
    );

    let db = Database::connect(
        settings.database.backend,
        &settings.database.uri,
        &settings.database.name,
    )
    .await
    .context("failed to create database handle")?;

    // An unreachable database is logged, not fatal: requests fail with 500 until it is back.
    match db.ping().await {
        Ok(()) => tracing::info!(database = %db.name(), "connected to database"),
        Err(e) => tracing::error!(database = %db.name(), error = %e, "error connecting to database"),
    }

    let mut registry = ModuleRegistry::new();
    shelf_app::modules::register_all(&mut registry, &db);

    let ctx = InitCtx {
        settings: &settings,
        db: &db,
    };
    registry.init_modules(&ctx).await?;
    if let Err(e) = registry.apply_indexes(&ctx).await {
        tracing::warn!(error = %format!("{:#}", e), "indexes not applied");
    }
    registry.start_modules(&ctx).await?;

    tracing::info!("shelf-app bootstrap complete");

    let served = shelf_http::start_server(&registry, &settings).await;

    registry.stop_modules().await?;
    db.shutdown()
        .await
        .context("failed to shut down database")?;

    served
}
