//! Inventory API - REST server for products, stock purchases and sales

use axum_helpers::create_production_app;
use core_config::FromEnv;
use core_config::tracing::{init_tracing, install_color_eyre};
use eyre::WrapErr;
use tracing::info;

mod api;
mod config;
mod openapi;
mod state;

use config::Config;
use state::AppState;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    // A missing .env file is fine; real deployments set the environment directly
    dotenvy::dotenv().ok();
    install_color_eyre();

    let config = Config::from_env().wrap_err("Invalid configuration")?;
    init_tracing(&config.environment);

    info!(database = %config.mongodb.database, "Connecting to MongoDB");

    let mongo_client = database::mongodb::connect_from_config_with_retry(&config.mongodb, None)
        .await
        .wrap_err("Could not connect to MongoDB")?;
    let db = mongo_client.database(&config.mongodb.database);

    let state = AppState {
        config: config.clone(),
        mongo_client,
        db,
    };

    api::init_indexes(&state).await?;

    let router = axum_helpers::create_router::<openapi::ApiDoc>(api::routes(&state))?;
    let app = router.merge(api::health::router(state.clone()));

    info!(
        "Starting {} v{} on {}",
        config.app.name,
        config.app.version,
        config.server.address()
    );

    create_production_app(app, &config.server, async move {
        info!("Shutting down: closing MongoDB connections");
        state.mongo_client.shutdown().await;
        info!("MongoDB connection closed");
    })
    .await
    .wrap_err("Server error")?;

    info!("Inventory API shutdown complete");
    Ok(())
}
