//! Mooni off-ramp API server
//!
//! Serves the fiat order endpoint used by the payment flow and the referral
//! profit-share endpoint.
use anyhow::Context;
use dotenv::dotenv;
use log::{error, info};
use mooni_offramp::ethereum::create_ethereum_client;
use mooni_offramp::{register_endpoints, Router, Settings};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tokio::net::TcpListener;

/// Application entry point
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenv().ok();

    // Initialize logging with default level of "info"
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    info!("Starting Mooni off-ramp API v{}", mooni_offramp::VERSION);

    let settings = Settings::load()?;

    // Setup database connection pool
    info!("Connecting to database...");
    let db_pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&settings.database_url)
        .await
        .context("Failed to create database connection pool")?;
    let db_pool = Arc::new(db_pool);

    // Create a separate connection for migrations
    let db_pool_for_migration = PgPoolOptions::new()
        .max_connections(1)
        .connect(&settings.database_url)
        .await
        .context("Failed to create migration connection pool")?;

    info!("Running database migrations...");
    if let Err(e) = sqlx::migrate!("./migrations")
        .run(&db_pool_for_migration)
        .await
    {
        error!("Failed to run migrations: {}", e);
        return Err(anyhow::Error::from(e));
    }
    info!("Migrations completed successfully");

    db_pool_for_migration.close().await;

    let ethereum_client = create_ethereum_client(&settings.ethereum_rpc_url)?;

    info!("Initializing application...");
    let (router, service_container) =
        mooni_offramp::create_application(&settings, db_pool, ethereum_client)?;

    let app = router.setup_handlers();
    for (route, description) in register_endpoints() {
        info!("  {} - {}", route, description);
    }

    let listener = TcpListener::bind(&settings.server_address)
        .await
        .with_context(|| format!("Failed to bind {}", settings.server_address))?;
    info!("Listening on {}. Press Ctrl+C to stop.", settings.server_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for shutdown signal: {}", e);
            }
        })
        .await
        .context("Server error")?;

    info!("Closing database pool...");
    service_container.db_pool().close().await;

    Ok(())
}
