//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{DbAdapter, HttpIdentityAdapter, OpenRouterJokeAdapter},
    config::Config,
    error::ApiError,
    web::{build_router, AppState},
};
use jokesmith_core::{ports::JokeGenerationService, prompts::validate_catalog};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    validate_catalog()?;

    // --- 2. Connect to Database & Run Migrations ---
    info!("Connecting to database...");
    let db_pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await?;
    let db_adapter = Arc::new(DbAdapter::new(db_pool));
    if config.run_migrations {
        info!("Running database migrations...");
        db_adapter.run_migrations().await?;
        info!("Database migrations complete.");
    }

    // --- 3. Initialize Service Adapters ---
    let identity = Arc::new(HttpIdentityAdapter::new(
        reqwest::Client::new(),
        &config.auth_url,
        &config.auth_api_key,
    ));

    let gateway: Option<Arc<dyn JokeGenerationService>> = match &config.openrouter_api_key {
        Some(api_key) => {
            let adapter: Arc<dyn JokeGenerationService> = Arc::new(OpenRouterJokeAdapter::new(
                api_key,
                &config.llm_api_base,
                &config.app_url,
                &config.app_title,
            )?);
            Some(adapter)
        }
        None => {
            warn!("OPENROUTER_API_KEY is not set; joke generation will be unavailable.");
            None
        }
    };

    // --- 4. Build the Shared AppState and Router ---
    let app_state = Arc::new(AppState {
        db: db_adapter,
        identity,
        gateway,
        config: config.clone(),
    });
    let app = build_router(app_state)?;

    // --- 5. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
