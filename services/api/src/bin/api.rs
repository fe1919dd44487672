//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{
        classifier::{KeywordCategoryAdapter, OpenAiCategoryAdapter},
        db::DbAdapter,
        notifier::LogNotificationAdapter,
    },
    cache::TtlCache,
    config::Config,
    error::ApiError,
    web::{router, state::AppState, ApiDoc},
};
use async_openai::{config::OpenAIConfig, Client};
use axum::http::{
    header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
    HeaderValue, Method,
};
use axum::{extract::DefaultBodyLimit, Router};
use chrono::Duration;
use duotrack_core::clock::SystemClock;
use duotrack_core::memory::MemoryStore;
use duotrack_core::ports::{CategoryClassifier, DatabaseService};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Connect to Database & Run Migrations ---
    let db: Arc<dyn DatabaseService> = match &config.database_url {
        Some(database_url) => {
            info!("Connecting to database...");
            let db_pool = PgPoolOptions::new()
                .max_connections(5)
                .connect(database_url)
                .await?;
            let db_adapter = DbAdapter::new(db_pool);
            info!("Running database migrations...");
            db_adapter.run_migrations().await?;
            info!("Database migrations complete.");
            Arc::new(db_adapter)
        }
        None => {
            warn!("DATABASE_URL is not set; data is kept in memory and lost on exit.");
            Arc::new(MemoryStore::new())
        }
    };

    // --- 3. Initialize Service Adapters ---
    let classifier: Arc<dyn CategoryClassifier> = match &config.openai_api_key {
        Some(api_key) => {
            let openai_client = Client::with_config(OpenAIConfig::new().with_api_key(api_key));
            Arc::new(OpenAiCategoryAdapter::new(
                openai_client,
                config.classifier_model.clone(),
            ))
        }
        None => {
            info!("OPENAI_API_KEY is not set; categories come from the keyword table.");
            Arc::new(KeywordCategoryAdapter)
        }
    };

    // --- 4. Build the Shared AppState ---
    let app_state = Arc::new(AppState {
        db,
        config: config.clone(),
        notifier: Arc::new(LogNotificationAdapter),
        classifier,
        clock: Arc::new(SystemClock),
        calendar: config.calendar(),
        category_cache: Arc::new(TtlCache::new(Duration::hours(1))),
    });

    // --- 5. Sweep the category cache now and then ---
    let sweeper_state = app_state.clone();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(std::time::Duration::from_secs(600));
        loop {
            ticker.tick().await;
            let evicted = sweeper_state.category_cache.evict_expired(sweeper_state.now());
            if evicted > 0 {
                info!("Evicted {} expired category suggestions", evicted);
            }
        }
    });

    // --- 6. Create the Web Router ---
    let origin = config.cors_origin.parse::<HeaderValue>().map_err(|e| {
        ApiError::Internal(format!("Invalid CORS origin '{}': {}", config.cors_origin, e))
    })?;
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE, ACCEPT]);

    let api_router = router(app_state)
        .layer(DefaultBodyLimit::max(1024 * 1024))
        .layer(cors);

    // Merge the API router with the Swagger UI router for a complete application.
    let app = Router::new()
        .merge(api_router)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    // --- 7. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
