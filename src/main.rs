mod app_state;
mod config;
mod db;
mod error;
mod models;
mod routes;
mod services;

use axum::{routing::get, routing::post, routing::put, Json, Router};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::sync::Arc;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use app_state::AppState;
use config::AppConfig;
use db::catalog::PgCatalog;
use services::{
    classifier::HfClassifier, kling::KlingClient, relay::MediaRelay, storage::MediaStorage,
    tryon::TryOnOrchestrator,
};

#[tokio::main]
async fn main() {
    // Initialize structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    // Load configuration from environment
    let config = AppConfig::from_env().expect("Failed to load configuration from environment");

    tracing::info!("Initializing closetly server");

    // Initialize Prometheus metrics recorder
    let prometheus_handle = PrometheusBuilder::new()
        .install_recorder()
        .expect("Failed to install Prometheus metrics recorder");
    let prometheus_handle = Arc::new(prometheus_handle);

    // Register application metrics
    metrics::describe_counter!("tryon_jobs_submitted_total", "Total try-on jobs submitted");
    metrics::describe_counter!(
        "tryon_jobs_succeeded_total",
        "Total try-on jobs observed succeeded, relayed, and cataloged"
    );
    metrics::describe_counter!(
        "tryon_jobs_failed_total",
        "Total try-on jobs reported failed by the provider"
    );

    // Initialize database connection pool
    tracing::info!("Connecting to PostgreSQL database");
    let db_pool = db::init_pool(&config.database_url)
        .await
        .expect("Failed to connect to database");

    // Run database migrations
    tracing::info!("Running database migrations");
    db::run_migrations(&db_pool)
        .await
        .expect("Failed to run database migrations");

    // Initialize media hosting client
    tracing::info!("Initializing media storage client");
    let storage = MediaStorage::new(
        &config.media_bucket,
        &config.media_endpoint,
        &config.media_access_key,
        &config.media_secret_key,
        &config.media_public_base_url,
    )
    .expect("Failed to initialize media storage client");

    let relay = Arc::new(
        MediaRelay::new(Arc::new(storage)).expect("Failed to initialize media relay"),
    );

    // Initialize try-on provider client
    tracing::info!("Initializing Kling try-on client");
    let kling = KlingClient::new(
        &config.kling_api_base,
        &config.kling_access_key,
        &config.kling_secret_key,
    )
    .expect("Failed to initialize Kling client");

    // Initialize garment classifier client
    tracing::info!("Initializing garment classifier client");
    let classifier = HfClassifier::new(&config.hf_api_token)
        .expect("Failed to initialize classifier client");

    let tryon = TryOnOrchestrator::new(
        Arc::new(kling),
        Arc::clone(&relay),
        Arc::new(PgCatalog::new(db_pool.clone())),
    );

    // Create shared application state
    let state = AppState::new(db_pool, relay, Arc::new(classifier), Arc::new(tryon));

    // Build API routes
    let app = Router::new()
        .route(
            "/",
            get(|| async { Json(serde_json::json!({"message": "Closetly API running"})) }),
        )
        .route("/health", get(routes::health::health_check))
        .route(
            "/api/items",
            get(routes::items::list_items).post(routes::items::add_item),
        )
        .route("/api/items/batch-delete", post(routes::items::batch_delete_items))
        .route(
            "/api/items/{item_id}",
            put(routes::items::update_item).delete(routes::items::delete_item),
        )
        .route(
            "/api/models",
            get(routes::models::list_models).post(routes::models::add_model),
        )
        .route(
            "/api/models/{model_id}",
            axum::routing::delete(routes::models::delete_model),
        )
        .route(
            "/api/recommend-by-weather",
            get(routes::recommend::recommend_by_weather),
        )
        .route("/api/tryon", post(routes::tryon::submit_tryon))
        .route("/api/tryon/status/{task_id}", get(routes::tryon::tryon_status))
        .with_state(state)
        // Prometheus metrics endpoint (separate state)
        .route(
            "/metrics",
            get(routes::metrics::prometheus_metrics).with_state(prometheus_handle),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(RequestBodyLimitLayer::new(25 * 1024 * 1024)); // two base64 images per try-on request

    tracing::info!("Starting closetly on {}", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app)
        .await
        .expect("Server error");
}
