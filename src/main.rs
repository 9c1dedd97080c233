mod config;
mod db;
mod fetcher;
mod ingest;
mod routes;
mod sanitize;

use std::sync::Arc;

use axum::{routing::get, Router};
use tower_http::services::ServeDir;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::db::Database;
use crate::fetcher::FeedClient;
use crate::ingest::{start_background_ingest, Ingestor};
use crate::routes::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "newshub=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::load("newshub.toml")?;
    info!(
        "Loaded configuration: {} categories, country '{}'",
        config.categories.len(),
        config.country
    );

    // Initialize database; a failure here is fatal before any ingest starts
    let database_url = std::env::var("DATABASE_URL")
        .unwrap_or_else(|_| "sqlite:newshub.db?mode=rwc".to_string());
    let db = Database::new(&database_url).await?;
    db.initialize().await?;
    info!("Database initialized");

    let db = Arc::new(db);

    // Start background ingest task
    let ingestor = Arc::new(Ingestor::new(
        FeedClient::new(&config),
        db.clone(),
        config.categories.clone(),
    ));
    let refresh_interval = config.refresh_interval;
    tokio::spawn(async move {
        start_background_ingest(ingestor, refresh_interval).await;
    });

    // Create app state
    let state = Arc::new(AppState { db: db.clone() });

    // Build router
    let app = Router::new()
        .route("/", get(routes::index))
        .route("/article/:id", get(routes::article_view))
        .route("/health", get(routes::health))
        .nest_service("/static", ServeDir::new("static"))
        .with_state(state);

    // Start server
    let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
    info!("Server starting on http://localhost:3000");

    axum::serve(listener, app).await?;

    Ok(())
}
