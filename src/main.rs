//! Price Tracker Service
//!
//! Main entry point for the price tracker backend.
//! This service provides:
//! - HTTP API to add products by URL, list them and read their price history
//! - On-demand price rechecks of tracked products

use price_tracker::config::{AppConfig, LogFormat};
use price_tracker::database::{create_pool, run_migrations};
use price_tracker::http_service;
use price_tracker::services::{Extractor, HttpFetcher};
use price_tracker::{AppError, AppResult, AppState};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};

fn init_tracing(config: &AppConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("price_tracker={},sqlx=warn,tower=info", config.log_level).into()
    });

    match config.log_format {
        LogFormat::Json => tracing_subscriber::fmt().json().with_env_filter(filter).init(),
        LogFormat::Pretty => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }
}

#[tokio::main]
async fn main() -> AppResult<()> {
    // Load environment variables first
    dotenv::dotenv().ok();

    // Load configuration
    let config = AppConfig::from_env().map_err(|e| {
        eprintln!("Configuration error: {}", e);
        AppError::Config(e)
    })?;

    init_tracing(&config);

    info!("Price tracker starting");
    info!("Log level: {}", config.log_level);
    info!("HTTP address: {}", config.http_addr());

    // =========================================================================
    // DATABASE SETUP
    // =========================================================================
    info!("Connecting to database {}...", config.database.url);

    let pool = create_pool(&config.database).await.map_err(|e| {
        error!("Failed to create database pool: {}", e);
        AppError::Database(e)
    })?;

    info!("Max connections: {}", config.database.max_connections);

    // Schema creation is idempotent, so this runs on every start
    run_migrations(&pool, None).await.map_err(|e| {
        error!("Database migration failed: {}", e);
        AppError::Database(e)
    })?;

    info!("Database schema ready");

    // =========================================================================
    // CORE SERVICES INITIALIZATION
    // =========================================================================
    let extractor = Extractor::new(&config.selectors)
        .map_err(|e| AppError::Config(format!("Selector table: {}", e)))?;

    let fetcher = HttpFetcher::new(&config.fetcher)
        .map_err(|e| AppError::Config(format!("HTTP client: {}", e)))?;
    info!(
        "Fetcher ready (delay {:?}, timeout {:?})",
        config.fetcher.request_delay(),
        config.fetcher.timeout()
    );

    let app_state = Arc::new(AppState::new(pool.clone(), Arc::new(fetcher), extractor));

    // =========================================================================
    // START SERVER
    // =========================================================================
    let addr: SocketAddr = config
        .http_addr()
        .parse()
        .map_err(|e| AppError::Config(format!("Invalid HTTP address: {}", e)))?;

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| AppError::Message(format!("Failed to bind HTTP server: {}", e)))?;

    info!("Listening on {}", addr);
    info!("Press Ctrl+C to shutdown gracefully");

    axum::serve(listener, http_service::router(app_state))
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for shutdown signal: {}", e);
            }
            info!("Shutdown signal received, shutting down gracefully...");
        })
        .await
        .map_err(|e| AppError::Message(format!("HTTP server error: {}", e)))?;

    pool.close().await;
    info!("Price tracker shutdown complete");
    Ok(())
}
