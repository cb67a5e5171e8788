//! Price Tracker Library
//!
//! This module exposes the tracker components for use by tests and the binary.

pub mod config;
pub mod database;
pub mod error;
pub mod http_service;
pub mod models;
pub mod repositories;
pub mod services;

// Re-export commonly used types
pub use config::AppConfig;
pub use error::{AppError, AppResult};

use repositories::ProductRepository;
use services::{Extractor, PageFetcher, TrackingService};
use std::sync::Arc;

/// Application state shared by all request handlers
pub struct AppState {
    pub product_repo: Arc<ProductRepository>,
    pub tracking_service: Arc<TrackingService>,
}

impl AppState {
    /// Wire the repository and tracking service over one pool
    pub fn new(pool: sqlx::SqlitePool, fetcher: Arc<dyn PageFetcher>, extractor: Extractor) -> Self {
        let product_repo = Arc::new(ProductRepository::new(pool));
        let tracking_service = Arc::new(TrackingService::new(
            fetcher,
            Arc::new(extractor),
            product_repo.clone(),
        ));

        Self {
            product_repo,
            tracking_service,
        }
    }
}
