#![allow(dead_code)]

use async_trait::async_trait;
use price_tracker::config::{DatabaseConfig, SelectorConfig};
use price_tracker::database::{create_pool, run_migrations};
use price_tracker::repositories::ProductRepository;
use price_tracker::services::{Extractor, FetchError, PageFetcher, TrackingService};
use price_tracker::AppState;
use sqlx::SqlitePool;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

/// Test database over a migrated SQLite pool
pub struct TestDatabase {
    pub pool: SqlitePool,
    pub product_repo: Arc<ProductRepository>,
    file: Option<PathBuf>,
}

impl TestDatabase {
    /// Private in-memory database
    pub async fn new() -> Self {
        Self::connect(DatabaseConfig::in_memory(), None).await
    }

    /// File-backed database with several connections, for concurrency tests
    pub async fn file(name: &str) -> Self {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        let path = std::env::temp_dir().join(format!(
            "price-tracker-{}-{}-{}.db",
            name,
            std::process::id(),
            nanos
        ));

        let config = DatabaseConfig {
            url: format!("sqlite://{}", path.display()),
            max_connections: 8,
            ..DatabaseConfig::default()
        };

        Self::connect(config, Some(path)).await
    }

    async fn connect(config: DatabaseConfig, file: Option<PathBuf>) -> Self {
        let pool = create_pool(&config)
            .await
            .expect("Failed to create test database pool");

        run_migrations(&pool, None)
            .await
            .expect("Failed to run migrations");

        Self {
            product_repo: Arc::new(ProductRepository::new(pool.clone())),
            pool,
            file,
        }
    }

    /// Close the pool and delete any database files
    pub async fn cleanup(self) {
        self.pool.close().await;
        if let Some(path) = self.file {
            for suffix in ["", "-wal", "-shm"] {
                let _ = std::fs::remove_file(format!("{}{}", path.display(), suffix));
            }
        }
    }

    pub async fn table_count(&self, table: &str) -> i64 {
        sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM {}", table))
            .fetch_one(&self.pool)
            .await
            .expect("Failed to count rows")
    }
}

/// Page fetcher serving canned HTML per URL. Unknown URLs fail like a
/// network error would.
#[derive(Default)]
pub struct StubFetcher {
    pages: Mutex<HashMap<String, String>>,
    calls: AtomicUsize,
}

impl StubFetcher {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_page(&self, url: &str, html: String) {
        self.pages.lock().unwrap().insert(url.to_string(), html);
    }

    pub fn remove_page(&self, url: &str) {
        self.pages.lock().unwrap().remove(url);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

/// A real `reqwest::Error`, produced without touching the network
pub fn transport_error() -> reqwest::Error {
    reqwest::Client::new()
        .get("not a url")
        .build()
        .expect_err("relative URL must not build")
}

#[async_trait]
impl PageFetcher for StubFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        // Let concurrent callers interleave
        tokio::task::yield_now().await;

        let page = self.pages.lock().unwrap().get(url).cloned();
        page.ok_or_else(|| FetchError {
            url: url.to_string(),
            source: transport_error(),
        })
    }
}

/// Product page using the default selector table
pub fn product_page(title: &str, description: &str, price: Option<&str>) -> String {
    let price_html = price
        .map(|p| format!(r#"<div class="_30jeq3">{}</div>"#, p))
        .unwrap_or_default();

    format!(
        r#"<!DOCTYPE html>
<html>
  <head><title>{title}</title></head>
  <body>
    <span class="B_NuCI">{title}</span>
    <div class="_1mXcCf">{description}</div>
    {price_html}
  </body>
</html>"#
    )
}

pub fn default_extractor() -> Extractor {
    Extractor::new(&SelectorConfig::default()).expect("Default selectors must compile")
}

pub fn tracking_service(db: &TestDatabase, fetcher: Arc<StubFetcher>) -> TrackingService {
    TrackingService::new(fetcher, Arc::new(default_extractor()), db.product_repo.clone())
}

pub fn app_state(db: &TestDatabase, fetcher: Arc<StubFetcher>) -> Arc<AppState> {
    Arc::new(AppState::new(db.pool.clone(), fetcher, default_extractor()))
}
