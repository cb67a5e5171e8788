use crate::error::{AppError, AppResult, IngestionError};
use crate::models::{ObservationOutcome, ObservedProduct};
use crate::repositories::ProductRepository;
use crate::services::extractor::Extractor;
use crate::services::fetcher::PageFetcher;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{info, warn};

/// Result of adding (or re-adding) a product URL
#[derive(Debug, Clone, PartialEq)]
pub struct AddProductResult {
    pub outcome: ObservationOutcome,
    pub observed: ObservedProduct,
}

impl AddProductResult {
    pub fn product_id(&self) -> i64 {
        self.outcome.product_id
    }

    pub fn is_new(&self) -> bool {
        self.outcome.is_new
    }

    /// Human readable status for API responses
    pub fn message(&self) -> &'static str {
        if self.outcome.is_new {
            "Product added successfully"
        } else {
            "Product already existed. Price updated."
        }
    }
}

/// Result of rechecking a tracked product's price
#[derive(Debug, Clone, PartialEq)]
pub struct RecheckResult {
    pub product_id: i64,
    pub new_price: Decimal,
    /// False when the page had no price element and zero was stored
    pub price_found: bool,
}

impl RecheckResult {
    pub fn message(&self) -> &'static str {
        "Price updated successfully"
    }
}

/// Runs fetch -> extract -> store for product URLs.
///
/// Nothing is written unless both the fetch and the extraction succeed.
pub struct TrackingService {
    fetcher: Arc<dyn PageFetcher>,
    extractor: Arc<Extractor>,
    product_repo: Arc<ProductRepository>,
}

impl TrackingService {
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        extractor: Arc<Extractor>,
        product_repo: Arc<ProductRepository>,
    ) -> Self {
        Self {
            fetcher,
            extractor,
            product_repo,
        }
    }

    /// Scrape one page into an observation
    async fn observe(&self, url: &str) -> Result<ObservedProduct, IngestionError> {
        let page = self.fetcher.fetch(url).await?;
        let observed = self.extractor.extract(&page)?;

        if !observed.has_price() {
            warn!("No price element found for {}, storing zero", url);
        }

        Ok(observed)
    }

    /// Track a product URL: create it on first sight, otherwise record a new
    /// price for the existing product.
    pub async fn add_or_update(&self, url: &str) -> AppResult<AddProductResult> {
        let observed = self.observe(url).await.map_err(|e| {
            warn!(cause = e.cause_tag(), "Ingestion failed for {}: {}", url, e);
            AppError::from(e)
        })?;

        let outcome = self.product_repo.record_observation(url, &observed).await?;

        if outcome.is_new {
            info!(
                "Created product {} for {} at {}",
                outcome.product_id,
                url,
                observed.price_or_sentinel()
            );
        } else {
            info!(
                "Updated price of product {} to {}",
                outcome.product_id,
                observed.price_or_sentinel()
            );
        }

        Ok(AddProductResult { outcome, observed })
    }

    /// Re-scrape a tracked product and record its current price.
    ///
    /// Fails with `NotFound` when the id is unknown.
    pub async fn recheck(&self, product_id: i64) -> AppResult<RecheckResult> {
        let url = self
            .product_repo
            .get_url(product_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?;

        let observed = self.observe(&url).await.map_err(|e| {
            warn!(
                cause = e.cause_tag(),
                "Recheck of product {} failed: {}", product_id, e
            );
            AppError::from(e)
        })?;

        let product = self
            .product_repo
            .update_observation(product_id, observed.price_or_sentinel())
            .await?;

        info!(
            "Rechecked product {}: price now {}",
            product_id, product.current_price
        );

        Ok(RecheckResult {
            product_id,
            new_price: product.current_price,
            price_found: observed.has_price(),
        })
    }
}
