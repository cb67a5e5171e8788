//! HTTP API for the price tracker
//!
//! Thin axum layer over [`TrackingService`](crate::services::TrackingService)
//! and [`ProductRepository`](crate::repositories::ProductRepository).

use crate::error::{AppError, AppResult};
use crate::models::{PriceHistoryEntry, Product, ProductFilter};
use crate::AppState;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use reqwest::Url;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};

#[derive(Debug, Deserialize)]
pub struct AddProductRequest {
    pub url: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AddProductResponse {
    pub message: String,
    pub product_id: i64,
}

#[derive(Debug, Default, Deserialize)]
pub struct ProductQuery {
    pub search: Option<String>,
    #[serde(default, with = "rust_decimal::serde::str_option")]
    pub min_price: Option<Decimal>,
    #[serde(default, with = "rust_decimal::serde::str_option")]
    pub max_price: Option<Decimal>,
}

impl From<ProductQuery> for ProductFilter {
    fn from(query: ProductQuery) -> Self {
        ProductFilter {
            search: query.search,
            min_price: query.min_price,
            max_price: query.max_price,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PricePoint {
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub timestamp: DateTime<Utc>,
}

impl From<PriceHistoryEntry> for PricePoint {
    fn from(entry: PriceHistoryEntry) -> Self {
        Self {
            price: entry.price,
            timestamp: entry.timestamp,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CheckPriceResponse {
    pub message: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub new_price: Decimal,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub detail: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let detail = match &self {
            AppError::NotFound(msg) | AppError::Validation(msg) => msg.clone(),
            AppError::Ingestion(_) => self.to_string(),
            _ => {
                error!("Internal error: {:?}", self);
                "Internal server error".to_string()
            }
        };

        (status, Json(ErrorBody { detail })).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(format!("Invalid request body: {}", rejection.body_text()))
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::Validation(format!("Invalid query parameters: {}", rejection.body_text()))
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::Validation(format!("Invalid product id: {}", rejection.body_text()))
    }
}

/// Accept only absolute http(s) URLs
fn validate_product_url(raw: &str) -> AppResult<String> {
    let trimmed = raw.trim();
    let url = Url::parse(trimmed)
        .map_err(|e| AppError::Validation(format!("Invalid product URL {:?}: {}", raw, e)))?;

    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(AppError::Validation(format!(
            "Product URL must be an absolute http(s) URL: {}",
            raw
        )));
    }

    Ok(trimmed.to_string())
}

async fn add_product(
    State(state): State<Arc<AppState>>,
    req: Result<Json<AddProductRequest>, JsonRejection>,
) -> AppResult<Json<AddProductResponse>> {
    let Json(req) = req?;
    let url = validate_product_url(&req.url)?;
    info!("AddProduct request: url={}", url);

    let result = state.tracking_service.add_or_update(&url).await?;

    Ok(Json(AddProductResponse {
        message: result.message().to_string(),
        product_id: result.product_id(),
    }))
}

async fn list_products(
    State(state): State<Arc<AppState>>,
    query: Result<Query<ProductQuery>, QueryRejection>,
) -> AppResult<Json<Vec<Product>>> {
    let Query(query) = query?;
    let filter = ProductFilter::from(query);
    let products = state.product_repo.list_products(&filter).await?;
    Ok(Json(products))
}

async fn get_price_history(
    State(state): State<Arc<AppState>>,
    product_id: Result<Path<i64>, PathRejection>,
) -> AppResult<Json<Vec<PricePoint>>> {
    let Path(product_id) = product_id?;
    let history = state.product_repo.get_history(product_id).await?;
    Ok(Json(history.into_iter().map(PricePoint::from).collect()))
}

async fn check_price(
    State(state): State<Arc<AppState>>,
    product_id: Result<Path<i64>, PathRejection>,
) -> AppResult<Json<CheckPriceResponse>> {
    let Path(product_id) = product_id?;
    info!("CheckPrice request: product_id={}", product_id);

    let result = state.tracking_service.recheck(product_id).await?;

    Ok(Json(CheckPriceResponse {
        message: result.message().to_string(),
        new_price: result.new_price,
    }))
}

/// Build the API router
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/products", get(list_products).post(add_product))
        .route("/products/", get(list_products).post(add_product))
        .route("/products/:product_id/history", get(get_price_history))
        .route("/products/:product_id/check", post(check_price))
        .with_state(state)
}
