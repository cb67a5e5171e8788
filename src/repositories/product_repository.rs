//! Repository for products and their price history

use crate::error::RepositoryError;
use crate::models::{
    encode_price, encode_timestamp, ObservationOutcome, ObservedProduct, PriceHistoryEntry,
    Product, ProductFilter,
};
use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use tracing::debug;

/// Observation store: products keyed by URL plus their append-only history.
///
/// Every write that touches `products.current_price` inserts its matching
/// `price_history` row inside the same transaction.
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    // =========================================================================
    // Observation writes
    // =========================================================================

    /// Create the product for `url` if absent, otherwise update its price and
    /// check time. Appends one history row either way.
    ///
    /// Title and description are only written on creation.
    pub async fn record_observation(
        &self,
        url: &str,
        observed: &ObservedProduct,
    ) -> Result<ObservationOutcome, RepositoryError> {
        self.record_observation_at(url, observed, Utc::now()).await
    }

    /// `record_observation` with an explicit observation time
    pub async fn record_observation_at(
        &self,
        url: &str,
        observed: &ObservedProduct,
        observed_at: DateTime<Utc>,
    ) -> Result<ObservationOutcome, RepositoryError> {
        let price = encode_price(observed.price_or_sentinel());
        let now = encode_timestamp(observed_at);

        let mut tx = self.pool.begin().await?;

        // The insert is the first statement so the write lock is held before
        // deciding between the create and update branches.
        let inserted = sqlx::query(
            r#"
            INSERT INTO products (url, title, description, current_price, last_checked)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT (url) DO NOTHING
            "#,
        )
        .bind(url)
        .bind(&observed.title)
        .bind(&observed.description)
        .bind(&price)
        .bind(&now)
        .execute(&mut *tx)
        .await?;

        let outcome = if inserted.rows_affected() == 1 {
            ObservationOutcome {
                product_id: inserted.last_insert_rowid(),
                is_new: true,
            }
        } else {
            sqlx::query(
                r#"
                UPDATE products
                SET current_price = ?, last_checked = ?
                WHERE url = ?
                "#,
            )
            .bind(&price)
            .bind(&now)
            .bind(url)
            .execute(&mut *tx)
            .await?;

            let product_id = sqlx::query_scalar::<_, i64>("SELECT id FROM products WHERE url = ?")
                .bind(url)
                .fetch_one(&mut *tx)
                .await?;

            ObservationOutcome {
                product_id,
                is_new: false,
            }
        };

        insert_history(&mut tx, outcome.product_id, &price, &now).await?;
        tx.commit().await?;

        debug!(
            product_id = outcome.product_id,
            is_new = outcome.is_new,
            price = %price,
            "Recorded observation for {}",
            url
        );

        Ok(outcome)
    }

    /// Update an existing product's price and append a history row.
    ///
    /// Fails with `NotFound` and writes nothing when the id is unknown.
    pub async fn update_observation(
        &self,
        product_id: i64,
        price: Decimal,
    ) -> Result<Product, RepositoryError> {
        self.update_observation_at(product_id, price, Utc::now()).await
    }

    /// `update_observation` with an explicit observation time
    pub async fn update_observation_at(
        &self,
        product_id: i64,
        price: Decimal,
        observed_at: DateTime<Utc>,
    ) -> Result<Product, RepositoryError> {
        let price = encode_price(price);
        let now = encode_timestamp(observed_at);

        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            r#"
            UPDATE products
            SET current_price = ?, last_checked = ?
            WHERE id = ?
            "#,
        )
        .bind(&price)
        .bind(&now)
        .bind(product_id)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(format!("Product {}", product_id)));
        }

        insert_history(&mut tx, product_id, &price, &now).await?;

        let product = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, url, title, description, current_price, last_checked
            FROM products
            WHERE id = ?
            "#,
        )
        .bind(product_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(product)
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Find a product by id
    pub async fn find_by_id(&self, id: i64) -> Result<Option<Product>, RepositoryError> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, url, title, description, current_price, last_checked
            FROM products
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Find a product by its exact URL
    pub async fn find_by_url(&self, url: &str) -> Result<Option<Product>, RepositoryError> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, url, title, description, current_price, last_checked
            FROM products
            WHERE url = ?
            "#,
        )
        .bind(url)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// URL of a product, `None` for an unknown id
    pub async fn get_url(&self, id: i64) -> Result<Option<String>, RepositoryError> {
        let url = sqlx::query_scalar::<_, String>("SELECT url FROM products WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(url)
    }

    pub async fn product_exists(&self, id: i64) -> Result<bool, RepositoryError> {
        Ok(self.get_url(id).await?.is_some())
    }

    /// List products matching the filter, in id order.
    ///
    /// Price bounds are inclusive and compared numerically. The text search
    /// runs in Rust because SQLite's `lower()` only folds ASCII.
    pub async fn list_products(
        &self,
        filter: &ProductFilter,
    ) -> Result<Vec<Product>, RepositoryError> {
        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new(
            "SELECT id, url, title, description, current_price, last_checked FROM products WHERE 1=1",
        );

        if let Some(min) = filter.min_price {
            query
                .push(" AND CAST(current_price AS REAL) >= ")
                .push_bind(decimal_bound(min));
        }

        if let Some(max) = filter.max_price {
            query
                .push(" AND CAST(current_price AS REAL) <= ")
                .push_bind(decimal_bound(max));
        }

        query.push(" ORDER BY id ASC");

        let products = query
            .build_query_as::<Product>()
            .fetch_all(&self.pool)
            .await?;

        Ok(products
            .into_iter()
            .filter(|p| filter.matches_text(p))
            .collect())
    }

    /// Price history for a product, most recent first.
    ///
    /// An unknown product id yields an empty list.
    pub async fn get_history(
        &self,
        product_id: i64,
    ) -> Result<Vec<PriceHistoryEntry>, RepositoryError> {
        let entries = sqlx::query_as::<_, PriceHistoryEntry>(
            r#"
            SELECT id, product_id, price, timestamp
            FROM price_history
            WHERE product_id = ?
            ORDER BY timestamp DESC, id DESC
            "#,
        )
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    /// Total number of tracked products
    pub async fn count(&self) -> Result<i64, RepositoryError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Number of history rows for a product
    pub async fn count_history(&self, product_id: i64) -> Result<i64, RepositoryError> {
        let count =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM price_history WHERE product_id = ?")
                .bind(product_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }
}

async fn insert_history(
    conn: &mut SqliteConnection,
    product_id: i64,
    price: &str,
    timestamp: &str,
) -> Result<(), RepositoryError> {
    sqlx::query(
        r#"
        INSERT INTO price_history (product_id, price, timestamp)
        VALUES (?, ?, ?)
        "#,
    )
    .bind(product_id)
    .bind(price)
    .bind(timestamp)
    .execute(conn)
    .await?;

    Ok(())
}

fn decimal_bound(value: Decimal) -> f64 {
    value.to_f64().unwrap_or(0.0)
}
