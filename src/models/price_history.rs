use super::product::column_error;
use super::{decode_price, decode_timestamp};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row};

/// One immutable price observation for a product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceHistoryEntry {
    pub id: i64,
    pub product_id: i64,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub timestamp: DateTime<Utc>,
}

impl<'r> FromRow<'r, SqliteRow> for PriceHistoryEntry {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let price: String = row.try_get("price")?;
        let timestamp: String = row.try_get("timestamp")?;

        Ok(Self {
            id: row.try_get("id")?,
            product_id: row.try_get("product_id")?,
            price: decode_price(&price).map_err(|e| column_error("price", e))?,
            timestamp: decode_timestamp(&timestamp).map_err(|e| column_error("timestamp", e))?,
        })
    }
}
