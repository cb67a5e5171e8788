use super::{decode_price, decode_timestamp};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row};

/// A tracked product, one per distinct page URL
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub url: String,
    pub title: String,
    pub description: String,
    /// Zero when the last observation found no price element
    #[serde(with = "rust_decimal::serde::float")]
    pub current_price: Decimal,
    pub last_checked: DateTime<Utc>,
}

impl<'r> FromRow<'r, SqliteRow> for Product {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let price: String = row.try_get("current_price")?;
        let last_checked: String = row.try_get("last_checked")?;

        Ok(Self {
            id: row.try_get("id")?,
            url: row.try_get("url")?,
            title: row.try_get("title")?,
            description: row.try_get("description")?,
            current_price: decode_price(&price).map_err(|e| column_error("current_price", e))?,
            last_checked: decode_timestamp(&last_checked)
                .map_err(|e| column_error("last_checked", e))?,
        })
    }
}

pub(crate) fn column_error(column: &str, message: String) -> sqlx::Error {
    sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: message.into(),
    }
}

/// Optional filters for listing products. The default matches everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductFilter {
    /// Case-insensitive substring matched against title or description
    pub search: Option<String>,
    /// Inclusive lower price bound
    pub min_price: Option<Decimal>,
    /// Inclusive upper price bound
    pub max_price: Option<Decimal>,
}

impl ProductFilter {
    pub fn search(mut self, needle: impl Into<String>) -> Self {
        self.search = Some(needle.into());
        self
    }

    pub fn min_price(mut self, price: Decimal) -> Self {
        self.min_price = Some(price);
        self
    }

    pub fn max_price(mut self, price: Decimal) -> Self {
        self.max_price = Some(price);
        self
    }

    /// The search needle lowercased, or `None` when absent or blank
    pub fn search_needle(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase)
    }

    /// Text half of the filter; price bounds are applied in SQL
    pub fn matches_text(&self, product: &Product) -> bool {
        match self.search_needle() {
            None => true,
            Some(needle) => {
                product.title.to_lowercase().contains(&needle)
                    || product.description.to_lowercase().contains(&needle)
            }
        }
    }
}
