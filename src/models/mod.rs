//! Domain models for the price tracker.
//!
//! `Product` and `PriceHistoryEntry` are the persisted entities;
//! `ObservedProduct` is what one scrape of a product page yields.

pub mod observation;
pub mod price_history;
pub mod product;

pub use observation::{ObservationOutcome, ObservedProduct, UNKNOWN_TITLE};
pub use price_history::PriceHistoryEntry;
pub use product::{Product, ProductFilter};

use chrono::{DateTime, SecondsFormat, Utc};
use rust_decimal::Decimal;
use std::str::FromStr;

/// Timestamps are stored as fixed-width RFC 3339 text (microseconds, `Z`
/// suffix) so that string order in SQLite matches chronological order.
pub fn encode_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_timestamp(raw: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| format!("invalid timestamp {:?}: {}", raw, e))
}

/// Prices are stored as exact decimal text
pub fn encode_price(price: Decimal) -> String {
    price.to_string()
}

pub fn decode_price(raw: &str) -> Result<Decimal, String> {
    Decimal::from_str(raw).map_err(|e| format!("invalid price {:?}: {}", raw, e))
}
