use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Title stored when no title selector matched
pub const UNKNOWN_TITLE: &str = "Unknown Title";

/// Structured result of extracting one product page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservedProduct {
    pub title: String,
    pub description: String,
    /// `None` when the page had no price element at all
    pub price: Option<Decimal>,
}

impl ObservedProduct {
    pub fn new(title: impl Into<String>, description: impl Into<String>, price: Option<Decimal>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            price,
        }
    }

    /// Price as persisted: a missing price element is stored as zero
    pub fn price_or_sentinel(&self) -> Decimal {
        self.price.unwrap_or(Decimal::ZERO)
    }

    pub fn has_price(&self) -> bool {
        self.price.is_some()
    }
}

/// Result of recording an observation against the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservationOutcome {
    pub product_id: i64,
    pub is_new: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_price_uses_zero_sentinel() {
        let observed = ObservedProduct::new(UNKNOWN_TITLE, "", None);
        assert!(!observed.has_price());
        assert_eq!(observed.price_or_sentinel(), Decimal::ZERO);
    }

    #[test]
    fn test_literal_zero_price_is_still_a_price() {
        let observed = ObservedProduct::new("Free sample", "", Some(Decimal::ZERO));
        assert!(observed.has_price());
        assert_eq!(observed.price_or_sentinel(), Decimal::ZERO);
    }
}
