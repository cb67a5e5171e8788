//! Product page extraction.
//!
//! Each field is located through an ordered list of CSS selectors taken from
//! [`SelectorConfig`]; the first selector with a match wins. Only a price
//! element whose text holds no parseable number is an error. Missing fields
//! fall back to sentinels.

use crate::config::SelectorConfig;
use crate::models::{ObservedProduct, UNKNOWN_TITLE};
use rust_decimal::Decimal;
use scraper::{Html, Selector};
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    /// A price element exists but its text is not a number
    #[error("unparseable price text {text:?}")]
    MalformedPrice { text: String },

    /// A configured selector does not compile
    #[error("invalid selector {selector:?}: {reason}")]
    InvalidSelector { selector: String, reason: String },
}

/// Compiled selector lists, one per field
#[derive(Debug)]
pub struct Extractor {
    title: Vec<Selector>,
    description: Vec<Selector>,
    price: Vec<Selector>,
}

fn compile(selectors: &[String]) -> Result<Vec<Selector>, ExtractionError> {
    selectors
        .iter()
        .map(|raw| {
            Selector::parse(raw).map_err(|e| ExtractionError::InvalidSelector {
                selector: raw.clone(),
                reason: e.to_string(),
            })
        })
        .collect()
}

/// Trimmed text of the first element matched by any selector, in order
fn first_text(document: &Html, selectors: &[Selector]) -> Option<String> {
    selectors.iter().find_map(|selector| {
        document
            .select(selector)
            .next()
            .map(|element| element.text().collect::<String>().trim().to_string())
    })
}

/// Parse display price text such as `"₹1,234.50"`.
///
/// Everything except ASCII digits and `.` is dropped before parsing, which
/// removes currency symbols, thousands separators and whitespace.
pub fn parse_price(text: &str) -> Result<Decimal, ExtractionError> {
    let cleaned: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();

    if !cleaned.chars().any(|c| c.is_ascii_digit()) {
        return Err(ExtractionError::MalformedPrice {
            text: text.to_string(),
        });
    }

    Decimal::from_str(&cleaned).map_err(|_| ExtractionError::MalformedPrice {
        text: text.to_string(),
    })
}

impl Extractor {
    /// Compile every selector in the table, failing on the first bad one
    pub fn new(config: &SelectorConfig) -> Result<Self, ExtractionError> {
        Ok(Self {
            title: compile(&config.title)?,
            description: compile(&config.description)?,
            price: compile(&config.price)?,
        })
    }

    pub fn extract(&self, page: &str) -> Result<ObservedProduct, ExtractionError> {
        let document = Html::parse_document(page);

        let title = first_text(&document, &self.title).unwrap_or_else(|| UNKNOWN_TITLE.to_string());

        let description = first_text(&document, &self.description).unwrap_or_default();

        let price = first_text(&document, &self.price)
            .map(|text| parse_price(&text))
            .transpose()?;

        Ok(ObservedProduct {
            title,
            description,
            price,
        })
    }
}
