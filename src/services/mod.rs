pub mod extractor;
pub mod fetcher;
pub mod tracking_service;

pub use extractor::{Extractor, ExtractionError};
pub use fetcher::{FetchError, HttpFetcher, PageFetcher};
pub use tracking_service::{AddProductResult, RecheckResult, TrackingService};
