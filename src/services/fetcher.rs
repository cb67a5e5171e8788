use crate::config::FetcherConfig;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CONNECTION, USER_AGENT};
use reqwest::{Client, StatusCode};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::debug;

/// Any failure to retrieve a page: transport error, timeout or non-2xx status
#[derive(Error, Debug)]
#[error("failed to fetch {url}: {source}")]
pub struct FetchError {
    pub url: String,
    #[source]
    pub source: reqwest::Error,
}

impl FetchError {
    pub fn is_timeout(&self) -> bool {
        self.source.is_timeout()
    }

    /// HTTP status when the server answered with a non-success code
    pub fn status(&self) -> Option<StatusCode> {
        self.source.status()
    }
}

/// Source of raw product page content
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

/// Fetches pages over HTTP with browser-like headers and a fixed delay
/// before every request.
pub struct HttpFetcher {
    client: Client,
    request_delay: Duration,
}

impl HttpFetcher {
    pub fn new(config: &FetcherConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .default_headers(browser_headers(&config.user_agent))
            .timeout(config.timeout())
            .build()?;

        Ok(Self {
            client,
            request_delay: config.request_delay(),
        })
    }

    pub fn request_delay(&self) -> Duration {
        self.request_delay
    }
}

fn browser_headers(user_agent: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        USER_AGENT,
        HeaderValue::from_str(user_agent)
            .unwrap_or_else(|_| HeaderValue::from_static(crate::config::DEFAULT_USER_AGENT)),
    );
    headers.insert(
        ACCEPT,
        HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8"),
    );
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));
    headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));
    headers
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        // Politeness delay; only this request waits
        if !self.request_delay.is_zero() {
            tokio::time::sleep(self.request_delay).await;
        }

        let started = Instant::now();
        let wrap = |source: reqwest::Error| FetchError {
            url: url.to_string(),
            source,
        };

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(wrap)?
            .error_for_status()
            .map_err(wrap)?;

        let body = response.text().await.map_err(wrap)?;

        debug!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            bytes = body.len(),
            "Fetched {}",
            url
        );

        Ok(body)
    }
}
