//! HTTP fetching with a minimum inter-request delay.
//!
//! One `ContentFetcher` serializes its requests: the rate-limit lock is held
//! across the delay decision and the sleep, so concurrent tasks sharing a
//! fetcher cannot burst past the configured spacing.

use crate::core::config::ParseOptions;
use crate::{OmniparseError, Result};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::debug;

/// Rate-limited HTTP client shared by the HTML pipeline and its image tasks.
pub struct ContentFetcher {
    client: reqwest::Client,
    rate_limit_delay: Duration,
    last_request: Mutex<Option<Instant>>,
}

impl ContentFetcher {
    pub fn new(options: &ParseOptions) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(options.timeout))
            .user_agent(options.user_agent.clone())
            .build()
            .map_err(|e| OmniparseError::network_with_source("Cannot build HTTP client", e))?;
        Ok(Self {
            client,
            rate_limit_delay: Duration::from_secs_f64(options.rate_limit_delay.max(0.0)),
            last_request: Mutex::new(None),
        })
    }

    /// Sleep out the remainder of the inter-request delay, then stamp the
    /// request time. With a zero delay this is a near no-op.
    async fn rate_limit(&self) {
        let mut last = self.last_request.lock().await;
        if self.rate_limit_delay > Duration::ZERO
            && let Some(previous) = *last
        {
            let elapsed = previous.elapsed();
            if elapsed < self.rate_limit_delay {
                tokio::time::sleep(self.rate_limit_delay - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }

    /// GET a URL as text.
    pub async fn fetch_text(&self, url: &str) -> Result<String> {
        self.rate_limit().await;
        debug!(url, "Fetching page");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| map_request_error(url, e))?;
        let response = response
            .error_for_status()
            .map_err(|e| map_request_error(url, e))?;
        response
            .text()
            .await
            .map_err(|e| map_request_error(url, e))
    }

    /// GET a URL as bytes, returning the Content-Type header when present.
    pub async fn fetch_bytes(&self, url: &str) -> Result<(Vec<u8>, Option<String>)> {
        self.rate_limit().await;
        debug!(url, "Fetching resource");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| map_request_error(url, e))?;
        let response = response
            .error_for_status()
            .map_err(|e| map_request_error(url, e))?;
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = response
            .bytes()
            .await
            .map_err(|e| map_request_error(url, e))?;
        Ok((bytes.to_vec(), content_type))
    }
}

fn map_request_error(url: &str, err: reqwest::Error) -> OmniparseError {
    if err.is_timeout() {
        OmniparseError::network_with_source(format!("Request timed out: {}", url), err)
    } else if err.is_connect() {
        OmniparseError::network_with_source(format!("Connection failed: {}", url), err)
    } else if let Some(status) = err.status() {
        OmniparseError::network_with_source(format!("HTTP {} for {}", status, url), err)
    } else {
        OmniparseError::network_with_source(format!("Request failed: {}", url), err)
    }
}
