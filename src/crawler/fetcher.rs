//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building HTTP clients with proper user agent strings
//! - Single paginated GET requests
//! - Bounded retry with exponential backoff for transient failures
//! - Error classification

use crate::config::{CrawlerConfig, UserAgentConfig};
use crate::url::with_page;
use crate::FetchError;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `user_agent` - The user agent configuration
/// * `crawler` - Crawler settings carrying the request timeouts
///
/// # Example
///
/// ```no_run
/// use bookmeter_harvest::config::{CrawlerConfig, UserAgentConfig};
/// use bookmeter_harvest::crawler::build_http_client;
///
/// let client = build_http_client(&UserAgentConfig::default(), &CrawlerConfig::default()).unwrap();
/// ```
pub fn build_http_client(
    user_agent: &UserAgentConfig,
    crawler: &CrawlerConfig,
) -> Result<Client, reqwest::Error> {
    // Format: CrawlerName/Version (+ContactURL; ContactEmail)
    let user_agent = format!(
        "{}/{} (+{}; {})",
        user_agent.crawler_name,
        user_agent.crawler_version,
        user_agent.contact_url,
        user_agent.contact_email
    );

    Client::builder()
        .user_agent(user_agent)
        .timeout(Duration::from_secs(crawler.request_timeout_secs))
        .connect_timeout(Duration::from_secs(crawler.connect_timeout_secs))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches one page of a paginated resource
///
/// Performs exactly one request for `url` with its `page` query parameter
/// set to `page`. Transport failures, timeouts and non-success statuses all
/// come back as `FetchError`; nothing is retried here.
pub async fn fetch_page(client: &Client, url: &Url, page: u32) -> Result<String, FetchError> {
    if page < 1 {
        return Err(FetchError::InvalidPage(page));
    }

    let request_url = with_page(url, page);
    let url_str = request_url.to_string();

    let response = client
        .get(request_url)
        .send()
        .await
        .map_err(|e| classify(&url_str, e))?;

    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status {
            url: url_str,
            status: status.as_u16(),
        });
    }

    response.text().await.map_err(|e| classify(&url_str, e))
}

fn classify(url: &str, error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
        }
    } else {
        FetchError::Transport {
            url: url.to_string(),
            source: error,
        }
    }
}

/// Shared fetch handle used by every walk of a crawl
///
/// Cloning is cheap; the client and settings are reference counted.
#[derive(Debug, Clone)]
pub struct PageFetcher {
    client: Client,
    crawler: Arc<CrawlerConfig>,
}

impl PageFetcher {
    pub fn new(client: Client, crawler: Arc<CrawlerConfig>) -> Self {
        Self { client, crawler }
    }

    /// Builds the client from configuration
    pub fn from_config(
        user_agent: &UserAgentConfig,
        crawler: Arc<CrawlerConfig>,
    ) -> Result<Self, reqwest::Error> {
        let client = build_http_client(user_agent, &crawler)?;
        Ok(Self::new(client, crawler))
    }

    pub fn crawler(&self) -> &CrawlerConfig {
        &self.crawler
    }

    /// One request, no retry
    pub async fn fetch(&self, url: &Url, page: u32) -> Result<String, FetchError> {
        fetch_page(&self.client, url, page).await
    }

    /// Fetches a page, retrying transient failures
    ///
    /// # Retry Logic
    ///
    /// | Condition | Action |
    /// |-----------|--------|
    /// | Transport error / timeout | Retry |
    /// | HTTP 429, HTTP 5xx | Retry |
    /// | Other HTTP status | Fail immediately |
    /// | Page number 0 | Fail immediately, no request |
    ///
    /// Up to `max-retries` retries; the wait before retry `n` is
    /// `retry-backoff-ms * 2^(n-1)`.
    pub async fn fetch_with_retry(&self, url: &Url, page: u32) -> Result<String, FetchError> {
        let mut attempt = 0;
        loop {
            match self.fetch(url, page).await {
                Ok(body) => return Ok(body),
                Err(e) if e.is_retryable() && attempt < self.crawler.max_retries => {
                    attempt += 1;
                    let wait = self.crawler.retry_backoff(attempt);
                    tracing::warn!(
                        "{} (page {}); retry {}/{} in {:?}",
                        e,
                        page,
                        attempt,
                        self.crawler.max_retries,
                        wait
                    );
                    tokio::time::sleep(wait).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
