use bytes::Bytes;
use std::time::Duration;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::{Client, StatusCode};
use url::Url;

use super::parser::{parse_feed, ParsedFeed};
use super::FeedSource;
use crate::config::FeedsConfig;
use crate::{Error, Result};

const MAX_FEED_BYTES: usize = 5 * 1024 * 1024;
const MAX_RETRIES: u32 = 3;
const INITIAL_RETRY_DELAY_MS: u64 = 500;
const MAX_REDIRECTS: usize = 10;
const USER_AGENT: &str = concat!("threatbrief/", env!("CARGO_PKG_VERSION"), " (feed digest)");

/// Feed fetcher backed by a shared HTTP client
pub struct FeedFetcher {
    client: Client,
    retry_delay: Duration,
}

impl FeedFetcher {
    /// Create a new feed fetcher with configuration
    pub fn new(config: &FeedsConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .gzip(true)
            .deflate(true)
            .brotli(true)
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .build()?;

        Ok(Self {
            client,
            retry_delay: Duration::from_millis(INITIAL_RETRY_DELAY_MS),
        })
    }

    /// Override the first retry delay (doubles on every retry)
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    fn build_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "application/rss+xml,application/atom+xml,application/feed+json,application/xml;q=0.9,*/*;q=0.8"
            )
        );
        headers
    }

    /// Fetch with retry and exponential backoff on 429/503 and transport errors
    async fn fetch_with_retry(&self, url: &str) -> Result<(StatusCode, Bytes)> {
        let mut last_error = None;
        let mut delay = self.retry_delay;

        for attempt in 1..=MAX_RETRIES {
            tracing::debug!("Fetch attempt {} for {}", attempt, url);

            match self.client.get(url).headers(Self::build_headers()).send().await {
                Ok(response) => {
                    let status = response.status();

                    if status == StatusCode::TOO_MANY_REQUESTS
                        || status == StatusCode::SERVICE_UNAVAILABLE
                    {
                        tracing::warn!(
                            "Received {} for {} (attempt {}/{})",
                            status,
                            url,
                            attempt,
                            MAX_RETRIES
                        );
                        last_error = Some(Error::FeedParse(format!("HTTP {} for URL: {}", status, url)));
                    } else {
                        match response.bytes().await {
                            Ok(bytes) => return Ok((status, bytes)),
                            Err(e) => {
                                tracing::warn!("Failed to read response body from {}: {}", url, e);
                                last_error = Some(Error::Http(e));
                            }
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!(
                        "Request failed for {} (attempt {}/{}): {}",
                        url,
                        attempt,
                        MAX_RETRIES,
                        e
                    );
                    last_error = Some(Error::Http(e));
                }
            }

            if attempt < MAX_RETRIES {
                tokio::time::sleep(delay).await;
                delay *= 2;
            }
        }

        Err(last_error.unwrap_or_else(|| {
            Error::FeedParse(format!("Failed to fetch URL after {} retries: {}", MAX_RETRIES, url))
        }))
    }

    /// Fetch and parse a feed from URL
    pub async fn fetch_feed(&self, url: &str) -> Result<ParsedFeed> {
        let url = Url::parse(url.trim())?;

        tracing::info!("Fetching feed from: {}", url);

        let (status, content) = self.fetch_with_retry(url.as_str()).await?;

        if !status.is_success() {
            return Err(Error::FeedParse(format!("HTTP {} for URL: {}", status, url)));
        }

        if content.len() > MAX_FEED_BYTES {
            return Err(Error::FeedParse(format!(
                "Feed too large ({} bytes) for URL: {}",
                content.len(),
                url
            )));
        }

        parse_feed(&content)
    }
}

#[async_trait::async_trait]
impl FeedSource for FeedFetcher {
    async fn fetch(&self, url: &str) -> Result<ParsedFeed> {
        self.fetch_feed(url).await
    }
}
