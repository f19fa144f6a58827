mod fetcher;
mod models;
mod parser;

pub use fetcher::FeedFetcher;
pub use models::{FeedItem, FeedOutcome};
pub use parser::{parse_feed, ParsedFeed};

use crate::Result;

/// A source of feed items, keyed by feed URL
#[async_trait::async_trait]
pub trait FeedSource: Send + Sync {
    /// Fetch and parse one feed
    async fn fetch(&self, url: &str) -> Result<ParsedFeed>;
}

/// Fetch every feed independently; one failing feed never hides the others
pub async fn fetch_all(source: &dyn FeedSource, urls: &[String]) -> Vec<FeedOutcome> {
    let mut outcomes = Vec::with_capacity(urls.len());

    for url in urls {
        let result = source.fetch(url).await;
        match &result {
            Ok(parsed) => tracing::info!(
                "Feed '{}' ({}): {} items",
                parsed.source,
                url,
                parsed.items.len()
            ),
            Err(e) => tracing::error!("Failed to fetch feed {}: {}", url, e),
        }
        outcomes.push(FeedOutcome {
            url: url.clone(),
            result: result.map(|parsed| parsed.items),
        });
    }

    outcomes
}
