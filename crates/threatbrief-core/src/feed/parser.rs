use feed_rs::parser;

use super::models::FeedItem;
use crate::{Error, Result};

const UNKNOWN_SOURCE: &str = "Unknown source";
const UNTITLED: &str = "Untitled";
const TEXT_WIDTH: usize = 120;

/// Parsed feed data from RSS/Atom content
#[derive(Debug, Clone)]
pub struct ParsedFeed {
    /// Feed-level title, used as the item source
    pub source: String,
    pub items: Vec<FeedItem>,
}

/// Parse RSS/Atom/JSON feed content into feed items
pub fn parse_feed(content: &[u8]) -> Result<ParsedFeed> {
    let feed = parser::parse(content)
        .map_err(|e| Error::FeedParse(e.to_string()))?;

    let source = feed.title
        .map(|t| t.content.trim().to_string())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| UNKNOWN_SOURCE.to_string());

    let items = feed.entries.into_iter().filter_map(|entry| {
        // Without a link there is nothing to dedup on
        let Some(link) = entry.links.first().map(|l| l.href.trim().to_string()).filter(|l| !l.is_empty()) else {
            tracing::debug!("Skipping entry '{}' without a link", entry.id);
            return None;
        };

        let title = entry.title
            .map(|t| t.content.trim().to_string())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| UNTITLED.to_string());

        let summary = entry.summary
            .map(|s| s.content)
            .or_else(|| entry.content.and_then(|c| c.body))
            .map(|html| html_to_text(&html))
            .unwrap_or_default();

        Some(FeedItem {
            title,
            summary,
            link,
            source: source.clone(),
        })
    }).collect();

    Ok(ParsedFeed { source, items })
}

/// Convert HTML content to plain text
fn html_to_text(html: &str) -> String {
    html2text::from_read(html.as_bytes(), TEXT_WIDTH)
        .map(|text| text.trim().to_string())
        .unwrap_or_else(|_| html.trim().to_string())
}
