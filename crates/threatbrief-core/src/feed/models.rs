/// One entry pulled from a feed during a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedItem {
    pub title: String,
    /// Plain-text summary (HTML already stripped)
    pub summary: String,
    /// Entry link, also the dedup identifier
    pub link: String,
    /// Title of the feed the entry came from
    pub source: String,
}

/// Result of fetching a single configured feed
#[derive(Debug)]
pub struct FeedOutcome {
    pub url: String,
    pub result: crate::Result<Vec<FeedItem>>,
}

impl FeedOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}
