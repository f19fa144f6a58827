use std::collections::HashSet;
use std::sync::Arc;

use chrono::Local;

use crate::ai::Summarizer;
use crate::config::AppConfig;
use crate::feed::{fetch_all, FeedFetcher, FeedItem, FeedSource};
use crate::report::{dispatch, ReportSender, SmtpMailer};
use crate::store::ProcessedStore;
use crate::Result;

/// What a single invocation ended up doing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Nothing new since the last delivered report
    NoNewItems,
    /// The AI step produced nothing; items stay pending for the next run
    NoReport { pending: usize },
    /// The report could not be delivered; items stay pending
    DeliveryFailed { pending: usize },
    /// Report sent and its items recorded as processed
    Delivered { reported: usize },
}

/// One fetch → dedup → summarize → mail → record cycle
pub struct Pipeline {
    feeds: Arc<dyn FeedSource>,
    urls: Vec<String>,
    store: ProcessedStore,
    summarizer: Summarizer,
    sender: Arc<dyn ReportSender>,
}

impl Pipeline {
    pub fn new(
        feeds: Arc<dyn FeedSource>,
        urls: Vec<String>,
        store: ProcessedStore,
        summarizer: Summarizer,
        sender: Arc<dyn ReportSender>,
    ) -> Self {
        Self {
            feeds,
            urls,
            store,
            summarizer,
            sender,
        }
    }

    /// Wire the production components from configuration
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Ok(Self::new(
            Arc::new(FeedFetcher::new(&config.feeds)?),
            config.feeds.urls.clone(),
            ProcessedStore::new(config.history_path()),
            Summarizer::new(&config.ai)?,
            Arc::new(SmtpMailer::new(&config.smtp)?),
        ))
    }

    /// Fetch every feed and keep items whose link has not been reported
    pub async fn collect_new_items(&self, processed: &HashSet<String>) -> Vec<FeedItem> {
        let outcomes = fetch_all(self.feeds.as_ref(), &self.urls).await;
        let failed = outcomes.iter().filter(|o| !o.is_ok()).count();
        if failed > 0 {
            tracing::warn!("{} of {} feeds could not be fetched", failed, outcomes.len());
        }

        outcomes
            .into_iter()
            .filter_map(|outcome| outcome.result.ok())
            .flatten()
            .filter(|item| !processed.contains(&item.link))
            .collect()
    }

    pub async fn run(&self) -> Result<RunOutcome> {
        tracing::info!("Starting intelligence run over {} feeds", self.urls.len());

        let processed = self.store.load()?;
        let items = self.collect_new_items(&processed).await;

        if items.is_empty() {
            tracing::info!("No new items since the last run");
            return Ok(RunOutcome::NoNewItems);
        }

        tracing::info!("Analyzing {} new items", items.len());

        let Some(report) = self.summarizer.summarize(&items).await else {
            tracing::warn!("No report produced; {} items left for the next run", items.len());
            return Ok(RunOutcome::NoReport { pending: items.len() });
        };

        if dispatch(self.sender.as_ref(), &report, items.len(), Local::now()).await.is_err() {
            tracing::warn!("Report not delivered; {} items left for the next run", items.len());
            return Ok(RunOutcome::DeliveryFailed { pending: items.len() });
        }

        let links: Vec<&str> = items.iter().map(|item| item.link.as_str()).collect();
        self.store.append(&links)?;

        Ok(RunOutcome::Delivered { reported: items.len() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AiConfig;
    use crate::test_support::{feed, RecordingSender, RecordingSleeper, ScriptedProvider, StaticFeeds};
    use crate::Error;
    use tempfile::TempDir;

    struct Harness {
        _dir: TempDir,
        store: ProcessedStore,
        provider: Arc<ScriptedProvider>,
        sleeper: Arc<RecordingSleeper>,
        sender: Arc<RecordingSender>,
        pipeline: Pipeline,
    }

    fn harness(feeds: StaticFeeds, ai: Vec<Result<String>>, sender: RecordingSender) -> Harness {
        let dir = TempDir::new().unwrap();
        let store = ProcessedStore::new(dir.path().join("processed_ids.txt"));
        let provider = Arc::new(ScriptedProvider::new(ai));
        let sleeper = Arc::new(RecordingSleeper::default());
        let sender = Arc::new(sender);
        let urls = feeds.urls();

        let summarizer = Summarizer::with_provider(provider.clone(), sleeper.clone(), &AiConfig::default());
        let pipeline = Pipeline::new(Arc::new(feeds), urls, store.clone(), summarizer, sender.clone());

        Harness {
            _dir: dir,
            store,
            provider,
            sleeper,
            sender,
            pipeline,
        }
    }

    #[tokio::test]
    async fn test_new_items_reported_and_recorded() {
        let feeds = StaticFeeds::default().with_feed("https://a.example/rss", feed("A feed", &["u1", "u2"]));
        let h = harness(feeds, vec![Ok("<div>OK</div>".to_string())], RecordingSender::default());

        let outcome = h.pipeline.run().await.unwrap();

        assert_eq!(outcome, RunOutcome::Delivered { reported: 2 });
        assert_eq!(
            h.store.load().unwrap(),
            HashSet::from(["u1".to_string(), "u2".to_string()])
        );
        let sent = h.sender.sent();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].1.contains("OK"));
        assert!(sent[0].0.starts_with("INTEL REPORT: "));
    }

    #[tokio::test]
    async fn test_already_processed_items_skip_everything() {
        let feeds = StaticFeeds::default().with_feed("https://a.example/rss", feed("A feed", &["u1"]));
        let h = harness(feeds, vec![Ok("<div>OK</div>".to_string())], RecordingSender::default());
        h.store.append(&["u1"]).unwrap();

        let outcome = h.pipeline.run().await.unwrap();

        assert_eq!(outcome, RunOutcome::NoNewItems);
        assert_eq!(h.provider.calls(), 0);
        assert!(h.sender.sent().is_empty());
        assert_eq!(std::fs::read_to_string(h.store.path()).unwrap(), "u1\n");
    }

    #[tokio::test]
    async fn test_processed_links_never_reach_prompt() {
        let feeds = StaticFeeds::default().with_feed("https://a.example/rss", feed("A feed", &["u1", "u2", "u3"]));
        let h = harness(feeds, vec![Ok("<div>OK</div>".to_string())], RecordingSender::default());
        h.store.append(&["u2"]).unwrap();

        let outcome = h.pipeline.run().await.unwrap();

        assert_eq!(outcome, RunOutcome::Delivered { reported: 2 });
        let prompt = h.provider.prompts.lock().unwrap()[0].clone();
        assert!(prompt.contains("Link: u1"));
        assert!(prompt.contains("Link: u3"));
        assert!(!prompt.contains("Link: u2"));
    }

    #[tokio::test]
    async fn test_ai_failure_leaves_store_untouched() {
        let feeds = StaticFeeds::default().with_feed("https://a.example/rss", feed("A feed", &["u1"]));
        let overloaded = || Err(Error::AiOverloaded("503".to_string()));
        let h = harness(feeds, vec![overloaded(), overloaded(), overloaded()], RecordingSender::default());

        let outcome = h.pipeline.run().await.unwrap();

        assert_eq!(outcome, RunOutcome::NoReport { pending: 1 });
        assert_eq!(h.sleeper.secs(), vec![30, 60, 90]);
        assert!(h.sender.sent().is_empty());
        assert!(!h.store.path().exists());
    }

    #[tokio::test]
    async fn test_overload_then_success_completes() {
        let feeds = StaticFeeds::default().with_feed("https://a.example/rss", feed("A feed", &["u1"]));
        let h = harness(
            feeds,
            vec![
                Err(Error::AiOverloaded("503".to_string())),
                Err(Error::AiOverloaded("503".to_string())),
                Ok("<div>third time</div>".to_string()),
            ],
            RecordingSender::default(),
        );

        let outcome = h.pipeline.run().await.unwrap();

        assert_eq!(outcome, RunOutcome::Delivered { reported: 1 });
        assert_eq!(h.provider.calls(), 3);
        assert_eq!(h.sleeper.secs(), vec![30, 60]);
        assert!(h.store.load().unwrap().contains("u1"));
    }

    #[tokio::test]
    async fn test_delivery_failure_leaves_store_untouched() {
        let feeds = StaticFeeds::default().with_feed("https://a.example/rss", feed("A feed", &["u1", "u2"]));
        let h = harness(feeds, vec![Ok("<div>OK</div>".to_string())], RecordingSender::failing());

        let outcome = h.pipeline.run().await.unwrap();

        assert_eq!(outcome, RunOutcome::DeliveryFailed { pending: 2 });
        assert_eq!(h.sender.attempts(), 1);
        assert!(h.store.load().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failing_feed_does_not_hide_others() {
        let feeds = StaticFeeds::default()
            .with_failure("https://down.example/rss")
            .with_feed("https://b.example/rss", feed("B feed", &["b1"]));
        let h = harness(feeds, vec![Ok("<div>OK</div>".to_string())], RecordingSender::default());

        let outcome = h.pipeline.run().await.unwrap();

        assert_eq!(outcome, RunOutcome::Delivered { reported: 1 });
        let prompt = h.provider.prompts.lock().unwrap()[0].clone();
        assert!(prompt.contains("Source: B feed"));
        assert_eq!(h.store.load().unwrap(), HashSet::from(["b1".to_string()]));
    }
}
