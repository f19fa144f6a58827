//! In-memory stand-ins for the network-facing seams

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::ai::providers::AiProvider;
use crate::ai::Sleeper;
use crate::feed::{FeedItem, FeedSource, ParsedFeed};
use crate::report::ReportSender;
use crate::{Error, Result};

/// Build a parsed feed whose items use the given links
pub fn feed(source: &str, links: &[&str]) -> ParsedFeed {
    ParsedFeed {
        source: source.to_string(),
        items: links
            .iter()
            .map(|link| FeedItem {
                title: format!("Story {link}"),
                summary: format!("Details about {link}"),
                link: link.to_string(),
                source: source.to_string(),
            })
            .collect(),
    }
}

/// Serves canned feeds; `None` entries fail like an unreachable host
#[derive(Default)]
pub struct StaticFeeds {
    feeds: Vec<(String, Option<ParsedFeed>)>,
}

impl StaticFeeds {
    pub fn with_feed(mut self, url: &str, parsed: ParsedFeed) -> Self {
        self.feeds.push((url.to_string(), Some(parsed)));
        self
    }

    pub fn with_failure(mut self, url: &str) -> Self {
        self.feeds.push((url.to_string(), None));
        self
    }

    pub fn urls(&self) -> Vec<String> {
        self.feeds.iter().map(|(url, _)| url.clone()).collect()
    }
}

#[async_trait::async_trait]
impl FeedSource for StaticFeeds {
    async fn fetch(&self, url: &str) -> Result<ParsedFeed> {
        match self.feeds.iter().find(|(u, _)| u == url) {
            Some((_, Some(parsed))) => Ok(parsed.clone()),
            _ => Err(Error::FeedParse(format!("HTTP 502 for URL: {url}"))),
        }
    }
}

/// Replays scripted responses and records prompts
pub struct ScriptedProvider {
    responses: Mutex<VecDeque<Result<String>>>,
    pub prompts: Mutex<Vec<String>>,
    char_limit: usize,
}

impl ScriptedProvider {
    pub fn new(responses: Vec<Result<String>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            prompts: Mutex::new(Vec::new()),
            char_limit: 100000,
        }
    }

    pub fn with_char_limit(mut self, limit: usize) -> Self {
        self.char_limit = limit;
        self
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl AiProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(Error::AiProvider("script exhausted".to_string())))
    }

    fn batch_char_limit(&self) -> usize {
        self.char_limit
    }
}

/// Records requested waits instead of sleeping
#[derive(Default)]
pub struct RecordingSleeper {
    slept: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn secs(&self) -> Vec<u64> {
        self.slept.lock().unwrap().iter().map(Duration::as_secs).collect()
    }
}

#[async_trait::async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.slept.lock().unwrap().push(duration);
    }
}

/// Captures delivered (subject, html) pairs
#[derive(Default)]
pub struct RecordingSender {
    sent: Mutex<Vec<(String, String)>>,
    attempts: AtomicUsize,
    fail: bool,
}

impl RecordingSender {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl ReportSender for RecordingSender {
    async fn send(&self, subject: &str, html: &str) -> Result<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(Error::Mail("connection refused".to_string()));
        }
        self.sent.lock().unwrap().push((subject.to_string(), html.to_string()));
        Ok(())
    }
}
