use std::sync::Arc;

use super::prompt::{build_prompt, prompt_len};
use super::providers::{AiProvider, GeminiApiProvider};
use super::retry::{RetryPolicy, Sleeper, TokioSleeper};
use crate::config::AiConfig;
use crate::feed::FeedItem;
use crate::Result;

/// Turns new feed items into the HTML body of the intelligence report
pub struct Summarizer {
    provider: Arc<dyn AiProvider>,
    sleeper: Arc<dyn Sleeper>,
    policy: RetryPolicy,
    language: String,
    max_items_per_prompt: usize,
}

impl Summarizer {
    /// Create a summarizer talking to the configured Gemini model
    pub fn new(config: &AiConfig) -> Result<Self> {
        let provider = Arc::new(GeminiApiProvider::new(config)?);
        Ok(Self::with_provider(provider, Arc::new(TokioSleeper), config))
    }

    pub fn with_provider(
        provider: Arc<dyn AiProvider>,
        sleeper: Arc<dyn Sleeper>,
        config: &AiConfig,
    ) -> Self {
        Self {
            provider,
            sleeper,
            policy: RetryPolicy::from_config(config),
            language: config.report_language.clone(),
            max_items_per_prompt: config.max_items_per_prompt.max(1),
        }
    }

    /// Split items, in order, into prompt-sized batches
    pub fn batches<'a>(&self, items: &'a [FeedItem]) -> Vec<&'a [FeedItem]> {
        let char_limit = self.provider.batch_char_limit();
        let mut batches = Vec::new();
        let mut start = 0;
        let mut chars = 0;

        for (i, item) in items.iter().enumerate() {
            let len = prompt_len(item);
            let count = i - start;
            if count > 0 && (count >= self.max_items_per_prompt || chars + len > char_limit) {
                batches.push(&items[start..i]);
                start = i;
                chars = 0;
            }
            chars += len;
        }

        if start < items.len() {
            batches.push(&items[start..]);
        }

        batches
    }

    /// Produce the report body, or `None` when no report could be produced
    ///
    /// Every batch must succeed; a partial report would leave some items
    /// without delivered coverage.
    pub async fn summarize(&self, items: &[FeedItem]) -> Option<String> {
        if items.is_empty() {
            return None;
        }

        let batches = self.batches(items);
        let total = batches.len();
        let mut sections = Vec::with_capacity(total);

        for (i, batch) in batches.into_iter().enumerate() {
            tracing::info!(
                "Analyzing batch {}/{} ({} items) with {}",
                i + 1,
                total,
                batch.len(),
                self.provider.name()
            );

            match self.summarize_batch(batch).await {
                Some(html) => sections.push(html),
                None => {
                    tracing::error!("Batch {}/{} produced no report, skipping this run", i + 1, total);
                    return None;
                }
            }
        }

        Some(sections.join("\n"))
    }

    async fn summarize_batch(&self, batch: &[FeedItem]) -> Option<String> {
        let prompt = build_prompt(batch, &self.language);
        let provider = self.provider.as_ref();
        let prompt = prompt.as_str();

        match self
            .policy
            .run(self.sleeper.as_ref(), move || provider.generate(prompt))
            .await
        {
            Ok(text) => {
                let html = strip_code_fences(&text);
                if html.is_empty() {
                    tracing::warn!("AI service returned an empty report");
                    None
                } else {
                    Some(html.to_string())
                }
            }
            Err(e) => {
                tracing::error!(
                    "AI summarization failed after at most {} attempts: {}",
                    self.policy.max_attempts,
                    e
                );
                None
            }
        }
    }
}

/// Remove a surrounding ```html fence that models like to add
fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the language tag on the opening line
    let body = rest.split_once('\n').map_or("", |(_, body)| body);
    body.trim_end()
        .strip_suffix("```")
        .unwrap_or(body)
        .trim()
}
