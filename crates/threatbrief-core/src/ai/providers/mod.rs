mod gemini_api;

pub use gemini_api::GeminiApiProvider;

use crate::Result;

/// A text-generation backend the report prompt is sent to
#[async_trait::async_trait]
pub trait AiProvider: Send + Sync {
    /// Human-readable provider name for logs
    fn name(&self) -> &str;

    /// Send one prompt and return the generated text
    ///
    /// Overload signals must surface as `Error::AiOverloaded` so callers can
    /// retry them; every other failure is final.
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Maximum characters of item text to embed in a single prompt
    fn batch_char_limit(&self) -> usize {
        80000 // ~20K tokens, conservative default
    }
}
