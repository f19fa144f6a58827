pub mod providers;
mod prompt;
mod retry;
mod summarizer;

pub use prompt::{build_prompt, Criticality};
pub use retry::{RetryPolicy, Sleeper, TokioSleeper};
pub use summarizer::Summarizer;
