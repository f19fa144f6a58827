pub mod config;
pub mod error;
pub mod feed;
pub mod store;
pub mod ai;
pub mod report;
pub mod pipeline;

#[cfg(test)]
mod test_support;

pub use config::AppConfig;
pub use error::{Error, Result};
pub use pipeline::{Pipeline, RunOutcome};
