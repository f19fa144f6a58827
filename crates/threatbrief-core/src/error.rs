use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Feed parsing error: {0}")]
    FeedParse(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("AI provider error: {0}")]
    AiProvider(String),

    /// The AI service reported that it is temporarily overloaded
    #[error("AI service overloaded: {0}")]
    AiOverloaded(String),

    #[error("Invalid email address: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("Email build error: {0}")]
    Email(#[from] lettre::error::Error),

    #[error("SMTP error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),

    #[error("Mail delivery error: {0}")]
    Mail(String),
}

impl Error {
    /// Whether the failure is worth retrying after a backoff
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::AiOverloaded(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
