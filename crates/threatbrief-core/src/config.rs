use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Environment variable pointing at an optional TOML config file
pub const CONFIG_PATH_ENV: &str = "THREATBRIEF_CONFIG";
const DEFAULT_CONFIG_FILE: &str = "threatbrief.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub feeds: FeedsConfig,
    #[serde(default)]
    pub ai: AiConfig,
    #[serde(default)]
    pub smtp: SmtpConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// File holding one already-reported link per line
    #[serde(default = "default_history_file")]
    pub history_file: PathBuf,
    /// Log level used when RUST_LOG is not set
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            history_file: default_history_file(),
            log_level: default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedsConfig {
    /// RSS/Atom feed URLs to poll
    #[serde(default)]
    pub urls: Vec<String>,
    /// Request timeout in seconds
    #[serde(default = "default_feed_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for FeedsConfig {
    fn default() -> Self {
        Self {
            urls: Vec::new(),
            request_timeout_secs: default_feed_timeout(),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct AiConfig {
    /// Gemini API key
    #[serde(default)]
    pub api_key: String,
    /// Gemini model name
    #[serde(default = "default_model")]
    pub model: String,
    /// REST API version segment ("v1", "v1beta")
    #[serde(default = "default_api_version")]
    pub api_version: String,
    #[serde(default = "default_ai_base_url")]
    pub base_url: String,
    /// Language the report is written in
    #[serde(default = "default_report_language")]
    pub report_language: String,
    /// Total attempts per prompt when the service is overloaded
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Backoff unit; the wait after attempt N is N times this
    #[serde(default = "default_retry_backoff")]
    pub retry_backoff_secs: u64,
    /// Maximum number of feed items embedded in one prompt
    #[serde(default = "default_max_items_per_prompt")]
    pub max_items_per_prompt: usize,
    #[serde(default = "default_ai_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: default_model(),
            api_version: default_api_version(),
            base_url: default_ai_base_url(),
            report_language: default_report_language(),
            max_attempts: default_max_attempts(),
            retry_backoff_secs: default_retry_backoff(),
            max_items_per_prompt: default_max_items_per_prompt(),
            request_timeout_secs: default_ai_timeout(),
        }
    }
}

#[derive(Clone, Default, Serialize, Deserialize)]
pub struct SmtpConfig {
    #[serde(default)]
    pub host: String,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    /// From address; falls back to `username`
    #[serde(default)]
    pub sender: Option<String>,
    #[serde(default)]
    pub recipient: String,
}

const REDACTED: &str = "<redacted>";

impl fmt::Debug for AiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AiConfig")
            .field("api_key", &REDACTED)
            .field("model", &self.model)
            .field("api_version", &self.api_version)
            .field("base_url", &self.base_url)
            .field("report_language", &self.report_language)
            .field("max_attempts", &self.max_attempts)
            .field("retry_backoff_secs", &self.retry_backoff_secs)
            .field("max_items_per_prompt", &self.max_items_per_prompt)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

impl fmt::Debug for SmtpConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmtpConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &REDACTED)
            .field("sender", &self.sender)
            .field("recipient", &self.recipient)
            .finish()
    }
}

impl SmtpConfig {
    /// Address the report is sent from
    pub fn sender(&self) -> &str {
        self.sender
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(self.username.as_str())
    }
}

fn default_history_file() -> PathBuf {
    PathBuf::from("processed_ids.txt")
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_feed_timeout() -> u64 {
    30
}

fn default_model() -> String {
    "gemini-2.5-flash-lite".to_string()
}

fn default_api_version() -> String {
    "v1".to_string()
}

fn default_ai_base_url() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_report_language() -> String {
    "English".to_string()
}

fn default_max_attempts() -> u32 {
    3
}

fn default_retry_backoff() -> u64 {
    30
}

fn default_max_items_per_prompt() -> usize {
    40
}

fn default_ai_timeout() -> u64 {
    60
}

/// Expand tilde (~) in path to user's home directory
fn expand_tilde(path: &Path) -> PathBuf {
    if let Some(path_str) = path.to_str() {
        if let Some(stripped) = path_str.strip_prefix("~/") {
            if let Some(home) = dirs::home_dir() {
                return home.join(stripped);
            }
        } else if path_str == "~" {
            if let Some(home) = dirs::home_dir() {
                return home;
            }
        }
    }
    path.to_path_buf()
}

/// Split a comma-separated URL list, dropping blanks
pub fn parse_url_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

impl AppConfig {
    /// Load configuration from `.env`, the optional TOML file and the process
    /// environment, then validate it
    pub fn load() -> crate::Result<Self> {
        // A missing .env is normal in scheduled environments
        let _ = dotenvy::dotenv();

        let config_path = Self::config_path();
        let mut config = if config_path.exists() {
            tracing::debug!("Reading configuration from {}", config_path.display());
            Self::from_toml(&std::fs::read_to_string(&config_path)?)?
        } else {
            Self::default()
        };

        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(content: &str) -> crate::Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Get the configuration file path
    pub fn config_path() -> PathBuf {
        std::env::var(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_FILE))
    }

    /// Override fields from environment-style variables
    pub fn apply_env<F>(&mut self, lookup: F) -> crate::Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("GEMINI_API_KEY") {
            self.ai.api_key = v;
        }
        if let Some(v) = lookup("GEMINI_MODEL") {
            self.ai.model = v;
        }
        if let Some(v) = lookup("RSS_URLS") {
            self.feeds.urls = parse_url_list(&v);
        }
        if let Some(v) = lookup("SMTP_SERVER") {
            self.smtp.host = v;
        }
        if let Some(v) = lookup("SMTP_PORT") {
            let port = v.trim().parse::<u16>().map_err(|_| {
                crate::Error::Config(format!("SMTP_PORT must be a port number, got '{}'", v))
            })?;
            self.smtp.port = Some(port);
        }
        if let Some(v) = lookup("EMAIL_USER") {
            self.smtp.username = v;
        }
        if let Some(v) = lookup("EMAIL_PASSWORD") {
            self.smtp.password = v;
        }
        if let Some(v) = lookup("EMAIL_SENDER") {
            self.smtp.sender = Some(v);
        }
        if let Some(v) = lookup("EMAIL_RECEIVER") {
            self.smtp.recipient = v;
        }
        if let Some(v) = lookup("HISTORY_FILE") {
            self.general.history_file = PathBuf::from(v);
        }
        Ok(())
    }

    /// Fail with every missing required setting at once
    pub fn validate(&self) -> crate::Result<()> {
        let mut missing = Vec::new();

        if self.ai.api_key.trim().is_empty() {
            missing.push("GEMINI_API_KEY");
        }
        if self.feeds.urls.is_empty() {
            missing.push("RSS_URLS");
        }
        if self.smtp.host.trim().is_empty() {
            missing.push("SMTP_SERVER");
        }
        if self.smtp.port.is_none() {
            missing.push("SMTP_PORT");
        }
        if self.smtp.username.trim().is_empty() {
            missing.push("EMAIL_USER");
        }
        if self.smtp.password.is_empty() {
            missing.push("EMAIL_PASSWORD");
        }
        if self.smtp.recipient.trim().is_empty() {
            missing.push("EMAIL_RECEIVER");
        }

        if !missing.is_empty() {
            return Err(crate::Error::Config(format!(
                "missing required settings: {}",
                missing.join(", ")
            )));
        }

        if self.ai.max_attempts == 0 {
            return Err(crate::Error::Config("ai.max_attempts must be at least 1".to_string()));
        }

        Ok(())
    }

    /// Path of the processed-identifier file (with tilde expansion)
    pub fn history_path(&self) -> PathBuf {
        expand_tilde(&self.general.history_file)
    }
}
