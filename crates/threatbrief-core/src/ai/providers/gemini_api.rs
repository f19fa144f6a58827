use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::AiProvider;
use crate::config::AiConfig;
use crate::{Error, Result};

const API_KEY_HEADER: &str = "x-goog-api-key";
const TEMPERATURE: f32 = 0.4;
const MAX_OUTPUT_TOKENS: u32 = 8192;

#[derive(Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct GeminiContent {
    role: &'static str,
    parts: Vec<GeminiPart>,
}

#[derive(Serialize)]
struct GeminiPart {
    text: String,
}

#[derive(Serialize)]
struct GenerationConfig {
    temperature: f32,
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: u32,
}

#[derive(Deserialize)]
struct GeminiResponse {
    candidates: Option<Vec<GeminiCandidate>>,
    error: Option<GeminiError>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiContentResponse>,
    #[serde(rename = "finishReason")]
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct GeminiContentResponse {
    #[serde(default)]
    parts: Vec<GeminiPartResponse>,
}

#[derive(Deserialize)]
struct GeminiPartResponse {
    #[serde(default)]
    text: String,
}

#[derive(Deserialize)]
struct GeminiErrorEnvelope {
    error: GeminiError,
}

#[derive(Deserialize)]
struct GeminiError {
    #[serde(default)]
    code: Option<u16>,
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: Option<String>,
}

impl GeminiError {
    fn is_overloaded(&self) -> bool {
        self.code == Some(StatusCode::SERVICE_UNAVAILABLE.as_u16())
            || self.status.as_deref() == Some("UNAVAILABLE")
            || self.message.to_lowercase().contains("overloaded")
    }
}

/// Gemini `generateContent` API provider
pub struct GeminiApiProvider {
    client: Client,
    api_key: String,
    model: String,
    endpoint_base: String,
}

impl GeminiApiProvider {
    pub fn new(config: &AiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            endpoint_base: format!(
                "{}/{}",
                config.base_url.trim_end_matches('/'),
                config.api_version.trim_matches('/')
            ),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.endpoint_base, self.model)
    }

    fn api_error(http_status: StatusCode, error: GeminiError) -> Error {
        let overloaded = http_status == StatusCode::SERVICE_UNAVAILABLE || error.is_overloaded();
        let message = format!(
            "Gemini API error ({}): {}",
            error.status.as_deref().unwrap_or(http_status.as_str()),
            error.message
        );

        if overloaded {
            Error::AiOverloaded(message)
        } else {
            Error::AiProvider(message)
        }
    }
}

#[async_trait::async_trait]
impl AiProvider for GeminiApiProvider {
    fn name(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        let request = GeminiRequest {
            contents: vec![GeminiContent {
                role: "user",
                parts: vec![GeminiPart {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: GenerationConfig {
                temperature: TEMPERATURE,
                max_output_tokens: MAX_OUTPUT_TOKENS,
            },
        };

        let response = self
            .client
            .post(self.endpoint())
            .header(API_KEY_HEADER, &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::AiProvider(format!("Gemini API request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::AiProvider(format!("Failed to read Gemini response: {}", e)))?;

        if !status.is_success() {
            return Err(match serde_json::from_str::<GeminiErrorEnvelope>(&body) {
                Ok(envelope) => Self::api_error(status, envelope.error),
                Err(_) => Self::api_error(
                    status,
                    GeminiError {
                        code: Some(status.as_u16()),
                        message: body.chars().take(500).collect(),
                        status: None,
                    },
                ),
            });
        }

        let gemini_response: GeminiResponse = serde_json::from_str(&body)?;

        if let Some(error) = gemini_response.error {
            return Err(Self::api_error(status, error));
        }

        let Some(candidate) = gemini_response.candidates.and_then(|c| c.into_iter().next()) else {
            return Ok(String::new());
        };

        if let Some(reason) = candidate.finish_reason.as_deref().filter(|r| *r != "STOP") {
            tracing::warn!(
                model = %self.model,
                finish_reason = reason,
                "Gemini stopped early; the report may be incomplete"
            );
        }

        // Long answers may be split across several parts
        let content = candidate
            .content
            .map(|c| c.parts.into_iter().map(|p| p.text).collect::<String>())
            .unwrap_or_default();

        Ok(content)
    }

    fn batch_char_limit(&self) -> usize {
        100000 // ~25K tokens for Gemini
    }
}
