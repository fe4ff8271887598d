//! Gemini API client
//!
//! generateContent with inline JPEG parts. Rate limits (429) and server
//! errors are retried; the response is reduced to the concatenated text of
//! the first candidate.

use super::{CaptionGenerator, ImagePayload};
use crate::config::Config;
use crate::error::{CaptionError, Result};
use async_trait::async_trait;
use reqwest::header::RETRY_AFTER;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Base wait before a retry when the server sends no Retry-After
const RETRY_BASE_SECS: u64 = 10;

#[derive(Serialize)]
struct GeminiRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Part {
    Text { text: String },
    InlineData { inline_data: InlineData },
}

#[derive(Serialize)]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Serialize)]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<ResponseContent>,
}

#[derive(Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    message: String,
}

/// Concatenated text parts of the first candidate.
///
/// A body without candidates, or with only blank text, is `EmptyResponse`;
/// a body that is not the expected JSON is a `Generation` error. Both only
/// affect the current object.
pub fn extract_text(body: &str) -> Result<String> {
    let response: GeminiResponse = serde_json::from_str(body)
        .map_err(|e| CaptionError::Generation(format!("malformed response: {}", e)))?;

    let text: String = response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|p| p.text)
                .collect()
        })
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(CaptionError::EmptyResponse);
    }
    Ok(text)
}

/// Seconds to wait before retry number `attempt` (1-based).
fn retry_delay(retry_after: Option<&str>, attempt: u32) -> Duration {
    retry_after
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
        .unwrap_or_else(|| Duration::from_secs(RETRY_BASE_SECS * attempt as u64))
}

#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    model: String,
    temperature: f32,
    max_retries: u32,
}

impl GeminiClient {
    pub fn new(config: &Config, api_key: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            api_key,
            model: config.model.clone(),
            temperature: config.temperature,
            max_retries: config.max_retries,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/{}:generateContent", GEMINI_API_BASE, self.model)
    }

    fn build_request(&self, prompt: &str, images: &[ImagePayload]) -> GeminiRequest {
        let mut parts = vec![Part::Text { text: prompt.to_string() }];
        parts.extend(images.iter().map(|img| Part::InlineData {
            inline_data: InlineData {
                mime_type: img.mime_type.clone(),
                data: img.data.clone(),
            },
        }));

        GeminiRequest {
            contents: vec![Content { parts }],
            generation_config: GenerationConfig {
                temperature: self.temperature,
            },
        }
    }
}

#[async_trait]
impl CaptionGenerator for GeminiClient {
    async fn generate(&self, prompt: &str, images: &[ImagePayload]) -> Result<String> {
        let request = self.build_request(prompt, images);
        debug!("prompt {} chars, {} images", prompt.len(), images.len());

        let mut attempt = 0u32;
        loop {
            let response = match self
                .client
                .post(self.endpoint())
                .header("x-goog-api-key", &self.api_key)
                .json(&request)
                .send()
                .await
            {
                Ok(r) => r,
                Err(e) if attempt < self.max_retries => {
                    attempt += 1;
                    let delay = retry_delay(None, attempt);
                    warn!("request failed ({}), retry {} in {:?}", e, attempt, delay);
                    tokio::time::sleep(delay).await;
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            let status = response.status();

            if status.as_u16() == 429 || status.is_server_error() {
                if attempt >= self.max_retries {
                    return Err(CaptionError::RateLimited {
                        retries: self.max_retries,
                    });
                }
                attempt += 1;
                let retry_after = response
                    .headers()
                    .get(RETRY_AFTER)
                    .and_then(|v| v.to_str().ok())
                    .map(|s| s.to_string());
                let delay = retry_delay(retry_after.as_deref(), attempt);
                warn!("API returned {}, retry {} in {:?}", status, attempt, delay);
                tokio::time::sleep(delay).await;
                continue;
            }

            let body = response.text().await?;

            if !status.is_success() {
                let message = serde_json::from_str::<ApiErrorBody>(&body)
                    .map(|e| e.error.message)
                    .unwrap_or(body);
                return Err(CaptionError::Generation(format!(
                    "API error {}: {}",
                    status.as_u16(),
                    message
                )));
            }

            debug!("response {} bytes", body.len());
            return extract_text(&body);
        }
    }
}
