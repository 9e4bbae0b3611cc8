use crate::error::{Result, SqlChatError};
use crate::llm::model::{CompletionClient, ModelConfig};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

/// google gemini `generateContent` client
pub struct GeminiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    config: ModelConfig,
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>, config: ModelConfig) -> Result<Self> {
        Self::with_base_url(GEMINI_BASE_URL, api_key, config)
    }

    pub fn with_base_url(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        config: ModelConfig,
    ) -> Result<Self> {
        // no request timeout: calls block until the provider answers
        let http = reqwest::Client::builder().build()?;

        tracing::info!("gemini client initialized for model {}", config.model);

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            config,
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.config.model
        )
    }

    fn build_request(&self, prompt: &str) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: GenerationConfig {
                temperature: self.config.temperature,
                max_output_tokens: self.config.max_output_tokens,
            },
        }
    }

    async fn send(&self, request: &GenerateContentRequest) -> Result<String> {
        let url = self.endpoint();
        let mut attempt = 0;

        loop {
            attempt += 1;
            let response = self
                .http
                .post(&url)
                .header("x-goog-api-key", &self.api_key)
                .json(request)
                .send()
                .await;

            let retries_left = attempt <= self.config.max_retries;

            let response = match response {
                Ok(r) => r,
                Err(e) if retries_left => {
                    tracing::warn!("gemini request attempt {} failed: {}", attempt, e);
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            let status = response.status();
            if status.is_success() {
                let body: GenerateContentResponse = response.json().await?;
                return extract_text(body);
            }

            let body = response.text().await.unwrap_or_default();
            if retries_left && is_retryable(status) {
                tracing::warn!("gemini returned {} on attempt {}, retrying", status, attempt);
                continue;
            }

            let truncated: String = body.chars().take(200).collect();
            return Err(SqlChatError::Llm(format!("gemini http {}: {}", status, truncated)));
        }
    }
}

fn is_retryable(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

fn extract_text(body: GenerateContentResponse) -> Result<String> {
    let content = body
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .ok_or_else(|| SqlChatError::Llm("gemini returned no candidates".to_string()))?;

    Ok(content
        .parts
        .into_iter()
        .map(|p| p.text)
        .collect::<Vec<_>>()
        .join(""))
}

#[async_trait]
impl CompletionClient for GeminiClient {
    #[tracing::instrument(skip(self, prompt), fields(llm.model = %self.config.model, prompt_len = prompt.len()))]
    async fn complete(&self, prompt: &str) -> Result<String> {
        let request = self.build_request(prompt);
        let output = self.send(&request).await?;
        tracing::debug!("generated {} chars", output.len());
        Ok(output)
    }
}
