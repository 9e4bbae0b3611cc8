use crate::error::Result;
use async_trait::async_trait;

#[derive(Debug, Clone)]
pub struct ModelConfig {
    pub model: String,
    pub temperature: f32,
    /// `None` leaves the output length to the provider
    pub max_output_tokens: Option<u32>,
    /// extra attempts the client makes on transport errors and retryable statuses
    pub max_retries: usize,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model: crate::config::DEFAULT_MODEL.to_string(),
            temperature: 0.0,
            max_output_tokens: None,
            max_retries: 2,
        }
    }
}

/// a hosted completion model
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// send a single-turn prompt and return the raw response text
    async fn complete(&self, prompt: &str) -> Result<String>;
}
