use crate::config::LlmConfig;
use crate::error::{Result, SqlChatError};
use crate::llm::gemini::GeminiClient;
use crate::llm::model::{CompletionClient, ModelConfig};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    GoogleGemini,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::GoogleGemini => "google-gemini",
        }
    }
}

impl std::str::FromStr for Provider {
    type Err = SqlChatError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "google-gemini" => Ok(Provider::GoogleGemini),
            other => Err(SqlChatError::UnsupportedProvider(other.to_string())),
        }
    }
}

/// build the completion client selected by `config.provider`
pub fn build_completion_client(config: &LlmConfig) -> Result<Arc<dyn CompletionClient>> {
    let provider: Provider = config.provider.parse()?;

    let model_config = ModelConfig {
        model: config.model.clone(),
        ..ModelConfig::default()
    };

    match provider {
        Provider::GoogleGemini => {
            let api_key = config.api_key.clone().ok_or_else(|| {
                SqlChatError::Config("GOOGLE_API_KEY is missing in environment variables".to_string())
            })?;
            tracing::info!("using {} provider", provider.as_str());
            Ok(Arc::new(GeminiClient::new(api_key, model_config)?))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn llm_config(provider: &str, api_key: Option<&str>) -> LlmConfig {
        LlmConfig {
            provider: provider.to_string(),
            model: "gemini-2.0-flash-001".to_string(),
            api_key: api_key.map(str::to_string),
        }
    }

    #[test]
    fn test_parse_provider() {
        assert_eq!("google-gemini".parse::<Provider>().unwrap(), Provider::GoogleGemini);
        assert_eq!(" Google-Gemini ".parse::<Provider>().unwrap(), Provider::GoogleGemini);
    }

    #[test]
    fn test_unknown_provider_is_rejected() {
        let result = build_completion_client(&llm_config("open-source", Some("k")));
        assert!(matches!(result, Err(SqlChatError::UnsupportedProvider(p)) if p == "open-source"));
    }

    #[test]
    fn test_gemini_requires_api_key() {
        let result = build_completion_client(&llm_config("google-gemini", None));
        assert!(matches!(result, Err(SqlChatError::Config(_))));
    }

    #[test]
    fn test_gemini_client_builds() {
        assert!(build_completion_client(&llm_config("google-gemini", Some("k"))).is_ok());
    }
}
