use anyhow::Result;
use async_trait::async_trait;
use genai::chat::ContentPart;
use std::fmt::Debug;

/// One part of a multimodal model request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestPart {
    Text(String),

    /// Inline media as base64
    InlineData { mime_type: String, data: String },
}

impl RequestPart {
    pub fn text(text: impl Into<String>) -> Self {
        RequestPart::Text(text.into())
    }

    /// Convert to genai::ContentPart for API requests
    pub fn to_genai_content_part(&self) -> ContentPart {
        match self {
            RequestPart::Text(text) => ContentPart::Text(text.clone()),
            RequestPart::InlineData { mime_type, data } => {
                ContentPart::from_binary_base64(mime_type.clone(), data.clone(), None)
            }
        }
    }
}

/// A single-turn request whose answer must follow `response_schema`
#[derive(Debug, Clone)]
pub struct ModelRequest {
    pub parts: Vec<RequestPart>,
    pub schema_name: String,
    pub response_schema: serde_json::Value,
    /// Reasoning token budget, for models that think before answering
    pub thinking_budget: Option<u32>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenUsage {
    pub prompt_tokens: Option<u32>,
    pub completion_tokens: Option<u32>,
    pub total_tokens: Option<u32>,
}

impl TokenUsage {
    pub fn format_short(&self) -> String {
        match (
            self.prompt_tokens,
            self.completion_tokens,
            self.total_tokens,
        ) {
            (Some(p), Some(c), Some(t)) => format!("{p}+{c}={t}"),
            (Some(p), Some(c), None) => format!("{p}+{c}"),
            (None, None, Some(t)) => format!("{t}"),
            _ => "N/A".to_string(),
        }
    }
}

/// Raw response text from an AI provider with usage information
#[derive(Debug)]
pub struct AiResponse {
    pub content: String,
    pub usage: TokenUsage,
}

/// Generic AI provider trait for abstraction across different AI services
#[async_trait]
pub trait AiProvider: Debug + Send + Sync {
    /// Send one structured-output request and return the raw response text
    async fn generate_content(&self, request: ModelRequest) -> Result<AiResponse>;

    /// Get the model name being used
    fn model_name(&self) -> &str;

    /// Get provider-specific information (e.g., "Gemini")
    fn provider_name(&self) -> &str;
}

/// Configuration for creating AI providers
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub model: String,
    pub api_key: String,
}

/// Factory for creating AI providers
pub struct ProviderFactory;

impl ProviderFactory {
    /// Create a provider based on the model string
    /// Model format: "`provider::model`" or just "model" (defaults to Gemini)
    pub fn create_provider(config: ProviderConfig) -> Result<Box<dyn AiProvider>> {
        let (provider_name, model_name) = match config.model.split_once("::") {
            Some((provider, model)) => (provider, model),
            None => ("gemini", config.model.as_str()),
        };

        match provider_name.to_lowercase().as_str() {
            "gemini" => {
                let client =
                    crate::gemini::GeminiClient::new(model_name.to_string(), config.api_key)?;
                Ok(Box::new(client))
            }
            _ => Err(anyhow::anyhow!(
                "Unsupported provider: {provider_name}. Supported providers: gemini"
            )),
        }
    }
}
