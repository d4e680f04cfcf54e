use crate::api_key::validate_api_key_format;
use crate::logging::{log_debug, log_error, log_info, log_trace, log_warn};
use crate::provider::{AiProvider, AiResponse, ModelRequest, RequestPart, TokenUsage};
use anyhow::{Context, Result};
use async_trait::async_trait;
use genai::Client;
use genai::chat::{
    ChatMessage, ChatOptions, ChatRequest, ChatResponseFormat, ContentPart, JsonSpec,
    MessageContent, ReasoningEffort,
};
use genai::resolver::{AuthData, AuthResolver};

#[derive(Debug)]
pub struct GeminiClient {
    api_key: String,
    model: String,
}

impl GeminiClient {
    pub fn new(model: String, api_key: String) -> Result<Self> {
        if api_key.trim().is_empty() {
            return Err(anyhow::anyhow!("No API key provided"));
        }

        if !validate_api_key_format(&api_key) {
            log_warn("API key format validation failed");
        }

        log_info(&format!("Initializing Gemini API client with model: {model}"));

        Ok(Self { api_key, model })
    }

    fn build_client(&self) -> Client {
        let api_key = self.api_key.clone();
        let auth_resolver = AuthResolver::from_resolver_fn(move |_model_iden| {
            Ok(Some(AuthData::from_single(api_key.clone())))
        });

        Client::builder().with_auth_resolver(auth_resolver).build()
    }

    fn build_chat_request(request: &ModelRequest) -> ChatRequest {
        let parts: Vec<ContentPart> = request
            .parts
            .iter()
            .map(RequestPart::to_genai_content_part)
            .collect();

        ChatRequest::new(vec![ChatMessage::user(MessageContent::from_parts(parts))])
    }

    fn build_chat_options(request: &ModelRequest) -> ChatOptions {
        let response_format = ChatResponseFormat::JsonSpec(JsonSpec::new(
            request.schema_name.clone(),
            request.response_schema.clone(),
        ));

        let options = ChatOptions::default().with_response_format(response_format);
        match request.thinking_budget {
            Some(budget) => options.with_reasoning_effort(ReasoningEffort::Budget(budget)),
            None => options,
        }
    }

    fn is_auth_error(error_debug: &str) -> bool {
        let lower = error_debug.to_lowercase();
        error_debug.contains("401")
            || error_debug.contains("403")
            || lower.contains("authentication")
            || lower.contains("permission")
    }
}

#[async_trait]
impl AiProvider for GeminiClient {
    async fn generate_content(&self, request: ModelRequest) -> Result<AiResponse> {
        log_debug(&format!(
            "Sending {} part(s) to Gemini model {} (schema: {}, thinking budget: {:?})",
            request.parts.len(),
            self.model,
            request.schema_name,
            request.thinking_budget
        ));

        let chat_request = Self::build_chat_request(&request);
        let options = Self::build_chat_options(&request);
        log_trace(&format!("Request Debug: {chat_request:?}"));

        let client = self.build_client();
        let chat_response = match client
            .exec_chat(&self.model, chat_request, Some(&options))
            .await
        {
            Ok(response) => response,
            Err(e) => {
                let error_debug = format!("{e:?}");
                log_debug(&format!("Raw genai error: {error_debug}"));
                if Self::is_auth_error(&error_debug) {
                    log_error("Gemini rejected the API key");
                    return Err(e).context(
                        "Authentication failed. Please check your API key and billing settings",
                    );
                }
                return Err(e).context("Failed to send request to Gemini API");
            }
        };

        log_trace(&format!("Response Debug: {chat_response:?}"));

        let usage = TokenUsage {
            prompt_tokens: chat_response.usage.prompt_tokens.map(|t| t as u32),
            completion_tokens: chat_response.usage.completion_tokens.map(|t| t as u32),
            total_tokens: chat_response.usage.total_tokens.map(|t| t as u32),
        };

        let generated_text = chat_response
            .first_text()
            .context("Failed to extract text from Gemini response")?;

        log_info(&format!(
            "Received response from {}, length: {}, tokens: {}",
            self.model,
            generated_text.len(),
            usage.format_short()
        ));

        Ok(AiResponse {
            content: generated_text.to_string(),
            usage,
        })
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn provider_name(&self) -> &'static str {
        "Gemini"
    }
}
