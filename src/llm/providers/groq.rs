//! Groq provider implementation
//!
//! Groq serves an OpenAI-compatible Chat Completions endpoint. Most of its
//! hosted models only support JSON mode, so schema-constrained requests are
//! sent as `json_object` with the schema spelled out in a system message.
//! The caller still validates the returned object against the schema.

use crate::llm::provider::{
    CompletionRequest, CompletionResponse, LlmError, LlmProvider, Message, ResponseFormat,
};
use crate::llm::providers::chat::{
    self, build_chat_request, build_http_client, convert_messages, log_request_info,
    parse_chat_response, with_retries, ChatCompletionResponse, ChatResponseFormat,
};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

/// Groq provider configuration
#[derive(Debug, Clone)]
pub struct GroqConfig {
    pub api_key: String,
    pub base_url: String,
    pub timeout: Duration,
    pub max_retries: u32,
}

impl Default for GroqConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://api.groq.com/openai/v1".to_string(),
            timeout: Duration::from_secs(60),
            max_retries: 2,
        }
    }
}

/// Groq provider implementation
pub struct GroqProvider {
    config: GroqConfig,
    client: Client,
}

impl GroqProvider {
    /// Create a new Groq provider
    pub fn new(config: GroqConfig) -> Result<Self, LlmError> {
        if config.api_key.is_empty() {
            return Err(LlmError::NotConfigured(
                "Groq API key is required".to_string(),
            ));
        }

        let client = build_http_client(config.timeout)?;
        Ok(Self { config, client })
    }

    /// System instruction carrying the output schema (pure function)
    fn schema_instruction(schema: &serde_json::Value) -> String {
        format!(
            "JSON schema:\n{schema}\nYou MUST answer with a JSON object that matches the JSON schema above."
        )
    }

    /// Rewrite messages and format for JSON mode (pure function)
    fn prepare_messages(request: &CompletionRequest) -> (Vec<Message>, Option<ChatResponseFormat>) {
        let mut messages = request.messages.clone();

        let format = match &request.response_format {
            None | Some(ResponseFormat::Text) => None,
            Some(ResponseFormat::Json) => Some(ChatResponseFormat::Simple {
                format_type: "json_object".to_string(),
            }),
            Some(ResponseFormat::JsonSchema { json_schema }) => {
                messages.insert(0, Message::system(Self::schema_instruction(&json_schema.schema)));
                Some(ChatResponseFormat::Simple {
                    format_type: "json_object".to_string(),
                })
            }
        };

        (messages, format)
    }
}

#[async_trait]
impl LlmProvider for GroqProvider {
    fn name(&self) -> &str {
        "groq"
    }

    fn available_models(&self) -> Vec<String> {
        vec![
            "llama-3.3-70b-versatile".to_string(),
            "llama-3.1-8b-instant".to_string(),
            "gemma2-9b-it".to_string(),
        ]
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        if request.requires_hosted_tools() {
            let names: Vec<&str> = request.tools.iter().map(|t| t.name()).collect();
            return Err(LlmError::InvalidRequest(format!(
                "Groq does not support hosted tools: {}",
                names.join(", ")
            )));
        }

        let (messages, response_format) = Self::prepare_messages(&request);
        let messages = convert_messages(&messages);
        log_request_info(self.name(), &messages);

        let body = build_chat_request(&request, messages, response_format);
        let url = format!("{}/chat/completions", self.config.base_url);

        let raw: ChatCompletionResponse = with_retries(self.name(), self.config.max_retries, || {
            chat::post_json(&self.client, "Groq", &url, &self.config.api_key, &body)
        })
        .await?;

        let response = parse_chat_response("Groq", raw, request.metadata)?;
        debug!(
            "Groq response: {} tokens used, finish_reason: {:?}",
            response.usage.total_tokens, response.finish_reason
        );
        Ok(response)
    }

    async fn health_check(&self) -> Result<(), LlmError> {
        chat::check_models_endpoint(
            &self.client,
            "Groq",
            &self.config.base_url,
            &self.config.api_key,
        )
        .await
    }
}
