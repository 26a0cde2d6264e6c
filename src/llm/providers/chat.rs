//! OpenAI-compatible Chat Completions wire format
//!
//! Shared by every provider that speaks `POST /chat/completions`, plus the
//! HTTP and retry plumbing the provider clients have in common.

use crate::llm::provider::{
    CompletionRequest, CompletionResponse, FinishReason, LlmError, Message, MessageRole,
    ResponseFormat, TokenUsage,
};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, error, warn};

const RETRY_BASE_DELAY_MS: u64 = 100;
const LARGE_REQUEST_TOKENS: usize = 120_000;

/// Build an HTTP client with the provider timeout applied
pub(crate) fn build_http_client(timeout: Duration) -> Result<Client, LlmError> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| LlmError::NetworkError(e.to_string()))
}

/// Estimate token count for messages (pure function)
pub(crate) fn estimate_token_count(messages: &[ChatMessage]) -> usize {
    messages.iter().map(|m| m.content.len() / 4).sum()
}

/// Log request size, warning on prompts likely to overflow the context window
pub(crate) fn log_request_info(provider: &str, messages: &[ChatMessage]) {
    let estimated_tokens = estimate_token_count(messages);
    debug!(
        "{} request: {} messages, estimated ~{} tokens",
        provider,
        messages.len(),
        estimated_tokens
    );

    if estimated_tokens > LARGE_REQUEST_TOKENS {
        warn!(
            "Large request detected: estimated {} tokens, may exceed model limits",
            estimated_tokens
        );
    }
}

/// Convert internal messages to chat format (pure function)
pub(crate) fn convert_messages(messages: &[Message]) -> Vec<ChatMessage> {
    messages
        .iter()
        .map(|message| ChatMessage {
            role: match message.role {
                MessageRole::System => "system".to_string(),
                MessageRole::User => "user".to_string(),
                MessageRole::Assistant => "assistant".to_string(),
            },
            content: message.content.clone(),
        })
        .collect()
}

/// Convert response format to chat format (pure function)
pub(crate) fn convert_response_format(format: &ResponseFormat) -> ChatResponseFormat {
    match format {
        ResponseFormat::Text => ChatResponseFormat::Simple {
            format_type: "text".to_string(),
        },
        ResponseFormat::Json => ChatResponseFormat::Simple {
            format_type: "json_object".to_string(),
        },
        ResponseFormat::JsonSchema { json_schema } => ChatResponseFormat::JsonSchema {
            format_type: "json_schema".to_string(),
            json_schema: ChatJsonSchema {
                name: json_schema.name.clone(),
                strict: json_schema.strict,
                schema: json_schema.schema.clone(),
            },
        },
    }
}

/// Assemble a chat completion request body (pure function)
pub(crate) fn build_chat_request(
    request: &CompletionRequest,
    messages: Vec<ChatMessage>,
    response_format: Option<ChatResponseFormat>,
) -> ChatCompletionRequest {
    ChatCompletionRequest {
        model: request.model.clone(),
        messages,
        max_tokens: request.max_tokens,
        temperature: request.temperature,
        top_p: request.top_p,
        stop: request.stop_sequences.clone(),
        response_format,
    }
}

/// Parse a chat completion response (pure function)
pub(crate) fn parse_chat_response(
    provider: &str,
    response: ChatCompletionResponse,
    metadata: HashMap<String, String>,
) -> Result<CompletionResponse, LlmError> {
    let choice = response.choices.into_iter().next().ok_or_else(|| {
        LlmError::InvalidResponse(format!("No choices returned from {provider}"))
    })?;

    let usage = response
        .usage
        .map(|u| TokenUsage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        })
        .unwrap_or_default();

    Ok(CompletionResponse {
        content: choice.message.content,
        model: response.model,
        usage,
        finish_reason: convert_finish_reason(choice.finish_reason.as_deref()),
        tool_calls: None,
        metadata,
    })
}

/// Convert chat finish reason to internal format (pure function)
pub(crate) fn convert_finish_reason(reason: Option<&str>) -> FinishReason {
    match reason {
        Some("stop") | Some("completed") => FinishReason::Stop,
        Some("length") | Some("max_output_tokens") => FinishReason::Length,
        Some("content_filter") => FinishReason::ContentFilter,
        _ => FinishReason::Error,
    }
}

/// Make a single authenticated JSON POST (impure I/O)
pub(crate) async fn post_json<B, R>(
    client: &Client,
    provider: &str,
    url: &str,
    api_key: &str,
    body: &B,
) -> Result<R, LlmError>
where
    B: Serialize + ?Sized,
    R: DeserializeOwned,
{
    let response = client
        .post(url)
        .header("Authorization", format!("Bearer {api_key}"))
        .header("Content-Type", "application/json")
        .json(body)
        .send()
        .await
        .map_err(|e| {
            let error_msg = format!(
                "HTTP request failed: {} (is_connect: {}, is_timeout: {}, is_request: {})",
                e,
                e.is_connect(),
                e.is_timeout(),
                e.is_request()
            );
            warn!("{} network error details: {}", provider, error_msg);
            LlmError::NetworkError(error_msg)
        })?;

    let status = response.status();
    if !status.is_success() {
        let error_text = response.text().await.unwrap_or_default();
        if status.is_server_error() {
            warn!("{} server error: {} - {}", provider, status, error_text);
        } else {
            error!(
                "{} API client error - Status: {}, Response: {}",
                provider, status, error_text
            );
            if error_text.contains("maximum context length") || error_text.contains("too many tokens")
            {
                warn!("Token limit exceeded - prompt may be too long");
            }
        }
        return Err(LlmError::from_status(provider, status, &error_text));
    }

    response
        .json()
        .await
        .map_err(|e| LlmError::InvalidResponse(e.to_string()))
}

/// Authenticated GET used by provider health checks
pub(crate) async fn check_models_endpoint(
    client: &Client,
    provider: &str,
    base_url: &str,
    api_key: &str,
) -> Result<(), LlmError> {
    let response = client
        .get(format!("{base_url}/models"))
        .header("Authorization", format!("Bearer {api_key}"))
        .send()
        .await
        .map_err(|e| LlmError::NetworkError(e.to_string()))?;

    if response.status().is_success() {
        Ok(())
    } else {
        Err(LlmError::AuthenticationFailed(format!(
            "{provider} API authentication failed"
        )))
    }
}

/// Run `attempt` until it succeeds, fails permanently, or `max_retries` is spent.
///
/// Only transient errors (network, 5xx) are retried, with linear backoff.
pub(crate) async fn with_retries<T, F, Fut>(
    provider: &str,
    max_retries: u32,
    mut attempt: F,
) -> Result<T, LlmError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, LlmError>>,
{
    let mut retries = 0u32;
    loop {
        match attempt().await {
            Ok(value) => {
                if retries > 0 {
                    debug!("{} request succeeded after {} retries", provider, retries);
                }
                return Ok(value);
            }
            Err(e) if retries < max_retries && e.is_retryable() => {
                retries += 1;
                let delay_ms = RETRY_BASE_DELAY_MS * u64::from(retries);
                warn!(
                    "{} request attempt {} failed, retrying in {}ms: {}",
                    provider, retries, delay_ms, e
                );
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }
            Err(e) => {
                if retries > 0 {
                    error!("{} request failed after {} retries", provider, retries);
                }
                return Err(e);
            }
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct ChatCompletionRequest {
    pub(crate) model: String,
    pub(crate) messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) stop: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) response_format: Option<ChatResponseFormat>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct ChatMessage {
    pub(crate) role: String,
    pub(crate) content: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatCompletionResponse {
    pub(crate) model: String,
    pub(crate) choices: Vec<ChatChoice>,
    pub(crate) usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatChoice {
    pub(crate) message: ChatResponseMessage,
    pub(crate) finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatResponseMessage {
    pub(crate) content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatUsage {
    pub(crate) prompt_tokens: u32,
    pub(crate) completion_tokens: u32,
    pub(crate) total_tokens: u32,
}

/// Chat response format
#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub(crate) enum ChatResponseFormat {
    /// Simple type string
    Simple {
        #[serde(rename = "type")]
        format_type: String,
    },
    /// JSON schema with strict validation
    JsonSchema {
        #[serde(rename = "type")]
        format_type: String,
        json_schema: ChatJsonSchema,
    },
}

/// Chat JSON Schema format
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct ChatJsonSchema {
    pub(crate) name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) strict: Option<bool>,
    pub(crate) schema: serde_json::Value,
}
