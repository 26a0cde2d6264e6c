//! LLM provider abstraction and trait definitions
//!
//! This module defines the core traits and types for LLM provider interactions,
//! enabling multiple provider backends with a unified interface.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// A single message in a conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }
}

/// Message roles in a conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

/// LLM completion request parameters
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub messages: Vec<Message>,
    pub model: String,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    pub top_p: Option<f32>,
    pub stop_sequences: Option<Vec<String>>,
    /// Provider-hosted tools the model may (or must) use before answering
    pub tools: Vec<ProviderTool>,
    pub tool_choice: Option<ToolChoice>,
    pub response_format: Option<ResponseFormat>,
    pub metadata: HashMap<String, String>,
}

impl CompletionRequest {
    /// Single-prompt request with no sampling overrides
    pub fn from_prompt(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::user(prompt)],
            model: model.into(),
            max_tokens: None,
            temperature: None,
            top_p: None,
            stop_sequences: None,
            tools: Vec::new(),
            tool_choice: None,
            response_format: None,
            metadata: HashMap::new(),
        }
    }

    /// Concatenated text of every user message
    pub fn prompt_text(&self) -> String {
        self.messages
            .iter()
            .filter(|m| m.role == MessageRole::User)
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    pub fn requires_hosted_tools(&self) -> bool {
        !self.tools.is_empty()
    }
}

/// Tools executed on the provider side (as opposed to locally dispatched functions)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProviderTool {
    /// OpenAI hosted web search
    WebSearchPreview {
        search_context_size: SearchContextSize,
    },
}

impl ProviderTool {
    pub fn name(&self) -> &'static str {
        match self {
            ProviderTool::WebSearchPreview { .. } => "web_search_preview",
        }
    }
}

/// How much retrieved web context the provider feeds to the model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchContextSize {
    Low,
    Medium,
    High,
}

/// Tool selection constraint
#[derive(Debug, Clone, PartialEq)]
pub enum ToolChoice {
    /// Model decides whether to call a tool
    Auto,
    /// Model must call the named tool before answering
    Required(String),
}

/// Tool call information from LLM response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub arguments: serde_json::Value,
}

/// LLM completion response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionResponse {
    pub content: Option<String>,
    pub model: String,
    pub usage: TokenUsage,
    pub finish_reason: FinishReason,
    pub tool_calls: Option<Vec<ToolCall>>,
    pub metadata: HashMap<String, String>,
}

/// Token usage statistics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Reason why completion finished
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum FinishReason {
    Stop,
    Length,
    ContentFilter,
    Error,
}

/// Response format for structured outputs
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResponseFormat {
    /// Plain text response
    Text,
    /// JSON object without schema validation
    Json,
    /// JSON with strict schema validation
    JsonSchema { json_schema: JsonSchemaDefinition },
}

/// JSON Schema definition for structured outputs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonSchemaDefinition {
    /// Schema name
    pub name: String,
    /// Whether to use strict mode (OpenAI only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strict: Option<bool>,
    /// The JSON Schema object
    pub schema: serde_json::Value,
}

impl Default for ResponseFormat {
    fn default() -> Self {
        Self::Text
    }
}

/// LLM provider trait for dependency injection and testing
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Get the provider name (e.g., "openai", "groq")
    fn name(&self) -> &str;

    /// Get list of available models for this provider
    fn available_models(&self) -> Vec<String>;

    /// Generate a completion from the given request
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError>;

    /// Check if the provider is configured and ready
    async fn health_check(&self) -> Result<(), LlmError>;

    /// Whether `JsonSchema` formats are enforced server-side in strict mode
    fn supports_strict_schema(&self) -> bool {
        false
    }
}

/// LLM provider errors
#[derive(Debug, Clone, Error)]
pub enum LlmError {
    #[error("Provider not configured: {0}")]
    NotConfigured(String),
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),
    #[error("Model not found: {0}")]
    ModelNotFound(String),
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),
    #[error("Request failed: {0}")]
    RequestFailed(String),
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
    #[error("Output does not match schema: {0}")]
    SchemaViolation(String),
    #[error("Network error: {0}")]
    NetworkError(String),
    #[error("API error: {0}")]
    ApiError(String),
}

impl LlmError {
    /// Map a non-success HTTP status to the matching error variant
    pub fn from_status(provider: &str, status: reqwest::StatusCode, body: &str) -> Self {
        if status.is_server_error() {
            return LlmError::ApiError(format!("{provider} API server error: {status} - {body}"));
        }

        let message = format!("{provider} API error: {status} - {body}");
        match status.as_u16() {
            401 | 403 => LlmError::AuthenticationFailed(message),
            404 => LlmError::ModelNotFound(message),
            429 => LlmError::RateLimitExceeded(message),
            400 | 422 => LlmError::InvalidRequest(message),
            _ => LlmError::ApiError(message),
        }
    }

    /// Network failures and provider-side 5xx errors are transient
    pub fn is_retryable(&self) -> bool {
        match self {
            LlmError::NetworkError(_) => true,
            LlmError::ApiError(msg) => msg.contains("server error"),
            _ => false,
        }
    }
}
