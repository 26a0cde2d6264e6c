//! OpenAI provider implementation
//!
//! Plain and schema-constrained requests use Chat Completions. Requests that
//! carry provider-hosted tools (web search) go through the Responses API,
//! which is the only OpenAI surface that executes those tools server-side.

use crate::llm::provider::{
    CompletionRequest, CompletionResponse, FinishReason, LlmError, LlmProvider, MessageRole,
    ProviderTool, SearchContextSize, TokenUsage, ToolCall, ToolChoice,
};
use crate::llm::providers::chat::{
    self, build_chat_request, build_http_client, convert_messages, convert_response_format,
    log_request_info, parse_chat_response, with_retries, ChatCompletionResponse,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

/// OpenAI provider configuration
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub base_url: String,
    pub timeout: Duration,
    pub max_retries: u32,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://api.openai.com/v1".to_string(),
            timeout: Duration::from_secs(60),
            max_retries: 2,
        }
    }
}

/// OpenAI provider implementation
pub struct OpenAiProvider {
    config: OpenAiConfig,
    client: Client,
}

impl OpenAiProvider {
    /// Create a new OpenAI provider
    pub fn new(config: OpenAiConfig) -> Result<Self, LlmError> {
        if config.api_key.is_empty() {
            return Err(LlmError::NotConfigured(
                "OpenAI API key is required".to_string(),
            ));
        }

        let client = build_http_client(config.timeout)?;
        Ok(Self { config, client })
    }

    /// Convert completion request to Responses API format (pure function)
    fn convert_to_responses_request(
        request: &CompletionRequest,
    ) -> Result<ResponsesRequest, LlmError> {
        let instructions = request
            .messages
            .iter()
            .filter(|m| m.role == MessageRole::System)
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>();

        let input = convert_messages(
            &request
                .messages
                .iter()
                .filter(|m| m.role != MessageRole::System)
                .cloned()
                .collect::<Vec<_>>(),
        )
        .into_iter()
        .map(|m| ResponsesInputMessage {
            role: m.role,
            content: m.content,
        })
        .collect();

        let tools = request.tools.iter().map(Self::convert_tool).collect();

        let tool_choice = match &request.tool_choice {
            None => None,
            Some(ToolChoice::Auto) => Some(ResponsesToolChoice::Mode("auto".to_string())),
            Some(ToolChoice::Required(name)) => {
                if !request.tools.iter().any(|t| t.name() == name) {
                    return Err(LlmError::InvalidRequest(format!(
                        "Required tool '{name}' is not among the request tools"
                    )));
                }
                Some(ResponsesToolChoice::Hosted {
                    tool_type: name.clone(),
                })
            }
        };

        Ok(ResponsesRequest {
            model: request.model.clone(),
            input,
            instructions: if instructions.is_empty() {
                None
            } else {
                Some(instructions.join("\n\n"))
            },
            tools,
            tool_choice,
            max_output_tokens: request.max_tokens,
            temperature: request.temperature,
            top_p: request.top_p,
        })
    }

    /// Convert a provider-hosted tool to Responses API format (pure function)
    fn convert_tool(tool: &ProviderTool) -> ResponsesTool {
        match tool {
            ProviderTool::WebSearchPreview {
                search_context_size,
            } => ResponsesTool {
                tool_type: tool.name().to_string(),
                search_context_size: Some(*search_context_size),
            },
        }
    }

    /// Parse Responses API output (pure function)
    fn parse_responses_response(
        response: ResponsesResponse,
        metadata: HashMap<String, String>,
    ) -> Result<CompletionResponse, LlmError> {
        let mut text = String::new();
        let mut tool_calls = Vec::new();

        for item in response.output {
            match item {
                ResponsesOutputItem::Message { content } => {
                    for part in content {
                        if let ResponsesContent::OutputText { text: chunk } = part {
                            text.push_str(&chunk);
                        }
                    }
                }
                ResponsesOutputItem::WebSearchCall { id, status } => {
                    tool_calls.push(ToolCall {
                        id,
                        name: "web_search_preview".to_string(),
                        arguments: serde_json::json!({ "status": status }),
                    });
                }
                ResponsesOutputItem::Other => {}
            }
        }

        if text.is_empty() {
            return Err(LlmError::InvalidResponse(
                "No output text returned from OpenAI".to_string(),
            ));
        }

        let usage = response
            .usage
            .map(|u| TokenUsage {
                prompt_tokens: u.input_tokens,
                completion_tokens: u.output_tokens,
                total_tokens: u.total_tokens,
            })
            .unwrap_or_default();

        let finish_reason = match response.status.as_deref() {
            Some("incomplete") => FinishReason::Length,
            other => chat::convert_finish_reason(other),
        };

        Ok(CompletionResponse {
            content: Some(text),
            model: response.model,
            usage,
            finish_reason,
            tool_calls: if tool_calls.is_empty() {
                None
            } else {
                Some(tool_calls)
            },
            metadata,
        })
    }

    async fn complete_chat(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, LlmError> {
        let messages = convert_messages(&request.messages);
        log_request_info(self.name(), &messages);

        let response_format = request
            .response_format
            .as_ref()
            .map(convert_response_format);
        let body = build_chat_request(&request, messages, response_format);
        let url = format!("{}/chat/completions", self.config.base_url);

        let raw: ChatCompletionResponse = with_retries(self.name(), self.config.max_retries, || {
            chat::post_json(&self.client, "OpenAI", &url, &self.config.api_key, &body)
        })
        .await?;

        let response = parse_chat_response("OpenAI", raw, request.metadata)?;
        self.log_response_info(&response);
        Ok(response)
    }

    async fn complete_responses(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, LlmError> {
        let body = Self::convert_to_responses_request(&request)?;
        debug!(
            "OpenAI responses request: model={}, hosted tools={}",
            body.model,
            body.tools.len()
        );
        let url = format!("{}/responses", self.config.base_url);

        let raw: ResponsesResponse = with_retries(self.name(), self.config.max_retries, || {
            chat::post_json(&self.client, "OpenAI", &url, &self.config.api_key, &body)
        })
        .await?;

        let response = Self::parse_responses_response(raw, request.metadata)?;
        self.log_response_info(&response);
        Ok(response)
    }

    /// Log response information (impure)
    fn log_response_info(&self, response: &CompletionResponse) {
        debug!(
            "OpenAI response: {} tokens used (prompt: {}, completion: {}), finish_reason: {:?}, tool_calls: {}",
            response.usage.total_tokens,
            response.usage.prompt_tokens,
            response.usage.completion_tokens,
            response.finish_reason,
            response.tool_calls.as_ref().map(|tc| tc.len()).unwrap_or(0)
        );
    }
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    fn available_models(&self) -> Vec<String> {
        vec![
            "gpt-4o".to_string(),
            "gpt-4o-mini".to_string(),
            "gpt-4.1".to_string(),
            "gpt-4.1-mini".to_string(),
        ]
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        if request.requires_hosted_tools() {
            self.complete_responses(request).await
        } else {
            self.complete_chat(request).await
        }
    }

    async fn health_check(&self) -> Result<(), LlmError> {
        chat::check_models_endpoint(
            &self.client,
            "OpenAI",
            &self.config.base_url,
            &self.config.api_key,
        )
        .await
    }

    fn supports_strict_schema(&self) -> bool {
        true
    }
}

#[derive(Debug, Serialize)]
struct ResponsesRequest {
    model: String,
    input: Vec<ResponsesInputMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    instructions: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<ResponsesTool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<ResponsesToolChoice>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
}

#[derive(Debug, Serialize)]
struct ResponsesInputMessage {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct ResponsesTool {
    #[serde(rename = "type")]
    tool_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    search_context_size: Option<SearchContextSize>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum ResponsesToolChoice {
    /// "auto" / "none" / "required"
    Mode(String),
    /// Force a specific hosted tool
    Hosted {
        #[serde(rename = "type")]
        tool_type: String,
    },
}

#[derive(Debug, Deserialize)]
struct ResponsesResponse {
    model: String,
    #[serde(default)]
    output: Vec<ResponsesOutputItem>,
    usage: Option<ResponsesUsage>,
    status: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ResponsesOutputItem {
    Message {
        #[serde(default)]
        content: Vec<ResponsesContent>,
    },
    WebSearchCall {
        id: String,
        status: Option<String>,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ResponsesContent {
    OutputText {
        text: String,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct ResponsesUsage {
    input_tokens: u32,
    output_tokens: u32,
    total_tokens: u32,
}
