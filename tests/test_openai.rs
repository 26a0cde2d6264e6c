//! Integration tests for the OpenAI provider
//!
//! Tests behavioral contracts against a mock HTTP server:
//! - Chat Completions request/response handling
//! - Responses API routing for hosted web search
//! - Error mapping (auth, rate limits, server errors)
//! - Retries on transient failures only

use sdr_agents::llm::provider::{
    CompletionRequest, FinishReason, JsonSchemaDefinition, LlmError, LlmProvider, ProviderTool,
    ResponseFormat, SearchContextSize, ToolChoice,
};
use sdr_agents::agents::EmailDraft;
use sdr_agents::llm::generate::{generate_object, GenerationRequest};
use sdr_agents::llm::providers::openai::{OpenAiConfig, OpenAiProvider};
use sdr_agents::llm::registry::{ModelSpec, ProviderRegistry};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_config(base_url: &str) -> OpenAiConfig {
    OpenAiConfig {
        api_key: "test-api-key".to_string(),
        base_url: base_url.to_string(),
        timeout: Duration::from_secs(5),
        max_retries: 2,
    }
}

fn chat_body(content: &str) -> serde_json::Value {
    json!({
        "id": "chatcmpl-123",
        "object": "chat.completion",
        "created": 1677652288,
        "model": "gpt-4o-mini",
        "choices": [
            {
                "index": 0,
                "message": {"role": "assistant", "content": content},
                "finish_reason": "stop"
            }
        ],
        "usage": {"prompt_tokens": 10, "completion_tokens": 15, "total_tokens": 25}
    })
}

fn web_search_request() -> CompletionRequest {
    let mut request = CompletionRequest::from_prompt("gpt-4o-mini", "Is Cyan a prospect?");
    request.tools = vec![ProviderTool::WebSearchPreview {
        search_context_size: SearchContextSize::Low,
    }];
    request.tool_choice = Some(ToolChoice::Required("web_search_preview".to_string()));
    request
}

#[tokio::test]
async fn test_openai_provider_returns_successful_completion_with_valid_response() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("Authorization", "Bearer test-api-key"))
        .and(body_partial_json(json!({"model": "gpt-4o-mini"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_body("Hello there")))
        .expect(1)
        .mount(&mock_server)
        .await;

    let provider = OpenAiProvider::new(test_config(&mock_server.uri())).unwrap();
    let response = provider
        .complete(CompletionRequest::from_prompt("gpt-4o-mini", "Hello"))
        .await
        .unwrap();

    assert_eq!(response.content.as_deref(), Some("Hello there"));
    assert_eq!(response.usage.total_tokens, 25);
    assert!(matches!(response.finish_reason, FinishReason::Stop));
}

#[tokio::test]
async fn test_openai_provider_sends_json_schema_response_format() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_partial_json(json!({
            "response_format": {
                "type": "json_schema",
                "json_schema": {"name": "email_draft"}
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_body("{}")))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut request = CompletionRequest::from_prompt("gpt-4o-mini", "Write an email");
    request.response_format = Some(ResponseFormat::JsonSchema {
        json_schema: JsonSchemaDefinition {
            name: "email_draft".to_string(),
            strict: None,
            schema: json!({"type": "object"}),
        },
    });

    let provider = OpenAiProvider::new(test_config(&mock_server.uri())).unwrap();
    assert!(provider.complete(request).await.is_ok());
}

#[tokio::test]
async fn test_structured_generation_sends_strict_closed_schema() {
    let mock_server = MockServer::start().await;
    let draft = json!({
        "subject": "Agent Deployment",
        "opening": "Hi Jane,",
        "value_prop": "Agentuity runs your agents.",
        "cta": "Worth a call?",
        "ps": "P.S. Free tier included."
    });

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_body(&draft.to_string())))
        .expect(1)
        .mount(&mock_server)
        .await;

    let provider = OpenAiProvider::new(test_config(&mock_server.uri())).unwrap();
    let registry = ProviderRegistry::new().with_provider("openai", Arc::new(provider));
    let request = GenerationRequest::new(ModelSpec::new("openai", "gpt-4o-mini"), "Write it");

    let email: EmailDraft = generate_object(&registry, &request).await.unwrap();
    assert_eq!(email.subject, "agent deployment");

    let received = mock_server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&received[0].body).unwrap();
    let json_schema = &body["response_format"]["json_schema"];

    assert_eq!(body["response_format"]["type"], "json_schema");
    assert_eq!(json_schema["name"], "email_draft");
    assert_eq!(json_schema["strict"], true);

    let schema = &json_schema["schema"];
    assert!(schema.get("$schema").is_none());
    assert!(schema.get("title").is_none());
    assert_eq!(schema["additionalProperties"], false);
    assert_eq!(schema["required"].as_array().unwrap().len(), 5);
    assert!(schema["properties"]["subject"].get("maxLength").is_none());
}

#[tokio::test]
async fn test_openai_provider_routes_web_search_through_responses_api() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/responses"))
        .and(header("Authorization", "Bearer test-api-key"))
        .and(body_partial_json(json!({
            "model": "gpt-4o-mini",
            "tools": [{"type": "web_search_preview", "search_context_size": "low"}],
            "tool_choice": {"type": "web_search_preview"}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "resp_1",
            "object": "response",
            "model": "gpt-4o-mini",
            "status": "completed",
            "output": [
                {"type": "web_search_call", "id": "ws_1", "status": "completed"},
                {
                    "type": "message",
                    "id": "msg_1",
                    "role": "assistant",
                    "content": [{"type": "output_text", "text": "No", "annotations": []}]
                }
            ],
            "usage": {"input_tokens": 900, "output_tokens": 1, "total_tokens": 901}
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&mock_server)
        .await;

    let provider = OpenAiProvider::new(test_config(&mock_server.uri())).unwrap();
    let response = provider.complete(web_search_request()).await.unwrap();

    assert_eq!(response.content.as_deref(), Some("No"));
    assert_eq!(response.usage.total_tokens, 901);
    assert_eq!(response.tool_calls.map(|calls| calls.len()), Some(1));
}

#[tokio::test]
async fn test_openai_provider_returns_error_when_api_responds_with_401() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": {"message": "Invalid API key", "type": "invalid_request_error"}
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let provider = OpenAiProvider::new(test_config(&mock_server.uri())).unwrap();
    let result = provider
        .complete(CompletionRequest::from_prompt("gpt-4o-mini", "Hello"))
        .await;

    assert!(matches!(result, Err(LlmError::AuthenticationFailed(_))));
}

#[tokio::test]
async fn test_openai_provider_does_not_retry_rate_limits() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let provider = OpenAiProvider::new(test_config(&mock_server.uri())).unwrap();
    let result = provider
        .complete(CompletionRequest::from_prompt("gpt-4o-mini", "Hello"))
        .await;

    assert!(matches!(result, Err(LlmError::RateLimitExceeded(_))));
}

#[tokio::test]
async fn test_openai_provider_retries_on_server_errors() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_body("recovered")))
        .expect(1)
        .mount(&mock_server)
        .await;

    let provider = OpenAiProvider::new(test_config(&mock_server.uri())).unwrap();
    let response = provider
        .complete(CompletionRequest::from_prompt("gpt-4o-mini", "Hello"))
        .await
        .unwrap();

    assert_eq!(response.content.as_deref(), Some("recovered"));
}

#[tokio::test]
async fn test_openai_provider_fails_after_all_retries_exhausted() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .expect(3)
        .mount(&mock_server)
        .await;

    let provider = OpenAiProvider::new(test_config(&mock_server.uri())).unwrap();
    let result = provider
        .complete(CompletionRequest::from_prompt("gpt-4o-mini", "Hello"))
        .await;

    assert!(matches!(result, Err(LlmError::ApiError(_))));
}

#[tokio::test]
async fn test_openai_provider_returns_error_when_choices_empty() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "chatcmpl-123",
            "model": "gpt-4o-mini",
            "choices": []
        })))
        .mount(&mock_server)
        .await;

    let provider = OpenAiProvider::new(test_config(&mock_server.uri())).unwrap();
    let result = provider
        .complete(CompletionRequest::from_prompt("gpt-4o-mini", "Hello"))
        .await;

    assert!(matches!(result, Err(LlmError::InvalidResponse(_))));
}

#[tokio::test]
async fn test_openai_provider_returns_error_when_json_parsing_fails() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&mock_server)
        .await;

    let provider = OpenAiProvider::new(test_config(&mock_server.uri())).unwrap();
    let result = provider
        .complete(CompletionRequest::from_prompt("gpt-4o-mini", "Hello"))
        .await;

    assert!(matches!(result, Err(LlmError::InvalidResponse(_))));
}

#[tokio::test]
async fn test_openai_health_check_succeeds_when_models_endpoint_available() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/models"))
        .and(header("Authorization", "Bearer test-api-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
        .mount(&mock_server)
        .await;

    let provider = OpenAiProvider::new(test_config(&mock_server.uri())).unwrap();
    assert!(provider.health_check().await.is_ok());
}

#[tokio::test]
async fn test_openai_health_check_fails_when_auth_invalid() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/models"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&mock_server)
        .await;

    let provider = OpenAiProvider::new(test_config(&mock_server.uri())).unwrap();
    assert!(matches!(
        provider.health_check().await,
        Err(LlmError::AuthenticationFailed(_))
    ));
}
