//! Mock implementations for testing
//!
//! `MockLlmProvider` stands in for a hosted model: it replays scripted
//! responses (or computes them from the request), records every request it
//! receives, and can be told to fail.

use crate::llm::provider::{
    CompletionRequest, CompletionResponse, FinishReason, LlmError, LlmProvider, TokenUsage,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

type Responder = Arc<dyn Fn(&CompletionRequest) -> Result<String, LlmError> + Send + Sync>;

/// Mock LLM provider for testing
pub struct MockLlmProvider {
    name: String,
    responses: Vec<String>,
    responder: Option<Responder>,
    current_response: AtomicUsize,
    failure: Option<LlmError>,
    strict_schema: bool,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl MockLlmProvider {
    /// Replay `responses` in order, cycling when exhausted
    pub fn with_responses(responses: Vec<String>) -> Self {
        Self {
            name: "mock".to_string(),
            responses,
            responder: None,
            current_response: AtomicUsize::new(0),
            failure: None,
            strict_schema: false,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn single_response(response: impl Into<String>) -> Self {
        Self::with_responses(vec![response.into()])
    }

    /// Compute each response from the request
    pub fn from_fn<F>(responder: F) -> Self
    where
        F: Fn(&CompletionRequest) -> Result<String, LlmError> + Send + Sync + 'static,
    {
        Self {
            responder: Some(Arc::new(responder)),
            ..Self::with_responses(vec![])
        }
    }

    /// Fail every call with a generic request failure
    pub fn with_failure() -> Self {
        Self::failing_with(LlmError::RequestFailed("Mock LLM failure".to_string()))
    }

    pub fn failing_with(error: LlmError) -> Self {
        Self {
            failure: Some(error),
            ..Self::with_responses(vec![])
        }
    }

    /// Report a different provider name
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Advertise strict server-side schema enforcement
    pub fn with_strict_schema(mut self) -> Self {
        self.strict_schema = true;
        self
    }

    /// Every request received so far, in order
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    fn next_content(&self, request: &CompletionRequest) -> Result<String, LlmError> {
        if let Some(responder) = &self.responder {
            return responder(request);
        }

        if self.responses.is_empty() {
            return Ok("Mock response".to_string());
        }

        let index = self.current_response.fetch_add(1, Ordering::SeqCst) % self.responses.len();
        Ok(self.responses[index].clone())
    }
}

#[async_trait]
impl LlmProvider for MockLlmProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn available_models(&self) -> Vec<String> {
        vec!["mock-model".to_string()]
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        self.requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(request.clone());

        if let Some(error) = &self.failure {
            return Err(error.clone());
        }

        let content = self.next_content(&request)?;

        Ok(CompletionResponse {
            content: Some(content),
            model: request.model,
            usage: TokenUsage {
                prompt_tokens: 10,
                completion_tokens: 5,
                total_tokens: 15,
            },
            finish_reason: FinishReason::Stop,
            tool_calls: None,
            metadata: HashMap::new(),
        })
    }

    async fn health_check(&self) -> Result<(), LlmError> {
        match &self.failure {
            Some(_) => Err(LlmError::RequestFailed(
                "Mock health check failure".to_string(),
            )),
            None => Ok(()),
        }
    }

    fn supports_strict_schema(&self) -> bool {
        self.strict_schema
    }
}
