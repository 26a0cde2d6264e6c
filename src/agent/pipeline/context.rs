//! Per-request generation context
//!
//! Agents make their model calls through this context so that every call is
//! counted, traced, and attributed to a pipeline stage in the same way.

use crate::agent::response::PipelineStage;
use crate::error::{AgentError, AgentResult};
use crate::generation_span;
use crate::llm::generate::{generate_object, generate_text, GenerationRequest, StructuredOutput};
use crate::llm::registry::ProviderRegistry;
use crate::observability::metrics;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, Instrument};

/// Model access and stage bookkeeping for a single request
pub struct GenerationContext {
    registry: Arc<ProviderRegistry>,
    stages: Vec<PipelineStage>,
    calls: usize,
}

impl GenerationContext {
    pub fn new(registry: Arc<ProviderRegistry>) -> Self {
        Self {
            registry,
            stages: vec![PipelineStage::Received],
            calls: 0,
        }
    }

    /// Free-text generation call
    pub async fn text(&mut self, request: GenerationRequest) -> AgentResult<String> {
        let (stage, label) = self.begin_call();
        let registry = Arc::clone(&self.registry);
        let span = generation_span!(stage = label, model = %request.model);

        let started = Instant::now();
        let result = generate_text(&registry, &request).instrument(span).await;
        Self::finish_call(stage, label, started, result)
    }

    /// Schema-constrained generation call
    pub async fn object<T: StructuredOutput>(
        &mut self,
        request: GenerationRequest,
    ) -> AgentResult<T> {
        let (stage, label) = self.begin_call();
        let registry = Arc::clone(&self.registry);
        let span = generation_span!(stage = label, model = %request.model, schema = T::SCHEMA_NAME);

        let started = Instant::now();
        let result = generate_object::<T>(&registry, &request)
            .instrument(span)
            .await;
        Self::finish_call(stage, label, started, result)
    }

    /// Record a stage transition
    pub fn record(&mut self, stage: PipelineStage) {
        self.stages.push(stage);
    }

    pub fn stages(&self) -> &[PipelineStage] {
        &self.stages
    }

    pub fn last_stage(&self) -> PipelineStage {
        self.stages
            .last()
            .copied()
            .unwrap_or(PipelineStage::Received)
    }

    pub fn generation_calls(&self) -> usize {
        self.calls
    }

    pub(crate) fn into_stages(self) -> Vec<PipelineStage> {
        self.stages
    }

    fn begin_call(&mut self) -> (PipelineStage, &'static str) {
        self.calls += 1;
        let (stage, label) = if self.calls == 1 {
            metrics().stage1_invoked();
            (PipelineStage::Stage1Invoked, "stage1")
        } else {
            metrics().stage2_invoked();
            (PipelineStage::Stage2Invoked, "stage2")
        };
        self.stages.push(stage);
        (stage, label)
    }

    fn finish_call<T>(
        stage: PipelineStage,
        label: &'static str,
        started: Instant,
        result: Result<T, crate::llm::provider::LlmError>,
    ) -> AgentResult<T> {
        debug!(
            "{} generation finished in {}ms",
            stage,
            started.elapsed().as_millis()
        );
        result.map_err(|source| {
            metrics().generation_failed();
            AgentError::generation_failed(label, source)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::registry::ModelSpec;
    use crate::testing::mocks::MockLlmProvider;

    fn context_with(provider: MockLlmProvider) -> GenerationContext {
        let registry = ProviderRegistry::new().with_provider("mock", Arc::new(provider));
        GenerationContext::new(Arc::new(registry))
    }

    #[tokio::test]
    async fn test_calls_are_numbered_by_stage() {
        let mut ctx = context_with(MockLlmProvider::single_response("hello"));
        let request = GenerationRequest::new(ModelSpec::new("mock", "m"), "hi");

        assert_eq!(ctx.text(request.clone()).await.unwrap(), "hello");
        assert_eq!(ctx.text(request).await.unwrap(), "hello");

        assert_eq!(ctx.generation_calls(), 2);
        assert_eq!(
            ctx.stages(),
            &[
                PipelineStage::Received,
                PipelineStage::Stage1Invoked,
                PipelineStage::Stage2Invoked
            ]
        );
    }

    #[tokio::test]
    async fn test_provider_errors_carry_the_stage() {
        let mut ctx = context_with(MockLlmProvider::with_failure());
        let request = GenerationRequest::new(ModelSpec::new("mock", "m"), "hi");

        match ctx.text(request).await {
            Err(AgentError::GenerationFailed { stage, .. }) => assert_eq!(stage, "stage1"),
            other => panic!("expected generation failure, got {other:?}"),
        }
        assert_eq!(ctx.last_stage(), PipelineStage::Stage1Invoked);
    }
}
