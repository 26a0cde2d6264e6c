//! Generic request cycle shared by all agents

use crate::agent::payload::parse_json_payload;
use crate::agent::pipeline::context::GenerationContext;
use crate::agent::response::{
    AgentOutput, AgentResponse, PipelineOutcome, PipelineRun, PipelineStage,
};
use crate::agent::welcome::Welcome;
use crate::error::{AgentError, AgentResult};
use crate::llm::registry::ProviderRegistry;
use crate::observability::metrics;
use crate::request_span;
use async_trait::async_trait;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, Instrument};
use uuid::Uuid;

/// The literal token a fit classification uses to reject a prospect
const REJECTION_TOKEN: &str = "no";

/// True when a classification result is the rejection token, ignoring case
/// and surrounding whitespace (pure function)
pub fn is_rejection(text: &str) -> bool {
    text.trim().to_lowercase() == REJECTION_TOKEN
}

/// One kind of agent: its input shape, prompts, model calls and output shape
#[async_trait]
pub trait SdrAgent: Send + Sync + 'static {
    type Input: DeserializeOwned + JsonSchema + Send;

    /// Stable identifier, used in routes and configuration
    fn id(&self) -> &'static str;

    fn description(&self) -> &'static str;

    fn welcome(&self) -> Welcome;

    /// Parse and validate a raw request body. JSON by default.
    fn parse_input(&self, body: &[u8]) -> AgentResult<Self::Input> {
        parse_json_payload(body)
    }

    /// Render prompts, call models and shape the output
    async fn run(
        &self,
        input: Self::Input,
        ctx: &mut GenerationContext,
    ) -> AgentResult<AgentOutput>;
}

/// Object-safe view of a pipeline, used by the catalog and the HTTP host
#[async_trait]
pub trait AgentHandler: Send + Sync {
    fn id(&self) -> &'static str;

    fn description(&self) -> &'static str;

    fn welcome(&self) -> Welcome;

    /// Run one request and report how it went
    async fn execute(&self, body: &[u8]) -> PipelineRun;

    /// Run one request; the caller only gets the response
    async fn handle(&self, body: &[u8]) -> AgentResponse {
        self.execute(body).await.response
    }
}

/// Runs an [`SdrAgent`] behind the single top-level error guard
pub struct AgentPipeline<A: SdrAgent> {
    agent: A,
    registry: Arc<ProviderRegistry>,
}

impl<A: SdrAgent> AgentPipeline<A> {
    pub fn new(agent: A, registry: Arc<ProviderRegistry>) -> Self {
        Self { agent, registry }
    }

    pub fn agent(&self) -> &A {
        &self.agent
    }

    async fn run_request(
        &self,
        body: &[u8],
        ctx: &mut GenerationContext,
    ) -> AgentResult<AgentOutput> {
        let input = self.agent.parse_input(body).map_err(|e| {
            if matches!(e, AgentError::InvalidInput { .. }) {
                metrics().validation_failed();
            }
            e
        })?;
        ctx.record(PipelineStage::Validated);

        let output = self.agent.run(input, ctx).await?;
        if output == AgentOutput::Rejected {
            ctx.record(PipelineStage::Rejected);
        }
        Ok(output)
    }
}

#[async_trait]
impl<A: SdrAgent> AgentHandler for AgentPipeline<A> {
    fn id(&self) -> &'static str {
        self.agent.id()
    }

    fn description(&self) -> &'static str {
        self.agent.description()
    }

    fn welcome(&self) -> Welcome {
        self.agent.welcome()
    }

    async fn execute(&self, body: &[u8]) -> PipelineRun {
        let request_id = Uuid::new_v4();
        let agent_id = self.agent.id();
        let span = request_span!(agent = agent_id, request_id = %request_id);

        async move {
            let started = Instant::now();
            metrics().request_received(agent_id);

            let mut ctx = GenerationContext::new(Arc::clone(&self.registry));
            let result = self.run_request(body, &mut ctx).await;

            let (response, outcome) = match result {
                Ok(output) => {
                    ctx.record(PipelineStage::Shaped);
                    let outcome = if output == AgentOutput::Rejected {
                        info!(
                            generation_calls = ctx.generation_calls(),
                            "Prospect rejected by fit classification"
                        );
                        metrics().request_rejected(agent_id, started.elapsed());
                        PipelineOutcome::Rejected
                    } else {
                        info!(
                            generation_calls = ctx.generation_calls(),
                            "Request completed in {}ms",
                            started.elapsed().as_millis()
                        );
                        metrics().request_completed(agent_id, started.elapsed());
                        PipelineOutcome::Completed
                    };
                    (AgentResponse::from(output), outcome)
                }
                Err(e) => {
                    error!(
                        error_kind = e.kind(),
                        stage = %ctx.last_stage(),
                        "Error running agent: {}",
                        e.log_message()
                    );
                    ctx.record(PipelineStage::Failed);
                    metrics().request_failed(agent_id, e.kind(), started.elapsed());
                    (AgentResponse::failure(), PipelineOutcome::Failed)
                }
            };

            ctx.record(PipelineStage::Returned);

            PipelineRun {
                request_id,
                response,
                outcome,
                stages: ctx.into_stages(),
            }
        }
        .instrument(span)
        .await
    }
}
