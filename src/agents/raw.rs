//! Customise the built-in outreach template from a raw person record

use crate::agent::payload::parse_embedded_json_object;
use crate::agent::pipeline::{GenerationContext, SdrAgent};
use crate::agent::prompt::{render_template, to_prompt_json};
use crate::agent::response::AgentOutput;
use crate::agent::welcome::{ExamplePrompt, Welcome};
use crate::agents::{default_model, samples};
use crate::config::AgentOverride;
use crate::error::AgentResult;
use crate::llm::generate::GenerationRequest;
use crate::llm::registry::ModelSpec;
use async_trait::async_trait;
use serde_json::{Map, Value};

pub const AGENT_ID: &str = "agent-sdr-raw";

const RAW_PROMPT: &str = include_str!("prompts/raw_email.md");

const WELCOME: &str = "Hi, I'm your AI SDR. Paste a JSON record describing a person as plain text and I'll fill in our outreach template for them.";

/// Takes a plain-text body holding a JSON person record
#[derive(Debug, Clone)]
pub struct RawTemplateAgent {
    model: ModelSpec,
}

impl RawTemplateAgent {
    pub fn new(model: ModelSpec) -> Self {
        Self { model }
    }

    pub fn from_override(overrides: &AgentOverride) -> Self {
        Self::new(overrides.model.clone().unwrap_or_else(default_model))
    }

    pub fn model(&self) -> &ModelSpec {
        &self.model
    }
}

impl Default for RawTemplateAgent {
    fn default() -> Self {
        Self::new(default_model())
    }
}

#[async_trait]
impl SdrAgent for RawTemplateAgent {
    type Input = Map<String, Value>;

    fn id(&self) -> &'static str {
        AGENT_ID
    }

    fn description(&self) -> &'static str {
        "Fills the built-in outreach template from a plain-text JSON person record"
    }

    fn welcome(&self) -> Welcome {
        let sample = |person: Value| ExamplePrompt::text(to_prompt_json(&person));

        Welcome {
            welcome: WELCOME.to_string(),
            prompts: vec![sample(samples::jane_doe()), sample(samples::john_smith())],
        }
    }

    fn parse_input(&self, body: &[u8]) -> AgentResult<Map<String, Value>> {
        parse_embedded_json_object(body)
    }

    async fn run(
        &self,
        person: Map<String, Value>,
        ctx: &mut GenerationContext,
    ) -> AgentResult<AgentOutput> {
        let prompt = render_template(RAW_PROMPT, &[("person", &to_prompt_json(&person))]);
        let email = ctx
            .text(GenerationRequest::new(self.model.clone(), prompt))
            .await?;

        Ok(AgentOutput::Text(email))
    }
}
