//! Customise a caller-supplied email template for one person

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
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{json, Value};

pub const AGENT_ID: &str = "agent-sdr-template";

const TEMPLATE_PROMPT: &str = include_str!("prompts/template_email.md");

const WELCOME: &str = "Hi, I'm your AI SDR. Send me a JSON object with an email template, your instructions, and information about a person, and I'll rewrite the template for that person.";

const SAMPLE_TEMPLATE: &str = "Subject: quick question about [company]

Hi [first name],

Saw that [company] is investing in AI. Most teams we talk to lose weeks to deployment plumbing before an agent ever reaches users.

Agentuity deploys agents with one command and lets agents from different frameworks work together. Open to a 15 minute chat next week?

P.S. We'll build your first agent for free.";

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct TemplateRequest {
    /// Any JSON describing the prospect
    #[serde(default)]
    pub person: Value,
    /// The email to customise
    pub template: String,
    pub prompt: String,
}

#[derive(Debug, Clone)]
pub struct TemplateEmailAgent {
    model: ModelSpec,
}

impl TemplateEmailAgent {
    pub fn new(model: ModelSpec) -> Self {
        Self { model }
    }

    pub fn from_override(overrides: &AgentOverride) -> Self {
        Self::new(overrides.model.clone().unwrap_or_else(default_model))
    }

    pub fn model(&self) -> &ModelSpec {
        &self.model
    }

    fn render(request: &TemplateRequest) -> String {
        render_template(
            TEMPLATE_PROMPT,
            &[
                ("prompt", &request.prompt),
                ("template", &request.template),
                ("person", &to_prompt_json(&request.person)),
            ],
        )
    }
}

impl Default for TemplateEmailAgent {
    fn default() -> Self {
        Self::new(default_model())
    }
}

#[async_trait]
impl SdrAgent for TemplateEmailAgent {
    type Input = TemplateRequest;

    fn id(&self) -> &'static str {
        AGENT_ID
    }

    fn description(&self) -> &'static str {
        "Rewrites a caller-supplied email template for one person"
    }

    fn welcome(&self) -> Welcome {
        Welcome {
            welcome: WELCOME.to_string(),
            prompts: vec![ExamplePrompt::json(json!({
                "person": samples::jane_doe(),
                "template": SAMPLE_TEMPLATE,
                "prompt": samples::CTO_OUTREACH_SHORT_PROMPT,
            }))],
        }
    }

    async fn run(
        &self,
        request: TemplateRequest,
        ctx: &mut GenerationContext,
    ) -> AgentResult<AgentOutput> {
        let email = ctx
            .text(GenerationRequest::new(self.model.clone(), Self::render(&request)))
            .await?;

        Ok(AgentOutput::Text(email))
    }
}
