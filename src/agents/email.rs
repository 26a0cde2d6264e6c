//! Outreach email drafted from a messaging analysis

use crate::agent::pipeline::{GenerationContext, SdrAgent};
use crate::agent::prompt::{render_template, to_prompt_json};
use crate::agent::response::AgentOutput;
use crate::agent::welcome::{ExamplePrompt, Welcome};
use crate::agents::outputs::EmailDraft;
use crate::agents::{default_model, samples};
use crate::config::AgentOverride;
use crate::error::AgentResult;
use crate::llm::generate::GenerationRequest;
use crate::llm::registry::ModelSpec;
use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{json, Map, Value};

pub const AGENT_ID: &str = "agent-sdr-email";

const EMAIL_PROMPT: &str = include_str!("prompts/analysis_email.md");

const WELCOME: &str = "Hi, I'm your AI SDR that specializes in generating personalized email templates for qualified Agentuity prospects. You can send me a JSON object containing information about a person and I'll respond with a one-of-a-kind email message for you to send the prospect.";

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct EmailRequest {
    /// Free-form record describing the prospect
    pub person: Map<String, Value>,
    /// Caller's outreach instructions
    pub prompt: String,
    /// Output of the fit analysis, or anything shaped like it
    pub analysis: Map<String, Value>,
}

#[derive(Debug, Clone)]
pub struct AnalysisEmailAgent {
    model: ModelSpec,
}

impl AnalysisEmailAgent {
    pub fn new(model: ModelSpec) -> Self {
        Self { model }
    }

    pub fn from_override(overrides: &AgentOverride) -> Self {
        Self::new(overrides.model.clone().unwrap_or_else(default_model))
    }

    pub fn model(&self) -> &ModelSpec {
        &self.model
    }

    fn render(request: &EmailRequest) -> String {
        render_template(
            EMAIL_PROMPT,
            &[
                ("prompt", &request.prompt),
                ("person", &to_prompt_json(&request.person)),
                ("analysis", &to_prompt_json(&request.analysis)),
            ],
        )
    }
}

impl Default for AnalysisEmailAgent {
    fn default() -> Self {
        Self::new(default_model())
    }
}

#[async_trait]
impl SdrAgent for AnalysisEmailAgent {
    type Input = EmailRequest;

    fn id(&self) -> &'static str {
        AGENT_ID
    }

    fn description(&self) -> &'static str {
        "Writes a first-touch outreach email from a person record and a messaging analysis"
    }

    fn welcome(&self) -> Welcome {
        let sample = |person: Value, analysis: Value| {
            ExamplePrompt::json(json!({
                "person": person,
                "prompt": samples::CTO_OUTREACH_PROMPT,
                "analysis": analysis,
            }))
        };

        Welcome {
            welcome: WELCOME.to_string(),
            prompts: vec![
                sample(samples::jane_doe(), samples::cyan_analysis()),
                sample(samples::john_smith(), samples::outreach_analysis()),
            ],
        }
    }

    async fn run(
        &self,
        request: EmailRequest,
        ctx: &mut GenerationContext,
    ) -> AgentResult<AgentOutput> {
        let draft: EmailDraft = ctx
            .object(GenerationRequest::new(self.model.clone(), Self::render(&request)))
            .await?;

        AgentOutput::json(&draft)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::payload::parse_json_payload;

    #[test]
    fn test_prompt_is_placed_verbatim() {
        let request = EmailRequest {
            person: json!({"first_name": "Jane"}).as_object().cloned().unwrap(),
            prompt: "Mention {person} literally".to_string(),
            analysis: Map::new(),
        };

        let rendered = AnalysisEmailAgent::render(&request);
        assert!(rendered.contains("Mention {person} literally"));
        assert!(rendered.contains(r#"{"first_name":"Jane"}"#));
        assert!(rendered.ends_with("# Analysis\n\n{}"));
    }

    #[test]
    fn test_person_must_be_an_object() {
        let body = br#"{"person": "Jane", "prompt": "hi", "analysis": {}}"#;
        assert!(parse_json_payload::<EmailRequest>(body).is_err());

        let body = br#"{"person": {}, "prompt": "hi"}"#;
        assert!(parse_json_payload::<EmailRequest>(body).is_err());
    }

    #[test]
    fn test_welcome_samples_are_valid_requests() {
        for prompt in AnalysisEmailAgent::default().welcome().prompts {
            assert!(parse_json_payload::<EmailRequest>(&prompt.body()).is_ok());
        }
    }
}
