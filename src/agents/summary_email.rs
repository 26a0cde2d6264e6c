//! Outreach email drafted from a prospect summary

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
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

pub const AGENT_ID: &str = "agent-sdr";

const EMAIL_PROMPT: &str = include_str!("prompts/summary_email.md");

const WELCOME: &str = "Hi, I'm your AI SDR. You can send me a JSON object containing information about a person and I'll generate a customized version of an email template for you.";

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct SummaryEmailRequest {
    /// Any JSON describing the prospect
    #[serde(default)]
    pub person: Value,
    pub prompt: String,
    pub summary: ProspectSummary,
}

/// Why the prospect fits and what to lead with
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ProspectSummary {
    pub prospect_fit: String,
    #[schemars(length(min = 3, max = 3))]
    pub key_focus_points: Vec<String>,
    #[schemars(length(min = 3, max = 3))]
    pub pain_points: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct SummaryEmailAgent {
    model: ModelSpec,
}

impl SummaryEmailAgent {
    pub fn new(model: ModelSpec) -> Self {
        Self { model }
    }

    pub fn from_override(overrides: &AgentOverride) -> Self {
        Self::new(overrides.model.clone().unwrap_or_else(default_model))
    }

    pub fn model(&self) -> &ModelSpec {
        &self.model
    }

    fn render(request: &SummaryEmailRequest) -> String {
        render_template(
            EMAIL_PROMPT,
            &[
                ("prompt", &request.prompt),
                ("person", &to_prompt_json(&request.person)),
                ("summary", &to_prompt_json(&request.summary)),
            ],
        )
    }
}

impl Default for SummaryEmailAgent {
    fn default() -> Self {
        Self::new(default_model())
    }
}

#[async_trait]
impl SdrAgent for SummaryEmailAgent {
    type Input = SummaryEmailRequest;

    fn id(&self) -> &'static str {
        AGENT_ID
    }

    fn description(&self) -> &'static str {
        "Writes a first-touch outreach email from a person record and a prospect summary"
    }

    fn welcome(&self) -> Welcome {
        let sample = |person: Value, summary: Value| {
            ExamplePrompt::json(json!({
                "person": person,
                "prompt": samples::CTO_OUTREACH_SHORT_PROMPT,
                "summary": summary,
            }))
        };

        Welcome {
            welcome: WELCOME.to_string(),
            prompts: vec![
                sample(samples::jane_doe_nested(), samples::cyan_analysis()),
                sample(samples::john_smith_nested(), samples::outreach_analysis()),
            ],
        }
    }

    async fn run(
        &self,
        request: SummaryEmailRequest,
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

    fn body(person: Option<Value>, pain_points: &[&str]) -> Vec<u8> {
        let mut request = json!({
            "prompt": "Write to the CTO",
            "summary": {
                "prospect_fit": "Builds AI agents",
                "key_focus_points": ["a", "b", "c"],
                "pain_points": pain_points,
            }
        });
        if let Some(person) = person {
            request["person"] = person;
        }
        serde_json::to_vec(&request).unwrap()
    }

    #[test]
    fn test_person_accepts_any_json() {
        for person in [json!("Jane Doe"), json!(42), json!(["Jane"]), json!({"name": "Jane"})] {
            let parsed = parse_json_payload::<SummaryEmailRequest>(&body(Some(person.clone()), &["x", "y", "z"]));
            assert_eq!(parsed.unwrap().person, person);
        }
    }

    #[test]
    fn test_missing_person_defaults_to_null() {
        let parsed = parse_json_payload::<SummaryEmailRequest>(&body(None, &["x", "y", "z"])).unwrap();
        assert_eq!(parsed.person, Value::Null);
        assert!(SummaryEmailAgent::render(&parsed).contains("# Target Person\n\nnull"));
    }

    #[test]
    fn test_summary_lists_need_three_entries() {
        assert!(parse_json_payload::<SummaryEmailRequest>(&body(None, &["x", "y"])).is_err());
        assert!(
            parse_json_payload::<SummaryEmailRequest>(&body(None, &["w", "x", "y", "z"])).is_err()
        );
    }

    #[test]
    fn test_welcome_samples_are_valid_requests() {
        for prompt in SummaryEmailAgent::default().welcome().prompts {
            assert!(parse_json_payload::<SummaryEmailRequest>(&prompt.body()).is_ok());
        }
    }
}
